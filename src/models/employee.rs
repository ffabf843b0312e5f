use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Ids that collide with the fixed `/employees/...` routes; a record stored
/// under one of them could never be addressed again.
pub const RESERVED_EMPLOYEE_IDS: [&str; 2] = ["search", "avg-salary"];

fn validate_employee_id(employee_id: &str) -> Result<(), ValidationError> {
    if RESERVED_EMPLOYEE_IDS.contains(&employee_id) {
        return Err(ValidationError::new("reserved_employee_id"));
    }
    Ok(())
}

/// Create-input: every field is required except `skills`.
#[derive(Deserialize, Validate, Debug, Clone)]
pub struct NewEmployee {
    #[validate(length(min = 1, max = 64), custom = "validate_employee_id")]
    pub employee_id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub department: String,
    #[validate(range(min = 0))]
    pub salary: i64,
    pub joining_date: NaiveDate,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Merge-patch input. Absent and `null` fields are both `None` and are never
/// written to the store.
#[derive(Deserialize, Validate, Debug, Clone, Default)]
pub struct EmployeeUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub department: Option<String>,
    #[validate(range(min = 0))]
    pub salary: Option<i64>,
    pub joining_date: Option<NaiveDate>,
    pub skills: Option<Vec<String>>,
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.department.is_none()
            && self.salary.is_none()
            && self.joining_date.is_none()
            && self.skills.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub salary: i64,
    pub joining_date: NaiveDate,
    pub skills: Vec<String>,
}

/// Stored shape. `joining_date` is kept as a BSON date at midnight UTC so that
/// the `(department, joining_date)` index sorts chronologically.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EmployeeDocument {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub salary: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub joining_date: DateTime<Utc>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DepartmentSalary {
    pub department: String,
    pub avg_salary: f64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    10
}

#[derive(Deserialize, Validate, Debug)]
pub struct ListEmployeesQuery {
    pub department: String,
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u64,
}

#[derive(Deserialize, Debug)]
pub struct SkillQuery {
    pub skill: String,
}

/// Joining dates carry no time of day; they are persisted at midnight UTC.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl From<NewEmployee> for EmployeeDocument {
    fn from(employee: NewEmployee) -> Self {
        EmployeeDocument {
            employee_id: employee.employee_id,
            name: employee.name,
            department: employee.department,
            salary: employee.salary,
            joining_date: midnight_utc(employee.joining_date),
            skills: employee.skills,
        }
    }
}

impl From<EmployeeDocument> for Employee {
    fn from(doc: EmployeeDocument) -> Self {
        Employee {
            employee_id: doc.employee_id,
            name: doc.name,
            department: doc.department,
            salary: doc.salary,
            joining_date: doc.joining_date.date_naive(),
            skills: doc.skills,
        }
    }
}

impl From<NewEmployee> for Employee {
    fn from(employee: NewEmployee) -> Self {
        EmployeeDocument::from(employee).into()
    }
}
