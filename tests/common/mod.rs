use async_trait::async_trait;
use employee_service::db::employee_repository::{page_offset, EmployeePage, EmployeeRepository};
use employee_service::errors::AppError;
use employee_service::models::employee::{DepartmentSalary, Employee, EmployeeUpdate, NewEmployee};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Stand-in for the Mongo repository so the HTTP layer can be tested
/// without a running server.
#[derive(Default)]
pub struct InMemoryEmployeeRepository {
    employees: Mutex<Vec<Employee>>,
}

impl InMemoryEmployeeRepository {
    pub fn len(&self) -> usize {
        self.employees.lock().unwrap().len()
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn create(&self, employee: NewEmployee) -> Result<Employee, AppError> {
        let mut employees = self.employees.lock().unwrap();
        if employees.iter().any(|e| e.employee_id == employee.employee_id) {
            return Err(AppError::AlreadyExists("employee_id already exists".to_string()));
        }
        let employee = Employee::from(employee);
        employees.push(employee.clone());
        Ok(employee)
    }

    async fn get_by_id(&self, employee_id: &str) -> Result<Option<Employee>, AppError> {
        let employees = self.employees.lock().unwrap();
        Ok(employees.iter().find(|e| e.employee_id == employee_id).cloned())
    }

    async fn update(&self, employee_id: &str, update: EmployeeUpdate) -> Result<Employee, AppError> {
        let mut employees = self.employees.lock().unwrap();
        let employee = employees
            .iter_mut()
            .find(|e| e.employee_id == employee_id)
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;
        if let Some(name) = update.name {
            employee.name = name;
        }
        if let Some(department) = update.department {
            employee.department = department;
        }
        if let Some(salary) = update.salary {
            employee.salary = salary;
        }
        if let Some(joining_date) = update.joining_date {
            employee.joining_date = joining_date;
        }
        if let Some(skills) = update.skills {
            employee.skills = skills;
        }
        Ok(employee.clone())
    }

    async fn delete(&self, employee_id: &str) -> Result<(), AppError> {
        let mut employees = self.employees.lock().unwrap();
        let before = employees.len();
        employees.retain(|e| e.employee_id != employee_id);
        if employees.len() == before {
            return Err(AppError::NotFound("Employee not found".to_string()));
        }
        Ok(())
    }

    async fn list_by_department(
        &self,
        department: &str,
        page: u64,
        page_size: u64,
    ) -> Result<EmployeePage, AppError> {
        let employees = self.employees.lock().unwrap();
        let mut matching: Vec<Employee> = employees
            .iter()
            .filter(|e| e.department == department)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.joining_date.cmp(&a.joining_date));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page_offset(page, page_size) as usize)
            .take(page_size as usize)
            .collect();
        Ok(EmployeePage { total, items })
    }

    async fn average_salary_by_department(&self) -> Result<Vec<DepartmentSalary>, AppError> {
        let employees = self.employees.lock().unwrap();
        let mut groups: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for e in employees.iter() {
            let entry = groups.entry(e.department.clone()).or_insert((0, 0));
            entry.0 += e.salary;
            entry.1 += 1;
        }
        Ok(groups
            .into_iter()
            .map(|(department, (sum, count))| DepartmentSalary {
                department,
                avg_salary: ((sum as f64 / count as f64) * 100.0).round() / 100.0,
            })
            .collect())
    }

    async fn search_by_skill(&self, skill: &str) -> Result<Vec<Employee>, AppError> {
        let needle = skill.to_lowercase();
        let employees = self.employees.lock().unwrap();
        Ok(employees
            .iter()
            .filter(|e| e.skills.iter().any(|s| s.to_lowercase() == needle))
            .cloned()
            .collect())
    }
}
