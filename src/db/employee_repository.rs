use crate::errors::AppError;
use crate::models::employee::{
    midnight_utc, DepartmentSalary, Employee, EmployeeDocument, EmployeeUpdate, NewEmployee,
};
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures_util::TryStreamExt;
use log::{debug, warn};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use std::future::Future;
use std::time::Duration;

/// One page of a department listing plus the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeePage {
    pub total: u64,
    pub items: Vec<Employee>,
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Fails with `AlreadyExists` when `employee_id` is taken.
    async fn create(&self, employee: NewEmployee) -> Result<Employee, AppError>;

    /// Absence is `Ok(None)`, not an error.
    async fn get_by_id(&self, employee_id: &str) -> Result<Option<Employee>, AppError>;

    /// Applies only the supplied fields and returns the full record.
    async fn update(&self, employee_id: &str, update: EmployeeUpdate) -> Result<Employee, AppError>;

    async fn delete(&self, employee_id: &str) -> Result<(), AppError>;

    /// `page` is 1-based. Items are sorted by `joining_date`, newest first.
    async fn list_by_department(
        &self,
        department: &str,
        page: u64,
        page_size: u64,
    ) -> Result<EmployeePage, AppError>;

    async fn average_salary_by_department(&self) -> Result<Vec<DepartmentSalary>, AppError>;

    /// Case-insensitive whole-string match against any element of `skills`.
    async fn search_by_skill(&self, skill: &str) -> Result<Vec<Employee>, AppError>;
}

pub struct MongoEmployeeRepository {
    collection: Collection<EmployeeDocument>,
    timeout: Duration,
}

impl MongoEmployeeRepository {
    pub fn new(collection: Collection<EmployeeDocument>, timeout: Duration) -> Self {
        MongoEmployeeRepository {
            collection,
            timeout,
        }
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} exceeded {:?}", operation, self.timeout);
                Err(AppError::Timeout(format!("{} timed out", operation)))
            }
        }
    }
}

#[async_trait]
impl EmployeeRepository for MongoEmployeeRepository {
    async fn create(&self, employee: NewEmployee) -> Result<Employee, AppError> {
        let document = EmployeeDocument::from(employee);
        self.bounded("create", async {
            // the unique index decides; no existence pre-check
            self.collection.insert_one(&document).await?;
            Ok::<_, AppError>(())
        })
        .await?;
        debug!("Inserted employee {}", document.employee_id);
        Ok(document.into())
    }

    async fn get_by_id(&self, employee_id: &str) -> Result<Option<Employee>, AppError> {
        let found = self
            .bounded("get_by_id", async move {
                Ok::<_, AppError>(
                    self.collection
                        .find_one(id_filter(employee_id))
                        .projection(without_internal_id())
                        .await?,
                )
            })
            .await?;
        Ok(found.map(Employee::from))
    }

    async fn update(&self, employee_id: &str, update: EmployeeUpdate) -> Result<Employee, AppError> {
        let patch = merge_patch(&update);
        if patch.is_empty() {
            return Err(AppError::InvalidInput("No fields to update".to_string()));
        }

        let updated = self
            .bounded("update", async move {
                Ok::<_, AppError>(
                    self.collection
                        .find_one_and_update(id_filter(employee_id), doc! { "$set": patch })
                        .projection(without_internal_id())
                        .return_document(ReturnDocument::After)
                        .await?,
                )
            })
            .await?;

        updated
            .map(Employee::from)
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))
    }

    async fn delete(&self, employee_id: &str) -> Result<(), AppError> {
        let result = self
            .bounded("delete", async move {
                Ok::<_, AppError>(self.collection.delete_one(id_filter(employee_id)).await?)
            })
            .await?;
        if result.deleted_count == 0 {
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
        let filter = department_filter(department);
        let limit = i64::try_from(page_size)
            .map_err(|_| AppError::InvalidInput("page_size out of range".to_string()))?;

        self.bounded("list_by_department", async move {
            let total = self.collection.count_documents(filter.clone()).await?;
            let items: Vec<EmployeeDocument> = self
                .collection
                .find(filter)
                .projection(without_internal_id())
                .sort(doc! { "joining_date": -1 })
                .skip(page_offset(page, page_size))
                .limit(limit)
                .await?
                .try_collect()
                .await?;
            Ok::<_, AppError>(EmployeePage {
                total,
                items: items.into_iter().map(Employee::from).collect(),
            })
        })
        .await
    }

    async fn average_salary_by_department(&self) -> Result<Vec<DepartmentSalary>, AppError> {
        let rows: Vec<Document> = self
            .bounded("average_salary_by_department", async move {
                Ok::<_, AppError>(
                    self.collection
                        .aggregate(average_salary_pipeline())
                        .await?
                        .try_collect::<Vec<_>>()
                        .await?,
                )
            })
            .await?;

        rows.into_iter()
            .map(|row| bson::from_document(row).map_err(AppError::from))
            .collect()
    }

    async fn search_by_skill(&self, skill: &str) -> Result<Vec<Employee>, AppError> {
        let found: Vec<EmployeeDocument> = self
            .bounded("search_by_skill", async move {
                Ok::<_, AppError>(
                    self.collection
                        .find(skill_filter(skill))
                        .projection(without_internal_id())
                        .await?
                        .try_collect::<Vec<_>>()
                        .await?,
                )
            })
            .await?;
        Ok(found.into_iter().map(Employee::from).collect())
    }
}

pub fn id_filter(employee_id: &str) -> Document {
    doc! { "employee_id": employee_id }
}

pub fn department_filter(department: &str) -> Document {
    doc! { "department": department }
}

pub fn without_internal_id() -> Document {
    doc! { "_id": 0 }
}

/// Anchored, case-insensitive regex so "java" matches "Java" but not
/// "JavaScript". The input is escaped so it is always taken literally.
/// `\z` rather than `$`: in PCRE `$` also matches before a trailing newline.
pub fn skill_pattern(skill: &str) -> String {
    format!("^{}\\z", regex::escape(skill))
}

pub fn skill_filter(skill: &str) -> Document {
    doc! {
        "skills": {
            "$elemMatch": { "$regex": skill_pattern(skill), "$options": "i" }
        }
    }
}

/// `$set` body holding only the fields present in the update.
pub fn merge_patch(update: &EmployeeUpdate) -> Document {
    let mut set = Document::new();
    if let Some(name) = &update.name {
        set.insert("name", name.as_str());
    }
    if let Some(department) = &update.department {
        set.insert("department", department.as_str());
    }
    if let Some(salary) = update.salary {
        set.insert("salary", salary);
    }
    if let Some(date) = update.joining_date {
        set.insert("joining_date", bson::DateTime::from_chrono(midnight_utc(date)));
    }
    if let Some(skills) = &update.skills {
        let skills: Vec<Bson> = skills.iter().map(|s| Bson::String(s.clone())).collect();
        set.insert("skills", skills);
    }
    set
}

pub fn page_offset(page: u64, page_size: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(page_size)
}

pub fn average_salary_pipeline() -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$department", "avg_salary": { "$avg": "$salary" } } },
        doc! {
            "$project": {
                "_id": 0,
                "department": "$_id",
                "avg_salary": { "$round": ["$avg_salary", 2] },
            }
        },
        doc! { "$sort": { "department": 1 } },
    ]
}
