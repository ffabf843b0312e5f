use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use validator::Validate;

use crate::db::employee_repository::EmployeeRepository;
use crate::errors::AppError;
use crate::models::employee::{EmployeeUpdate, ListEmployeesQuery, NewEmployee, SkillQuery};

type Repo = web::Data<dyn EmployeeRepository>;

/// Registers the `/employees` routes. The fixed paths come before
/// `/employees/{employee_id}` so they are never read as an id; `NewEmployee`
/// refuses those two names as ids.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::InvalidInput(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::InvalidInput(err.to_string()).into()
    }))
    .service(
        web::resource("/employees")
            .route(web::post().to(create_employee))
            .route(web::get().to(list_employees)),
    )
    .service(web::resource("/employees/avg-salary").route(web::get().to(average_salary)))
    .service(web::resource("/employees/search").route(web::get().to(search_by_skill)))
    .service(
        web::resource("/employees/{employee_id}")
            .route(web::get().to(get_employee))
            .route(web::put().to(update_employee))
            .route(web::delete().to(delete_employee)),
    );
}

pub async fn create_employee(
    repo: Repo,
    new_employee: web::Json<NewEmployee>,
) -> Result<HttpResponse, actix_web::Error> {
    new_employee.validate().map_err(AppError::from)?;

    let created = repo.create(new_employee.into_inner()).await?;
    info!("Created employee {}", created.employee_id);

    Ok(HttpResponse::Created().json(created))
}

pub async fn get_employee(
    repo: Repo,
    employee_id: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    match repo.get_by_id(&employee_id).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(employee)),
        None => Err(AppError::NotFound("Employee not found".to_string()).into()),
    }
}

pub async fn update_employee(
    repo: Repo,
    employee_id: web::Path<String>,
    updates: web::Json<EmployeeUpdate>,
) -> Result<HttpResponse, actix_web::Error> {
    if updates.is_empty() {
        return Err(AppError::InvalidInput("No fields to update".to_string()).into());
    }
    updates.validate().map_err(AppError::from)?;

    let updated = repo.update(&employee_id, updates.into_inner()).await?;
    info!("Updated employee {}", updated.employee_id);

    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_employee(
    repo: Repo,
    employee_id: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    repo.delete(&employee_id).await?;
    info!("Deleted employee {}", employee_id);

    Ok(HttpResponse::NoContent().finish())
}

/// Only the requested page goes back to the client; the total is dropped.
pub async fn list_employees(
    repo: Repo,
    query: web::Query<ListEmployeesQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    query.validate().map_err(AppError::from)?;

    let page = repo
        .list_by_department(&query.department, query.page, query.page_size)
        .await?;

    Ok(HttpResponse::Ok().json(page.items))
}

pub async fn average_salary(repo: Repo) -> Result<HttpResponse, actix_web::Error> {
    let averages = repo.average_salary_by_department().await?;
    Ok(HttpResponse::Ok().json(averages))
}

pub async fn search_by_skill(
    repo: Repo,
    query: web::Query<SkillQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let employees = repo.search_by_skill(&query.skill).await?;
    Ok(HttpResponse::Ok().json(employees))
}
