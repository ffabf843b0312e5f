use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use employee_service::config::Settings;
use employee_service::db::employee_repository::{EmployeeRepository, MongoEmployeeRepository};
use employee_service::db::Storage;
use employee_service::handlers;
use log::info;
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let settings = Settings::from_env().map_err(io::Error::other)?;

    // Connect before serving so handlers never see an uninitialized store
    let storage = Storage::new(settings.mongo.clone());
    storage.connect().await.map_err(io::Error::other)?;

    let collection = storage.collection().map_err(io::Error::other)?;
    let repo: Arc<dyn EmployeeRepository> =
        Arc::new(MongoEmployeeRepository::new(collection, settings.mongo.timeout));
    let repo = web::Data::from(repo);

    info!("Starting server at {}", settings.bind_address);

    let result = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(repo.clone())
            .configure(handlers::employee::config)
    })
    .bind(&settings.bind_address)?
    .run()
    .await;

    storage.disconnect().await;
    result
}
