pub mod employee_repository;

use crate::config::MongoSettings;
use crate::errors::AppError;
use crate::models::employee::EmployeeDocument;
use bson::doc;
use log::{info, warn};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use std::sync::RwLock;
use tokio::sync::Mutex;

/// Owns the process-wide client. Constructed once at startup and handed to
/// whatever needs a collection handle.
pub struct Storage {
    settings: MongoSettings,
    client: RwLock<Option<Client>>,
    // serialises connect/disconnect; readers only touch `client`
    lifecycle: Mutex<()>,
}

impl Storage {
    pub fn new(settings: MongoSettings) -> Self {
        Storage {
            settings,
            client: RwLock::new(None),
            lifecycle: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &MongoSettings {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        self.client.read().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Creates the client and makes sure the employee indexes exist. Only the
    /// first successful call has any effect; concurrent callers wait for it.
    pub async fn connect(&self) -> Result<(), AppError> {
        let _guard = self.lifecycle.lock().await;
        if self.is_connected() {
            return Ok(());
        }

        let mut options = ClientOptions::parse(&self.settings.uri).await?;
        options.app_name = Some("employee_service".to_string());
        options.connect_timeout = Some(self.settings.timeout);
        options.server_selection_timeout = Some(self.settings.timeout);
        if let Some(size) = self.settings.max_pool_size {
            options.max_pool_size = Some(size);
        }
        let client = Client::with_options(options)?;

        // the client is published only once its indexes exist
        let created = self
            .employees(&client)
            .create_indexes(employee_indexes())
            .await;
        match created {
            Ok(created) => info!("Ensured indexes: {}", created.index_names.join(", ")),
            Err(err) => {
                client.shutdown().await;
                return Err(err.into());
            }
        }

        *self.client.write().map_err(|_| lock_poisoned())? = Some(client);
        info!(
            "Connected to MongoDB database '{}', collection '{}'",
            self.settings.database, self.settings.collection
        );
        Ok(())
    }

    /// Releases the client. A no-op when already disconnected.
    pub async fn disconnect(&self) {
        let _guard = self.lifecycle.lock().await;
        let client = match self.client.write() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                warn!("Storage lock poisoned during disconnect");
                None
            }
        };
        if let Some(client) = client {
            client.shutdown().await;
            info!("Disconnected from MongoDB");
        }
    }

    fn employees(&self, client: &Client) -> Collection<EmployeeDocument> {
        client
            .database(&self.settings.database)
            .collection(&self.settings.collection)
    }

    /// Returns the live employee collection, or `Uninitialized` before
    /// `connect` has succeeded.
    pub fn collection(&self) -> Result<Collection<EmployeeDocument>, AppError> {
        let slot = self.client.read().map_err(|_| lock_poisoned())?;
        let client = slot.as_ref().ok_or(AppError::Uninitialized)?;
        Ok(self.employees(client))
    }
}

fn lock_poisoned() -> AppError {
    AppError::DatabaseError("storage lock poisoned".to_string())
}

pub fn employee_indexes() -> Vec<IndexModel> {
    vec![
        IndexModel::builder()
            .keys(doc! { "employee_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build(),
        IndexModel::builder()
            .keys(doc! { "department": 1, "joining_date": -1 })
            .build(),
        IndexModel::builder().keys(doc! { "skills": 1 }).build(),
    ]
}
