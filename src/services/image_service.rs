use crate::api::error::AppError;
use crate::entities::images;
use crate::services::storage::LocalStorage;
use crate::utils::naming::generate_filename;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tracing::info;

/// Upload-and-register sequence: generate a name, write the blob, insert the
/// metadata row.
pub struct ImageService {
    db: DatabaseConnection,
    storage: Arc<LocalStorage>,
}

impl ImageService {
    pub fn new(db: DatabaseConnection, storage: Arc<LocalStorage>) -> Self {
        Self { db, storage }
    }

    /// Stores a validated upload. Callers check type and size before this
    /// point; nothing is re-checked here.
    ///
    /// If the insert fails after the blob was written, the blob stays on disk
    /// as an orphan. There is no compensating delete and no reconciliation.
    pub async fn store(
        &self,
        original_name: &str,
        mimetype: &str,
        data: &[u8],
    ) -> Result<images::Model, AppError> {
        let filename = generate_filename(original_name);

        self.storage.save(&filename, data).await.map_err(|e| {
            tracing::error!("Failed to write blob {}: {}", filename, e);
            AppError::Internal("Failed to store file".to_string())
        })?;

        let record = images::ActiveModel {
            filename: Set(filename.clone()),
            original_name: Set(Some(original_name.to_string())),
            mimetype: Set(Some(mimetype.to_string())),
            size: Set(Some(data.len() as i64)),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(
            "🖼️  Stored '{}' ({} bytes) as {}",
            original_name,
            data.len(),
            filename
        );

        Ok(record)
    }
}
