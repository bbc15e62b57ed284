use crate::config::AppConfig;
use crate::services::storage::LocalStorage;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> anyhow::Result<Arc<LocalStorage>> {
    info!("🗂️  Upload directory: {}", config.upload_dir.display());

    let storage = LocalStorage::new(config.upload_dir.clone());
    storage.ensure_root().await?;

    Ok(Arc::new(storage))
}
