//! Crop store backed by a single JSON file

use std::path::PathBuf;

use async_trait::async_trait;
use shared::Crop;
use tokio::sync::Mutex;

use crate::error::{EngineError, EngineResult};
use crate::external::CropStore;

/// Keeps the crop set as one JSON array; a missing file is an empty store
pub struct JsonFileCropStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileCropStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> EngineResult<Vec<Crop>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| EngineError::Storage(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(EngineError::Storage(format!("{}: {}", self.path.display(), e))),
        }
    }
}

#[async_trait]
impl CropStore for JsonFileCropStore {
    async fn save(&self, crop: &Crop) -> EngineResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut crops = self.read().await?;
        match crops.iter_mut().find(|c| c.name == crop.name) {
            Some(existing) => *existing = crop.clone(),
            None => crops.push(crop.clone()),
        }

        let json = serde_json::to_vec_pretty(&crops)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| EngineError::Storage(format!("{}: {}", self.path.display(), e)))?;
        tracing::debug!(crop = %crop.name, path = %self.path.display(), "Saved crop");
        Ok(())
    }

    async fn load_all(&self) -> EngineResult<Vec<Crop>> {
        self.read().await
    }
}
