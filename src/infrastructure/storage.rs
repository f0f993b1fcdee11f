use std::path::PathBuf;

use serde::Serialize;

use crate::domain::error::{AppError, Result};
use crate::domain::scripts::{find_script, ScriptInfo, SCRIPT_CATALOG};

/// Catalog entry plus whether its file is present on disk.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptListing {
    #[serde(flatten)]
    pub info: ScriptInfo,
    pub available: bool,
}

/// Read-only access to the companion scripts directory.
#[derive(Debug, Clone)]
pub struct ScriptStore {
    root: PathBuf,
}

impl ScriptStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn list(&self) -> Vec<ScriptListing> {
        SCRIPT_CATALOG
            .iter()
            .map(|info| ScriptListing {
                info: *info,
                available: self.root.join(info.file_name).is_file(),
            })
            .collect()
    }

    /// Only catalogued names resolve, so request paths never reach the filesystem directly.
    pub async fn read(&self, file_name: &str) -> Result<(&'static ScriptInfo, Vec<u8>)> {
        let info = find_script(file_name)
            .ok_or_else(|| AppError::NotFound(format!("Unknown script: {}", file_name)))?;

        let path = self.root.join(info.file_name);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("Script file missing: {}", path.display()))
            } else {
                AppError::from(e)
            }
        })?;

        Ok((info, bytes))
    }
}
