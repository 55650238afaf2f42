//! Directory resolution for aegis's on-disk state.

use std::path::PathBuf;

use crate::error::{Result, StorageError};

const AEGIS_DIR_NAME: &str = ".aegis";
const AEGIS_DIR_ENV: &str = "AEGIS_DIR";

/// Resolve the aegis state directory: `$AEGIS_DIR` if set, else `~/.aegis`.
pub fn resolve_aegis_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(AEGIS_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|h| h.join(AEGIS_DIR_NAME))
        .ok_or(StorageError::NoHomeDir)
}

pub async fn ensure_aegis_dir() -> Result<PathBuf> {
    let dir = resolve_aegis_dir()?;
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}
