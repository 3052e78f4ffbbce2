use std::{fs, path::PathBuf};

use directories::BaseDirs;
use tempdir::TempDir;
use tracing::info;

use crate::errors::StoreError;

/// Resolve and create the directory the database lives in.
///
/// An `ephemeral` directory is created under the system temp dir and is not removed on
/// exit, so tests can inspect it after a failure.
pub fn setup_data_dir(
    app_name: &str,
    data_dir: Option<PathBuf>,
    ephemeral: bool,
) -> Result<PathBuf, StoreError> {
    let data_dir = if ephemeral {
        TempDir::new(app_name)?.into_path()
    } else {
        match data_dir {
            Some(data_dir) => data_dir,
            None => BaseDirs::new()
                .map(|dirs| dirs.data_dir().join(app_name))
                .ok_or_else(|| StoreError::DataDirUnavailable(app_name.to_string()))?,
        }
    };

    fs::create_dir_all(&data_dir)?;
    info!("Using data directory: {}", data_dir.display());
    Ok(data_dir)
}
