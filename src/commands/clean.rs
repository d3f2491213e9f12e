//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::cache;
use crate::App;

/// Clean the public directory and cache
pub fn run(app: &App) -> Result<()> {
    if app.public_dir.exists() {
        fs::remove_dir_all(&app.public_dir)?;
        tracing::info!("Deleted: {:?}", app.public_dir);
    }

    cache::clear(&app.base_dir)?;

    Ok(())
}
