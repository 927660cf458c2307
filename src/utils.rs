//! Utility functions for logging and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for log previews of unexpected markup
//! - File system validation for the output directory

use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Truncate a string for logging purposes.
///
/// Cuts at a character boundary so multi-byte text stays valid.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("Zamek w Będzinie", 5), "Zamek…");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s.to_string(),
    }
}

/// Ensure the output directory exists and accepts new files.
///
/// Creates the directory if needed, then writes and removes an empty marker
/// file. Runs before harvesting so a long run does not end in a failed write.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let marker = write_check_file(Path::new(path));
    fs::write(&marker, b"").await?;
    if let Err(e) = fs::remove_file(&marker).await {
        warn!(file = %marker.display(), error = %e, "Could not remove write check file");
    }
    info!("Output directory is writable");
    Ok(())
}

fn write_check_file(dir: &Path) -> PathBuf {
    dir.join(format!(".heritage_harvest_write_check_{}", std::process::id()))
}
