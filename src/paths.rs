//! Path resolution for classroom data files.
//!
//! Provides XDG-compliant path resolution.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "classroom";

/// Get XDG-compliant data directory.
///
/// Uses `$XDG_DATA_HOME/classroom`, falling back to `$HOME/.local/share/classroom`.
/// With neither variable set the current directory is used.
pub fn get_data_dir() -> PathBuf {
    let data_home = env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|home| PathBuf::from(home).join(".local/share")))
        .unwrap_or_else(|_| PathBuf::from("."));

    data_home.join(APP_DIR)
}

/// Get database file path (data_dir/classroom.db).
pub fn get_db_path() -> PathBuf {
    get_data_dir().join("classroom.db")
}
