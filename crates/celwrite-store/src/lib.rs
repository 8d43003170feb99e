//! celwrite-store: SQLite-backed draft persistence.
//!
//! Drafts live in a single key-value table. One background thread owns the
//! connection and serves requests in arrival order, so a `load` issued after
//! a `save` always sees that save.

pub mod sqlite;

use std::path::PathBuf;

pub use sqlite::{DraftEntry, SqliteDraftStore};

/// File name of the draft database inside the data directory.
pub const DB_FILE_NAME: &str = "drafts.db";

/// Platform data directory for celwrite (e.g. `~/.local/share/celwrite`).
pub fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "celwrite").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Draft database path under `data_dir`, or under the platform default.
pub fn db_path(data_dir: Option<&std::path::Path>) -> Option<PathBuf> {
    match data_dir {
        Some(dir) => Some(dir.join(DB_FILE_NAME)),
        None => default_data_dir().map(|dir| dir.join(DB_FILE_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_data_dir_wins() {
        let path = db_path(Some(std::path::Path::new("/tmp/celwrite-data"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/celwrite-data/drafts.db"));
    }
}
