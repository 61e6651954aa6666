//! Backup directory layout.
//!
//! Local backups live at `<base>/<server>/backup/<label>`, with the actual
//! data tree under a `data` subdirectory and the catalog record beside it.
//! Remote keys mirror the same `<server>/backup/<label>` shape under the
//! engine's configured base directory.

use std::path::{Path, PathBuf};

/// Directory of one backup: `<base>/<server>/backup/<label>`.
#[must_use]
pub fn local_backup_dir(base: &Path, server: &str, label: &str) -> PathBuf {
    base.join(server).join("backup").join(label)
}

/// Data tree of one backup: `<base>/<server>/backup/<label>/data`.
#[must_use]
pub fn local_data_dir(base: &Path, server: &str, label: &str) -> PathBuf {
    local_backup_dir(base, server, label).join("data")
}

/// Catalog directory of one server: `<base>/<server>/backup`.
#[must_use]
pub fn catalog_dir(base: &Path, server: &str) -> PathBuf {
    base.join(server).join("backup")
}

/// Remote key prefix for one backup.
///
/// An empty engine base directory yields `<server>/backup/<label>` with no
/// leading slash.
#[must_use]
pub fn remote_backup_prefix(engine_base: &str, server: &str, label: &str) -> String {
    let engine_base = engine_base.trim_matches('/');
    if engine_base.is_empty() {
        format!("{server}/backup/{label}")
    } else {
        format!("{engine_base}/{server}/backup/{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_lay_out_local_backup_paths() {
        let base = Path::new("/var/lib/pgvault");
        assert_eq!(
            local_backup_dir(base, "primary", "2025-01-01"),
            Path::new("/var/lib/pgvault/primary/backup/2025-01-01")
        );
        assert_eq!(
            local_data_dir(base, "primary", "2025-01-01"),
            Path::new("/var/lib/pgvault/primary/backup/2025-01-01/data")
        );
        assert_eq!(
            catalog_dir(base, "primary"),
            Path::new("/var/lib/pgvault/primary/backup")
        );
    }

    #[test]
    fn test_should_build_remote_prefix_with_base_dir() {
        assert_eq!(
            remote_backup_prefix("backups", "primary", "2025-01-01"),
            "backups/primary/backup/2025-01-01"
        );
    }

    #[test]
    fn test_should_build_remote_prefix_without_base_dir() {
        assert_eq!(
            remote_backup_prefix("", "primary", "2025-01-01"),
            "primary/backup/2025-01-01"
        );
    }

    #[test]
    fn test_should_trim_slashes_from_engine_base() {
        assert_eq!(
            remote_backup_prefix("/backups/", "primary", "2025-01-01"),
            "backups/primary/backup/2025-01-01"
        );
    }
}
