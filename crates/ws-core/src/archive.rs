use std::fs;
use std::path::{Path, PathBuf};

use crate::name::WorkspaceName;
use crate::workspace::{io_err, WorkspaceError, WorkspaceStore};

#[derive(Debug, Clone)]
pub struct ArchiveResult {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// True when the destination already existed and was merged into.
    pub merged: bool,
}

impl WorkspaceStore {
    /// Archive destination of `name`: its relative path under `.archive`.
    pub fn archive_path_of(&self, name: &WorkspaceName) -> PathBuf {
        name.to_path(&self.archive_root())
    }

    /// Move a workspace subtree under `.archive`, mirroring its relative
    /// path. A destination left behind by an earlier archive (e.g. a child
    /// archived before its parent) is merged into, with incoming files
    /// replacing same-named ones.
    pub fn move_to_archive(&self, name: &WorkspaceName) -> Result<ArchiveResult, WorkspaceError> {
        let source = self.require(name)?;
        let destination = self.archive_path_of(name);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let merged = destination.exists();
        if merged {
            copy_tree(&source, &destination)?;
            fs::remove_dir_all(&source).map_err(io_err(&source))?;
        } else {
            fs::rename(&source, &destination).map_err(io_err(&source))?;
        }

        Ok(ArchiveResult {
            source,
            destination,
            merged,
        })
    }
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(to).map_err(io_err(to))?;
    for entry in fs::read_dir(from).map_err(io_err(from))? {
        let entry = entry.map_err(io_err(from))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(io_err(&source))?;
        if file_type.is_dir() {
            copy_tree(&source, &target)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(&source).map_err(io_err(&source))?;
            if target.symlink_metadata().is_ok() {
                fs::remove_file(&target).map_err(io_err(&target))?;
            }
            symlink(&link, &target)?;
        } else {
            fs::copy(&source, &target).map_err(io_err(&source))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(link: &Path, target: &Path) -> Result<(), WorkspaceError> {
    std::os::unix::fs::symlink(link, target).map_err(io_err(target))
}

#[cfg(not(unix))]
fn symlink(link: &Path, target: &Path) -> Result<(), WorkspaceError> {
    let resolved = target.parent().map(|dir| dir.join(link)).unwrap_or_else(|| link.to_path_buf());
    fs::copy(&resolved, target).map(|_| ()).map_err(io_err(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkspaceDefaults;
    use crate::workspace::{is_workspace_dir, CreateOptions};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create(store: &WorkspaceStore, raw: &str) -> PathBuf {
        store
            .create(
                &WorkspaceName::parse(raw).expect("name"),
                CreateOptions::default(),
                &WorkspaceDefaults::default(),
                NaiveDate::from_ymd_opt(2026, 1, 1).expect("date"),
            )
            .expect("create")
            .path
    }

    #[test]
    fn archive_moves_subtree_under_archive_root() {
        let temp = TempDir::new().expect("tempdir");
        let store = WorkspaceStore::new(temp.path());
        let path = create(&store, "p");
        create(&store, "p.child");
        fs::write(path.join("notes.txt"), "hello").expect("notes");

        let result = store
            .move_to_archive(&WorkspaceName::parse("p").expect("name"))
            .expect("archive");
        assert!(!result.merged);
        assert!(!path.exists());
        let archived = temp.path().join(".archive").join("p");
        assert_eq!(result.destination, archived);
        assert!(is_workspace_dir(&archived));
        assert!(is_workspace_dir(&archived.join("child")));
        assert_eq!(
            fs::read_to_string(archived.join("notes.txt")).expect("notes"),
            "hello"
        );
    }

    #[test]
    fn archive_missing_workspace_fails() {
        let temp = TempDir::new().expect("tempdir");
        let store = WorkspaceStore::new(temp.path());
        let err = store
            .move_to_archive(&WorkspaceName::parse("ghost").expect("name"))
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound(_)));
    }
}
