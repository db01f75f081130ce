//! Scratch directory fixtures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary tree holding a drop directory, a backup directory, and a staging
/// directory on the same filesystem so files can be published by rename.
#[derive(Debug)]
pub struct DropWorkspace {
    _temp: TempDir,
    root: PathBuf,
    drop_dir: PathBuf,
    backup_dir: PathBuf,
    staging_dir: PathBuf,
}

impl DropWorkspace {
    /// Create the three directories under a fresh temporary root. All paths
    /// are canonical, matching what the watcher and the settings report.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary tree cannot be created.
    pub fn new() -> io::Result<Self> {
        let temp = tempfile::Builder::new().prefix("dropvault-").tempdir()?;
        let root = temp.path().canonicalize()?;
        let drop_dir = root.join("drop");
        let backup_dir = root.join("backup");
        let staging_dir = root.join("staging");
        for dir in [&drop_dir, &backup_dir, &staging_dir] {
            fs::create_dir(dir)?;
        }
        Ok(Self {
            _temp: temp,
            root,
            drop_dir,
            backup_dir,
            staging_dir,
        })
    }

    /// Root of the temporary tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Watched drop directory.
    #[must_use]
    pub fn drop_dir(&self) -> &Path {
        &self.drop_dir
    }

    /// Backup destination directory.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Write `contents` straight into the drop directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn drop_file(&self, name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self.drop_dir.join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write `contents` to the staging directory, then rename the complete
    /// file into the drop directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or moved.
    pub fn publish(&self, name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let staged = self.staging_dir.join(name);
        fs::write(&staged, contents)?;
        let target = self.drop_dir.join(name);
        fs::rename(&staged, &target)?;
        Ok(target)
    }

    /// Regular files currently in the backup directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn backup_files(&self) -> io::Result<Vec<PathBuf>> {
        list_files(&self.backup_dir)
    }

    /// Regular files currently in the drop directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn drop_files(&self) -> io::Result<Vec<PathBuf>> {
        list_files(&self.drop_dir)
    }
}

fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_creates_sibling_directories() -> io::Result<()> {
        let workspace = DropWorkspace::new()?;
        assert!(workspace.drop_dir().is_dir());
        assert!(workspace.backup_dir().is_dir());
        assert_eq!(workspace.drop_dir().parent(), Some(workspace.root()));
        Ok(())
    }

    #[test]
    fn publish_moves_complete_file_into_drop_dir() -> io::Result<()> {
        let workspace = DropWorkspace::new()?;
        let path = workspace.publish("data.txt", b"hello")?;
        assert_eq!(fs::read(&path)?, b"hello");
        assert_eq!(workspace.drop_files()?, vec![path]);
        assert!(workspace.backup_files()?.is_empty());
        Ok(())
    }
}
