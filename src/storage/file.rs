use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::RelayResult;
use crate::storage::traits::SeenStore;

/// Newline-separated identifiers in a plain text file
pub struct FileSeenStore {
    path: PathBuf,
}

impl FileSeenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeenStore for FileSeenStore {
    fn load(&self) -> RelayResult<Vec<String>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            // First run
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn save(&self, ids: &[String]) -> RelayResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, ids.join("\n"))?;
        Ok(())
    }
}
