use crate::error::{AppError, AppResult};
use crate::store::FileStore;
use std::fs;
use std::path::PathBuf;

/// Binary template files kept on local disk, named by the MD5 of their content.
#[derive(Debug, Clone)]
pub struct DiskFileStore {
    dir: PathBuf,
}

impl DiskFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DiskFileStore { dir: dir.into() }
    }

    fn path_for(&self, file_ref: &str) -> AppResult<PathBuf> {
        let valid = !file_ref.is_empty()
            && file_ref
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
            && !file_ref.starts_with('.');
        if !valid {
            return Err(AppError::NotFound(format!("Template file '{}'", file_ref)));
        }
        Ok(self.dir.join(file_ref))
    }
}

impl FileStore for DiskFileStore {
    fn read(&self, file_ref: &str) -> AppResult<Vec<u8>> {
        let path = self.path_for(file_ref)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Template file '{}'", file_ref)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, bytes: &[u8], extension: &str) -> AppResult<String> {
        let file_ref = format!("{:x}.{}", md5::compute(bytes), extension);
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&file_ref)?;
        // identical content already stored under the same name
        if !path.exists() {
            fs::write(&path, bytes)?;
        }
        Ok(file_ref)
    }
}
