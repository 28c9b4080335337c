use crate::error::AppError;
use crate::storage::KeyValueStore;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::debug;

const STORE_DIR_ENV_VAR: &str = "TASKLOG_STORE_DIR";
const APP_DIR_NAME: &str = "tasklog";

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

pub fn store_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_dir()?))
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key);
        std::fs::create_dir_all(&self.dir)
            .map_err(|err| AppError::persistence(format!("{}: {}", self.dir.display(), err)))?;

        let mut temp = NamedTempFile::new_in(&self.dir)
            .map_err(|err| AppError::persistence(err.to_string()))?;
        temp.write_all(value.as_bytes())
            .map_err(|err| AppError::persistence(err.to_string()))?;
        temp.flush()
            .map_err(|err| AppError::persistence(err.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(temp.path(), permissions)
                .map_err(|err| AppError::persistence(err.to_string()))?;
        }

        temp.persist(&path).map_err(|err| {
            AppError::persistence(format!("failed to persist {}: {}", path.display(), err))
        })?;
        debug!(path = %path.display(), bytes = value.len(), "wrote store blob");

        Ok(())
    }
}
