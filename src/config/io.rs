use std::env::current_exe;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use directories_next::ProjectDirs;
use fd_lock::{RwLock, RwLockWriteGuard};
use log::{debug, info, warn};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::config::types::Config;
use crate::error::ConfigError;

const CONFIG_FILE_NAME: &str = "lightpanel.json";

// <exe dir>/<exe name>.json, only used if it already exists so a panel can be shipped with its config
fn portable_config_path() -> Option<PathBuf> {
    let mut path = current_exe()
        .map_err(|err| warn!("Can not determine the executable path: {}", err))
        .ok()?;

    if !path.set_extension("json") {
        warn!("Executable path has no file name: {}", path.display());
        return None;
    }

    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Some(path),
        Ok(_) => None,
        Err(err) => {
            debug!("No portable config at {} ({})", path.display(), err);
            None
        },
    }
}

// ~/.config/lightpanel/lightpanel.json on linux, the platform equivalent elsewhere
fn user_config_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("org", "lightpanel", "lightpanel")?;
    Some(dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn resolve_config_path(explicit_path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    explicit_path
        .or_else(portable_config_path)
        .or_else(user_config_path)
        .ok_or(ConfigError::NoConfigPath)
}

fn create_parent_dir(path: &Path) -> Result<(), ConfigError> {
    match path.parent() {
        Some(directory) if !directory.as_os_str().is_empty() => {
            std::fs::create_dir_all(directory)?;
            Ok(())
        },
        _ => Ok(()),
    }
}

pub struct ConfigIOLocker {
    rw_lock: RwLock<std::fs::File>,
}

impl ConfigIOLocker {
    /// Held for the lifetime of the panel so that a config drives one panel at a time.
    pub fn lock(&mut self) -> Result<RwLockWriteGuard<'_, std::fs::File>, ConfigError> {
        self.rw_lock.try_write().map_err(|source| ConfigError::CanNotLock { source })
    }
}

/// The config file of this panel, opened once and kept open.
pub struct ConfigIO {
    path: PathBuf,
    file: std::fs::File,
}

impl ConfigIO {
    pub fn new_sync(explicit_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = resolve_config_path(explicit_path)?;
        info!("Using config file {}", path.display());
        create_parent_dir(&path)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        Ok(ConfigIO { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn locker(&self) -> Result<ConfigIOLocker, ConfigError> {
        Ok(ConfigIOLocker { rw_lock: RwLock::new(self.file.try_clone()?) })
    }

    // a duplicate handle, the original stays open for the lock
    fn async_handle(&self) -> Result<File, ConfigError> {
        Ok(File::from_std(self.file.try_clone()?))
    }

    /// Reads the config; `None` if the file is still empty.
    pub async fn read(&self) -> Result<Option<Config>, ConfigError> {
        debug!("Reading config file");
        let mut file = self.async_handle()?;
        file.rewind().await?;

        let mut content = Vec::new();
        file.read_to_end(&mut content).await?;

        let text = std::str::from_utf8(&content)?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(text)?))
    }

    /// Reads the config, writing the defaults first if the file is new.
    pub async fn read_or_init(&self) -> Result<Config, ConfigError> {
        if let Some(config) = self.read().await? {
            return Ok(config);
        }

        info!("Config file is empty, writing defaults");
        let config = Config::default();
        self.save(&config).await?;
        Ok(config)
    }

    pub async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        info!("Saving config");
        let content = serde_json::to_vec_pretty(config)?;

        let mut file = self.async_handle()?;
        file.set_len(0).await?;
        file.rewind().await?;
        file.write_all(&content).await?;
        file.flush().await?;
        Ok(())
    }
}
