//! JSON configuration file adapter.
//!
//! Implements [`ConfigPort`] on top of a single JSON document.
//!
//! - A missing file loads as [`FermenterConfig::default()`].
//! - Every load and save is validated; bad values are rejected, not clamped.
//! - Saves are atomic: the document is written beside the target and renamed
//!   over it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::FermenterConfig;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<FermenterConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("CONFIG | {} not found, using defaults", self.path.display());
                return Ok(FermenterConfig::default());
            }
            Err(e) => {
                warn!("CONFIG | cannot read {}: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };

        let cfg: FermenterConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("CONFIG | {} is not valid: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        cfg.validate()?;
        info!("CONFIG | loaded {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &FermenterConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::Corrupted)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text).map_err(|_| ConfigError::IoError)?;
        fs::rename(&tmp, &self.path).map_err(|_| ConfigError::IoError)?;
        info!("CONFIG | saved {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
