//! Target temperature file.
//!
//! The operator's target lives in a one-line text file holding either a
//! temperature in °F or `off`.  The control loop polls it every tick; the
//! `set-target` command replaces it atomically (temp file + rename) so a
//! poll never sees a half-written value.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::TargetPort;
use crate::error::TargetError;
use crate::target::Target;

pub struct TargetFile {
    path: PathBuf,
}

impl TargetFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Target, TargetError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(TargetError::Missing),
            Err(e) => return Err(TargetError::Io(e.kind())),
        };
        text.lines().next().ok_or(TargetError::Malformed)?.parse()
    }

    /// Replace the target.  Values outside [45, 80] never reach the file.
    pub fn write(&self, target: Target) -> Result<(), TargetError> {
        if let Target::Value(v) = target {
            Target::value(v)?;
        }
        let body = match target {
            Target::Value(v) => format!("{v}\n"),
            Target::Off => "off\n".to_string(),
        };

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, body).map_err(|e| TargetError::Io(e.kind()))?;
        fs::rename(&tmp, &self.path).map_err(|e| TargetError::Io(e.kind()))?;
        info!("Temperature successfully set to {}", target);
        Ok(())
    }
}

impl TargetPort for TargetFile {
    fn poll(&mut self) -> Result<Target, TargetError> {
        self.read()
    }
}
