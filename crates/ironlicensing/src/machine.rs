//! Machine identification for activations.
//!
//! The machine identifier is a random UUID created on first use and
//! persisted per user, so every activation from this installation reports
//! the same id. Persistence failures never surface to callers: an
//! unreadable or unwritable store yields a fresh identifier instead.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MACHINE_ID_DIR: &str = ".ironlicensing";
const MACHINE_ID_FILE: &str = "machine_id";

/// File-backed store for the machine identifier.
#[derive(Debug, Clone)]
pub struct MachineIdStore {
    path: Option<PathBuf>,
}

impl MachineIdStore {
    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store at `~/.ironlicensing/machine_id`. Without a home directory the
    /// store is ephemeral.
    pub fn user_default() -> Self {
        Self {
            path: default_path(),
        }
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the persisted identifier, creating and persisting one if absent.
    pub fn load_or_create(&self) -> String {
        let Some(path) = self.path.as_deref() else {
            warn!("No home directory; using an ephemeral machine id");
            return generate();
        };

        match read(path) {
            Ok(Some(id)) => {
                debug!(path = %path.display(), "Loaded machine id");
                id
            }
            Ok(None) => {
                let id = generate();
                if let Err(e) = write(path, &id) {
                    warn!(path = %path.display(), error = %e, "Failed to persist machine id");
                }
                id
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read machine id");
                generate()
            }
        }
    }
}

/// `Ok(None)` when the file is missing or blank.
fn read(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let id = contents.trim();
            Ok((!id.is_empty()).then(|| id.to_string()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn write(path: &Path, id: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, id)
}

fn generate() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(MACHINE_ID_DIR)
            .join(MACHINE_ID_FILE)
    })
}

/// Hostname of this machine, or `unknown`.
pub fn hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Platform name reported on activation: `windows`, `macos`, `linux`, or the
/// raw OS name elsewhere.
pub fn platform() -> &'static str {
    std::env::consts::OS
}
