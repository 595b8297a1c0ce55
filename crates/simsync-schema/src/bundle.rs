use crate::arch::Arch;
use crate::types::BundleId;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const APP_EXTENSION: &str = "app";
pub const INFO_PLIST: &str = "Info.plist";

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("could not find Info.plist in '{0}'")]
    MissingInfoPlist(String),
    #[error("could not parse '{path}': {reason}")]
    Plist { path: String, reason: String },
    #[error("'{path}' is not a dictionary")]
    NotADictionary { path: String },
    #[error("expected key '{key}' in '{path}'")]
    MissingKey { key: &'static str, path: String },
    #[error("bundle executable '{0}' does not exist")]
    MissingExecutable(String),
    #[error("could not read bundle executable '{path}': {source}")]
    UnreadableExecutable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Identity fields read from a bundle's `Info.plist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleInfo {
    pub bundle_id: BundleId,
    pub executable_name: String,
}

impl BundleInfo {
    /// Read `CFBundleIdentifier` and `CFBundleExecutable` from `<bundle>/Info.plist`.
    /// Both XML and binary property lists are accepted.
    pub fn read(bundle: &Path) -> Result<Self, BundleError> {
        let plist_path = bundle.join(INFO_PLIST);
        let display = plist_path.display().to_string();
        if !plist_path.is_file() {
            return Err(BundleError::MissingInfoPlist(bundle.display().to_string()));
        }

        let value = plist::Value::from_file(&plist_path).map_err(|e| BundleError::Plist {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        let dict = value
            .as_dictionary()
            .ok_or_else(|| BundleError::NotADictionary {
                path: display.clone(),
            })?;

        let string_key = |key: &'static str| {
            dict.get(key)
                .and_then(plist::Value::as_string)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_owned)
                .ok_or_else(|| BundleError::MissingKey {
                    key,
                    path: display.clone(),
                })
        };

        Ok(Self {
            bundle_id: BundleId::new(string_key("CFBundleIdentifier")?),
            executable_name: string_key("CFBundleExecutable")?,
        })
    }
}

/// A validated application bundle. Only produced by [`crate::validate_app`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct App {
    path: PathBuf,
    bundle_id: BundleId,
    executable_name: String,
    arches: Vec<Arch>,
}

impl App {
    pub(crate) fn new(path: PathBuf, info: BundleInfo, arches: Vec<Arch>) -> Self {
        Self {
            path,
            bundle_id: info.bundle_id,
            executable_name: info.executable_name,
            arches,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bundle_identifier(&self) -> &BundleId {
        &self.bundle_id
    }

    pub fn executable_name(&self) -> &str {
        &self.executable_name
    }

    pub fn executable_path(&self) -> PathBuf {
        self.path.join(&self.executable_name)
    }

    pub fn arches(&self) -> &[Arch] {
        &self.arches
    }
}
