//! Library configuration (which backend project to talk to)

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

/// Where `Settings::from_default_file` looks for the settings file
pub static DEFAULT_SETTINGS_FILE: Lazy<PathBuf> = Lazy::new(|| {
    // the shell's `~` is not expanded by std::fs, so build the path from $HOME
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".config/study-satchel/settings.json")
});

/// The coordinates of the hosted backend project.
///
/// The API key here is the public ("anon") key; it identifies the project, not a
/// user. User identity comes from the access token attached after sign-in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    base_url: Url,
    api_key: String,
}

impl Settings {
    pub fn new(base_url: Url, api_key: String) -> Self {
        Self { base_url, api_key }
    }

    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(file)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }

    /// Read settings from [`DEFAULT_SETTINGS_FILE`]
    pub fn from_default_file() -> Result<Self, std::io::Error> {
        Self::from_file(&DEFAULT_SETTINGS_FILE)
    }

    /// Store these settings to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}
