//! A small local key-value store
//!
//! The app uses this for one thing only: carrying the freshly registered e-mail
//! and password from the sign-up screen to the sign-in screen, so the latter can
//! pre-fill its fields. The store is a flat string map mirrored to a JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key under which the sign-up screen parks the registered e-mail
pub const SIGNUP_EMAIL_KEY: &str = "signup.email";
/// Key under which the sign-up screen parks the registered password
pub const SIGNUP_PASSWORD_KEY: &str = "signup.password";

/// A string key-value store, optionally mirrored to a local JSON file
pub struct KvStore {
    values: Mutex<HashMap<String, String>>,
    backing_file: Option<PathBuf>,
}

impl KvStore {
    /// Create an empty store with no backing file
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            backing_file: None,
        }
    }

    /// Initialize a store from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let file = std::fs::File::open(path)?;
        let values: HashMap<String, String> = serde_json::from_reader(file)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;

        Ok(Self {
            values: Mutex::new(values),
            backing_file: Some(PathBuf::from(path)),
        })
    }

    /// Like [`Self::from_file`], but an absent or unreadable file yields an
    /// empty store that will write to `path` from now on
    pub fn open_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(store) => store,
            Err(err) => {
                log::warn!("Unable to open kv file {:?} ({}), starting empty", path, err);
                let mut store = Self::new();
                store.backing_file = Some(PathBuf::from(path));
                store
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.save_to_file();
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let removed = self.values.lock().unwrap().remove(key);
        self.save_to_file();
        removed
    }

    /// Park credentials for the sign-in screen to pre-fill
    pub fn stash_signup_credentials(&self, email: &str, password: &str) {
        self.set(SIGNUP_EMAIL_KEY, email);
        self.set(SIGNUP_PASSWORD_KEY, password);
    }

    /// Take (and clear) the parked credentials, if a sign-up just happened
    pub fn take_signup_credentials(&self) -> Option<(String, String)> {
        let email = self.remove(SIGNUP_EMAIL_KEY)?;
        let password = self.remove(SIGNUP_PASSWORD_KEY)?;
        Some((email, password))
    }

    /// Store the current values to the backing file, if one is set
    fn save_to_file(&self) {
        let path = match &self.backing_file {
            None => return,
            Some(p) => p,
        };

        let file = match std::fs::File::create(path) {
            Err(err) => {
                log::warn!("Unable to save file {:?}: {}", path, err);
                return;
            }
            Ok(f) => f,
        };

        let values = self.values.lock().unwrap();
        if let Err(err) = serde_json::to_writer(file, &*values) {
            log::warn!("Unable to serialize: {}", err);
        }
    }
}

impl Default for KvStore {
    fn default() -> Self {
        Self::new()
    }
}
