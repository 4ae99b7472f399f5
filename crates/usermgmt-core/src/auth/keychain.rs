use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;

use super::store::{lock, Storage};

const SERVICE_NAME: &str = "usermgmt";

/// Store that keeps each session entry in the OS keychain.
///
/// Each key becomes one keychain item under the `usermgmt` service. Entries
/// are created once per key and reused, so a credential written through this
/// store is read back through the same handle.
#[derive(Debug)]
pub struct KeychainStore {
    service: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl KeychainStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a different keychain service name, e.g. one per server.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn with_entry<T>(&self, key: &str, f: impl FnOnce(&Entry) -> Result<T>) -> Result<T> {
        let mut entries = lock(&self.entries);
        if !entries.contains_key(key) {
            let entry = Entry::new(&self.service, key).context("Failed to create keyring entry")?;
            entries.insert(key.to_string(), entry);
        }
        let entry = entries
            .get(key)
            .context("Keyring entry missing after insert")?;
        f(entry)
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for KeychainStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve entry from keychain"),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_entry(key, |entry| {
            entry
                .set_password(value)
                .context("Failed to store entry in keychain")
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete entry from keychain"),
        })
    }
}
