//! Key/value persistence backends.
//!
//! Every persisted record (player stats, both leaderboards) is a JSON blob
//! under a fixed string key. [`BrowserStorage`] writes to `window.localStorage`;
//! [`MemoryStorage`] keeps the same contract in process memory for native
//! builds and tests. Clones of a `MemoryStorage` share one map, mirroring how
//! every page script sees the same `localStorage`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StoreError, StoreResult};

/// String key/value store. Access is single-threaded and synchronous.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// Decode the record under `key`, falling back to `default` when it is absent
/// or cannot be parsed.
pub(crate) fn load_json<S, T>(store: &S, key: &str, default: impl FnOnce() -> T) -> T
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default(),
        Err(err) => {
            log::error!("reading `{key}` failed: {err}");
            return default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("discarding malformed record `{key}`: {err}");
            default()
        }
    }
}

/// Encode `value` and write it under `key`.
pub(crate) fn save_json<S, T>(store: &S, key: &str, value: &T) -> StoreResult<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &encoded)
}

// --- In-memory backend ------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// --- Browser backend --------------------------------------------------------

/// `window.localStorage` handle. Cloning is cheap (JS reference).
#[derive(Clone, Debug)]
pub struct BrowserStorage {
    inner: web_sys::Storage,
}

impl BrowserStorage {
    /// Open the page's local storage. Fails when the browser blocks it
    /// (private mode on some engines, sandboxed iframes).
    pub fn local() -> StoreResult<Self> {
        let inner = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StoreError::Unavailable)?;
        Ok(Self { inner })
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get_item(key).map_err(|e| StoreError::Backend {
            key: key.to_string(),
            message: format!("{e:?}"),
        })
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set_item(key, value).map_err(|e| StoreError::Backend {
            key: key.to_string(),
            message: format!("{e:?}"),
        })
    }
}
