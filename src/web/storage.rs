use web_sys::Storage;

use crate::error::RankingError;
use crate::ranking::KeyValueStore;

/// `window.localStorage` slot store.
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn from_window() -> Result<Self, RankingError> {
        let window =
            web_sys::window().ok_or_else(|| RankingError::Storage("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| RankingError::Storage(format!("{e:?}")))?
            .ok_or_else(|| RankingError::Storage("localStorage disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, RankingError> {
        self.storage
            .get_item(key)
            .map_err(|e| RankingError::Storage(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RankingError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| RankingError::Storage(format!("{e:?}")))
    }
}
