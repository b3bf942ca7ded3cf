/// Persisted settings for chrome.storage.sync
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::provider::ProviderError;

pub const AUTO_GROUP_KEY: &str = "autoGroupEnabled";
pub const AUTO_ALPHABETIZE_KEY: &str = "autoAlphabetizeEnabled";

/// Engine configuration; missing keys read as `false`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub auto_group_enabled: bool,
    pub auto_alphabetize_enabled: bool,
}

impl Settings {
    pub fn new(auto_group_enabled: bool, auto_alphabetize_enabled: bool) -> Self {
        Settings {
            auto_group_enabled,
            auto_alphabetize_enabled,
        }
    }
}

/// Key-value store that survives browser restarts
#[async_trait(?Send)]
pub trait SettingsStore {
    async fn load(&self) -> Result<Settings, ProviderError>;

    async fn set_flag(&self, key: &'static str, enabled: bool) -> Result<(), ProviderError>;
}

/// In-process store, used in tests and when no browser storage is around
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
    fail_loads: bool,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        MemorySettingsStore {
            settings: Mutex::new(settings),
            fail_loads: false,
        }
    }

    /// A store whose reads always fail
    pub fn unreadable() -> Self {
        MemorySettingsStore {
            settings: Mutex::new(Settings::default()),
            fail_loads: true,
        }
    }

    pub fn snapshot(&self) -> Settings {
        *self.settings.lock()
    }
}

#[async_trait(?Send)]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings, ProviderError> {
        if self.fail_loads {
            return Err(ProviderError::call("storage.sync.get", "storage unavailable"));
        }
        Ok(self.snapshot())
    }

    async fn set_flag(&self, key: &'static str, enabled: bool) -> Result<(), ProviderError> {
        let mut settings = self.settings.lock();
        match key {
            AUTO_GROUP_KEY => settings.auto_group_enabled = enabled,
            AUTO_ALPHABETIZE_KEY => settings.auto_alphabetize_enabled = enabled,
            other => {
                return Err(ProviderError::call(
                    "storage.sync.set",
                    format!("unknown setting {}", other),
                ));
            }
        }
        Ok(())
    }
}
