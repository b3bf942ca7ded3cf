/// Chrome extension bindings: the real provider, settings store and timer,
/// plus the `TabGrouper` object the background script drives.
use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Object, Promise, Reflect};
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::command::{Command, CommandResponse};
use crate::debounce::Timer;
use crate::provider::{ProviderError, TabProvider};
use crate::service::TabOrganizerService;
use crate::storage::{AUTO_ALPHABETIZE_KEY, AUTO_GROUP_KEY, Settings, SettingsStore};
use crate::tab_data::{GroupId, GroupUpdate, Tab, TabGroup, TabId, TabQuery, WindowId, WindowSnapshot};

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getAllWindows() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryTabs(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getTab(tab_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getActiveTab() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryGroups(window_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn groupTabs(tab_ids: JsValue, group_id: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateGroup(group_id: i32, properties: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn ungroupTab(tab_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn moveTab(tab_id: i32, index: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(items: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sleep(millis: u32) -> Result<(), JsValue>;
}

fn call_error(operation: &'static str, error: JsValue) -> ProviderError {
    ProviderError::call(operation, format!("{:?}", error))
}

fn decode<T: DeserializeOwned>(operation: &'static str, value: JsValue) -> Result<T, ProviderError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| ProviderError::Decode {
        operation,
        message: e.to_string(),
    })
}

fn encode<T: Serialize>(operation: &'static str, value: &T) -> Result<JsValue, ProviderError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| ProviderError::Decode {
        operation,
        message: e.to_string(),
    })
}

/// `chrome.tabs`, `chrome.tabGroups` and `chrome.windows`
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeTabProvider;

#[async_trait(?Send)]
impl TabProvider for ChromeTabProvider {
    async fn windows(&self) -> Result<Vec<WindowSnapshot>, ProviderError> {
        let windows = getAllWindows()
            .await
            .map_err(|e| call_error("windows.getAll", e))?;
        decode("windows.getAll", windows)
    }

    async fn tabs(&self, query: TabQuery) -> Result<Vec<Tab>, ProviderError> {
        let query = encode("tabs.query", &query)?;
        let tabs = queryTabs(query)
            .await
            .map_err(|e| call_error("tabs.query", e))?;
        decode("tabs.query", tabs)
    }

    async fn tab(&self, tab_id: TabId) -> Result<Tab, ProviderError> {
        let tab = getTab(tab_id).await.map_err(|e| call_error("tabs.get", e))?;
        if tab.is_null() || tab.is_undefined() {
            return Err(ProviderError::TabNotFound(tab_id));
        }
        decode("tabs.get", tab)
    }

    async fn active_tab(&self) -> Result<Option<Tab>, ProviderError> {
        let tab = getActiveTab()
            .await
            .map_err(|e| call_error("tabs.query", e))?;
        decode("tabs.query", tab)
    }

    async fn groups(&self, window_id: WindowId) -> Result<Vec<TabGroup>, ProviderError> {
        let groups = queryGroups(window_id)
            .await
            .map_err(|e| call_error("tabGroups.query", e))?;
        decode("tabGroups.query", groups)
    }

    async fn group_tabs(&self, tab_ids: &[TabId], group_id: Option<GroupId>) -> Result<GroupId, ProviderError> {
        let tab_ids = encode("tabs.group", &tab_ids)?;
        let group_id = group_id.map_or(JsValue::UNDEFINED, JsValue::from);
        let result = groupTabs(tab_ids, group_id)
            .await
            .map_err(|e| call_error("tabs.group", e))?;
        decode("tabs.group", result)
    }

    async fn update_group(&self, group_id: GroupId, update: GroupUpdate) -> Result<(), ProviderError> {
        let properties = encode("tabGroups.update", &update)?;
        updateGroup(group_id, properties)
            .await
            .map_err(|e| call_error("tabGroups.update", e))
    }

    async fn ungroup(&self, tab_id: TabId) -> Result<(), ProviderError> {
        ungroupTab(tab_id)
            .await
            .map_err(|e| call_error("tabs.ungroup", e))
    }

    async fn move_tab(&self, tab_id: TabId, index: i32) -> Result<(), ProviderError> {
        moveTab(tab_id, index)
            .await
            .map_err(|e| call_error("tabs.move", e))
    }
}

/// `chrome.storage.sync`
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeSettingsStore;

#[async_trait(?Send)]
impl SettingsStore for ChromeSettingsStore {
    async fn load(&self) -> Result<Settings, ProviderError> {
        let keys = encode("storage.sync.get", &[AUTO_GROUP_KEY, AUTO_ALPHABETIZE_KEY])?;
        let stored = getStorage(keys)
            .await
            .map_err(|e| call_error("storage.sync.get", e))?;
        if stored.is_null() || stored.is_undefined() {
            return Ok(Settings::default());
        }
        decode("storage.sync.get", stored)
    }

    async fn set_flag(&self, key: &'static str, enabled: bool) -> Result<(), ProviderError> {
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(key), &JsValue::from_bool(enabled))
            .map_err(|e| call_error("storage.sync.set", e))?;
        setStorage(items.into())
            .await
            .map_err(|e| call_error("storage.sync.set", e))
    }
}

/// `setTimeout`
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeTimer;

#[async_trait(?Send)]
impl Timer for ChromeTimer {
    async fn sleep(&self, millis: u32) {
        if let Err(e) = sleep(millis).await {
            warn!("Timer failed: {:?}", e);
        }
    }
}

type ChromeService = TabOrganizerService<ChromeTabProvider, ChromeSettingsStore, ChromeTimer>;

/// Entry point for the background service worker.
///
/// ```js
/// const grouper = new TabGrouper();
/// await grouper.init();
/// chrome.runtime.onMessage.addListener((request, sender, sendResponse) => {
///   grouper.handleMessage(request).then(sendResponse);
///   return true;
/// });
/// chrome.tabs.onCreated.addListener((tab) => grouper.onTabEvent(tab.id));
/// ```
#[wasm_bindgen]
pub struct TabGrouper {
    service: Rc<ChromeService>,
}

impl Default for TabGrouper {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl TabGrouper {
    #[wasm_bindgen(constructor)]
    pub fn new() -> TabGrouper {
        TabGrouper {
            service: Rc::new(TabOrganizerService::new(
                ChromeTabProvider,
                ChromeSettingsStore,
                ChromeTimer,
            )),
        }
    }

    /// Load persisted settings; resolves to them
    pub fn init(&self) -> Promise {
        let service = Rc::clone(&self.service);
        future_to_promise(async move {
            let settings = service.load_settings().await;
            serde_wasm_bindgen::to_value(&settings).map_err(JsValue::from)
        })
    }

    /// Run a `{ action: ... }` message; resolves to `{ success }`
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue) -> Promise {
        let service = Rc::clone(&self.service);
        future_to_promise(async move {
            let response = match serde_wasm_bindgen::from_value::<Command>(message) {
                Ok(command) => service.handle_command(command).await,
                Err(e) => {
                    warn!("Ignoring message: {}", e);
                    CommandResponse { success: false }
                }
            };
            serde_wasm_bindgen::to_value(&response).map_err(JsValue::from)
        })
    }

    /// Tab created or navigated; groups it if auto-grouping is on
    #[wasm_bindgen(js_name = onTabEvent)]
    pub fn on_tab_event(&self, tab_id: i32) -> Promise {
        let service = Rc::clone(&self.service);
        future_to_promise(async move {
            if let Err(e) = service.handle_tab_event(tab_id).await {
                log::error!("Error auto-grouping tab {}: {}", tab_id, e);
            }
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Tab, domain and group counts for the current window
    pub fn stats(&self) -> Promise {
        let service = Rc::clone(&self.service);
        future_to_promise(async move {
            let stats = service
                .window_stats()
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            serde_wasm_bindgen::to_value(&stats).map_err(JsValue::from)
        })
    }
}
