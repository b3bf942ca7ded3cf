/// The browser side of the engine: tabs, windows and groups
use async_trait::async_trait;
use thiserror::Error;

use crate::tab_data::{GroupId, GroupUpdate, Tab, TabGroup, TabId, TabQuery, WindowId, WindowSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The browser rejected or failed the call
    #[error("{operation} failed: {message}")]
    Call {
        operation: &'static str,
        message: String,
    },

    /// The browser answered with something we could not read
    #[error("unexpected {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("no tab with id {0}")]
    TabNotFound(TabId),
}

impl ProviderError {
    pub fn call(operation: &'static str, message: impl Into<String>) -> Self {
        ProviderError::Call {
            operation,
            message: message.into(),
        }
    }
}

/// Access to the host browser's tab, window and group APIs.
///
/// Every method is a round trip to the browser. Calls against different
/// windows may complete in any order.
#[async_trait(?Send)]
pub trait TabProvider {
    /// All windows, each with its tabs
    async fn windows(&self) -> Result<Vec<WindowSnapshot>, ProviderError>;

    async fn tabs(&self, query: TabQuery) -> Result<Vec<Tab>, ProviderError>;

    async fn tab(&self, tab_id: TabId) -> Result<Tab, ProviderError>;

    /// Active tab of the focused window, if there is one
    async fn active_tab(&self) -> Result<Option<Tab>, ProviderError>;

    async fn groups(&self, window_id: WindowId) -> Result<Vec<TabGroup>, ProviderError>;

    /// Put tabs into `group_id`, or into a fresh group when `None`.
    /// Returns the id of the group the tabs ended up in.
    async fn group_tabs(&self, tab_ids: &[TabId], group_id: Option<GroupId>) -> Result<GroupId, ProviderError>;

    async fn update_group(&self, group_id: GroupId, update: GroupUpdate) -> Result<(), ProviderError>;

    async fn ungroup(&self, tab_id: TabId) -> Result<(), ProviderError>;

    /// Move a tab to an absolute index in its window. Moving a grouped tab
    /// relocates its whole group, kept contiguous.
    async fn move_tab(&self, tab_id: TabId, index: i32) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ProviderError::call("tabs.group", "No tab with id: 4").to_string(),
            "tabs.group failed: No tab with id: 4"
        );
        assert_eq!(ProviderError::TabNotFound(9).to_string(), "no tab with id 9");
    }
}
