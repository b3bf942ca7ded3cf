//! In-memory browser for exercising the service without a real one.
//!
//! Follows the Chromium rules the engine relies on: a group's tabs stay
//! contiguous, moving a grouped tab moves its whole group, and groups that
//! lose their last tab disappear. Every call is recorded.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::debounce::Timer;
use crate::provider::{ProviderError, TabProvider};
use crate::tab_data::{
    GroupId, GroupUpdate, Tab, TabGroup, TabGroupColor, TabId, TabQuery, WindowId, WindowSnapshot,
};

/// A recorded call to the mock provider.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Windows,
    Tabs(TabQuery),
    Tab(TabId),
    ActiveTab,
    Groups(WindowId),
    GroupTabs {
        tab_ids: Vec<TabId>,
        group_id: Option<GroupId>,
    },
    UpdateGroup {
        group_id: GroupId,
        update: GroupUpdate,
    },
    Ungroup(TabId),
    MoveTab {
        tab_id: TabId,
        index: i32,
    },
}

#[derive(Debug, Default)]
struct MockState {
    /// Tabs per window, in index order
    windows: Vec<(WindowId, Vec<Tab>)>,
    groups: Vec<TabGroup>,
    next_group_id: GroupId,
    active_tab: Option<TabId>,
    calls: Vec<MockCall>,
    failing_group_tabs: HashSet<TabId>,
    failing_ungroup_tabs: HashSet<TabId>,
    fail_group_updates: bool,
    fail_moves: bool,
}

/// Mock implementation of `TabProvider` for testing.
#[derive(Debug)]
pub struct MockTabProvider {
    state: Mutex<MockState>,
}

impl Default for MockTabProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTabProvider {
    pub fn new() -> Self {
        MockTabProvider {
            state: Mutex::new(MockState {
                next_group_id: 100,
                ..MockState::default()
            }),
        }
    }

    /// Add a window holding `urls` in order; `None` stands for a tab without URL.
    /// Tab ids are `window_id * 100 + position`.
    pub fn with_window(self, window_id: WindowId, urls: &[Option<&str>]) -> Self {
        let tabs = urls
            .iter()
            .enumerate()
            .map(|(position, url)| Tab::new(window_id * 100 + position as i32, window_id, *url, position as i32))
            .collect();
        self.state.lock().windows.push((window_id, tabs));
        self
    }

    /// Add an existing group holding the given tabs, which are pulled together
    /// at the position of the first one.
    pub fn with_group(self, window_id: WindowId, group_id: GroupId, title: &str, color: TabGroupColor, tab_ids: &[TabId]) -> Self {
        {
            let mut state = self.state.lock();
            state.groups.push(TabGroup {
                id: group_id,
                window_id,
                title: Some(title.to_string()),
                color,
                collapsed: false,
            });
            for tab in state.tabs_mut(window_id) {
                if tab_ids.contains(&tab.id) {
                    tab.group_id = Some(group_id);
                }
            }
            state.gather(window_id, group_id);
            state.next_group_id = state.next_group_id.max(group_id + 1);
        }
        self
    }

    pub fn with_active_tab(self, tab_id: TabId) -> Self {
        self.state.lock().active_tab = Some(tab_id);
        self
    }

    /// Make any `group_tabs` call that includes this tab fail
    pub fn fail_grouping_of(self, tab_id: TabId) -> Self {
        self.state.lock().failing_group_tabs.insert(tab_id);
        self
    }

    pub fn fail_ungrouping_of(self, tab_id: TabId) -> Self {
        self.state.lock().failing_ungroup_tabs.insert(tab_id);
        self
    }

    pub fn fail_group_updates(self) -> Self {
        self.state.lock().fail_group_updates = true;
        self
    }

    pub fn fail_moves(self) -> Self {
        self.state.lock().fail_moves = true;
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn move_calls(&self) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, MockCall::MoveTab { .. }))
            .collect()
    }

    pub fn tabs_in(&self, window_id: WindowId) -> Vec<Tab> {
        self.state.lock().window_tabs(window_id)
    }

    /// Group membership of each tab of the window, in index order
    pub fn layout(&self, window_id: WindowId) -> Vec<Option<GroupId>> {
        self.tabs_in(window_id).iter().map(|tab| tab.group_id).collect()
    }

    pub fn group(&self, group_id: GroupId) -> Option<TabGroup> {
        self.state.lock().groups.iter().find(|group| group.id == group_id).cloned()
    }

    pub fn groups_in(&self, window_id: WindowId) -> Vec<TabGroup> {
        self.state.lock().window_groups(window_id)
    }

    /// Ids of the tabs in a group, in index order
    pub fn members(&self, group_id: GroupId) -> Vec<TabId> {
        let state = self.state.lock();
        state
            .windows
            .iter()
            .flat_map(|(_, tabs)| tabs.iter())
            .filter(|tab| tab.group_id == Some(group_id))
            .map(|tab| tab.id)
            .collect()
    }

    fn record(&self, call: MockCall) {
        self.state.lock().calls.push(call);
    }
}

impl MockState {
    fn tabs_mut(&mut self, window_id: WindowId) -> &mut Vec<Tab> {
        if !self.windows.iter().any(|(id, _)| *id == window_id) {
            self.windows.push((window_id, Vec::new()));
        }
        let slot = self
            .windows
            .iter()
            .position(|(id, _)| *id == window_id)
            .unwrap_or(0);
        &mut self.windows[slot].1
    }

    fn window_tabs(&self, window_id: WindowId) -> Vec<Tab> {
        self.windows
            .iter()
            .find(|(id, _)| *id == window_id)
            .map(|(_, tabs)| tabs.clone())
            .unwrap_or_default()
    }

    fn window_groups(&self, window_id: WindowId) -> Vec<TabGroup> {
        self.groups
            .iter()
            .filter(|group| group.window_id == window_id)
            .cloned()
            .collect()
    }

    fn window_of(&self, tab_id: TabId) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|(_, tabs)| tabs.iter().any(|tab| tab.id == tab_id))
            .map(|(id, _)| *id)
    }

    fn find_tab(&self, tab_id: TabId) -> Option<Tab> {
        self.windows
            .iter()
            .flat_map(|(_, tabs)| tabs.iter())
            .find(|tab| tab.id == tab_id)
            .cloned()
    }

    /// Pull a group's tabs together at the position of its first tab
    fn gather(&mut self, window_id: WindowId, group_id: GroupId) {
        let tabs = self.tabs_mut(window_id);
        let Some(start) = tabs.iter().position(|tab| tab.group_id == Some(group_id)) else {
            return;
        };
        let (members, rest): (Vec<Tab>, Vec<Tab>) = tabs
            .drain(..)
            .partition(|tab| tab.group_id == Some(group_id));
        *tabs = rest;
        let tail = tabs.split_off(start.min(tabs.len()));
        tabs.extend(members);
        tabs.extend(tail);
        reindex(tabs);
    }

    fn prune_empty_groups(&mut self) {
        let used: HashSet<GroupId> = self
            .windows
            .iter()
            .flat_map(|(_, tabs)| tabs.iter())
            .filter_map(|tab| tab.group_id)
            .collect();
        self.groups.retain(|group| used.contains(&group.id));
    }
}

fn reindex(tabs: &mut [Tab]) {
    for (index, tab) in tabs.iter_mut().enumerate() {
        tab.index = index as i32;
    }
}

#[async_trait(?Send)]
impl TabProvider for MockTabProvider {
    async fn windows(&self) -> Result<Vec<WindowSnapshot>, ProviderError> {
        self.record(MockCall::Windows);
        let state = self.state.lock();
        Ok(state
            .windows
            .iter()
            .map(|(id, tabs)| WindowSnapshot {
                id: *id,
                tabs: tabs.clone(),
            })
            .collect())
    }

    async fn tabs(&self, query: TabQuery) -> Result<Vec<Tab>, ProviderError> {
        self.record(MockCall::Tabs(query));
        let state = self.state.lock();
        Ok(state
            .windows
            .iter()
            .flat_map(|(_, tabs)| tabs.iter())
            .filter(|tab| query.matches(tab))
            .cloned()
            .collect())
    }

    async fn tab(&self, tab_id: TabId) -> Result<Tab, ProviderError> {
        self.record(MockCall::Tab(tab_id));
        self.state
            .lock()
            .find_tab(tab_id)
            .ok_or(ProviderError::TabNotFound(tab_id))
    }

    async fn active_tab(&self) -> Result<Option<Tab>, ProviderError> {
        self.record(MockCall::ActiveTab);
        let state = self.state.lock();
        Ok(state.active_tab.and_then(|id| state.find_tab(id)))
    }

    async fn groups(&self, window_id: WindowId) -> Result<Vec<TabGroup>, ProviderError> {
        self.record(MockCall::Groups(window_id));
        Ok(self.state.lock().window_groups(window_id))
    }

    async fn group_tabs(&self, tab_ids: &[TabId], group_id: Option<GroupId>) -> Result<GroupId, ProviderError> {
        self.record(MockCall::GroupTabs {
            tab_ids: tab_ids.to_vec(),
            group_id,
        });
        let mut state = self.state.lock();

        if tab_ids.iter().any(|id| state.failing_group_tabs.contains(id)) {
            return Err(ProviderError::call("tabs.group", "grouping refused"));
        }
        let first = *tab_ids
            .first()
            .ok_or_else(|| ProviderError::call("tabs.group", "no tabs given"))?;
        let window_id = state.window_of(first).ok_or(ProviderError::TabNotFound(first))?;
        if let Some(missing) = tab_ids.iter().find(|id| state.window_of(**id) != Some(window_id)) {
            return Err(ProviderError::TabNotFound(*missing));
        }

        let target = match group_id {
            Some(id) => {
                if !state.groups.iter().any(|group| group.id == id && group.window_id == window_id) {
                    return Err(ProviderError::call("tabs.group", format!("No group with id: {}", id)));
                }
                id
            }
            None => {
                let id = state.next_group_id;
                state.next_group_id += 1;
                state.groups.push(TabGroup {
                    id,
                    window_id,
                    title: None,
                    color: TabGroupColor::Grey,
                    collapsed: false,
                });
                id
            }
        };

        for tab in state.tabs_mut(window_id) {
            if tab_ids.contains(&tab.id) {
                tab.group_id = Some(target);
            }
        }
        state.gather(window_id, target);
        state.prune_empty_groups();
        Ok(target)
    }

    async fn update_group(&self, group_id: GroupId, update: GroupUpdate) -> Result<(), ProviderError> {
        self.record(MockCall::UpdateGroup {
            group_id,
            update: update.clone(),
        });
        let mut state = self.state.lock();

        if state.fail_group_updates {
            return Err(ProviderError::call("tabGroups.update", "update refused"));
        }
        let group = state
            .groups
            .iter_mut()
            .find(|group| group.id == group_id)
            .ok_or_else(|| ProviderError::call("tabGroups.update", format!("No group with id: {}", group_id)))?;

        if let Some(title) = update.title {
            group.title = Some(title);
        }
        if let Some(color) = update.color {
            group.color = color;
        }
        if let Some(collapsed) = update.collapsed {
            group.collapsed = collapsed;
        }
        Ok(())
    }

    async fn ungroup(&self, tab_id: TabId) -> Result<(), ProviderError> {
        self.record(MockCall::Ungroup(tab_id));
        let mut state = self.state.lock();

        if state.failing_ungroup_tabs.contains(&tab_id) {
            return Err(ProviderError::call("tabs.ungroup", "ungroup refused"));
        }
        let window_id = state.window_of(tab_id).ok_or(ProviderError::TabNotFound(tab_id))?;
        let tabs = state.tabs_mut(window_id);
        let Some(position) = tabs.iter().position(|tab| tab.id == tab_id) else {
            return Err(ProviderError::TabNotFound(tab_id));
        };
        let Some(former) = tabs[position].group_id.take() else {
            return Ok(());
        };

        // The detached tab leaves the group's run of tabs
        if let Some(last) = tabs.iter().rposition(|tab| tab.group_id == Some(former)) {
            if last > position {
                let tab = tabs.remove(position);
                tabs.insert(last, tab);
            }
        }
        reindex(tabs);
        state.prune_empty_groups();
        Ok(())
    }

    async fn move_tab(&self, tab_id: TabId, index: i32) -> Result<(), ProviderError> {
        self.record(MockCall::MoveTab { tab_id, index });
        let mut state = self.state.lock();

        if state.fail_moves {
            return Err(ProviderError::call("tabs.move", "move refused"));
        }
        let window_id = state.window_of(tab_id).ok_or(ProviderError::TabNotFound(tab_id))?;
        let tabs = state.tabs_mut(window_id);
        let group = tabs
            .iter()
            .find(|tab| tab.id == tab_id)
            .and_then(|tab| tab.group_id);

        let (moving, mut rest): (Vec<Tab>, Vec<Tab>) = tabs.drain(..).partition(|tab| match group {
            Some(group_id) => tab.group_id == Some(group_id),
            None => tab.id == tab_id,
        });
        let insert_at = if index < 0 {
            rest.len()
        } else {
            (index as usize).min(rest.len())
        };
        let tail = rest.split_off(insert_at);
        rest.extend(moving);
        rest.extend(tail);
        *tabs = rest;
        reindex(tabs);
        Ok(())
    }
}

/// Timer that returns at once
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

#[async_trait(?Send)]
impl Timer for NoDelay {
    async fn sleep(&self, _millis: u32) {}
}
