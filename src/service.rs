/// Runs the planners against the browser
use futures_util::future::join_all;
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::color::ColorAssigner;
use crate::debounce::{Debouncer, Timer};
use crate::domain::{WindowStats, window_stats};
use crate::organizer::{GroupPlan, Scope, plan_duplicate_merges, plan_groups};
use crate::provider::{ProviderError, TabProvider};
use crate::sorter::{is_sorted_layout, plan_sort};
use crate::storage::{AUTO_ALPHABETIZE_KEY, AUTO_GROUP_KEY, Settings, SettingsStore};
use crate::tab_data::{GroupUpdate, Tab, TabGroupColor, TabId, TabQuery, WindowId, WindowSnapshot};
use crate::ungroup::plan_ungroup;

/// Delays around automatic grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Wait after a tab event so the tab's URL settles
    pub auto_group_delay_ms: u32,
    /// Wait after automatic grouping before sorting groups
    pub auto_alphabetize_delay_ms: u32,
    /// Wait after grouping every window before sorting groups
    pub group_all_alphabetize_delay_ms: u32,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        ServiceOptions {
            auto_group_delay_ms: 500,
            auto_alphabetize_delay_ms: 100,
            group_all_alphabetize_delay_ms: 200,
        }
    }
}

/// The one component that talks to the browser.
///
/// Owns the domain colors for its whole lifetime; build one per process.
pub struct TabOrganizerService<P, S, T> {
    provider: P,
    store: S,
    timer: T,
    options: ServiceOptions,
    colors: Mutex<ColorAssigner>,
    settings: Mutex<Settings>,
    debouncer: Mutex<Debouncer<TabId>>,
}

impl<P, S, T> TabOrganizerService<P, S, T>
where
    P: TabProvider,
    S: SettingsStore,
    T: Timer,
{
    pub fn new(provider: P, store: S, timer: T) -> Self {
        Self::with_options(provider, store, timer, ServiceOptions::default())
    }

    pub fn with_options(provider: P, store: S, timer: T, options: ServiceOptions) -> Self {
        TabOrganizerService {
            provider,
            store,
            timer,
            options,
            colors: Mutex::new(ColorAssigner::new()),
            settings: Mutex::new(Settings::default()),
            debouncer: Mutex::new(Debouncer::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> Settings {
        *self.settings.lock()
    }

    /// Read persisted settings; an unreadable store means both flags off
    pub async fn load_settings(&self) -> Settings {
        let settings = match self.store.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Error loading settings: {}", e);
                Settings::default()
            }
        };
        *self.settings.lock() = settings;
        settings
    }

    pub async fn set_auto_group(&self, enabled: bool) -> Result<(), ProviderError> {
        self.settings.lock().auto_group_enabled = enabled;
        self.store.set_flag(AUTO_GROUP_KEY, enabled).await
    }

    pub async fn set_auto_alphabetize(&self, enabled: bool) -> Result<(), ProviderError> {
        self.settings.lock().auto_alphabetize_enabled = enabled;
        self.store.set_flag(AUTO_ALPHABETIZE_KEY, enabled).await
    }

    pub fn color_for(&self, domain: &str) -> TabGroupColor {
        self.colors.lock().color_for(domain)
    }

    pub fn reset_colors(&self) {
        self.colors.lock().reset();
    }

    /// Group every window's tabs by domain
    pub async fn group_all_tabs(&self) -> Result<(), ProviderError> {
        let windows = self.provider.windows().await?;
        let tabs: Vec<Tab> = windows.into_iter().flat_map(|window| window.tabs).collect();

        let plans = self.plan(&tabs, &Scope::All);
        let created = self.apply_plans(plans).await;
        info!("Grouped all tabs, {} new groups", created);

        if self.settings().auto_alphabetize_enabled {
            self.timer.sleep(self.options.group_all_alphabetize_delay_ms).await;
            self.alphabetize_groups().await?;
        }
        Ok(())
    }

    /// Detach every grouped tab of every window
    pub async fn ungroup_all_tabs(&self) -> Result<(), ProviderError> {
        let windows = self.provider.windows().await?;
        let tabs: Vec<Tab> = windows.into_iter().flat_map(|window| window.tabs).collect();

        let tab_ids = plan_ungroup(&tabs, &Scope::All);
        let results = join_all(tab_ids.iter().map(|tab_id| self.provider.ungroup(*tab_id))).await;

        let mut first_error = None;
        for (tab_id, result) in tab_ids.iter().zip(results) {
            if let Err(e) = result {
                error!("Error ungrouping tab {}: {}", tab_id, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Group the tabs sharing the active tab's domain in its window
    pub async fn group_current_domain(&self) -> Result<(), ProviderError> {
        match self.provider.active_tab().await? {
            Some(tab) => self.group_domain_of(&tab).await.map(|_| ()),
            None => {
                debug!("No active tab to group by");
                Ok(())
            }
        }
    }

    /// Detach the grouped tabs sharing the active tab's domain in its window
    pub async fn ungroup_current_domain(&self) -> Result<(), ProviderError> {
        let Some(tab) = self.provider.active_tab().await? else {
            debug!("No active tab to ungroup by");
            return Ok(());
        };
        let Some(scope) = Scope::for_tab(&tab) else {
            return Ok(());
        };

        let tabs = self.provider.tabs(TabQuery::window(tab.window_id)).await?;
        for tab_id in plan_ungroup(&tabs, &scope) {
            self.provider.ungroup(tab_id).await?;
        }
        Ok(())
    }

    /// Sort the groups of every window by title
    pub async fn alphabetize_groups(&self) -> Result<(), ProviderError> {
        let windows = self.provider.windows().await?;
        let results = join_all(windows.iter().map(|window| self.alphabetize_window(window))).await;

        let mut first_error = None;
        for (window, result) in windows.iter().zip(results) {
            match result {
                Ok(moves) => debug!("Window {}: {} group moves", window.id, moves),
                Err(e) => {
                    error!("Error alphabetizing tab groups in window {}: {}", window.id, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// React to a created tab or a tab whose URL changed.
    ///
    /// Bursts of events for one tab collapse into a single grouping pass once
    /// the delay has passed without a newer event.
    pub async fn handle_tab_event(&self, tab_id: TabId) -> Result<(), ProviderError> {
        if !self.settings().auto_group_enabled {
            return Ok(());
        }

        let ticket = self.debouncer.lock().schedule(tab_id);
        self.timer.sleep(self.options.auto_group_delay_ms).await;
        let settled = self.debouncer.lock().settle(ticket);
        if !settled || !self.settings().auto_group_enabled {
            return Ok(());
        }

        let tab = self.provider.tab(tab_id).await?;
        self.auto_group_tab(&tab).await
    }

    /// Counts for the active tab's window
    pub async fn window_stats(&self) -> Result<WindowStats, ProviderError> {
        let Some(tab) = self.provider.active_tab().await? else {
            return Ok(WindowStats::default());
        };
        let tabs = self.provider.tabs(TabQuery::window(tab.window_id)).await?;
        Ok(window_stats(&tabs))
    }

    async fn auto_group_tab(&self, tab: &Tab) -> Result<(), ProviderError> {
        let created = self.group_domain_of(tab).await?;

        // Two events racing for the same new domain can leave two groups
        let tabs = self.provider.tabs(TabQuery::window(tab.window_id)).await?;
        let groups = self.provider.groups(tab.window_id).await?;
        let merges = plan_duplicate_merges(&tabs, &groups);
        if !merges.is_empty() {
            info!("Merging {} duplicate groups in window {}", merges.len(), tab.window_id);
            self.apply_plans(merges).await;
        }

        if created > 0 && self.settings().auto_alphabetize_enabled {
            self.timer.sleep(self.options.auto_alphabetize_delay_ms).await;
            self.alphabetize_groups().await?;
        }
        Ok(())
    }

    /// Group the tab's domain within its window, returning how many groups
    /// were created. Privileged tabs are left alone.
    async fn group_domain_of(&self, tab: &Tab) -> Result<usize, ProviderError> {
        let Some(scope) = Scope::for_tab(tab) else {
            debug!("Tab {} is not groupable", tab.id);
            return Ok(0);
        };

        let tabs = self.provider.tabs(TabQuery::window(tab.window_id)).await?;
        let plans = self.plan(&tabs, &scope);
        Ok(self.apply_plans(plans).await)
    }

    fn plan(&self, tabs: &[Tab], scope: &Scope) -> Vec<GroupPlan> {
        let mut colors = self.colors.lock();
        plan_groups(tabs, scope, &mut colors)
    }

    /// Apply plans window by window, windows concurrently. A failing plan is
    /// logged and skipped; the others still run. Returns the number of groups
    /// created.
    async fn apply_plans(&self, plans: Vec<GroupPlan>) -> usize {
        let mut by_window: Vec<(WindowId, Vec<GroupPlan>)> = Vec::new();
        for plan in plans {
            match by_window.iter_mut().find(|(id, _)| *id == plan.window_id()) {
                Some((_, batch)) => batch.push(plan),
                None => by_window.push((plan.window_id(), vec![plan])),
            }
        }

        let created = join_all(by_window.iter().map(|(_, batch)| async move {
            let mut created: usize = 0;
            for plan in batch {
                match self.apply_plan(plan).await {
                    Ok(true) => created += 1,
                    Ok(false) => {}
                    Err(e) => error!("Error creating group for {}: {}", plan.domain(), e),
                }
            }
            created
        }))
        .await;

        created.into_iter().sum()
    }

    async fn apply_plan(&self, plan: &GroupPlan) -> Result<bool, ProviderError> {
        match plan {
            GroupPlan::Create {
                domain,
                tab_ids,
                color,
                ..
            } => {
                let group_id = self.provider.group_tabs(tab_ids, None).await?;
                let update = GroupUpdate {
                    title: Some(domain.clone()),
                    color: Some(*color),
                    collapsed: Some(false),
                };
                self.provider.update_group(group_id, update).await?;
                debug!("Created group {} for {}", group_id, domain);
                Ok(true)
            }
            GroupPlan::Extend {
                group_id, tab_ids, ..
            } => {
                self.provider.group_tabs(tab_ids, Some(*group_id)).await?;
                Ok(false)
            }
        }
    }

    /// Moves are awaited one by one; each relies on the previous having landed.
    async fn alphabetize_window(&self, window: &WindowSnapshot) -> Result<usize, ProviderError> {
        let groups = self.provider.groups(window.id).await?;
        if groups.is_empty() || is_sorted_layout(&window.tabs, &groups) {
            return Ok(0);
        }

        let moves = plan_sort(&window.tabs, &groups);
        for group_move in &moves {
            self.provider
                .move_tab(group_move.tab_id, group_move.target_index)
                .await?;
        }
        Ok(moves.len())
    }
}
