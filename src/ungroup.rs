/// Tabs to detach from their groups
use crate::domain::tab_domain;
use crate::organizer::{Scope, in_window_order};
use crate::tab_data::{Tab, TabId};

/// Grouped tabs within `scope`, in tab order.
///
/// `Scope::All` takes every grouped tab whatever its URL; a domain scope only
/// looks at groupable tabs of that domain in that window.
pub fn plan_ungroup(tabs: &[Tab], scope: &Scope) -> Vec<TabId> {
    in_window_order(tabs)
        .iter()
        .filter(|tab| tab.is_grouped())
        .filter(|tab| match scope {
            Scope::All => true,
            Scope::Domain { .. } => tab_domain(tab)
                .is_some_and(|domain| scope.covers(tab.window_id, &domain)),
        })
        .map(|tab| tab.id)
        .collect()
}
