/// Grouping decisions: which tabs form a new group and which join an existing one
use std::collections::HashMap;

use crate::color::ColorAssigner;
use crate::domain::tab_domain;
use crate::tab_data::{GroupId, Tab, TabGroup, TabGroupColor, TabId, WindowId};

/// Which tabs an operation looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every tab of every window in the snapshot
    All,
    /// Tabs of one window sharing one domain
    Domain { window_id: WindowId, domain: String },
}

impl Scope {
    /// Domain scope of the window and domain a tab belongs to.
    /// `None` for tabs that never take part in grouping.
    pub fn for_tab(tab: &Tab) -> Option<Scope> {
        tab_domain(tab).map(|domain| Scope::Domain {
            window_id: tab.window_id,
            domain,
        })
    }

    pub fn covers_window(&self, window_id: WindowId) -> bool {
        match self {
            Scope::All => true,
            Scope::Domain { window_id: id, .. } => *id == window_id,
        }
    }

    pub fn covers(&self, window_id: WindowId, domain: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Domain {
                window_id: id,
                domain: wanted,
            } => *id == window_id && wanted == domain,
        }
    }
}

/// One grouping action for one domain partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPlan {
    /// Group the tabs together, then title and color the new group
    Create {
        window_id: WindowId,
        domain: String,
        tab_ids: Vec<TabId>,
        color: TabGroupColor,
    },
    /// Add the tabs to a group that already exists; its title and color stay
    Extend {
        window_id: WindowId,
        domain: String,
        group_id: GroupId,
        tab_ids: Vec<TabId>,
    },
}

impl GroupPlan {
    pub fn window_id(&self) -> WindowId {
        match self {
            GroupPlan::Create { window_id, .. } | GroupPlan::Extend { window_id, .. } => *window_id,
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            GroupPlan::Create { domain, .. } | GroupPlan::Extend { domain, .. } => domain,
        }
    }

    pub fn tab_ids(&self) -> &[TabId] {
        match self {
            GroupPlan::Create { tab_ids, .. } | GroupPlan::Extend { tab_ids, .. } => tab_ids,
        }
    }

    pub fn creates_group(&self) -> bool {
        matches!(self, GroupPlan::Create { .. })
    }
}

/// Tabs of one window sharing one domain, in tab order
#[derive(Debug, Clone)]
pub(crate) struct Partition {
    pub window_id: WindowId,
    pub domain: String,
    pub tabs: Vec<Tab>,
}

/// Tabs sorted window by window (first appearance), then by index
pub(crate) fn in_window_order(tabs: &[Tab]) -> Vec<Tab> {
    let mut window_rank: HashMap<WindowId, usize> = HashMap::new();
    for tab in tabs {
        let next = window_rank.len();
        window_rank.entry(tab.window_id).or_insert(next);
    }

    let mut ordered = tabs.to_vec();
    ordered.sort_by_key(|tab| (window_rank[&tab.window_id], tab.index));
    ordered
}

/// Split groupable tabs into (window, domain) partitions, keeping the order
/// in which each partition is first seen.
pub(crate) fn partition_by_domain(tabs: &[Tab], scope: &Scope) -> Vec<Partition> {
    let mut slots: HashMap<(WindowId, String), usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();

    for tab in in_window_order(tabs) {
        let Some(domain) = tab_domain(&tab) else {
            continue;
        };
        if !scope.covers(tab.window_id, &domain) {
            continue;
        }

        let key = (tab.window_id, domain);
        match slots.get(&key) {
            Some(slot) => partitions[*slot].tabs.push(tab),
            None => {
                slots.insert(key.clone(), partitions.len());
                partitions.push(Partition {
                    window_id: key.0,
                    domain: key.1,
                    tabs: vec![tab],
                });
            }
        }
    }

    partitions
}

/// Decide how each domain partition in scope gets grouped.
///
/// Single-tab partitions are left alone. When some tabs of a partition are
/// already grouped, the lowest group id among them receives the rest;
/// otherwise the whole partition becomes a new group colored by `colors`.
pub fn plan_groups(tabs: &[Tab], scope: &Scope, colors: &mut ColorAssigner) -> Vec<GroupPlan> {
    partition_by_domain(tabs, scope)
        .into_iter()
        .filter(|partition| partition.tabs.len() > 1)
        .filter_map(|partition| plan_partition(partition, colors))
        .collect()
}

fn plan_partition(partition: Partition, colors: &mut ColorAssigner) -> Option<GroupPlan> {
    let target = partition.tabs.iter().filter_map(|tab| tab.group_id).min();

    match target {
        Some(group_id) => {
            let tab_ids: Vec<TabId> = partition
                .tabs
                .iter()
                .filter(|tab| !tab.is_grouped())
                .map(|tab| tab.id)
                .collect();

            if tab_ids.is_empty() {
                return None;
            }

            Some(GroupPlan::Extend {
                window_id: partition.window_id,
                domain: partition.domain,
                group_id,
                tab_ids,
            })
        }
        None => {
            let color = colors.color_for(&partition.domain);
            Some(GroupPlan::Create {
                window_id: partition.window_id,
                tab_ids: partition.tabs.iter().map(|tab| tab.id).collect(),
                domain: partition.domain,
                color,
            })
        }
    }
}

/// Fold groups that share a title within a window into the lowest-id one.
///
/// Two quick tab events for the same new domain can each create a group
/// before either lands; this pass cleans that up afterwards.
pub fn plan_duplicate_merges(tabs: &[Tab], groups: &[TabGroup]) -> Vec<GroupPlan> {
    let mut by_title: Vec<((WindowId, String), Vec<GroupId>)> = Vec::new();
    for group in groups {
        let title = group.title_or_empty();
        if title.is_empty() {
            continue;
        }
        let key = (group.window_id, title.to_string());
        match by_title.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, ids)) => ids.push(group.id),
            None => by_title.push((key, vec![group.id])),
        }
    }

    let ordered = in_window_order(tabs);
    by_title
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .filter_map(|((window_id, title), ids)| {
            let target = *ids.iter().min()?;
            let tab_ids: Vec<TabId> = ordered
                .iter()
                .filter(|tab| tab.window_id == window_id)
                .filter(|tab| tab.group_id.is_some_and(|id| id != target && ids.contains(&id)))
                .map(|tab| tab.id)
                .collect();

            (!tab_ids.is_empty()).then_some(GroupPlan::Extend {
                window_id,
                domain: title,
                group_id: target,
                tab_ids,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tab(id: TabId, url: &str, index: i32) -> Tab {
        Tab::new(id, 1, Some(url), index)
    }

    fn create_test_group(id: GroupId, title: &str) -> TabGroup {
        TabGroup {
            id,
            window_id: 1,
            title: Some(title.to_string()),
            color: TabGroupColor::Blue,
            collapsed: false,
        }
    }

    #[test]
    fn test_new_group_for_repeated_domain() {
        let tabs = vec![
            create_test_tab(1, "https://a.com/1", 0),
            create_test_tab(2, "https://b.com", 1),
            create_test_tab(3, "https://www.a.com/2", 2),
            create_test_tab(4, "https://a.com/3", 3),
        ];
        let mut colors = ColorAssigner::new();

        let plans = plan_groups(&tabs, &Scope::All, &mut colors);

        assert_eq!(
            plans,
            vec![GroupPlan::Create {
                window_id: 1,
                domain: "a.com".to_string(),
                tab_ids: vec![1, 3, 4],
                color: TabGroupColor::Grey,
            }]
        );
        // The single b.com tab never asked for a color
        assert_eq!(colors.assigned("b.com"), None);
    }

    #[test]
    fn test_extend_existing_group() {
        let tabs = vec![
            create_test_tab(1, "https://a.com/1", 0).in_group(40),
            create_test_tab(2, "https://a.com/2", 1).in_group(40),
            create_test_tab(3, "https://a.com/3", 2),
        ];
        let mut colors = ColorAssigner::new();

        let plans = plan_groups(&tabs, &Scope::All, &mut colors);

        assert_eq!(
            plans,
            vec![GroupPlan::Extend {
                window_id: 1,
                domain: "a.com".to_string(),
                group_id: 40,
                tab_ids: vec![3],
            }]
        );
        assert!(colors.is_empty());
    }

    #[test]
    fn test_fully_grouped_partition_needs_nothing() {
        let tabs = vec![
            create_test_tab(1, "https://a.com/1", 0).in_group(40),
            create_test_tab(2, "https://a.com/2", 1).in_group(40),
        ];

        let plans = plan_groups(&tabs, &Scope::All, &mut ColorAssigner::new());

        assert!(plans.is_empty());
    }

    #[test]
    fn test_merge_target_is_lowest_group_id() {
        let tabs = vec![
            create_test_tab(1, "https://a.com/1", 0).in_group(9),
            create_test_tab(2, "https://a.com/2", 1).in_group(3),
            create_test_tab(3, "https://a.com/3", 2),
        ];

        let plans = plan_groups(&tabs, &Scope::All, &mut ColorAssigner::new());

        match &plans[..] {
            [GroupPlan::Extend { group_id, tab_ids, .. }] => {
                assert_eq!(*group_id, 3);
                assert_eq!(tab_ids, &vec![3]);
            }
            other => panic!("unexpected plans: {:?}", other),
        }
    }

    #[test]
    fn test_privileged_and_missing_urls_are_skipped() {
        let tabs = vec![
            create_test_tab(1, "chrome://settings", 0),
            create_test_tab(2, "chrome://extensions", 1),
            Tab::new(3, 1, None, 2),
            Tab::new(4, 1, None, 3),
            create_test_tab(5, "about:blank", 4),
            create_test_tab(6, "about:blank", 5),
        ];

        let plans = plan_groups(&tabs, &Scope::All, &mut ColorAssigner::new());

        assert!(plans.is_empty());
    }

    #[test]
    fn test_unparseable_urls_group_as_other() {
        let tabs = vec![
            create_test_tab(1, "file:///tmp/a.html", 0),
            create_test_tab(2, "file:///tmp/b.html", 1),
        ];

        let plans = plan_groups(&tabs, &Scope::All, &mut ColorAssigner::new());

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].domain(), "other");
    }

    #[test]
    fn test_windows_are_planned_separately_with_global_colors() {
        let tabs = vec![
            Tab::new(1, 1, Some("https://a.com/1"), 0),
            Tab::new(2, 1, Some("https://a.com/2"), 1),
            Tab::new(3, 2, Some("https://b.com/1"), 0),
            Tab::new(4, 2, Some("https://b.com/2"), 1),
            Tab::new(5, 2, Some("https://a.com/3"), 2),
            Tab::new(6, 2, Some("https://a.com/4"), 3),
        ];
        let mut colors = ColorAssigner::new();

        let plans = plan_groups(&tabs, &Scope::All, &mut colors);

        assert_eq!(plans.len(), 3);
        let a_colors: Vec<TabGroupColor> = plans
            .iter()
            .filter(|plan| plan.domain() == "a.com")
            .map(|plan| match plan {
                GroupPlan::Create { color, .. } => *color,
                GroupPlan::Extend { .. } => panic!("expected new groups"),
            })
            .collect();
        assert_eq!(a_colors, vec![TabGroupColor::Grey, TabGroupColor::Grey]);
        assert_eq!(colors.assigned("b.com"), Some(TabGroupColor::Blue));
        assert_eq!(plans[1].window_id(), 2);
        assert_eq!(plans[1].tab_ids(), &[3, 4]);
    }

    #[test]
    fn test_domain_scope_limits_plans() {
        let tabs = vec![
            Tab::new(1, 1, Some("https://a.com/1"), 0),
            Tab::new(2, 1, Some("https://a.com/2"), 1),
            Tab::new(3, 1, Some("https://b.com/1"), 2),
            Tab::new(4, 1, Some("https://b.com/2"), 3),
            Tab::new(5, 2, Some("https://a.com/3"), 0),
            Tab::new(6, 2, Some("https://a.com/4"), 1),
        ];
        let scope = Scope::Domain {
            window_id: 1,
            domain: "a.com".to_string(),
        };

        let plans = plan_groups(&tabs, &scope, &mut ColorAssigner::new());

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].tab_ids(), &[1, 2]);
        assert!(plans[0].creates_group());
    }

    #[test]
    fn test_scope_for_tab() {
        let tab = Tab::new(1, 7, Some("https://www.docs.rs/serde"), 0);
        assert_eq!(
            Scope::for_tab(&tab),
            Some(Scope::Domain {
                window_id: 7,
                domain: "docs.rs".to_string(),
            })
        );
        assert_eq!(Scope::for_tab(&Tab::new(2, 7, Some("edge://newtab"), 1)), None);
        assert_eq!(Scope::for_tab(&Tab::new(3, 7, None, 2)), None);
    }

    #[test]
    fn test_duplicate_groups_merge_into_lowest_id() {
        let tabs = vec![
            create_test_tab(1, "https://a.com/1", 0).in_group(8),
            create_test_tab(2, "https://a.com/2", 1).in_group(8),
            create_test_tab(3, "https://a.com/3", 2).in_group(5),
            create_test_tab(4, "https://b.com/1", 3).in_group(6),
        ];
        let groups = vec![
            create_test_group(8, "a.com"),
            create_test_group(5, "a.com"),
            create_test_group(6, "b.com"),
        ];

        let merges = plan_duplicate_merges(&tabs, &groups);

        assert_eq!(
            merges,
            vec![GroupPlan::Extend {
                window_id: 1,
                domain: "a.com".to_string(),
                group_id: 5,
                tab_ids: vec![1, 2],
            }]
        );
    }

    #[test]
    fn test_duplicate_titles_in_other_windows_are_independent() {
        let tabs = vec![
            create_test_tab(1, "https://a.com/1", 0).in_group(1),
            Tab::new(2, 2, Some("https://a.com/2"), 0).in_group(2),
        ];
        let mut other_window = create_test_group(2, "a.com");
        other_window.window_id = 2;
        let groups = vec![create_test_group(1, "a.com"), other_window];

        assert!(plan_duplicate_merges(&tabs, &groups).is_empty());
    }
}
