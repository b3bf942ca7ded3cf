/// Alphabetical ordering of tab groups within a window
use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::tab_data::{GroupId, Tab, TabGroup, TabId};

/// Where one group has to go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMove {
    pub group_id: GroupId,
    /// Any tab of the group; moving it drags the whole group along
    pub tab_id: TabId,
    pub target_index: i32,
}

/// Compute the target index of every group in one window.
///
/// Ungrouped tabs are never moved and take up the lowest indices; groups
/// follow in title order. Moves must be applied one after the other, in the
/// returned order, with nothing else touching the window in between.
pub fn plan_sort(tabs: &[Tab], groups: &[TabGroup]) -> Vec<GroupMove> {
    if groups.is_empty() {
        return Vec::new();
    }

    let mut ordered_tabs = tabs.to_vec();
    ordered_tabs.sort_by_key(|tab| tab.index);

    let mut position = ordered_tabs.iter().filter(|tab| !tab.is_grouped()).count() as i32;
    let mut moves = Vec::new();

    for group in sorted_groups(groups) {
        let members: Vec<&Tab> = ordered_tabs
            .iter()
            .filter(|tab| tab.group_id == Some(group.id))
            .collect();

        if let Some(first) = members.first() {
            moves.push(GroupMove {
                group_id: group.id,
                tab_id: first.id,
                target_index: position,
            });
        }
        position += members.len() as i32;
    }

    moves
}

/// Whether the window already has ungrouped tabs first and groups in title order
pub fn is_sorted_layout(tabs: &[Tab], groups: &[TabGroup]) -> bool {
    let mut ordered_tabs = tabs.to_vec();
    ordered_tabs.sort_by_key(|tab| tab.index);

    let mut expected: Vec<Option<GroupId>> = ordered_tabs
        .iter()
        .filter(|tab| !tab.is_grouped())
        .map(|_| None)
        .collect();
    for group in sorted_groups(groups) {
        let size = ordered_tabs
            .iter()
            .filter(|tab| tab.group_id == Some(group.id))
            .count();
        expected.extend(std::iter::repeat_n(Some(group.id), size));
    }

    let actual: Vec<Option<GroupId>> = ordered_tabs.iter().map(|tab| tab.group_id).collect();
    actual == expected
}

fn sorted_groups(groups: &[TabGroup]) -> Vec<&TabGroup> {
    let mut sorted: Vec<&TabGroup> = groups.iter().collect();
    // Stable sort keeps the browser's order for identical titles
    sorted.sort_by(|a, b| compare_titles(a.title_or_empty(), b.title_or_empty()));
    sorted
}

/// Locale-style title comparison.
///
/// Titles are decomposed (NFD) and letters compare by their base form first
/// (so "Émile" sits between "Eli" and "Erin"), then unaccented before
/// accented, then lowercase before uppercase. Raw code points break any
/// remaining tie.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    let a_keys = collation_keys(a);
    let b_keys = collation_keys(b);

    let primary = |keys: &[CollationKey]| keys.iter().map(|k| k.base).collect::<Vec<char>>();
    let tertiary = |keys: &[CollationKey]| keys.iter().map(|k| k.upper).collect::<Vec<bool>>();

    primary(&a_keys)
        .cmp(&primary(&b_keys))
        .then_with(|| secondary(&a_keys).cmp(&secondary(&b_keys)))
        .then_with(|| tertiary(&a_keys).cmp(&tertiary(&b_keys)))
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone)]
struct CollationKey {
    base: char,
    /// Combining marks following the base letter
    marks: Vec<char>,
    upper: bool,
}

fn secondary(keys: &[CollationKey]) -> Vec<&[char]> {
    keys.iter().map(|k| k.marks.as_slice()).collect()
}

/// Marks a letter folded through `fold`, so it sorts after its plain base
const FOLDED: char = '\u{0338}';

/// Latin letters with no canonical decomposition, spelled with plain letters
fn fold(c: char) -> Option<&'static str> {
    let folded = match c {
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'þ' => "th",
        'ð' | 'đ' => "d",
        'ħ' => "h",
        'ı' => "i",
        'ł' => "l",
        'ø' => "o",
        'ŧ' => "t",
        _ => return None,
    };
    Some(folded)
}

fn collation_keys(title: &str) -> Vec<CollationKey> {
    let mut keys: Vec<CollationKey> = Vec::new();
    for c in title.nfd() {
        if is_combining_mark(c) {
            if let Some(key) = keys.last_mut() {
                key.marks.push(c);
                continue;
            }
        }

        let upper = c.is_uppercase();
        let lower = c.to_lowercase().next().unwrap_or(c);
        match fold(lower) {
            Some(spelled) => {
                for (position, base) in spelled.chars().enumerate() {
                    let marks = if position == 0 { vec![FOLDED] } else { Vec::new() };
                    keys.push(CollationKey { base, marks, upper });
                }
            }
            None => keys.push(CollationKey {
                base: lower,
                marks: Vec::new(),
                upper,
            }),
        }
    }
    keys
}
