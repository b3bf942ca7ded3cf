/// Domain extraction and counting logic for Tab Grouper
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::tab_data::Tab;

/// Domain used for tabs whose URL has no usable hostname
pub const OTHER_DOMAIN: &str = "other";

/// Browser-internal URL prefixes that are never grouped
const PRIVILEGED_PREFIXES: [&str; 3] = ["chrome://", "edge://", "about:"];

/// Extract the domain a tab is grouped under
///
/// Algorithm:
/// 1. Parse URL and take its hostname
/// 2. Strip a leading "www."
/// 3. Anything unparseable (or without a host) becomes "other"
///
/// Examples:
/// - https://www.google.com/search?q=rust → google.com
/// - https://docs.rs/serde → docs.rs
/// - not a url → other
pub fn extract_domain(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
        .map(|host| match host.strip_prefix("www.") {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => host,
        })
        .unwrap_or_else(|| OTHER_DOMAIN.to_string())
}

/// Whether a tab URL may take part in grouping at all
pub fn is_groupable_url(url: &str) -> bool {
    !PRIVILEGED_PREFIXES
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Domain of a tab, or `None` when the tab is excluded from grouping
pub fn tab_domain(tab: &Tab) -> Option<String> {
    tab.url
        .as_deref()
        .filter(|url| is_groupable_url(url))
        .map(extract_domain)
}

/// Count domain occurrences across groupable tabs
pub fn count_domains(tabs: &[Tab]) -> HashMap<String, usize> {
    tabs.iter()
        .filter_map(tab_domain)
        .fold(HashMap::new(), |mut counts, domain| {
            *counts.entry(domain).or_insert(0) += 1;
            counts
        })
}

/// Summary shown by the popup for the current window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    pub total_tabs: usize,
    pub total_domains: usize,
    pub total_groups: usize,
}

pub fn window_stats(tabs: &[Tab]) -> WindowStats {
    let groups: HashSet<_> = tabs.iter().filter_map(|tab| tab.group_id).collect();

    WindowStats {
        total_tabs: tabs.len(),
        total_domains: count_domains(tabs).len(),
        total_groups: groups.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain_basic() {
        assert_eq!(extract_domain("https://www.google.com"), "google.com");
        assert_eq!(extract_domain("https://google.com"), "google.com");
        assert_eq!(extract_domain("http://google.com"), "google.com");
    }

    #[test]
    fn test_extract_domain_keeps_subdomains() {
        assert_eq!(extract_domain("https://mail.google.com"), "mail.google.com");
        assert_eq!(extract_domain("https://news.bbc.co.uk/article"), "news.bbc.co.uk");
    }

    #[test]
    fn test_extract_domain_with_path_and_query() {
        assert_eq!(extract_domain("https://www.google.com/search?q=rust#top"), "google.com");
        assert_eq!(extract_domain("https://github.com/rust-lang/rust"), "github.com");
        assert_eq!(extract_domain("http://localhost:3000/app"), "localhost");
    }

    #[test]
    fn test_extract_domain_only_strips_leading_www() {
        assert_eq!(extract_domain("https://wwww.example.com"), "wwww.example.com");
        assert_eq!(extract_domain("https://shop.www.example.com"), "shop.www.example.com");
    }

    #[test]
    fn test_extract_domain_other() {
        assert_eq!(extract_domain(""), OTHER_DOMAIN);
        assert_eq!(extract_domain("not a url"), OTHER_DOMAIN);
        assert_eq!(extract_domain("https://"), OTHER_DOMAIN);
        assert_eq!(extract_domain("file:///home/user/notes.txt"), OTHER_DOMAIN);
    }

    #[test]
    fn test_is_groupable_url() {
        assert!(is_groupable_url("https://example.com"));
        assert!(is_groupable_url("file:///tmp/a.html"));
        assert!(!is_groupable_url("chrome://extensions"));
        assert!(!is_groupable_url("edge://settings"));
        assert!(!is_groupable_url("about:blank"));
    }

    #[test]
    fn test_count_domains() {
        let tabs = vec![
            Tab::new(1, 1, Some("https://www.google.com/search"), 0),
            Tab::new(2, 1, Some("https://google.com/maps"), 1),
            Tab::new(3, 1, Some("https://github.com/rust"), 2),
            Tab::new(4, 1, Some("chrome://newtab"), 3),
            Tab::new(5, 1, None, 4),
        ];

        let counts = count_domains(&tabs);

        assert_eq!(counts.get("google.com"), Some(&2));
        assert_eq!(counts.get("github.com"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_window_stats() {
        let tabs = vec![
            Tab::new(1, 1, Some("https://a.com"), 0).in_group(4),
            Tab::new(2, 1, Some("https://a.com/x"), 1).in_group(4),
            Tab::new(3, 1, Some("https://b.com"), 2).in_group(5),
            Tab::new(4, 1, Some("about:blank"), 3),
        ];

        let stats = window_stats(&tabs);

        assert_eq!(
            stats,
            WindowStats {
                total_tabs: 4,
                total_domains: 2,
                total_groups: 2,
            }
        );
    }
}
