/// Data structures for Tab Grouper
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type TabId = i32;
pub type WindowId = i32;
pub type GroupId = i32;

/// Wire value of `chrome.tabGroups.TAB_GROUP_ID_NONE`
pub const TAB_GROUP_ID_NONE: GroupId = -1;

/// Information about a browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub index: i32,
    #[serde(default, with = "membership")]
    pub group_id: Option<GroupId>,
}

impl Tab {
    pub fn new(id: TabId, window_id: WindowId, url: Option<&str>, index: i32) -> Tab {
        Tab {
            id,
            window_id,
            url: url.map(str::to_string),
            index,
            group_id: None,
        }
    }

    pub fn in_group(mut self, group_id: GroupId) -> Tab {
        self.group_id = Some(group_id);
        self
    }

    pub fn is_grouped(&self) -> bool {
        self.group_id.is_some()
    }
}

/// Group membership travels as a plain integer, `-1` meaning "ungrouped".
mod membership {
    use super::{GroupId, TAB_GROUP_ID_NONE};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<GroupId>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(value.unwrap_or(TAB_GROUP_ID_NONE))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<GroupId>, D::Error> {
        let raw = Option::<GroupId>::deserialize(deserializer)?;
        Ok(raw.filter(|id| *id != TAB_GROUP_ID_NONE))
    }
}

/// Colors offered by the browser for tab groups, in palette order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabGroupColor {
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl TabGroupColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabGroupColor::Grey => "grey",
            TabGroupColor::Blue => "blue",
            TabGroupColor::Red => "red",
            TabGroupColor::Yellow => "yellow",
            TabGroupColor::Green => "green",
            TabGroupColor::Pink => "pink",
            TabGroupColor::Purple => "purple",
            TabGroupColor::Cyan => "cyan",
            TabGroupColor::Orange => "orange",
        }
    }

    pub fn from_name(name: &str) -> Option<TabGroupColor> {
        match name {
            "grey" => Some(TabGroupColor::Grey),
            "blue" => Some(TabGroupColor::Blue),
            "red" => Some(TabGroupColor::Red),
            "yellow" => Some(TabGroupColor::Yellow),
            "green" => Some(TabGroupColor::Green),
            "pink" => Some(TabGroupColor::Pink),
            "purple" => Some(TabGroupColor::Purple),
            "cyan" => Some(TabGroupColor::Cyan),
            "orange" => Some(TabGroupColor::Orange),
            _ => None,
        }
    }
}

impl Serialize for TabGroupColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Unknown color names (newer browsers add some) fall back to grey rather than
// failing the whole snapshot.
impl<'de> Deserialize<'de> for TabGroupColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(TabGroupColor::from_name(&name).unwrap_or(TabGroupColor::Grey))
    }
}

/// A tab group as reported by the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroup {
    pub id: GroupId,
    pub window_id: WindowId,
    #[serde(default)]
    pub title: Option<String>,
    pub color: TabGroupColor,
    #[serde(default)]
    pub collapsed: bool,
}

impl TabGroup {
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// A browser window with its tabs, as returned by `windows.getAll({ populate: true })`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub id: WindowId,
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

impl WindowSnapshot {
    /// Tabs in index order
    pub fn ordered_tabs(&self) -> Vec<Tab> {
        let mut tabs = self.tabs.clone();
        tabs.sort_by_key(|tab| tab.index);
        tabs
    }
}

/// Properties to change on a group; `None` leaves the property untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<TabGroupColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

/// Filter for tab queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

impl TabQuery {
    pub fn window(window_id: WindowId) -> TabQuery {
        TabQuery {
            window_id: Some(window_id),
            group_id: None,
        }
    }

    pub fn group(window_id: WindowId, group_id: GroupId) -> TabQuery {
        TabQuery {
            window_id: Some(window_id),
            group_id: Some(group_id),
        }
    }

    pub fn matches(&self, tab: &Tab) -> bool {
        self.window_id.is_none_or(|id| id == tab.window_id)
            && self.group_id.is_none_or(|id| tab.group_id == Some(id))
    }
}
