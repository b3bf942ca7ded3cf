/// Messages a UI surface sends to the engine
use log::error;
use serde::{Deserialize, Serialize};

use crate::debounce::Timer;
use crate::provider::TabProvider;
use crate::service::TabOrganizerService;
use crate::storage::SettingsStore;

/// One request from the popup or a context menu, tagged by `action`.
///
/// The older popup message names are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    #[serde(alias = "groupTabs")]
    GroupAllTabs,
    #[serde(alias = "ungroupTabs")]
    UngroupAllTabs,
    GroupCurrentDomain,
    UngroupCurrentDomain,
    #[serde(alias = "alphabetizeTabs")]
    AlphabetizeGroups,
    SetAutoGroup { enabled: bool },
    SetAutoAlphabetize { enabled: bool },
}

/// What the caller learns: whether it worked, nothing more
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
}

impl<P, S, T> TabOrganizerService<P, S, T>
where
    P: TabProvider,
    S: SettingsStore,
    T: Timer,
{
    /// Run a command; failures are logged and reported as `success: false`
    pub async fn handle_command(&self, command: Command) -> CommandResponse {
        let result = match command {
            Command::GroupAllTabs => self.group_all_tabs().await,
            Command::UngroupAllTabs => self.ungroup_all_tabs().await,
            Command::GroupCurrentDomain => self.group_current_domain().await,
            Command::UngroupCurrentDomain => self.ungroup_current_domain().await,
            Command::AlphabetizeGroups => self.alphabetize_groups().await,
            Command::SetAutoGroup { enabled } => self.set_auto_group(enabled).await,
            Command::SetAutoAlphabetize { enabled } => self.set_auto_alphabetize(enabled).await,
        };

        match result {
            Ok(()) => CommandResponse { success: true },
            Err(e) => {
                error!("Error handling {:?}: {}", command, e);
                CommandResponse { success: false }
            }
        }
    }
}
