/// Tab Grouper - groups browser tabs by domain and sorts the groups
/// Built with Rust + WASM
pub mod bridge;
pub mod color;
pub mod command;
pub mod debounce;
pub mod domain;
pub mod mock;
pub mod organizer;
pub mod provider;
pub mod service;
pub mod sorter;
pub mod storage;
pub mod tab_data;
pub mod ungroup;

use wasm_bindgen::prelude::*;

pub use bridge::TabGrouper;
pub use color::{ColorAssigner, PALETTE};
pub use command::{Command, CommandResponse};
pub use organizer::{GroupPlan, Scope, plan_duplicate_merges, plan_groups};
pub use provider::{ProviderError, TabProvider};
pub use service::{ServiceOptions, TabOrganizerService};
pub use sorter::{GroupMove, plan_sort};
pub use storage::{Settings, SettingsStore};
pub use ungroup::plan_ungroup;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export domain extraction for JavaScript access
#[wasm_bindgen]
pub fn extract_domain(url: &str) -> String {
    domain::extract_domain(url)
}
