//! Wire body for remote writes

use chrono::{DateTime, Utc};
use cockpit_model::{Cockpit, Domain};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operation a pending write performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteKind {
    /// Replace the whole document
    Update,
}

/// Body of `PUT /cockpits/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CockpitPayload {
    pub name: String,
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub scrolling_banner: Option<String>,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub use_original_view: bool,
    #[serde(default)]
    pub zones: Vec<Value>,
    #[serde(default)]
    pub template_icons: Map<String, Value>,
    pub client_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub data_history: Value,
    #[serde(default)]
    pub selected_data_date: Option<String>,
}

impl CockpitPayload {
    /// Snapshot a cockpit for sending
    #[must_use]
    pub fn from_cockpit(cockpit: &Cockpit, client_updated_at: DateTime<Utc>) -> Self {
        Self {
            name: cockpit.name.clone(),
            domains: cockpit.domains.clone(),
            logo: cockpit.logo.clone(),
            scrolling_banner: cockpit.scrolling_banner.clone(),
            shared_with: cockpit.shared_with.clone(),
            use_original_view: cockpit.use_original_view,
            zones: cockpit.zones.clone(),
            template_icons: cockpit.template_icons.clone(),
            client_updated_at,
            data_history: cockpit.data_history.clone(),
            selected_data_date: cockpit.selected_data_date.clone(),
        }
    }

    /// Approximate encoded size in bytes
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        serde_json::to_vec(self).map_or(0, |bytes| bytes.len())
    }
}
