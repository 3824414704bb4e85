//! Smart Device Management API resources

use serde::{Deserialize, Serialize};

/// A device as returned by `enterprises.devices.list`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Resource name, `enterprises/{project}/devices/{device}`
    #[serde(default)]
    pub name: String,

    /// Device type tag, e.g. `sdm.devices.types.THERMOSTAT`
    #[serde(rename = "type", default)]
    pub device_type: String,

    /// Device traits keyed by trait name
    #[serde(default)]
    pub traits: serde_json::Value,

    /// Rooms and structures the device belongs to
    #[serde(default)]
    pub parent_relations: Vec<ParentRelation>,
}

impl Device {
    /// Display name of the first parent relation, or empty
    pub fn room(&self) -> &str {
        self.parent_relations
            .first()
            .map(|relation| relation.display_name.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentRelation {
    #[serde(default)]
    pub parent: String,

    #[serde(default)]
    pub display_name: String,
}

/// One page of `enterprises.devices.list`.
///
/// Devices stay raw so a single malformed record can be dropped without
/// losing the rest of the page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesResponse {
    #[serde(default)]
    pub devices: Vec<serde_json::Value>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}
