use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// A group as the external directory wants it to exist in CDF.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredGroup {
    /// Category label from the source document; only affects iteration.
    pub main_group: String,
    pub name: String,
    pub source_id: String,
    pub capabilities: Vec<Capability>,
}

/// A group as currently stored in CDF.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExistingGroup {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl ExistingGroup {
    /// Source id, with an empty string treated as absent.
    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Payload for creating a group.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub name: String,
    pub source_id: String,
    pub capabilities: Vec<Capability>,
}

impl From<&DesiredGroup> for NewGroup {
    fn from(group: &DesiredGroup) -> Self {
        Self {
            name: group.name.clone(),
            source_id: group.source_id.clone(),
            capabilities: group.capabilities.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceAccount {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub groups: Vec<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataSet {
    pub id: i64,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}
