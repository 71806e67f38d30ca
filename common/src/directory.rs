use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// Entry of `APP_Registrations.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AppRegistration {
    #[serde(rename = "App name")]
    pub app_name: String,
}

/// Entry of `AAD_Groups.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AadGroup {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "CDFAlias", default)]
    pub cdf_alias: String,
    #[serde(rename = "Capabilities", default)]
    pub capabilities: Vec<Capability>,
}

/// Entry of a group membership roster. Exactly one of `service_principal`
/// and `user` is expected to be set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MembershipRecord {
    #[serde(
        rename = "Service principal",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_principal: Option<String>,
    #[serde(rename = "User", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(rename = "Groups", default)]
    pub groups: Vec<String>,
}

impl MembershipRecord {
    pub fn for_app(name: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            service_principal: Some(name.into()),
            user: None,
            groups,
        }
    }

    pub fn for_user(name: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            service_principal: None,
            user: Some(name.into()),
            groups,
        }
    }
}
