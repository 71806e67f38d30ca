//! Desired-groups source document:
//! `{ mainGroup: { groupName: { "Capabilities": [...] | "None", "ID": sourceId } } }`.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::capability::Capability;
use crate::error::IamError;
use crate::types::DesiredGroup;

#[derive(Deserialize)]
struct SourceEntry {
    #[serde(rename = "Capabilities")]
    capabilities: CapabilityList,
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CapabilityList {
    Entries(Vec<Capability>),
    Label(String),
}

/// Parses the source document into desired groups, in document order.
pub fn parse_source_document(content: &str) -> Result<Vec<DesiredGroup>, IamError> {
    let root: Map<String, Value> = serde_json::from_str(content)?;
    let mut desired = Vec::new();

    for (main_group, groups) in root {
        let Value::Object(groups) = groups else {
            return Err(IamError::MalformedSource(format!(
                "main group {main_group} is not an object"
            )));
        };

        for (name, entry) in groups {
            let entry: SourceEntry = serde_json::from_value(entry).map_err(|e| {
                IamError::MalformedSource(format!("group {name} in {main_group}: {e}"))
            })?;

            let capabilities = match entry.capabilities {
                CapabilityList::Entries(entries) => entries,
                CapabilityList::Label(label) if label == "None" => Vec::new(),
                CapabilityList::Label(label) => {
                    return Err(IamError::MalformedSource(format!(
                        "group {name}: unexpected capabilities value {label:?}"
                    )))
                }
            };

            desired.push(DesiredGroup {
                main_group: main_group.clone(),
                name,
                source_id: entry.id,
                capabilities,
            });
        }
    }

    Ok(desired)
}
