use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IamError;

/// Scope kind whose identifiers refer to data sets and must be resolved before use.
pub const DATASET_SCOPE: &str = "datasetScope";

/// Scope kinds that carry an `ids` list. `idscope` is the spelling used by
/// `securityCategoriesAcl`.
const ID_LIST_SCOPES: &[&str] = &[DATASET_SCOPE, "assetRootIdScope", "idScope", "idscope"];

/// One access-control entry: a set of actions granted over a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, AclBody>", into = "BTreeMap<String, AclBody>")]
pub struct Capability {
    pub acl: String,
    pub actions: Vec<String>,
    pub scope: Scope,
}

/// Body of a capability entry as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclBody {
    pub actions: Vec<String>,
    pub scope: Scope,
}

impl TryFrom<BTreeMap<String, AclBody>> for Capability {
    type Error = IamError;

    fn try_from(map: BTreeMap<String, AclBody>) -> Result<Self, Self::Error> {
        let mut entries = map.into_iter();
        match (entries.next(), entries.next()) {
            (Some((acl, body)), None) => Ok(Self {
                acl,
                actions: body.actions,
                scope: body.scope,
            }),
            (None, _) => Err(IamError::MalformedCapability("no acl kind".into())),
            (Some((first, _)), Some((second, _))) => Err(IamError::MalformedCapability(format!(
                "more than one acl kind in one entry ({first}, {second})"
            ))),
        }
    }
}

impl From<Capability> for BTreeMap<String, AclBody> {
    fn from(capability: Capability) -> Self {
        let body = AclBody {
            actions: capability.actions,
            scope: capability.scope,
        };
        BTreeMap::from([(capability.acl, body)])
    }
}

impl Capability {
    pub fn new(acl: impl Into<String>, actions: &[&str], scope: Scope) -> Self {
        Self {
            acl: acl.into(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            scope,
        }
    }
}

/// Resource selector attached to a capability. Exactly one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Value>", into = "BTreeMap<String, Value>")]
pub struct Scope {
    pub kind: String,
    pub value: Value,
}

impl TryFrom<BTreeMap<String, Value>> for Scope {
    type Error = IamError;

    fn try_from(map: BTreeMap<String, Value>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(IamError::MalformedCapability(format!(
                "scope must have exactly one kind, found {}",
                map.len()
            )));
        }
        let (kind, value) = map
            .into_iter()
            .next()
            .ok_or_else(|| IamError::MalformedCapability("empty scope".into()))?;
        Ok(Self { kind, value })
    }
}

impl From<Scope> for BTreeMap<String, Value> {
    fn from(scope: Scope) -> Self {
        BTreeMap::from([(scope.kind, scope.value)])
    }
}

impl Scope {
    pub fn all() -> Self {
        Self {
            kind: "all".into(),
            value: Value::Object(Default::default()),
        }
    }

    pub fn datasets(ids: &[i64]) -> Self {
        Self::with_kind_ids(DATASET_SCOPE, ids)
    }

    pub fn with_kind_ids(kind: &str, ids: &[i64]) -> Self {
        Self {
            kind: kind.to_string(),
            value: serde_json::json!({ "ids": ids }),
        }
    }

    /// Whether this scope kind selects resources by an `ids` list.
    pub fn is_id_list(&self) -> bool {
        ID_LIST_SCOPES.contains(&self.kind.as_str())
    }

    /// Identifiers of an id-list scope, normalized to integers.
    ///
    /// Numeric strings are accepted since exported documents often quote ids.
    /// A missing `ids` field yields an empty list.
    pub fn ids(&self) -> Result<Vec<i64>, IamError> {
        let Some(raw) = self.value.get("ids") else {
            return Ok(Vec::new());
        };
        let items = raw.as_array().ok_or_else(|| IamError::InvalidScopeId {
            kind: self.kind.clone(),
            value: raw.to_string(),
        })?;

        items
            .iter()
            .map(|item| {
                let parsed = match item {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                parsed.ok_or_else(|| IamError::InvalidScopeId {
                    kind: self.kind.clone(),
                    value: item.to_string(),
                })
            })
            .collect()
    }

    /// Returns this scope with its `ids` replaced, other fields untouched.
    pub fn replace_ids(&self, ids: &[i64]) -> Self {
        let mut value = match &self.value {
            Value::Object(map) => map.clone(),
            _ => Default::default(),
        };
        value.insert("ids".into(), serde_json::json!(ids));
        Self {
            kind: self.kind.clone(),
            value: Value::Object(value),
        }
    }
}
