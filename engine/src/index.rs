use std::collections::HashMap;

use common::{DuplicateNamePolicy, ExistingGroup};

/// Existing groups keyed by exact name. CDF does not enforce unique names,
/// so every name maps to all groups carrying it, in listing order.
#[derive(Debug, Default)]
pub struct GroupIndex {
    by_name: HashMap<String, Vec<ExistingGroup>>,
}

#[derive(Debug, PartialEq)]
pub enum Lookup<'a> {
    Missing,
    Found(&'a ExistingGroup),
    Ambiguous(&'a [ExistingGroup]),
}

impl GroupIndex {
    pub fn build(groups: impl IntoIterator<Item = ExistingGroup>) -> Self {
        let mut by_name: HashMap<String, Vec<ExistingGroup>> = HashMap::new();
        for group in groups {
            by_name.entry(group.name.clone()).or_default().push(group);
        }
        Self { by_name }
    }

    pub fn lookup(&self, name: &str, policy: DuplicateNamePolicy) -> Lookup<'_> {
        match self.by_name.get(name).map(Vec::as_slice) {
            None | Some([]) => Lookup::Missing,
            Some([only]) => Lookup::Found(only),
            Some(all) => match policy {
                DuplicateNamePolicy::LastWins => match all.last() {
                    Some(last) => Lookup::Found(last),
                    None => Lookup::Missing,
                },
                DuplicateNamePolicy::RejectAmbiguous => Lookup::Ambiguous(all),
            },
        }
    }

    /// Names shared by more than one group, with their ids, sorted by name.
    pub fn duplicate_names(&self) -> Vec<(&str, Vec<i64>)> {
        let mut duplicates: Vec<_> = self
            .by_name
            .iter()
            .filter(|(_, groups)| groups.len() > 1)
            .map(|(name, groups)| (name.as_str(), groups.iter().map(|g| g.id).collect()))
            .collect();
        duplicates.sort_by(|a, b| a.0.cmp(b.0));
        duplicates
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
