use std::collections::{BTreeSet, HashMap};

use common::{AadGroup, AppRegistration, MembershipRecord};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MembershipValidation {
    /// Service principals missing from the app registrations, sorted.
    pub invalid_apps: Vec<String>,
    /// Groups referenced by memberships but missing from the group list, sorted.
    pub invalid_groups: Vec<String>,
    /// Group names that collide with another name when case is ignored, sorted.
    pub duplicate_groups: Vec<String>,
}

impl MembershipValidation {
    pub fn memberships_valid(&self) -> bool {
        self.invalid_apps.is_empty() && self.invalid_groups.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.memberships_valid() && self.duplicate_groups.is_empty()
    }
}

pub fn validate_memberships(
    groups: &[AadGroup],
    apps: &[AppRegistration],
    memberships: &[MembershipRecord],
) -> MembershipValidation {
    let known_apps: BTreeSet<&str> = apps.iter().map(|a| a.app_name.as_str()).collect();
    let known_groups: BTreeSet<&str> = groups.iter().map(|g| g.group.as_str()).collect();

    let mut invalid_apps = BTreeSet::new();
    let mut invalid_groups = BTreeSet::new();

    for membership in memberships {
        if let Some(app) = &membership.service_principal {
            if !known_apps.contains(app.as_str()) {
                invalid_apps.insert(app.clone());
            }
        }
        for group in &membership.groups {
            if !known_groups.contains(group.as_str()) {
                invalid_groups.insert(group.clone());
            }
        }
    }

    MembershipValidation {
        invalid_apps: invalid_apps.into_iter().collect(),
        invalid_groups: invalid_groups.into_iter().collect(),
        duplicate_groups: case_insensitive_duplicates(groups),
    }
}

fn case_insensitive_duplicates(groups: &[AadGroup]) -> Vec<String> {
    let mut by_folded: HashMap<String, usize> = HashMap::new();
    for group in groups {
        *by_folded.entry(group.group.to_lowercase()).or_default() += 1;
    }

    groups
        .iter()
        .filter(|g| by_folded.get(&g.group.to_lowercase()).copied().unwrap_or(0) > 1)
        .map(|g| g.group.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<AadGroup> {
        names
            .iter()
            .map(|n| AadGroup {
                group: n.to_string(),
                cdf_alias: n.to_string(),
                capabilities: vec![],
            })
            .collect()
    }

    fn apps(names: &[&str]) -> Vec<AppRegistration> {
        names
            .iter()
            .map(|n| AppRegistration { app_name: n.to_string() })
            .collect()
    }

    #[test]
    fn test_all_references_valid() {
        let result = validate_memberships(
            &groups(&["Readers", "Writers"]),
            &apps(&["etl-runner"]),
            &[
                MembershipRecord::for_app("etl-runner", vec!["Readers".into()]),
                MembershipRecord::for_user("ann@corp.com", vec!["Writers".into()]),
            ],
        );
        assert!(result.is_clean());
    }

    #[test]
    fn test_invalid_names_are_deduplicated() {
        let result = validate_memberships(
            &groups(&["Readers"]),
            &apps(&["etl-runner"]),
            &[
                MembershipRecord::for_app("ghost-app", vec!["Missing".into(), "Readers".into()]),
                MembershipRecord::for_app("ghost-app", vec!["Missing".into()]),
                MembershipRecord::for_app("etl-runner", vec!["Also Missing".into()]),
            ],
        );
        assert_eq!(result.invalid_apps, vec!["ghost-app"]);
        assert_eq!(result.invalid_groups, vec!["Also Missing", "Missing"]);
        assert!(!result.memberships_valid());
    }

    #[test]
    fn test_users_are_not_checked_against_apps() {
        let result = validate_memberships(
            &groups(&["Readers"]),
            &[],
            &[MembershipRecord::for_user("ann@corp.com", vec!["Readers".into()])],
        );
        assert!(result.invalid_apps.is_empty());
    }

    #[test]
    fn test_case_insensitive_duplicate_groups() {
        let names = groups(&["Admin", "admin", "Readers", "ADMIN"]);
        let result = validate_memberships(&names, &[], &[]);
        assert_eq!(result.duplicate_groups, vec!["ADMIN", "Admin", "admin"]);
        assert!(result.memberships_valid());
        assert!(!result.is_clean());
    }

    #[test]
    fn test_group_names_match_exactly() {
        let result = validate_memberships(
            &groups(&["Readers"]),
            &[],
            &[MembershipRecord::for_user("ann@corp.com", vec!["readers".into()])],
        );
        assert_eq!(result.invalid_groups, vec!["readers"]);
    }
}
