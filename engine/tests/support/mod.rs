//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use common::{Capability, DataSet, DesiredGroup, ExistingGroup, NewGroup, Scope, ServiceAccount};
use engine::{ClientError, ConfirmationSource, TargetClient};

/// Calls observed by [`InMemoryClient`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListGroups { all: bool },
    Create { name: String },
    Delete { id: i64 },
    RetrieveDataset { id: i64 },
    ListServiceAccounts,
}

#[derive(Default)]
struct State {
    groups: Vec<ExistingGroup>,
    datasets: Vec<i64>,
    accounts: Vec<ServiceAccount>,
    next_id: i64,
    calls: Vec<Call>,
    fail_create: bool,
    fail_delete: bool,
}

/// CDF stand-in holding groups, data sets and service accounts in memory.
pub struct InMemoryClient {
    state: Mutex<State>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 100,
                ..Default::default()
            }),
        }
    }

    pub fn with_groups(self, groups: Vec<ExistingGroup>) -> Self {
        self.state.lock().unwrap().groups = groups;
        self
    }

    pub fn with_datasets(self, ids: &[i64]) -> Self {
        self.state.lock().unwrap().datasets = ids.to_vec();
        self
    }

    pub fn with_accounts(self, accounts: Vec<ServiceAccount>) -> Self {
        self.state.lock().unwrap().accounts = accounts;
        self
    }

    pub fn failing_create(self) -> Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    pub fn failing_delete(self) -> Self {
        self.state.lock().unwrap().fail_delete = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn groups(&self) -> Vec<ExistingGroup> {
        self.state.lock().unwrap().groups.clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Create { .. } | Call::Delete { .. }))
            .collect()
    }
}

fn api_error(message: &str) -> ClientError {
    ClientError::Api {
        status: 500,
        message: message.to_string(),
    }
}

impl TargetClient for InMemoryClient {
    async fn list_groups(&self, all: bool) -> Result<Vec<ExistingGroup>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListGroups { all });
        Ok(state.groups.clone())
    }

    async fn create_group(&self, group: &NewGroup) -> Result<ExistingGroup, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            name: group.name.clone(),
        });
        if state.fail_create {
            return Err(api_error("create failed"));
        }
        let id = state.next_id;
        state.next_id += 1;
        let created = ExistingGroup {
            id,
            name: group.name.clone(),
            source_id: Some(group.source_id.clone()),
            capabilities: group.capabilities.clone(),
        };
        state.groups.push(created.clone());
        Ok(created)
    }

    async fn delete_group(&self, id: i64) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete { id });
        if state.fail_delete {
            return Err(api_error("delete failed"));
        }
        state.groups.retain(|g| g.id != id);
        Ok(())
    }

    async fn retrieve_dataset(&self, id: i64) -> Result<Option<DataSet>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::RetrieveDataset { id });
        Ok(state.datasets.contains(&id).then(|| DataSet {
            id,
            external_id: None,
            name: None,
        }))
    }

    async fn list_service_accounts(&self) -> Result<Vec<ServiceAccount>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListServiceAccounts);
        Ok(state.accounts.clone())
    }
}

/// Answers confirmations from a fixed script and remembers every prompt.
#[derive(Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    pub prompts: Vec<String>,
}

impl ScriptedConfirm {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            prompts: Vec::new(),
        }
    }
}

impl ConfirmationSource for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unexpected prompt: {}", prompt))
    }
}

pub fn datasets_capability(actions: &[&str], ids: &[i64]) -> Capability {
    Capability::new("datasetsAcl", actions, Scope::datasets(ids))
}

pub fn existing(
    id: i64,
    name: &str,
    source_id: Option<&str>,
    capabilities: Vec<Capability>,
) -> ExistingGroup {
    ExistingGroup {
        id,
        name: name.to_string(),
        source_id: source_id.map(String::from),
        capabilities,
    }
}

pub fn desired(name: &str, source_id: &str, capabilities: Vec<Capability>) -> DesiredGroup {
    DesiredGroup {
        main_group: "Test".to_string(),
        name: name.to_string(),
        source_id: source_id.to_string(),
        capabilities,
    }
}

pub fn account(id: i64, name: &str, groups: &[i64]) -> ServiceAccount {
    ServiceAccount {
        id,
        name: name.to_string(),
        groups: groups.to_vec(),
    }
}
