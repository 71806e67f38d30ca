pub mod capability;
pub mod config;
pub mod directory;
pub mod error;
pub mod source;
pub mod types;

pub use capability::{Capability, Scope, DATASET_SCOPE};
pub use config::{CdfConfig, Config, DuplicateNamePolicy, PathsConfig, ReconcileConfig};
pub use directory::{AadGroup, AppRegistration, MembershipRecord};
pub use error::IamError;
pub use source::parse_source_document;
pub use types::{DataSet, DesiredGroup, ExistingGroup, NewGroup, ServiceAccount};
