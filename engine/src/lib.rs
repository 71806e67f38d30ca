pub mod analytics;
pub mod client;
pub mod compare;
pub mod confirm;
pub mod index;
pub mod ledger;
pub mod output;
pub mod reconcile;
pub mod validate;

pub use analytics::{fetch_report, IamReport, SourceDocuments};
pub use client::{CdfClient, ClientError, TargetClient};
pub use compare::equivalent;
pub use confirm::{AutoApprove, ConfirmationSource};
pub use index::{GroupIndex, Lookup};
pub use ledger::{AuditRecord, Ledger, RunMode, Status};
pub use reconcile::{Reconciler, RunAborted};
pub use validate::{validate_memberships, MembershipValidation};
