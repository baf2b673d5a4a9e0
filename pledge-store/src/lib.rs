//! Persistence and account rules for pledge.
//!
//! - [`model`]: users, identities, projects, connections, messages, approvals
//! - [`credentials`] and [`validate`]: password hashing, session tokens, field checks
//! - [`accounts`]: the registration pipeline and account events
//! - [`policy`]: create/update/destroy decisions and listing scopes
//! - [`store`]: the SQLite repository
pub mod accounts;
pub mod credentials;
pub mod model;
pub mod policy;
pub mod store;
pub mod validate;

pub use accounts::{AccountEvent, Accounts, KeepRoles, StatusPolicy};
pub use model::{
    Approval, ApprovalStatus, Connection, ConnectionKind, Identity, Message, NewIdentity,
    NewProject, NewUser, Project, Roles, User,
};
pub use policy::{authorize, decide, scope, Action, Actor, Authored, Decision, Draft, Scope};
pub use store::Store;
