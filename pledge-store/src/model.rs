//! Domain records persisted by the store.
use chrono::{DateTime, Utc};
use pledge_common::{PledgeError, Provider, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Independent role flags; a user may hold any combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    pub admin: bool,
    pub member: bool,
    pub prospect: bool,
}

impl Roles {
    pub fn admin() -> Self {
        Self {
            admin: true,
            ..Self::default()
        }
    }

    pub fn member() -> Self {
        Self {
            member: true,
            ..Self::default()
        }
    }

    pub fn prospect() -> Self {
        Self {
            prospect: true,
            ..Self::default()
        }
    }

    pub fn is_member_or_admin(&self) -> bool {
        self.member || self.admin
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub login: Option<String>,
    pub name: Option<String>,
    pub roles: Roles,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub session_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Registration input. The password is only held until it has been hashed.
#[derive(Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub login: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub roles: Roles,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("login", &self.login)
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("roles", &self.roles)
            .finish()
    }
}

/// A stored OAuth credential linking a user to a provider account.
#[derive(Clone, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: Provider,
    pub uid: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub access_secret: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("provider", &self.provider)
            .field("uid", &self.uid)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub provider: Provider,
    pub uid: Option<String>,
    pub access_token: String,
    pub access_secret: Option<String>,
}

/// Type of relationship a connection records between a user and a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Follower,
    Precommitted,
    Other(String),
}

impl ConnectionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ConnectionKind::Follower => "follower",
            ConnectionKind::Precommitted => "precommitted",
            ConnectionKind::Other(tag) => tag,
        }
    }
}

impl FromStr for ConnectionKind {
    type Err = PledgeError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase();
        match tag.as_str() {
            "" => Err(PledgeError::validation("kind", "can't be blank")),
            "follower" => Ok(ConnectionKind::Follower),
            "precommitted" => Ok(ConnectionKind::Precommitted),
            _ => Ok(ConnectionKind::Other(tag)),
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Connection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub kind: ConnectionKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub document_url: Option<String>,
    /// Box View document id, set once the pitch document has been submitted.
    pub box_document_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub document_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub author_id: Uuid,
    pub project_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Declined,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Declined => "declined",
        }
    }

    /// Only pending approvals can be settled, and only once.
    pub fn can_become(&self, next: ApprovalStatus) -> bool {
        matches!(
            (self, next),
            (ApprovalStatus::Pending, ApprovalStatus::Approved)
                | (ApprovalStatus::Pending, ApprovalStatus::Declined)
        )
    }
}

impl FromStr for ApprovalStatus {
    type Err = PledgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "declined" => Ok(ApprovalStatus::Declined),
            other => Err(PledgeError::validation(
                "status",
                format!("'{other}' is not a known approval status"),
            )),
        }
    }
}

/// A backer's payment approval for a project.
#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub amount_cents: i64,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
