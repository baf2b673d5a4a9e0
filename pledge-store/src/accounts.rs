//! Account lifecycle: registration, authentication and identity linking.
//!
//! Every change to password or identity state is followed by an
//! [`AccountEvent`] handed to the configured [`StatusPolicy`], which may
//! replace the user's role flags.
use crate::credentials::{issue_session_token, set_credential, verify_password};
use crate::model::{Identity, NewIdentity, NewUser, Roles, User};
use crate::store::Store;
use crate::validate::registration_errors;
use chrono::Utc;
use pledge_common::{FieldError, PledgeError, Provider, Result};
use std::fmt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    Registered,
    PasswordChanged,
    IdentityLinked { provider: Provider },
    IdentityUnlinked { provider: Provider },
}

impl fmt::Display for AccountEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountEvent::Registered => f.write_str("registered"),
            AccountEvent::PasswordChanged => f.write_str("password_changed"),
            AccountEvent::IdentityLinked { provider } => write!(f, "identity_linked:{provider}"),
            AccountEvent::IdentityUnlinked { provider } => {
                write!(f, "identity_unlinked:{provider}")
            }
        }
    }
}

/// Decides a user's role flags after an account change.
///
/// Return `None` to leave the stored roles alone.
pub trait StatusPolicy: Send + Sync {
    fn on_saved(&self, user: &User, event: &AccountEvent) -> Option<Roles>;
}

/// Never changes roles.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepRoles;

impl StatusPolicy for KeepRoles {
    fn on_saved(&self, _user: &User, _event: &AccountEvent) -> Option<Roles> {
        None
    }
}

#[derive(Clone)]
pub struct Accounts {
    store: Store,
    policy: Arc<dyn StatusPolicy>,
}

impl fmt::Debug for Accounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accounts").field("store", &self.store).finish_non_exhaustive()
    }
}

impl Accounts {
    pub fn new(store: Store) -> Self {
        Self::with_policy(store, Arc::new(KeepRoles))
    }

    pub fn with_policy(store: Store, policy: Arc<dyn StatusPolicy>) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Validate, hash, assign the session token and persist a new user.
    ///
    /// All format and uniqueness failures are reported together; nothing is
    /// written unless the whole pipeline passes.
    pub async fn register(&self, new: NewUser) -> Result<User> {
        let NewUser {
            email,
            login,
            name,
            password,
            roles,
        } = new;
        let password = password.map(Zeroizing::new);
        let email = email.trim().to_string();
        let login = login.map(|l| l.trim().to_string());

        let mut errors =
            registration_errors(&email, login.as_deref(), password.as_deref().map(String::as_str));
        if !errors.iter().any(|e| e.field == "email") && self.store.email_taken(&email, None).await? {
            errors.push(FieldError::new("email", "has already been taken"));
        }
        if let Some(l) = &login {
            if !errors.iter().any(|e| e.field == "login") && self.store.login_taken(l, None).await? {
                errors.push(FieldError::new("login", "has already been taken"));
            }
        }
        if !errors.is_empty() {
            info!(fields=?errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>(), "accounts.register.invalid");
            return Err(PledgeError::ValidationFailed(errors));
        }

        let password_hash = set_credential(password)?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            login,
            name,
            roles,
            password_hash,
            session_token: issue_session_token(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;
        info!(user_id=%user.id, "accounts.register");
        self.after_save(user, AccountEvent::Registered).await
    }

    /// Look a user up by email or login (ignoring case) and check the password.
    pub async fn authenticate(&self, email_or_login: &str, password: &str) -> Result<User> {
        let key = email_or_login.trim();
        let found = match self.store.find_user_by_email(key).await? {
            Some(u) => Some(u),
            None => self.store.find_user_by_login(key).await?,
        };
        let Some(user) = found else {
            info!("accounts.authenticate.unknown_user");
            return Err(PledgeError::InvalidCredentials);
        };
        match &user.password_hash {
            Some(hash) if verify_password(password, hash) => {
                info!(user_id=%user.id, "accounts.authenticate");
                Ok(user)
            }
            _ => {
                info!(user_id=%user.id, "accounts.authenticate.rejected");
                Err(PledgeError::InvalidCredentials)
            }
        }
    }

    pub async fn change_password(&self, user_id: Uuid, password: Option<String>) -> Result<User> {
        let hash = set_credential(password.map(Zeroizing::new))?;
        self.store.update_password(user_id, hash.as_deref()).await?;
        let user = self.store.get_user(user_id).await?;
        self.after_save(user, AccountEvent::PasswordChanged).await
    }

    pub async fn link_identity(&self, user_id: Uuid, new: NewIdentity) -> Result<Identity> {
        if new.access_token.trim().is_empty() {
            return Err(PledgeError::validation("access_token", "can't be blank"));
        }
        let user = self.store.get_user(user_id).await?;
        let provider = new.provider;
        let identity = self.store.insert_identity(user.id, new).await?;
        self.after_save(user, AccountEvent::IdentityLinked { provider })
            .await?;
        Ok(identity)
    }

    pub async fn unlink_identity(&self, user_id: Uuid, identity_id: Uuid) -> Result<Identity> {
        let identity = self.store.delete_identity(user_id, identity_id).await?;
        let user = self.store.get_user(user_id).await?;
        self.after_save(
            user,
            AccountEvent::IdentityUnlinked {
                provider: identity.provider,
            },
        )
        .await?;
        Ok(identity)
    }

    pub async fn find_by_session_token(&self, token: &str) -> Result<Option<User>> {
        self.store.find_user_by_session_token(token).await
    }

    pub async fn destroy_user(&self, user_id: Uuid) -> Result<()> {
        self.store.destroy_user(user_id).await
    }

    async fn after_save(&self, mut user: User, event: AccountEvent) -> Result<User> {
        if let Some(roles) = self.policy.on_saved(&user, &event) {
            if roles != user.roles {
                self.store.update_roles(user.id, roles).await?;
                info!(user_id=%user.id, %event, ?roles, "accounts.status_changed");
                user.roles = roles;
            }
        }
        Ok(user)
    }
}
