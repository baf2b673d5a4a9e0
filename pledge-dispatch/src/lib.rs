//! Provider dispatch: turn an in-app action into an authenticated provider call.
//!
//! Every action runs the same three stages:
//!
//! 1. **Locate identity**: find the acting user's stored identity for the
//!    action's provider. Twitter and LinkedIn fail here with
//!    [`PledgeError::NoLinkedIdentity`] before any request is built. Box
//!    authenticates with the application token and skips the lookup.
//! 2. **Authenticate client**: combine the identity's tokens with the
//!    process-wide [`ProviderCredentials`].
//! 3. **Execute action**: issue the request and translate the response into a
//!    [`DispatchOutcome`]. Provider failures surface as
//!    [`PledgeError::ProviderCallFailed`] carrying the raw response body.
//!
//! Nothing is retried.
pub mod credentials;

pub use credentials::ProviderCredentials;

use async_trait::async_trait;
use pledge_common::{PledgeError, Provider, Result};
use pledge_social::boxview::BoxViewApi;
use pledge_social::linkedin::LinkedinApi;
use pledge_social::twitter::{TwitterApi, is_valid_handle};
use pledge_social::SocialError;
use pledge_store::{Identity, Project, Store};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The records dispatch reads and writes.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    async fn identity_for(&self, user_id: Uuid, provider: Provider) -> Result<Option<Identity>>;
    async fn project(&self, project_id: Uuid) -> Result<Project>;
    async fn set_box_document_id(&self, project_id: Uuid, document_id: &str) -> Result<()>;
}

#[async_trait]
impl DispatchStore for Store {
    async fn identity_for(&self, user_id: Uuid, provider: Provider) -> Result<Option<Identity>> {
        Store::identity_for(self, user_id, provider).await
    }

    async fn project(&self, project_id: Uuid) -> Result<Project> {
        self.get_project(project_id).await
    }

    async fn set_box_document_id(&self, project_id: Uuid, document_id: &str) -> Result<()> {
        Store::set_box_document_id(self, project_id, document_id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    TwitterStatus {
        body: String,
    },
    TwitterDirectMessage {
        recipient: String,
        body: String,
    },
    LinkedinMail {
        recipient_id: String,
        subject: String,
        body: String,
    },
    /// Open a viewer session; `duration` falls back to the configured minutes.
    BoxSession {
        document_id: String,
        duration: Option<u32>,
    },
    /// Viewer URL for a project's pitch document, converting it on first use.
    BoxProjectViewUrl {
        project_id: Uuid,
    },
}

impl DispatchAction {
    pub fn provider(&self) -> Provider {
        match self {
            DispatchAction::TwitterStatus { .. } | DispatchAction::TwitterDirectMessage { .. } => {
                Provider::Twitter
            }
            DispatchAction::LinkedinMail { .. } => Provider::Linkedin,
            DispatchAction::BoxSession { .. } | DispatchAction::BoxProjectViewUrl { .. } => {
                Provider::Box
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DispatchAction::TwitterStatus { .. } => "post_status",
            DispatchAction::TwitterDirectMessage { .. } => "direct_message",
            DispatchAction::LinkedinMail { .. } => "mail",
            DispatchAction::BoxSession { .. } => "view_session",
            DispatchAction::BoxProjectViewUrl { .. } => "project_view_url",
        }
    }

    fn needs_identity(&self) -> bool {
        self.provider() != Provider::Box
    }

    /// Payload checks that need neither the store nor the network.
    fn validate(&self) -> Result<()> {
        let blank = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(PledgeError::validation(field, "can't be blank"))
            } else {
                Ok(())
            }
        };
        match self {
            DispatchAction::TwitterStatus { body } => blank("body", body),
            DispatchAction::TwitterDirectMessage { recipient, body } => {
                let handle = recipient.trim().trim_start_matches('@');
                blank("recipient", handle)?;
                if !is_valid_handle(handle) {
                    return Err(PledgeError::validation("recipient", "is not a twitter handle"));
                }
                blank("body", body)
            }
            DispatchAction::LinkedinMail {
                recipient_id,
                subject,
                body,
            } => {
                blank("recipient_id", recipient_id)?;
                blank("subject", subject)?;
                blank("body", body)
            }
            DispatchAction::BoxSession {
                document_id,
                duration,
            } => {
                blank("document_id", document_id)?;
                if *duration == Some(0) {
                    return Err(PledgeError::validation("duration", "must be greater than 0"));
                }
                Ok(())
            }
            DispatchAction::BoxProjectViewUrl { .. } => Ok(()),
        }
    }
}

impl fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.provider(), self.name())
    }
}

/// What a successful dispatch produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub provider: Provider,
    pub action: &'static str,
    /// Provider-side id of whatever was created (tweet, DM event, session).
    pub external_id: Option<String>,
    pub view_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    LocateIdentity,
    AuthenticateClient,
    ExecuteAction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::LocateIdentity => "locate_identity",
            Stage::AuthenticateClient => "authenticate_client",
            Stage::ExecuteAction => "execute_action",
        })
    }
}

enum Client {
    Twitter(TwitterApi),
    Linkedin(LinkedinApi),
    BoxView { api: BoxViewApi, session_minutes: u32 },
}

fn call_failed(provider: Provider, err: SocialError) -> PledgeError {
    let status = err.status();
    let payload = err.payload();
    warn!(%provider, ?status, error=%err, "dispatch.provider_call_failed");
    PledgeError::ProviderCallFailed {
        provider,
        status,
        payload,
    }
}

fn not_configured(provider: Provider) -> PledgeError {
    PledgeError::Config(format!("{provider} application credentials are not configured"))
}

pub struct Dispatcher<S> {
    store: S,
    creds: Arc<ProviderCredentials>,
}

impl<S: DispatchStore> Dispatcher<S> {
    pub fn new(store: S, creds: Arc<ProviderCredentials>) -> Self {
        Self { store, creds }
    }

    /// Run `action` on behalf of `user_id`.
    pub async fn dispatch(&self, user_id: Uuid, action: DispatchAction) -> Result<DispatchOutcome> {
        let provider = action.provider();
        action.validate()?;

        debug!(user_id=%user_id, %action, stage=%Stage::LocateIdentity, "dispatch.stage");
        let identity = if action.needs_identity() {
            match self.store.identity_for(user_id, provider).await? {
                Some(identity) => Some(identity),
                None => {
                    info!(user_id=%user_id, %provider, "dispatch.no_linked_identity");
                    return Err(PledgeError::NoLinkedIdentity { provider });
                }
            }
        } else {
            None
        };

        debug!(user_id=%user_id, %action, stage=%Stage::AuthenticateClient, "dispatch.stage");
        let client = self.authenticate(provider, identity.as_ref())?;

        debug!(user_id=%user_id, %action, stage=%Stage::ExecuteAction, "dispatch.stage");
        let outcome = self.execute(client, action).await?;
        info!(
            user_id=%user_id,
            provider=%outcome.provider,
            action=outcome.action,
            external_id=?outcome.external_id,
            "dispatch.success"
        );
        Ok(outcome)
    }

    fn authenticate(&self, provider: Provider, identity: Option<&Identity>) -> Result<Client> {
        let build_failed = |e: SocialError| PledgeError::Config(format!("{provider} client: {e}"));
        match (provider, identity) {
            (Provider::Twitter, Some(identity)) => {
                let app = self
                    .creds
                    .twitter
                    .as_ref()
                    .ok_or_else(|| not_configured(provider))?;
                let secret = identity.access_secret.as_deref().ok_or_else(|| {
                    PledgeError::validation("access_secret", "is required for twitter identities")
                })?;
                TwitterApi::new(app, &identity.access_token, secret)
                    .map(Client::Twitter)
                    .map_err(build_failed)
            }
            (Provider::Linkedin, Some(identity)) => LinkedinApi::new(
                &self.creds.linkedin_endpoint,
                self.creds.timeout,
                &identity.access_token,
            )
            .map(Client::Linkedin)
            .map_err(build_failed),
            (Provider::Box, _) => {
                let app = self
                    .creds
                    .box_view
                    .as_ref()
                    .ok_or_else(|| not_configured(provider))?;
                BoxViewApi::new(app)
                    .map(|api| Client::BoxView {
                        api,
                        session_minutes: app.session_minutes,
                    })
                    .map_err(build_failed)
            }
            (_, None) => Err(PledgeError::NoLinkedIdentity { provider }),
        }
    }

    async fn execute(&self, client: Client, action: DispatchAction) -> Result<DispatchOutcome> {
        let provider = action.provider();
        let name = action.name();
        let outcome = |external_id: Option<String>, view_url: Option<String>| DispatchOutcome {
            provider,
            action: name,
            external_id,
            view_url,
        };
        match (client, action) {
            (Client::Twitter(api), DispatchAction::TwitterStatus { body }) => {
                let tweet = api
                    .post_status(&body)
                    .await
                    .map_err(|e| call_failed(provider, e))?;
                Ok(outcome(Some(tweet.id), None))
            }
            (Client::Twitter(api), DispatchAction::TwitterDirectMessage { recipient, body }) => {
                let sent = api
                    .send_direct_message(&recipient, &body)
                    .await
                    .map_err(|e| call_failed(provider, e))?;
                Ok(outcome(Some(sent.dm_event_id), None))
            }
            (
                Client::Linkedin(api),
                DispatchAction::LinkedinMail {
                    recipient_id,
                    subject,
                    body,
                },
            ) => {
                api.send_mail(&recipient_id, &subject, &body)
                    .await
                    .map_err(|e| call_failed(provider, e))?;
                Ok(outcome(None, None))
            }
            (
                Client::BoxView {
                    api,
                    session_minutes,
                },
                DispatchAction::BoxSession {
                    document_id,
                    duration,
                },
            ) => {
                let session = api
                    .create_session(&document_id, duration.unwrap_or(session_minutes))
                    .await
                    .map_err(|e| call_failed(provider, e))?;
                Ok(outcome(Some(session.id), Some(session.view_url)))
            }
            (
                Client::BoxView {
                    api,
                    session_minutes,
                },
                DispatchAction::BoxProjectViewUrl { project_id },
            ) => {
                let project = self.store.project(project_id).await?;
                let document_id = match project.box_document_id {
                    Some(id) => id,
                    None => {
                        let url = project.document_url.as_deref().ok_or_else(|| {
                            PledgeError::validation("document_url", "can't be blank")
                        })?;
                        let doc = api
                            .create_document(url)
                            .await
                            .map_err(|e| call_failed(provider, e))?;
                        self.store.set_box_document_id(project_id, &doc.id).await?;
                        info!(project_id=%project_id, document_id=%doc.id, "dispatch.box_document_saved");
                        doc.id
                    }
                };
                let session = api
                    .create_session(&document_id, session_minutes)
                    .await
                    .map_err(|e| call_failed(provider, e))?;
                Ok(outcome(Some(session.id), Some(session.view_url)))
            }
            (_, action) => Err(PledgeError::Config(format!(
                "client does not match action {action}"
            ))),
        }
    }
}
