use crate::boxview::types::{CreateDocument, CreateSession, Created, Document, Session};
use crate::{Result, SocialError, provider_http};
use pledge_http::{Auth, HttpClient, RawResponse, RequestOpts};
use std::time::Duration;

/// Process-wide Box View settings, read once at startup.
#[derive(Clone)]
pub struct BoxViewApp {
    pub api_token: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub session_minutes: u32,
}

impl std::fmt::Debug for BoxViewApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxViewApp")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("session_minutes", &self.session_minutes)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct BoxViewApi {
    http: HttpClient,
    api_token: String,
}

fn created_id(resp: &RawResponse, what: &str) -> Result<Created> {
    let created: Option<Created> = resp.json()?;
    match created {
        Some(c) if c.id.as_deref().is_some_and(|id| !id.is_empty()) => Ok(c),
        _ => Err(SocialError::Unexpected {
            message: format!("{what} response (status {}) carried no id", resp.status),
            payload: String::from_utf8_lossy(&resp.body).into_owned(),
        }),
    }
}

impl BoxViewApi {
    pub fn new(app: &BoxViewApp) -> Result<Self> {
        Ok(Self {
            http: provider_http(&app.endpoint, app.timeout)?,
            api_token: app.api_token.clone(),
        })
    }

    fn opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.api_token)),
            retries: Some(0),
            ..Default::default()
        }
    }

    /// Submit a publicly reachable document URL for conversion.
    ///
    /// Box answers `202 Accepted` and the `id` is captured.
    pub async fn create_document(&self, url: &str) -> Result<Document> {
        let resp = self
            .http
            .post_json_raw("1/documents", &CreateDocument { url }, self.opts())
            .await?;
        let created = created_id(&resp, "document")?;
        let id = created.id.unwrap_or_default();
        tracing::info!(status=%resp.status, document_id=%id, "boxview.create_document");
        Ok(Document {
            id,
            status: created.status,
        })
    }

    /// Open a viewer session on a converted document.
    pub async fn create_session(&self, document_id: &str, duration_minutes: u32) -> Result<Session> {
        let resp = self
            .http
            .post_json_raw(
                "1/sessions",
                &CreateSession {
                    document_id,
                    duration: duration_minutes,
                },
                self.opts(),
            )
            .await?;
        let created = created_id(&resp, "session")?;
        let id = created.id.unwrap_or_default();
        let view_url = match created.urls.and_then(|u| u.view) {
            Some(view) => view,
            None => self.http.url(&format!("1/sessions/{id}/view"))?.to_string(),
        };
        tracing::info!(status=%resp.status, document_id, session_id=%id, "boxview.create_session");
        Ok(Session { id, view_url })
    }
}
