use crate::linkedin::types::MailboxMessage;
use crate::{Result, provider_http};
use pledge_http::{Auth, HttpClient, RequestOpts};
use reqwest::StatusCode;
use std::borrow::Cow;
use std::time::Duration;

const MAILBOX_PATH: &str = "v1/people/~/mailbox";

#[derive(Clone)]
pub struct LinkedinApi {
    http: HttpClient,
    access_token: String,
}

impl LinkedinApi {
    pub fn new(endpoint: &str, timeout: Duration, access_token: &str) -> Result<Self> {
        Ok(Self {
            http: provider_http(endpoint, timeout)?,
            access_token: access_token.to_string(),
        })
    }

    /// Send an internal LinkedIn message to the member with provider id `recipient_id`.
    ///
    /// LinkedIn answers `201 Created` with an empty body.
    pub async fn send_mail(&self, recipient_id: &str, subject: &str, body: &str) -> Result<StatusCode> {
        let message = MailboxMessage::to_person(recipient_id, subject, body);
        let resp = self
            .http
            .post_json_raw(
                MAILBOX_PATH,
                &message,
                RequestOpts {
                    auth: Some(Auth::Query {
                        name: "oauth2_access_token",
                        value: Cow::Borrowed(&self.access_token),
                    }),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(status=%resp.status, recipient_id, "linkedin.send_mail");
        Ok(resp.status)
    }
}
