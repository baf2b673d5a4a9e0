//! User-context Twitter client: status updates and direct messages.
use crate::oauth1::{self, Credentials};
use crate::twitter::types::{
    CreateDirectMessage, CreateDirectMessageResponse, CreateTweet, CreateTweetResponse,
    PostedTweet, SentDirectMessage, User, UserLookupResponse,
};
use crate::{Result, SocialError, provider_http};
use pledge_http::{Auth, HttpClient, HttpError, RequestOpts};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use std::time::Duration;

/// Process-wide application credentials, read once at startup.
#[derive(Clone)]
pub struct TwitterApp {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for TwitterApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterApp")
            .field("consumer_key", &self.consumer_key)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    consumer_key: String,
    consumer_secret: String,
    token: String,
    token_secret: String,
}

impl TwitterApi {
    /// Authenticate a client for one linked identity.
    pub fn new(app: &TwitterApp, token: &str, token_secret: &str) -> Result<Self> {
        Ok(Self {
            http: provider_http(&app.endpoint, app.timeout)?,
            consumer_key: app.consumer_key.clone(),
            consumer_secret: app.consumer_secret.clone(),
            token: token.to_string(),
            token_secret: token_secret.to_string(),
        })
    }

    fn signed(&self, method: &str, path: &str) -> std::result::Result<RequestOpts<'static>, HttpError> {
        let url = self.http.url(path)?;
        let creds = Credentials {
            consumer_key: &self.consumer_key,
            consumer_secret: &self.consumer_secret,
            token: &self.token,
            token_secret: &self.token_secret,
        };
        let header = oauth1::authorization_header(method, &url, &[], &creds);
        let value = HeaderValue::from_str(&header)
            .map_err(|e| HttpError::Build(format!("invalid OAuth header: {e}")))?;
        Ok(RequestOpts {
            auth: Some(Auth::Header {
                name: AUTHORIZATION,
                value,
            }),
            retries: Some(0),
            ..Default::default()
        })
    }

    /// Post a status update on behalf of the identity's account.
    pub async fn post_status(&self, text: &str) -> Result<PostedTweet> {
        let path = "2/tweets";
        let resp: CreateTweetResponse = self
            .http
            .post_json_opts(path, &CreateTweet { text }, self.signed("POST", path)?)
            .await?;
        tracing::info!(tweet_id=%resp.data.id, "twitter.post_status");
        Ok(resp.data)
    }

    /// Resolve a handle (with or without a leading `@`) to a user.
    pub async fn user_by_username(&self, handle: &str) -> Result<User> {
        let handle = handle.trim().trim_start_matches('@');
        if !is_valid_handle(handle) {
            return Err(SocialError::Unexpected {
                message: format!("'{handle}' is not a twitter handle"),
                payload: String::new(),
            });
        }
        let path = format!("2/users/by/username/{handle}");
        let resp: UserLookupResponse = self
            .http
            .get_json(&path, self.signed("GET", &path)?)
            .await?;
        match resp.data {
            Some(user) => Ok(user),
            None => Err(SocialError::Unexpected {
                message: format!("no twitter user named '{handle}'"),
                payload: serde_json::to_string(&resp.errors).unwrap_or_default(),
            }),
        }
    }

    /// Send a direct message to the account behind `recipient`.
    pub async fn send_direct_message(&self, recipient: &str, text: &str) -> Result<SentDirectMessage> {
        let user = self.user_by_username(recipient).await?;
        let path = format!("2/dm_conversations/with/{}/messages", user.id);
        let resp: CreateDirectMessageResponse = self
            .http
            .post_json_opts(&path, &CreateDirectMessage { text }, self.signed("POST", &path)?)
            .await?;
        tracing::info!(
            recipient_id=%user.id,
            dm_event_id=%resp.data.dm_event_id,
            "twitter.send_direct_message"
        );
        Ok(resp.data)
    }
}

/// Twitter screen names: 1 to 15 ASCII letters, digits or underscores.
pub fn is_valid_handle(handle: &str) -> bool {
    (1..=15).contains(&handle.len())
        && handle.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::is_valid_handle;

    #[test]
    fn handles_are_plain_screen_names() {
        assert!(is_valid_handle("backer_bob"));
        assert!(is_valid_handle("A1"));
        for bad in ["", "../me", "bob/../me", "bob smith", "bob%2f", "a_very_long_handle_name", "José"] {
            assert!(!is_valid_handle(bad), "{bad} should be rejected");
        }
    }
}
