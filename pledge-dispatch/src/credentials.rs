//! Application-level provider credentials, built once from configuration.
use pledge_config::PledgeConfig;
use pledge_social::boxview::BoxViewApp;
use pledge_social::twitter::TwitterApp;
use std::time::Duration;

/// Immutable provider settings shared by every dispatch.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub twitter: Option<TwitterApp>,
    pub linkedin_endpoint: String,
    pub box_view: Option<BoxViewApp>,
    pub timeout: Duration,
}

impl ProviderCredentials {
    pub fn from_config(cfg: &PledgeConfig) -> Self {
        let timeout = Duration::from_secs(cfg.http.timeout_secs);
        Self {
            twitter: cfg.twitter.as_ref().map(|t| TwitterApp {
                consumer_key: t.consumer_key.clone(),
                consumer_secret: t.consumer_secret.clone(),
                endpoint: t.endpoint.clone(),
                timeout,
            }),
            linkedin_endpoint: cfg.linkedin.endpoint.clone(),
            box_view: cfg.box_view.as_ref().map(|b| BoxViewApp {
                api_token: b.api_token.clone(),
                endpoint: b.endpoint.clone(),
                timeout,
                session_minutes: b.session_duration_minutes,
            }),
            timeout,
        }
    }
}
