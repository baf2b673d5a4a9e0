use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct CreateDocument<'a> {
    pub url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSession<'a> {
    pub document_id: &'a str,
    /// Session lifetime in minutes.
    pub duration: u32,
}

/// Shared shape of document and session responses; only `id` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct Created {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub urls: Option<SessionUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionUrls {
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub assets: Option<String>,
}

/// A document accepted for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub status: Option<String>,
}

/// A viewer session and the URL a browser should open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub view_url: String,
}
