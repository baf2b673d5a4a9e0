use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct CreateTweet<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTweetResponse {
    pub data: PostedTweet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostedTweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDirectMessage<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDirectMessageResponse {
    pub data: SentDirectMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentDirectMessage {
    pub dm_conversation_id: String,
    pub dm_event_id: String,
}

/// `GET /2/users/by/username/:username` answers 200 with `errors` when the
/// handle does not exist, so `data` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UserLookupResponse {
    #[serde(default)]
    pub data: Option<User>,
    #[serde(default)]
    pub errors: Option<Vec<ApiProblem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiProblem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}
