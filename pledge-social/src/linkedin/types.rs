use serde::Serialize;

/// Body of `POST /v1/people/~/mailbox`.
///
/// ```
/// use pledge_social::linkedin::types::MailboxMessage;
///
/// let msg = MailboxMessage::to_person("abc123", "Hi", "Back my project?");
/// let v = serde_json::to_value(&msg).unwrap();
/// assert_eq!(v["recipients"]["values"][0]["person"]["_path"], "/people/abc123");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct MailboxMessage<'a> {
    pub recipients: Recipients,
    pub subject: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipients {
    pub values: Vec<Recipient>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipient {
    pub person: PersonPath,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonPath {
    #[serde(rename = "_path")]
    pub path: String,
}

impl<'a> MailboxMessage<'a> {
    pub fn to_person(recipient_id: &str, subject: &'a str, body: &'a str) -> Self {
        Self {
            recipients: Recipients {
                values: vec![Recipient {
                    person: PersonPath {
                        path: format!("/people/{recipient_id}"),
                    },
                }],
            },
            subject,
            body,
        }
    }
}
