//! OAuth 1.0a request signing (HMAC-SHA1), as required by Twitter's user-context endpoints.
//!
//! Only the `Authorization` header variant is produced. JSON request bodies
//! are not part of the signature; query parameters and any form parameters
//! passed in `extra` are.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;
use url::{Position, Url};

/// RFC 3986 unreserved characters stay as-is; everything else is encoded.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Application keys plus the per-user access token pair.
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
    pub token: &'a str,
    pub token_secret: &'a str,
}

impl std::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE).to_string()
}

/// Fresh 32-character alphanumeric nonce.
pub fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub fn timestamp() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

fn oauth_params(creds: &Credentials<'_>, nonce: &str, timestamp: i64) -> Vec<(String, String)> {
    vec![
        ("oauth_consumer_key".into(), creds.consumer_key.into()),
        ("oauth_nonce".into(), nonce.into()),
        ("oauth_signature_method".into(), "HMAC-SHA1".into()),
        ("oauth_timestamp".into(), timestamp.to_string()),
        ("oauth_token".into(), creds.token.into()),
        ("oauth_version".into(), "1.0".into()),
    ]
}

/// Signature base string: `METHOD&enc(base_url)&enc(sorted params)`.
pub fn signature_base(
    method: &str,
    url: &Url,
    params: &[(String, String)],
    extra: &[(&str, &str)],
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .chain(url.query_pairs().map(|(k, v)| (encode(&k), encode(&v))))
        .chain(extra.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&url[..Position::AfterPath]),
        encode(&param_string)
    )
}

pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    // HMAC accepts keys of any length
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes()).expect("hmac takes any key length");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Build the `Authorization: OAuth ...` header value with an explicit nonce and timestamp.
pub fn authorization_header_with(
    method: &str,
    url: &Url,
    extra: &[(&str, &str)],
    creds: &Credentials<'_>,
    nonce: &str,
    timestamp: i64,
) -> String {
    let mut params = oauth_params(creds, nonce, timestamp);
    let base = signature_base(method, url, &params, extra);
    let signature = sign(&base, creds.consumer_secret, creds.token_secret);
    params.push(("oauth_signature".into(), signature));
    params.sort();

    let fields = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {fields}")
}

pub fn authorization_header(
    method: &str,
    url: &Url,
    extra: &[(&str, &str)],
    creds: &Credentials<'_>,
) -> String {
    authorization_header_with(method, url, extra, creds, &nonce(), timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example from Twitter's "Creating a signature" documentation.
    const NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
    const TIMESTAMP: i64 = 1318622958;
    const STATUS: &str = "Hello Ladies + Gentlemen, a signed OAuth request!";

    fn creds() -> Credentials<'static> {
        Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog",
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        }
    }

    fn url() -> Url {
        Url::parse("https://api.twitter.com/1.1/statuses/update.json?include_entities=true").unwrap()
    }

    #[test]
    fn base_string_matches_reference() {
        let params = oauth_params(&creds(), NONCE, TIMESTAMP);
        let base = signature_base("post", &url(), &params, &[("status", STATUS)]);
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
        );
    }

    #[test]
    fn signature_matches_reference() {
        let params = oauth_params(&creds(), NONCE, TIMESTAMP);
        let base = signature_base("POST", &url(), &params, &[("status", STATUS)]);
        let c = creds();
        assert_eq!(
            sign(&base, c.consumer_secret, c.token_secret),
            "hCtSmYh+iHYCEqBWrE7C7hYmtUk="
        );
    }

    #[test]
    fn header_carries_encoded_signature() {
        let header = authorization_header_with(
            "POST",
            &url(),
            &[("status", STATUS)],
            &creds(),
            NONCE,
            TIMESTAMP,
        );
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_version=\"1.0\""));
    }

    #[test]
    fn nonces_differ() {
        let a = nonce();
        assert_eq!(a.len(), 32);
        assert_ne!(a, nonce());
    }
}
