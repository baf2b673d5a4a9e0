use pledge_common::{PledgeError, Provider};
use pledge_dispatch::{DispatchAction, Dispatcher, ProviderCredentials};
use pledge_social::boxview::BoxViewApp;
use pledge_social::twitter::TwitterApp;
use pledge_store::{Accounts, NewIdentity, NewProject, NewUser, Roles, Store, User};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{any, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn creds(server: &MockServer) -> Arc<ProviderCredentials> {
    let timeout = Duration::from_secs(5);
    Arc::new(ProviderCredentials {
        twitter: Some(TwitterApp {
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            endpoint: server.uri(),
            timeout,
        }),
        linkedin_endpoint: server.uri(),
        box_view: Some(BoxViewApp {
            api_token: "box-token".into(),
            endpoint: server.uri(),
            timeout,
            session_minutes: 45,
        }),
        timeout,
    })
}

async fn setup(server: &MockServer) -> (Accounts, Dispatcher<Store>, User) {
    let store = Store::in_memory().await.unwrap();
    let accounts = Accounts::new(store.clone());
    let user = accounts
        .register(NewUser {
            email: "founder@example.com".into(),
            roles: Roles::member(),
            ..NewUser::default()
        })
        .await
        .unwrap();
    (accounts, Dispatcher::new(store, creds(server)), user)
}

async fn link(accounts: &Accounts, user: &User, provider: Provider, token: &str) {
    accounts
        .link_identity(
            user.id,
            NewIdentity {
                provider,
                uid: None,
                access_token: token.into(),
                access_secret: Some(format!("{token}-secret")),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_identity_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (_accounts, dispatcher, user) = setup(&server).await;

    let err = dispatcher
        .dispatch(
            user.id,
            DispatchAction::TwitterStatus {
                body: "We launched".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PledgeError::NoLinkedIdentity {
            provider: Provider::Twitter
        }
    ));

    let err = dispatcher
        .dispatch(
            user.id,
            DispatchAction::LinkedinMail {
                recipient_id: "abc".into(),
                subject: "s".into(),
                body: "b".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PledgeError::NoLinkedIdentity {
            provider: Provider::Linkedin
        }
    ));
}

#[tokio::test]
async fn status_update_uses_the_oldest_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "1001", "text": "hi"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let (accounts, dispatcher, user) = setup(&server).await;
    link(&accounts, &user, Provider::Twitter, "first").await;
    link(&accounts, &user, Provider::Twitter, "second").await;

    let outcome = dispatcher
        .dispatch(user.id, DispatchAction::TwitterStatus { body: "hi".into() })
        .await
        .unwrap();
    assert_eq!(outcome.provider, Provider::Twitter);
    assert_eq!(outcome.action, "post_status");
    assert_eq!(outcome.external_id.as_deref(), Some("1001"));

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(auth.contains(r#"oauth_token="first""#));
}

#[tokio::test]
async fn failed_direct_message_keeps_raw_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/backer"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "7", "username": "backer"}})),
        )
        .mount(&server)
        .await;
    let raw = r#"{"title":"Forbidden","detail":"not following"}"#;
    Mock::given(method("POST"))
        .and(path("/2/dm_conversations/with/7/messages"))
        .respond_with(ResponseTemplate::new(403).set_body_string(raw))
        .expect(1)
        .mount(&server)
        .await;
    let (accounts, dispatcher, user) = setup(&server).await;
    link(&accounts, &user, Provider::Twitter, "tok").await;

    let err = dispatcher
        .dispatch(
            user.id,
            DispatchAction::TwitterDirectMessage {
                recipient: "@backer".into(),
                body: "thanks!".into(),
            },
        )
        .await
        .unwrap_err();
    match err {
        PledgeError::ProviderCallFailed {
            provider,
            status,
            payload,
        } => {
            assert_eq!(provider, Provider::Twitter);
            assert_eq!(status, Some(403));
            assert_eq!(payload, raw);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn linkedin_mail_sends_token_as_query_param() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/people/~/mailbox"))
        .and(query_param("oauth2_access_token", "li-token"))
        .and(body_json(json!({
            "recipients": {"values": [{"person": {"_path": "/people/xyz"}}]},
            "subject": "Launch",
            "body": "Please share"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let (accounts, dispatcher, user) = setup(&server).await;
    link(&accounts, &user, Provider::Linkedin, "li-token").await;

    let outcome = dispatcher
        .dispatch(
            user.id,
            DispatchAction::LinkedinMail {
                recipient_id: "xyz".into(),
                subject: "Launch".into(),
                body: "Please share".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.provider, Provider::Linkedin);
    assert!(outcome.external_id.is_none());
}

#[tokio::test]
async fn project_view_url_converts_once_and_persists_document_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/documents"))
        .and(body_json(json!({"url": "https://cdn.example.com/pitch.pdf"})))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(json!({"type": "document", "id": "doc-1"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/1/sessions"))
        .and(body_json(json!({"document_id": "doc-1", "duration": 45})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "type": "session",
            "id": "sess-1",
            "urls": {"view": "https://view.example.com/sess-1"}
        })))
        .expect(2)
        .mount(&server)
        .await;
    let (accounts, dispatcher, user) = setup(&server).await;
    let project = accounts
        .store()
        .insert_project(
            user.id,
            NewProject {
                name: "Community Oven".into(),
                description: None,
                document_url: Some("https://cdn.example.com/pitch.pdf".into()),
            },
        )
        .await
        .unwrap();

    let action = DispatchAction::BoxProjectViewUrl {
        project_id: project.id,
    };
    // no box identity is needed
    let first = dispatcher.dispatch(user.id, action.clone()).await.unwrap();
    assert_eq!(first.view_url.as_deref(), Some("https://view.example.com/sess-1"));
    let saved = accounts.store().get_project(project.id).await.unwrap();
    assert_eq!(saved.box_document_id.as_deref(), Some("doc-1"));

    let second = dispatcher.dispatch(user.id, action).await.unwrap();
    assert_eq!(second.external_id.as_deref(), Some("sess-1"));
}

#[tokio::test]
async fn box_failure_leaves_project_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/documents"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"message":"bad url"}"#))
        .expect(1)
        .mount(&server)
        .await;
    let (accounts, dispatcher, user) = setup(&server).await;
    let project = accounts
        .store()
        .insert_project(
            user.id,
            NewProject {
                name: "Seed Bank".into(),
                description: None,
                document_url: Some("not-a-url".into()),
            },
        )
        .await
        .unwrap();

    let err = dispatcher
        .dispatch(
            user.id,
            DispatchAction::BoxProjectViewUrl {
                project_id: project.id,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PledgeError::ProviderCallFailed {
            provider: Provider::Box,
            status: Some(400),
            ..
        }
    ));
    let saved = accounts.store().get_project(project.id).await.unwrap();
    assert!(saved.box_document_id.is_none());
}

#[tokio::test]
async fn box_without_configuration_is_a_config_error() {
    let server = MockServer::start().await;
    let (_accounts, _dispatcher, user) = setup(&server).await;
    let store = Store::in_memory().await.unwrap();
    let bare = Dispatcher::new(
        store,
        Arc::new(ProviderCredentials {
            twitter: None,
            linkedin_endpoint: server.uri(),
            box_view: None,
            timeout: Duration::from_secs(5),
        }),
    );
    let err = bare
        .dispatch(
            user.id,
            DispatchAction::BoxSession {
                document_id: "doc".into(),
                duration: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PledgeError::Config(_)));
}
