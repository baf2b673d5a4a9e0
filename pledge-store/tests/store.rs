use pledge_common::{PledgeError, Provider};
use pledge_store::{
    authorize, scope, Accounts, Action, Actor, ApprovalStatus, ConnectionKind, NewIdentity,
    NewProject, NewUser, Roles, Store, User,
};

async fn register(accounts: &Accounts, email: &str, roles: Roles) -> User {
    accounts
        .register(NewUser {
            email: email.into(),
            roles,
            ..NewUser::default()
        })
        .await
        .unwrap()
}

fn project(name: &str) -> NewProject {
    NewProject {
        name: name.into(),
        description: None,
        document_url: Some("https://cdn.example.com/pitch.pdf".into()),
    }
}

#[tokio::test]
async fn connections_drive_followed_and_precommitted_lists() {
    let accounts = Accounts::new(Store::in_memory().await.unwrap());
    let store = accounts.store();
    let author = register(&accounts, "author@example.com", Roles::member()).await;
    let backer = register(&accounts, "backer@example.com", Roles::member()).await;
    let solar = store.insert_project(author.id, project("Solar Kiosk")).await.unwrap();
    let garden = store.insert_project(author.id, project("Roof Garden")).await.unwrap();

    store
        .add_connection(backer.id, solar.id, &ConnectionKind::Follower)
        .await
        .unwrap();
    store
        .add_connection(backer.id, garden.id, &ConnectionKind::Follower)
        .await
        .unwrap();
    store
        .add_connection(backer.id, garden.id, &ConnectionKind::Precommitted)
        .await
        .unwrap();
    // recording the same connection again changes nothing
    store
        .add_connection(backer.id, solar.id, &ConnectionKind::Follower)
        .await
        .unwrap();
    store
        .add_connection(backer.id, solar.id, &"sponsor".parse().unwrap())
        .await
        .unwrap();

    let followed: Vec<_> = store
        .followed_projects(backer.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(followed, ["Solar Kiosk", "Roof Garden"]);
    let pre = store.precommitted_projects(backer.id).await.unwrap();
    assert_eq!(pre.len(), 1);
    assert_eq!(pre[0].id, garden.id);
    assert!(store.followed_projects(author.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn approvals_settle_once() {
    let accounts = Accounts::new(Store::in_memory().await.unwrap());
    let store = accounts.store();
    let author = register(&accounts, "author@example.com", Roles::member()).await;
    let p = store.insert_project(author.id, project("Bike Share")).await.unwrap();

    let err = store.record_approval(author.id, p.id, 0).await.unwrap_err();
    assert_eq!(err.field_errors()[0].field, "amount");

    let a = store.record_approval(author.id, p.id, 2_500).await.unwrap();
    assert_eq!(a.status, ApprovalStatus::Pending);
    let settled = store
        .settle_approval(a.id, ApprovalStatus::Approved)
        .await
        .unwrap();
    assert_eq!(settled.status, ApprovalStatus::Approved);
    assert!(store
        .settle_approval(a.id, ApprovalStatus::Declined)
        .await
        .is_err());

    let listed = store.approvals_for_project(p.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, ApprovalStatus::Approved);
    assert_eq!(listed[0].amount_cents, 2_500);
}

#[tokio::test]
async fn destroying_a_user_removes_dependents_but_keeps_projects() {
    let accounts = Accounts::new(Store::in_memory().await.unwrap());
    let store = accounts.store();
    let user = register(&accounts, "leaver@example.com", Roles::member()).await;
    let p = store.insert_project(user.id, project("Tool Library")).await.unwrap();
    accounts
        .link_identity(
            user.id,
            NewIdentity {
                provider: Provider::Box,
                uid: None,
                access_token: "box".into(),
                access_secret: None,
            },
        )
        .await
        .unwrap();
    store
        .add_connection(user.id, p.id, &ConnectionKind::Follower)
        .await
        .unwrap();
    store.record_approval(user.id, p.id, 100).await.unwrap();
    store.insert_message(user.id, Some(p.id), "bye").await.unwrap();

    accounts.destroy_user(user.id).await.unwrap();

    assert!(store.identities_for(user.id).await.unwrap().is_empty());
    assert!(store.followed_projects(user.id).await.unwrap().is_empty());
    assert!(store.approvals_for_project(p.id).await.unwrap().is_empty());
    assert!(matches!(
        store.get_user(user.id).await.unwrap_err(),
        PledgeError::NotFound { kind: "user", .. }
    ));
    assert_eq!(store.get_project(p.id).await.unwrap().author_id, user.id);
    assert!(matches!(
        accounts.destroy_user(user.id).await.unwrap_err(),
        PledgeError::NotFound { .. }
    ));
}

#[tokio::test]
async fn message_listing_follows_scope() {
    let accounts = Accounts::new(Store::in_memory().await.unwrap());
    let store = accounts.store();
    let admin = register(&accounts, "admin@example.com", Roles::admin()).await;
    let a = register(&accounts, "a@example.com", Roles::member()).await;
    let b = register(&accounts, "b@example.com", Roles::member()).await;
    store.insert_message(a.id, None, "from a").await.unwrap();
    store.insert_message(b.id, None, "from b").await.unwrap();

    let all = store.list_messages(scope(Actor::from(&admin))).await.unwrap();
    assert_eq!(all.len(), 2);
    let own = store.list_messages(scope(Actor::from(&a))).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].body, "from a");
}

#[tokio::test]
async fn policy_scenario_over_stored_messages() {
    let accounts = Accounts::new(Store::in_memory().await.unwrap());
    let store = accounts.store();
    let admin = register(&accounts, "admin@example.com", Roles::admin()).await;
    let a = register(&accounts, "a@example.com", Roles::member()).await;
    let b = register(&accounts, "b@example.com", Roles::default()).await;

    let msg = store.insert_message(a.id, None, "update").await.unwrap();
    assert!(authorize(Actor::from(&a), Action::Create, &msg).is_ok());
    assert!(matches!(
        authorize(Actor::from(&b), Action::Create, &msg),
        Err(PledgeError::NotAuthorized { .. })
    ));
    assert!(authorize(Actor::from(&b), Action::Destroy, &msg).is_err());
    assert!(authorize(Actor::from(&admin), Action::Destroy, &msg).is_ok());
}

#[tokio::test]
async fn box_document_id_persists() {
    let accounts = Accounts::new(Store::in_memory().await.unwrap());
    let store = accounts.store();
    let author = register(&accounts, "author@example.com", Roles::member()).await;
    let p = store.insert_project(author.id, project("Makerspace")).await.unwrap();
    assert!(p.box_document_id.is_none());
    store.set_box_document_id(p.id, "doc-9").await.unwrap();
    assert_eq!(
        store.get_project(p.id).await.unwrap().box_document_id.as_deref(),
        Some("doc-9")
    );
}
