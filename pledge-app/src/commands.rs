//! One handler per subcommand. Each prints a JSON document on success.
use crate::cli::{Acting, Command};
use crate::tether::Tether;
use anyhow::Result;
use pledge_common::{PledgeError, Provider};
use pledge_dispatch::DispatchAction;
use pledge_store::{
    authorize, decide, scope, Action, Actor, ApprovalStatus, ConnectionKind, Draft, NewIdentity,
    NewProject, NewUser, Roles, User,
};
use serde::Serialize;
use serde_json::json;

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve `--user` by email first, then login.
async fn acting_user(t: &Tether, acting: &Acting) -> pledge_common::Result<User> {
    let store = t.store();
    if let Some(user) = store.find_user_by_email(&acting.user).await? {
        return Ok(user);
    }
    store
        .find_user_by_login(&acting.user)
        .await?
        .ok_or_else(|| PledgeError::not_found("user", &acting.user))
}

async fn connect(t: &Tether, acting: &Acting, project: uuid::Uuid, kind: ConnectionKind) -> Result<()> {
    let user = acting_user(t, acting).await?;
    let connection = t.store().add_connection(user.id, project, &kind).await?;
    emit(&connection)
}

async fn dispatch(t: &Tether, acting: &Acting, action: DispatchAction) -> Result<()> {
    let user = acting_user(t, acting).await?;
    let outcome = t.dispatcher.dispatch(user.id, action).await?;
    emit(&outcome)
}

pub async fn run(t: &Tether, command: Command) -> Result<()> {
    match command {
        Command::Migrate => {
            // schema is applied while building the tether
            emit(&json!({ "migrated": true }))
        }
        Command::Register {
            email,
            login,
            name,
            password,
            admin,
            member,
            prospect,
        } => {
            let user = t
                .accounts
                .register(NewUser {
                    email,
                    login,
                    name,
                    password,
                    roles: Roles {
                        admin,
                        member,
                        prospect,
                    },
                })
                .await?;
            emit(&json!({ "user": user, "session_token": user.session_token }))
        }
        Command::Login { who, password } => {
            let user = t.accounts.authenticate(&who, &password).await?;
            emit(&json!({ "user": user, "session_token": user.session_token }))
        }
        Command::Passwd { acting, password } => {
            let user = acting_user(t, &acting).await?;
            let user = t.accounts.change_password(user.id, password).await?;
            emit(&json!({ "user": user, "has_password": user.has_password() }))
        }
        Command::Link {
            acting,
            provider,
            token,
            secret,
            uid,
        } => {
            let user = acting_user(t, &acting).await?;
            let provider: Provider = provider.parse()?;
            let identity = t
                .accounts
                .link_identity(
                    user.id,
                    NewIdentity {
                        provider,
                        uid,
                        access_token: token,
                        access_secret: secret,
                    },
                )
                .await?;
            emit(&identity)
        }
        Command::Unlink { acting, identity } => {
            let user = acting_user(t, &acting).await?;
            let removed = t.accounts.unlink_identity(user.id, identity).await?;
            emit(&removed)
        }
        Command::Unregister { acting } => {
            let user = acting_user(t, &acting).await?;
            t.accounts.destroy_user(user.id).await?;
            emit(&json!({ "destroyed": user.id }))
        }
        Command::Tweet { acting, body } => {
            dispatch(t, &acting, DispatchAction::TwitterStatus { body }).await
        }
        Command::Dm { acting, to, body } => {
            dispatch(
                t,
                &acting,
                DispatchAction::TwitterDirectMessage {
                    recipient: to,
                    body,
                },
            )
            .await
        }
        Command::LinkedinMail {
            acting,
            to,
            subject,
            body,
        } => {
            dispatch(
                t,
                &acting,
                DispatchAction::LinkedinMail {
                    recipient_id: to,
                    subject,
                    body,
                },
            )
            .await
        }
        Command::BoxView {
            acting,
            project,
            document,
            duration,
        } => {
            let action = match (project, document) {
                (Some(project_id), _) => DispatchAction::BoxProjectViewUrl { project_id },
                (None, Some(document_id)) => DispatchAction::BoxSession {
                    document_id,
                    duration,
                },
                (None, None) => {
                    return Err(PledgeError::validation("project", "or --document is required").into());
                }
            };
            dispatch(t, &acting, action).await
        }
        Command::CreateProject {
            acting,
            name,
            description,
            document_url,
        } => {
            let user = acting_user(t, &acting).await?;
            authorize(Actor::from(&user), Action::Create, &Draft { author_id: user.id })?;
            let project = t
                .store()
                .insert_project(
                    user.id,
                    NewProject {
                        name,
                        description,
                        document_url,
                    },
                )
                .await?;
            emit(&project)
        }
        Command::Post {
            acting,
            project,
            body,
        } => {
            let user = acting_user(t, &acting).await?;
            authorize(Actor::from(&user), Action::Create, &Draft { author_id: user.id })?;
            let message = t.store().insert_message(user.id, project, &body).await?;
            emit(&message)
        }
        Command::Messages { acting } => {
            let user = acting_user(t, &acting).await?;
            let messages = t.store().list_messages(scope(Actor::from(&user))).await?;
            emit(&messages)
        }
        Command::Follow { acting, project } => {
            connect(t, &acting, project, ConnectionKind::Follower).await
        }
        Command::Precommit { acting, project } => {
            connect(t, &acting, project, ConnectionKind::Precommitted).await
        }
        Command::Projects { acting, kind } => {
            let user = acting_user(t, &acting).await?;
            let kind: ConnectionKind = kind.parse()?;
            let projects = t.store().projects_for(user.id, &kind).await?;
            emit(&projects)
        }
        Command::Approve {
            acting,
            project,
            amount_cents,
        } => {
            let user = acting_user(t, &acting).await?;
            let approval = t
                .store()
                .record_approval(user.id, project, amount_cents)
                .await?;
            emit(&approval)
        }
        Command::Settle {
            acting,
            approval,
            status,
        } => {
            let user = acting_user(t, &acting).await?;
            let next: ApprovalStatus = status.parse()?;
            let current = t.store().get_approval(approval).await?;
            authorize(Actor::from(&user), Action::Update, &current)?;
            let settled = t.store().settle_approval(approval, next).await?;
            emit(&settled)
        }
        Command::Can {
            acting,
            action,
            project,
        } => {
            let user = acting_user(t, &acting).await?;
            let action: Action = action.parse()?;
            let project = t.store().get_project(project).await?;
            let decision = decide(Actor::from(&user), action, &project);
            emit(&json!({ "action": action, "project": project.id, "decision": decision }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tether::build_from_config;
    use pledge_config::PledgeConfigLoader;

    async fn tether() -> Tether {
        let cfg = PledgeConfigLoader::new()
            .with_yaml_str("database_url: 'sqlite::memory:'")
            .load()
            .unwrap();
        build_from_config(&cfg, true).await.unwrap()
    }

    fn acting(user: &str) -> Acting {
        Acting { user: user.into() }
    }

    fn register(email: &str, member: bool) -> Command {
        Command::Register {
            email: email.into(),
            login: None,
            name: None,
            password: Some("secret1".into()),
            admin: false,
            member,
            prospect: !member,
        }
    }

    #[tokio::test]
    async fn prospects_cannot_create_projects() {
        let t = tether().await;
        run(&t, register("pat@example.com", false)).await.unwrap();
        let err = run(
            &t,
            Command::CreateProject {
                acting: acting("pat@example.com"),
                name: "Kiln".into(),
                description: None,
                document_url: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PledgeError>(),
            Some(PledgeError::NotAuthorized { .. })
        ));
    }

    #[tokio::test]
    async fn members_create_and_follow_projects() {
        let t = tether().await;
        run(&t, register("mia@example.com", true)).await.unwrap();
        run(
            &t,
            Command::CreateProject {
                acting: acting("mia@example.com"),
                name: "Kiln".into(),
                description: None,
                document_url: None,
            },
        )
        .await
        .unwrap();
        let user = t.store().find_user_by_email("mia@example.com").await.unwrap().unwrap();
        let project = t.store().insert_project(user.id, NewProject {
            name: "Loom".into(),
            ..NewProject::default()
        })
        .await
        .unwrap();
        run(
            &t,
            Command::Follow {
                acting: acting("MIA@example.com"),
                project: project.id,
            },
        )
        .await
        .unwrap();
        let followed = t.store().followed_projects(user.id).await.unwrap();
        assert_eq!(followed.len(), 1);
    }

    #[tokio::test]
    async fn unknown_acting_user_is_not_found() {
        let t = tether().await;
        let err = run(&t, Command::Messages { acting: acting("ghost") })
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PledgeError>(),
            Some(PledgeError::NotFound { kind: "user", .. })
        ));
    }

    #[tokio::test]
    async fn dispatch_without_identity_fails_cleanly() {
        let t = tether().await;
        run(&t, register("tia@example.com", true)).await.unwrap();
        let err = run(
            &t,
            Command::Tweet {
                acting: acting("tia@example.com"),
                body: "hello".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PledgeError>(),
            Some(PledgeError::NoLinkedIdentity { provider: Provider::Twitter })
        ));
    }
}
