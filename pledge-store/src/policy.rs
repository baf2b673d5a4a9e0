//! Authorization policy: who may create, update or destroy an authored record.
//!
//! Decisions are pure functions of the actor's role flags and the resource's
//! author at call time.
use crate::model::{Approval, Message, Project, Roles, User};
use pledge_common::{PledgeError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Destroy,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
        })
    }
}

impl FromStr for Action {
    type Err = PledgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_end_matches('?').to_ascii_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "destroy" => Ok(Action::Destroy),
            other => Err(PledgeError::validation(
                "action",
                format!("unknown action '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Anything with a single owning author.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Message {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Project {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Approval {
    fn author_id(&self) -> Uuid {
        self.user_id
    }
}

/// A record not yet written, known only by its prospective author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draft {
    pub author_id: Uuid,
}

impl Authored for Draft {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// The actor as the policy sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub roles: Roles,
}

impl From<&User> for Actor {
    fn from(u: &User) -> Self {
        Actor {
            id: u.id,
            roles: u.roles,
        }
    }
}

pub fn decide<R: Authored + ?Sized>(actor: Actor, action: Action, resource: &R) -> Decision {
    let is_author = resource.author_id() == actor.id;
    let allowed = match action {
        Action::Create => is_author && actor.roles.is_member_or_admin(),
        Action::Update | Action::Destroy => actor.roles.admin || is_author,
    };
    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// [`decide`], with a denial turned into [`PledgeError::NotAuthorized`].
pub fn authorize<R: Authored + ?Sized>(actor: Actor, action: Action, resource: &R) -> Result<()> {
    match decide(actor, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::info!(actor=%actor.id, %action, author=%resource.author_id(), "policy.denied");
            Err(PledgeError::NotAuthorized {
                action: action.to_string(),
            })
        }
    }
}

/// What a listing query may return for an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Unrestricted,
    /// Narrowing is up to the query layer; the store shows own records only.
    RoleFiltered { actor: Uuid, roles: Roles },
}

pub fn scope(actor: Actor) -> Scope {
    if actor.roles.admin {
        Scope::Unrestricted
    } else {
        Scope::RoleFiltered {
            actor: actor.id,
            roles: actor.roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn actor(roles: Roles) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            roles,
        }
    }

    fn message_by(author: Uuid) -> Message {
        Message {
            id: Uuid::new_v4(),
            author_id: author,
            project_id: None,
            body: "hello backers".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn member_may_create_own_message() {
        let a = actor(Roles::member());
        assert_eq!(decide(a, Action::Create, &message_by(a.id)), Decision::Allow);
    }

    #[test]
    fn roleless_user_may_not_create_someone_elses_message() {
        let a = actor(Roles::member());
        let b = actor(Roles::default());
        assert_eq!(decide(b, Action::Create, &message_by(a.id)), Decision::Deny);
    }

    #[test]
    fn create_requires_a_role_even_for_the_author() {
        let p = actor(Roles::prospect());
        assert_eq!(decide(p, Action::Create, &message_by(p.id)), Decision::Deny);
    }

    #[test]
    fn admin_cannot_create_on_behalf_of_others() {
        let admin = actor(Roles::admin());
        let other = Uuid::new_v4();
        assert_eq!(decide(admin, Action::Create, &message_by(other)), Decision::Deny);
    }

    #[test]
    fn admin_may_destroy_anything() {
        let admin = actor(Roles::admin());
        let msg = message_by(Uuid::new_v4());
        assert!(decide(admin, Action::Destroy, &msg).is_allowed());
        assert!(decide(admin, Action::Update, &msg).is_allowed());
    }

    #[test]
    fn author_may_update_and_destroy_without_roles() {
        let a = actor(Roles::default());
        let msg = message_by(a.id);
        assert!(decide(a, Action::Update, &msg).is_allowed());
        assert!(decide(a, Action::Destroy, &msg).is_allowed());
    }

    #[test]
    fn stranger_is_denied_destroy() {
        let stranger = actor(Roles::member());
        let err = authorize(stranger, Action::Destroy, &message_by(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, PledgeError::NotAuthorized { ref action } if action == "destroy"));
    }

    #[test]
    fn scopes_follow_admin_flag() {
        let admin = actor(Roles::admin());
        assert_eq!(scope(admin), Scope::Unrestricted);
        let m = actor(Roles::member());
        assert_eq!(
            scope(m),
            Scope::RoleFiltered {
                actor: m.id,
                roles: m.roles
            }
        );
    }

    #[test]
    fn drafts_are_judged_like_stored_records() {
        let m = actor(Roles::member());
        let draft = Draft { author_id: m.id };
        assert!(decide(m, Action::Create, &draft).is_allowed());
        let p = actor(Roles::prospect());
        assert!(!decide(p, Action::Create, &Draft { author_id: p.id }).is_allowed());
    }

    #[test]
    fn actions_parse_with_question_mark() {
        assert_eq!("create?".parse::<Action>().unwrap(), Action::Create);
        assert_eq!("Destroy".parse::<Action>().unwrap(), Action::Destroy);
        assert!("publish".parse::<Action>().is_err());
    }
}
