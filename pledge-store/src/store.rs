//! SQLite-backed persistence for accounts, identities, projects and approvals.
//!
//! All ids are stored as TEXT uuids and timestamps as RFC 3339 TEXT. Lookups on
//! email and login compare with `COLLATE NOCASE`, matching the unique indexes
//! declared in the migrations.
use crate::model::{
    Approval, ApprovalStatus, Connection, ConnectionKind, Identity, Message, NewIdentity,
    NewProject, Project, Roles, User,
};
use crate::policy::Scope;
use chrono::{DateTime, Utc};
use pledge_common::{PledgeError, Provider, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, login, name, admin, member, prospect, password_hash, \
                            session_token, created_at, updated_at";
const PROJECT_COLUMNS: &str =
    "id, author_id, name, description, document_url, box_document_id, created_at, updated_at";

/// Map a driver error, turning unique-index violations into field errors.
fn db_err(err: sqlx::Error) -> PledgeError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            let msg = db.message();
            let field = if msg.contains("users.email") {
                "email"
            } else if msg.contains("users.login") {
                "login"
            } else if msg.contains("users.session_token") {
                "session_token"
            } else {
                "record"
            };
            return PledgeError::validation(field, "has already been taken");
        }
    }
    PledgeError::Storage(err.to_string())
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| PledgeError::Storage(format!("bad uuid '{raw}': {e}")))
}

fn get_id(r: &SqliteRow, col: &str) -> Result<Uuid> {
    let raw: String = r.try_get(col).map_err(db_err)?;
    parse_id(&raw)
}

fn get_ts(r: &SqliteRow, col: &str) -> Result<DateTime<Utc>> {
    r.try_get::<DateTime<Utc>, _>(col).map_err(db_err)
}

fn user_from_row(r: &SqliteRow) -> Result<User> {
    Ok(User {
        id: get_id(r, "id")?,
        email: r.try_get("email").map_err(db_err)?,
        login: r.try_get("login").map_err(db_err)?,
        name: r.try_get("name").map_err(db_err)?,
        roles: Roles {
            admin: r.try_get::<bool, _>("admin").map_err(db_err)?,
            member: r.try_get::<bool, _>("member").map_err(db_err)?,
            prospect: r.try_get::<bool, _>("prospect").map_err(db_err)?,
        },
        password_hash: r.try_get("password_hash").map_err(db_err)?,
        session_token: r.try_get("session_token").map_err(db_err)?,
        created_at: get_ts(r, "created_at")?,
        updated_at: get_ts(r, "updated_at")?,
    })
}

fn identity_from_row(r: &SqliteRow) -> Result<Identity> {
    let provider: String = r.try_get("provider").map_err(db_err)?;
    Ok(Identity {
        id: get_id(r, "id")?,
        user_id: get_id(r, "user_id")?,
        provider: Provider::from_str(&provider)?,
        uid: r.try_get("uid").map_err(db_err)?,
        access_token: r.try_get("access_token").map_err(db_err)?,
        access_secret: r.try_get("access_secret").map_err(db_err)?,
        created_at: get_ts(r, "created_at")?,
    })
}

fn project_from_row(r: &SqliteRow) -> Result<Project> {
    Ok(Project {
        id: get_id(r, "id")?,
        author_id: get_id(r, "author_id")?,
        name: r.try_get("name").map_err(db_err)?,
        description: r.try_get("description").map_err(db_err)?,
        document_url: r.try_get("document_url").map_err(db_err)?,
        box_document_id: r.try_get("box_document_id").map_err(db_err)?,
        created_at: get_ts(r, "created_at")?,
        updated_at: get_ts(r, "updated_at")?,
    })
}

fn message_from_row(r: &SqliteRow) -> Result<Message> {
    let project: Option<String> = r.try_get("project_id").map_err(db_err)?;
    Ok(Message {
        id: get_id(r, "id")?,
        author_id: get_id(r, "author_id")?,
        project_id: project.as_deref().map(parse_id).transpose()?,
        body: r.try_get("body").map_err(db_err)?,
        created_at: get_ts(r, "created_at")?,
    })
}

fn approval_from_row(r: &SqliteRow) -> Result<Approval> {
    let status: String = r.try_get("status").map_err(db_err)?;
    Ok(Approval {
        id: get_id(r, "id")?,
        user_id: get_id(r, "user_id")?,
        project_id: get_id(r, "project_id")?,
        amount_cents: r.try_get("amount_cents").map_err(db_err)?,
        status: ApprovalStatus::from_str(&status)?,
        created_at: get_ts(r, "created_at")?,
        updated_at: get_ts(r, "updated_at")?,
    })
}

#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .map_err(|e| PledgeError::Config(format!("database_url '{url}': {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);
        let mut pool_opts = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            // Every connection to :memory: is its own database.
            pool_opts = pool_opts
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_opts.connect_with(opts).await.map_err(db_err)?;
        info!(url=%url, "store.connect");
        Ok(Self { pool })
    }

    /// Fresh migrated in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let store = Self::connect("sqlite::memory:").await?;
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PledgeError::Storage(format!("migration failed: {e}")))?;
        info!("store.migrate");
        Ok(())
    }

    // ---- users ----

    pub async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool> {
        let row = sqlx::query(
            r#"SELECT COUNT(*) AS n FROM users
               WHERE email = ?1 COLLATE NOCASE AND (?2 IS NULL OR id <> ?2)"#,
        )
        .bind(email.trim())
        .bind(except.map(|id| id.to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.try_get::<i64, _>("n").map_err(db_err)? > 0)
    }

    pub async fn login_taken(&self, login: &str, except: Option<Uuid>) -> Result<bool> {
        let row = sqlx::query(
            r#"SELECT COUNT(*) AS n FROM users
               WHERE login = ?1 COLLATE NOCASE AND (?2 IS NULL OR id <> ?2)"#,
        )
        .bind(login.trim())
        .bind(except.map(|id| id.to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.try_get::<i64, _>("n").map_err(db_err)? > 0)
    }

    pub async fn insert_user(&self, user: &User) -> Result<()> {
        let res = sqlx::query(
            r#"INSERT INTO users
               (id, email, login, name, admin, member, prospect, password_hash,
                session_token, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
        )
        .bind(user.id.to_string())
        .bind(user.email.as_str())
        .bind(user.login.as_deref())
        .bind(user.name.as_deref())
        .bind(user.roles.admin)
        .bind(user.roles.member)
        .bind(user.roles.prospect)
        .bind(user.password_hash.as_deref())
        .bind(user.session_token.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        info!(user_id=%user.id, rows=res.rows_affected(), "store.insert_user");
        Ok(())
    }

    /// Replace the stored hash. The session token column is never written here.
    pub async fn update_password(&self, id: Uuid, hash: Option<&str>) -> Result<()> {
        let res = sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(hash)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(PledgeError::not_found("user", id));
        }
        info!(user_id=%id, "store.update_password");
        Ok(())
    }

    pub async fn update_roles(&self, id: Uuid, roles: Roles) -> Result<()> {
        let res = sqlx::query(
            "UPDATE users SET admin = ?1, member = ?2, prospect = ?3, updated_at = ?4 WHERE id = ?5",
        )
        .bind(roles.admin)
        .bind(roles.member)
        .bind(roles.prospect)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(PledgeError::not_found("user", id));
        }
        info!(user_id=%id, ?roles, "store.update_roles");
        Ok(())
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match row {
            Some(r) => user_from_row(&r),
            None => Err(PledgeError::not_found("user", id)),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE login = ? COLLATE NOCASE"
        ))
        .bind(login.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_user_by_session_token(&self, token: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE session_token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Remove a user and everything that hangs off it, in one transaction.
    /// Authored projects stay behind.
    pub async fn destroy_user(&self, id: Uuid) -> Result<()> {
        let id_s = id.to_string();
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut removed = 0u64;
        for sql in [
            "DELETE FROM identities WHERE user_id = ?",
            "DELETE FROM connections WHERE user_id = ?",
            "DELETE FROM approvals WHERE user_id = ?",
            "DELETE FROM messages WHERE author_id = ?",
        ] {
            removed += sqlx::query(sql)
                .bind(id_s.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?
                .rows_affected();
        }
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id_s.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            // dropping tx rolls back
            return Err(PledgeError::not_found("user", id));
        }
        tx.commit().await.map_err(db_err)?;
        info!(user_id=%id, dependents=removed, "store.destroy_user");
        Ok(())
    }

    // ---- identities ----

    pub async fn insert_identity(&self, user_id: Uuid, new: NewIdentity) -> Result<Identity> {
        let identity = Identity {
            id: Uuid::new_v4(),
            user_id,
            provider: new.provider,
            uid: new.uid,
            access_token: new.access_token,
            access_secret: new.access_secret,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO identities
               (id, user_id, provider, uid, access_token, access_secret, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(identity.id.to_string())
        .bind(user_id.to_string())
        .bind(identity.provider.as_str())
        .bind(identity.uid.as_deref())
        .bind(identity.access_token.as_str())
        .bind(identity.access_secret.as_deref())
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        info!(
            user_id=%user_id,
            identity_id=%identity.id,
            provider=%identity.provider,
            "store.insert_identity"
        );
        Ok(identity)
    }

    pub async fn identities_for(&self, user_id: Uuid) -> Result<Vec<Identity>> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, provider, uid, access_token, access_secret, created_at
               FROM identities WHERE user_id = ?
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(identity_from_row).collect()
    }

    /// Oldest identity the user holds for `provider`.
    pub async fn identity_for(&self, user_id: Uuid, provider: Provider) -> Result<Option<Identity>> {
        let row = sqlx::query(
            r#"SELECT id, user_id, provider, uid, access_token, access_secret, created_at
               FROM identities WHERE user_id = ?1 AND provider = ?2
               ORDER BY created_at ASC, rowid ASC
               LIMIT 1"#,
        )
        .bind(user_id.to_string())
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        debug!(user_id=%user_id, %provider, found=row.is_some(), "store.identity_for");
        row.as_ref().map(identity_from_row).transpose()
    }

    pub async fn delete_identity(&self, user_id: Uuid, identity_id: Uuid) -> Result<Identity> {
        let row = sqlx::query(
            r#"DELETE FROM identities WHERE id = ?1 AND user_id = ?2
               RETURNING id, user_id, provider, uid, access_token, access_secret, created_at"#,
        )
        .bind(identity_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        match row {
            Some(r) => {
                info!(user_id=%user_id, identity_id=%identity_id, "store.delete_identity");
                identity_from_row(&r)
            }
            None => Err(PledgeError::not_found("identity", identity_id)),
        }
    }

    // ---- projects ----

    pub async fn insert_project(&self, author_id: Uuid, new: NewProject) -> Result<Project> {
        if new.name.trim().is_empty() {
            return Err(PledgeError::validation("name", "can't be blank"));
        }
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            author_id,
            name: new.name.trim().to_string(),
            description: new.description,
            document_url: new.document_url,
            box_document_id: None,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            r#"INSERT INTO projects
               (id, author_id, name, description, document_url, box_document_id, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7)"#,
        )
        .bind(project.id.to_string())
        .bind(author_id.to_string())
        .bind(project.name.as_str())
        .bind(project.description.as_deref())
        .bind(project.document_url.as_deref())
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        info!(project_id=%project.id, author_id=%author_id, "store.insert_project");
        Ok(project)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Project> {
        let row = sqlx::query(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match row {
            Some(r) => project_from_row(&r),
            None => Err(PledgeError::not_found("project", id)),
        }
    }

    pub async fn set_box_document_id(&self, project_id: Uuid, document_id: &str) -> Result<()> {
        let res = sqlx::query(
            "UPDATE projects SET box_document_id = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(document_id)
        .bind(Utc::now())
        .bind(project_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(PledgeError::not_found("project", project_id));
        }
        info!(project_id=%project_id, document_id, "store.set_box_document_id");
        Ok(())
    }

    // ---- connections ----

    /// Record a connection; recording the same one twice is a no-op.
    pub async fn add_connection(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        kind: &ConnectionKind,
    ) -> Result<Connection> {
        self.get_project(project_id).await?;
        let fresh = Uuid::new_v4();
        let res = sqlx::query(
            r#"INSERT INTO connections (id, user_id, project_id, kind, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(user_id, project_id, kind) DO NOTHING"#,
        )
        .bind(fresh.to_string())
        .bind(user_id.to_string())
        .bind(project_id.to_string())
        .bind(kind.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        let row = sqlx::query(
            r#"SELECT id, created_at FROM connections
               WHERE user_id = ?1 AND project_id = ?2 AND kind = ?3"#,
        )
        .bind(user_id.to_string())
        .bind(project_id.to_string())
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        info!(
            user_id=%user_id,
            project_id=%project_id,
            kind=%kind,
            inserted=res.rows_affected(),
            "store.add_connection"
        );
        Ok(Connection {
            id: get_id(&row, "id")?,
            user_id,
            project_id,
            kind: kind.clone(),
            created_at: get_ts(&row, "created_at")?,
        })
    }

    pub async fn projects_for(&self, user_id: Uuid, kind: &ConnectionKind) -> Result<Vec<Project>> {
        let rows = sqlx::query(
            r#"SELECT p.id, p.author_id, p.name, p.description, p.document_url,
                      p.box_document_id, p.created_at, p.updated_at
               FROM connections c
               JOIN projects p ON p.id = c.project_id
               WHERE c.user_id = ?1 AND c.kind = ?2
               ORDER BY c.created_at ASC, c.rowid ASC"#,
        )
        .bind(user_id.to_string())
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        debug!(user_id=%user_id, kind=%kind, rows=rows.len(), "store.projects_for");
        rows.iter().map(project_from_row).collect()
    }

    pub async fn followed_projects(&self, user_id: Uuid) -> Result<Vec<Project>> {
        self.projects_for(user_id, &ConnectionKind::Follower).await
    }

    pub async fn precommitted_projects(&self, user_id: Uuid) -> Result<Vec<Project>> {
        self.projects_for(user_id, &ConnectionKind::Precommitted)
            .await
    }

    // ---- messages ----

    pub async fn insert_message(
        &self,
        author_id: Uuid,
        project_id: Option<Uuid>,
        body: &str,
    ) -> Result<Message> {
        if body.trim().is_empty() {
            return Err(PledgeError::validation("body", "can't be blank"));
        }
        let message = Message {
            id: Uuid::new_v4(),
            author_id,
            project_id,
            body: body.to_string(),
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO messages (id, author_id, project_id, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(message.id.to_string())
        .bind(author_id.to_string())
        .bind(project_id.map(|p| p.to_string()))
        .bind(message.body.as_str())
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        info!(message_id=%message.id, author_id=%author_id, "store.insert_message");
        Ok(message)
    }

    pub async fn list_messages(&self, scope: Scope) -> Result<Vec<Message>> {
        let author = match scope {
            Scope::Unrestricted => None,
            Scope::RoleFiltered { actor, .. } => Some(actor.to_string()),
        };
        let rows = sqlx::query(
            r#"SELECT id, author_id, project_id, body, created_at FROM messages
               WHERE (?1 IS NULL OR author_id = ?1)
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(author)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        debug!(?scope, rows=rows.len(), "store.list_messages");
        rows.iter().map(message_from_row).collect()
    }

    // ---- approvals ----

    pub async fn record_approval(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        amount_cents: i64,
    ) -> Result<Approval> {
        if amount_cents <= 0 {
            return Err(PledgeError::validation("amount", "must be greater than 0"));
        }
        self.get_project(project_id).await?;
        let now = Utc::now();
        let approval = Approval {
            id: Uuid::new_v4(),
            user_id,
            project_id,
            amount_cents,
            status: ApprovalStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            r#"INSERT INTO approvals (id, user_id, project_id, amount_cents, status, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(approval.id.to_string())
        .bind(user_id.to_string())
        .bind(project_id.to_string())
        .bind(amount_cents)
        .bind(approval.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        info!(
            approval_id=%approval.id,
            user_id=%user_id,
            project_id=%project_id,
            amount_cents,
            "store.record_approval"
        );
        Ok(approval)
    }

    pub async fn get_approval(&self, id: Uuid) -> Result<Approval> {
        let row = sqlx::query(
            r#"SELECT id, user_id, project_id, amount_cents, status, created_at, updated_at
               FROM approvals WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        match row {
            Some(r) => approval_from_row(&r),
            None => Err(PledgeError::not_found("approval", id)),
        }
    }

    /// Move a pending approval to `next`. Settled approvals are final.
    pub async fn settle_approval(&self, id: Uuid, next: ApprovalStatus) -> Result<Approval> {
        let mut current = self.get_approval(id).await?;
        if !current.status.can_become(next) {
            warn!(
                approval_id=%id,
                from=current.status.as_str(),
                to=next.as_str(),
                "store.settle_approval.rejected"
            );
            return Err(PledgeError::validation(
                "status",
                format!("cannot change from {} to {}", current.status.as_str(), next.as_str()),
            ));
        }
        let now = Utc::now();
        // Guard on the old status so two racing settlements cannot both win.
        let res = sqlx::query(
            "UPDATE approvals SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(next.as_str())
        .bind(now)
        .bind(id.to_string())
        .bind(current.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(PledgeError::validation("status", "was changed concurrently"));
        }
        info!(approval_id=%id, status=next.as_str(), "store.settle_approval");
        current.status = next;
        current.updated_at = now;
        Ok(current)
    }

    pub async fn approvals_for_project(&self, project_id: Uuid) -> Result<Vec<Approval>> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, project_id, amount_cents, status, created_at, updated_at
               FROM approvals WHERE project_id = ?
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(approval_from_row).collect()
    }
}
