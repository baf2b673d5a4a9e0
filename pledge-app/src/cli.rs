use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "pledge", version, about = "Crowdfunding accounts, projects and provider dispatch")]
pub struct Cli {
    /// YAML configuration file; skipped when missing.
    #[arg(long, short, env = "PLEDGE_CONFIG", default_value = "pledge.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Who is acting: an email address or login handle.
#[derive(Debug, Args)]
pub struct Acting {
    #[arg(long, short)]
    pub user: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or upgrade the database schema.
    Migrate,
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        login: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, env = "PLEDGE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        admin: bool,
        #[arg(long)]
        member: bool,
        #[arg(long)]
        prospect: bool,
    },
    /// Check a password and print the account's session token.
    Login {
        #[arg(long)]
        who: String,
        #[arg(long, env = "PLEDGE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Set or clear (no --password) an account password.
    Passwd {
        #[command(flatten)]
        acting: Acting,
        #[arg(long, env = "PLEDGE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Store an OAuth identity for a provider.
    Link {
        #[command(flatten)]
        acting: Acting,
        #[arg(long)]
        provider: String,
        #[arg(long, env = "PLEDGE_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long, env = "PLEDGE_ACCESS_SECRET", hide_env_values = true)]
        secret: Option<String>,
        #[arg(long)]
        uid: Option<String>,
    },
    Unlink {
        #[command(flatten)]
        acting: Acting,
        #[arg(long)]
        identity: Uuid,
    },
    /// Delete an account and everything attached to it except authored projects.
    Unregister {
        #[command(flatten)]
        acting: Acting,
    },
    Tweet {
        #[command(flatten)]
        acting: Acting,
        #[arg(long)]
        body: String,
    },
    Dm {
        #[command(flatten)]
        acting: Acting,
        /// Twitter handle, with or without `@`.
        #[arg(long)]
        to: String,
        #[arg(long)]
        body: String,
    },
    LinkedinMail {
        #[command(flatten)]
        acting: Acting,
        /// LinkedIn member id.
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
    },
    /// Open a Box viewer session for a project or a raw document id.
    BoxView {
        #[command(flatten)]
        acting: Acting,
        #[arg(long, conflicts_with = "document", required_unless_present = "document")]
        project: Option<Uuid>,
        #[arg(long)]
        document: Option<String>,
        /// Session length in minutes.
        #[arg(long, requires = "document")]
        duration: Option<u32>,
    },
    CreateProject {
        #[command(flatten)]
        acting: Acting,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Public URL of the pitch document.
        #[arg(long)]
        document_url: Option<String>,
    },
    /// Post a message, optionally on a project.
    Post {
        #[command(flatten)]
        acting: Acting,
        #[arg(long)]
        project: Option<Uuid>,
        #[arg(long)]
        body: String,
    },
    /// List messages visible to the acting user.
    Messages {
        #[command(flatten)]
        acting: Acting,
    },
    Follow {
        #[command(flatten)]
        acting: Acting,
        #[arg(long)]
        project: Uuid,
    },
    Precommit {
        #[command(flatten)]
        acting: Acting,
        #[arg(long)]
        project: Uuid,
    },
    /// List projects connected to the acting user.
    Projects {
        #[command(flatten)]
        acting: Acting,
        #[arg(long, default_value = "follower")]
        kind: String,
    },
    /// Record a pending payment approval.
    Approve {
        #[command(flatten)]
        acting: Acting,
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        amount_cents: i64,
    },
    /// Move a pending approval to approved or declined.
    Settle {
        #[command(flatten)]
        acting: Acting,
        #[arg(long)]
        approval: Uuid,
        #[arg(long)]
        status: String,
    },
    /// Ask the policy whether the acting user may act on a project.
    Can {
        #[command(flatten)]
        acting: Acting,
        /// create, update or destroy
        #[arg(long)]
        action: String,
        #[arg(long)]
        project: Uuid,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn box_view_takes_project_or_document() {
        let project = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from(["pledge", "box-view", "-u", "ann", "--project", &project])
            .unwrap();
        assert!(matches!(cli.command, Command::BoxView { project: Some(_), .. }));
        assert!(Cli::try_parse_from(["pledge", "box-view", "-u", "ann"]).is_err());
        assert!(
            Cli::try_parse_from([
                "pledge", "box-view", "-u", "ann", "--project", &project, "--document", "d"
            ])
            .is_err()
        );
    }

    #[test]
    fn linkedin_mail_subcommand_is_kebab_case() {
        let cli = Cli::try_parse_from([
            "pledge",
            "linkedin-mail",
            "--user",
            "ann",
            "--to",
            "abc123",
            "--subject",
            "hi",
            "--body",
            "there",
        ])
        .unwrap();
        match cli.command {
            Command::LinkedinMail { to, acting, .. } => {
                assert_eq!(to, "abc123");
                assert_eq!(acting.user, "ann");
            }
            other => panic!("parsed {other:?}"),
        }
    }
}
