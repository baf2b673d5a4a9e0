use anyhow::{Context, Result};
use pledge_common::observability::{LogConfig, LogFormat};
use pledge_config::{LogSection, PledgeConfig};
use pledge_dispatch::{Dispatcher, ProviderCredentials};
use pledge_store::{Accounts, Store};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a command needs, built once from configuration.
pub struct Tether {
    pub accounts: Accounts,
    pub dispatcher: Dispatcher<Store>,
}

impl Tether {
    pub fn store(&self) -> &Store {
        self.accounts.store()
    }
}

pub fn log_config(section: &LogSection) -> Result<LogConfig> {
    let mut log = LogConfig {
        log_dir: section.dir.as_ref().map(PathBuf::from),
        emit_stderr: section.stderr,
        ..LogConfig::default()
    };
    if let Some(format) = &section.format {
        log.format = format.parse::<LogFormat>()?;
    }
    if let Some(filter) = &section.filter {
        log.default_filter = filter.clone();
    }
    Ok(log)
}

/// Open the database and build the account and dispatch services.
///
/// `migrate` runs the embedded migrations first; other commands expect an
/// already migrated database.
pub async fn build_from_config(cfg: &PledgeConfig, migrate: bool) -> Result<Tether> {
    let store = Store::connect(&cfg.database_url)
        .await
        .with_context(|| format!("opening {}", cfg.database_url))?;
    if migrate || cfg.database_url.contains(":memory:") {
        store.migrate().await?;
    }
    let creds = Arc::new(ProviderCredentials::from_config(cfg));
    tracing::info!(
        twitter = creds.twitter.is_some(),
        box_view = creds.box_view.is_some(),
        timeout_secs = creds.timeout.as_secs(),
        "app.tether.ready"
    );
    Ok(Tether {
        accounts: Accounts::new(store.clone()),
        dispatcher: Dispatcher::new(store, creds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_section_maps_onto_log_config() {
        let section = LogSection {
            dir: Some("/tmp/pledge-logs".into()),
            format: Some("json".into()),
            stderr: true,
            filter: Some("pledge=debug".into()),
        };
        let log = log_config(&section).unwrap();
        assert_eq!(log.format, LogFormat::Json);
        assert!(log.emit_stderr);
        assert_eq!(log.default_filter, "pledge=debug");
        assert_eq!(log.log_dir, Some(PathBuf::from("/tmp/pledge-logs")));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let section = LogSection {
            format: Some("xml".into()),
            ..LogSection::default()
        };
        assert!(log_config(&section).is_err());
    }
}
