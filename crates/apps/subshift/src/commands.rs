//! Subcommand handlers

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{error, info, warn};
use subscriptions::{
    AccountRole, CancellationToken, ClientSecrets, FileProgressStore, MigrationConfig,
    MigrationError, ProgressStore, Scope, SourceListReader, SourceListWriter,
    SyncEngine, YoutubeAuth, YoutubeClient, export_subscriptions, remove_token_file,
};

use crate::LogoutTarget;

fn load_secrets(settings: &MigrationConfig) -> Result<ClientSecrets> {
    ClientSecrets::load(settings.client_secrets_file.as_deref()).map_err(|e| {
        if let Some(path) = ClientSecrets::default_path() {
            warn!(
                "To configure YouTube access, either:\n\
                 1. Place your Google OAuth credentials at: {}\n\
                 2. Or set environment variables: YOUTUBE_CLIENT_ID and YOUTUBE_CLIENT_SECRET",
                path.display()
            );
        }
        MigrationError::Credential(format!("{e:#}")).into()
    })
}

fn connect(settings: &MigrationConfig, role: AccountRole) -> Result<YoutubeClient> {
    let secrets = load_secrets(settings)?;
    let scope = match role {
        AccountRole::Source => Scope::ReadOnly,
        AccountRole::Destination => Scope::Manage,
    };
    let auth = YoutubeAuth::new(&secrets, scope, settings.token_path(role)?);
    let client = YoutubeClient::new(auth);

    client
        .authenticate()
        .map_err(|e| MigrationError::Credential(format!("{e:#}")))?;
    Ok(client)
}

pub fn export(settings: &MigrationConfig, today: NaiveDate) -> Result<()> {
    info!("Sign in with the SOURCE account when the browser opens");
    let client = connect(settings, AccountRole::Source)?;

    let report = export_subscriptions(
        &client,
        &SourceListWriter::new(&settings.source_list),
        &FileProgressStore::new(&settings.progress_file),
        today,
    )?;

    println!("{report} to {}", settings.source_list.display());
    Ok(())
}

pub fn import(settings: &MigrationConfig, today: NaiveDate) -> Result<()> {
    // Read the list before any browser sign-in so a missing export fails fast
    let source = SourceListReader::new(&settings.source_list).read()?;
    if source.is_empty() {
        warn!(
            "Source list {} is empty; run `subshift export` first",
            settings.source_list.display()
        );
    }

    info!("Sign in with the DESTINATION account when the browser opens");
    let client = connect(settings, AccountRole::Destination)?;
    let store = FileProgressStore::new(&settings.progress_file);

    let token = CancellationToken::new();
    spawn_interrupt_listener(token.clone())?;

    let engine = SyncEngine::new(settings.sync_options(), &client, &store, token);
    let report = engine.run(&source, today)?;

    println!("{report}");
    Ok(())
}

pub fn status(settings: &MigrationConfig, today: NaiveDate) -> Result<()> {
    let store = FileProgressStore::new(&settings.progress_file);
    if !store.path().exists() {
        println!(
            "No progress recorded yet at {}; run `subshift export` first.",
            store.path().display()
        );
        return Ok(());
    }

    let record = store.load(today)?;
    let daily_count = if record.is_stale(today) {
        0
    } else {
        record.daily_imported_count
    };

    println!("Progress file:      {}", store.path().display());
    println!("Exported on:        {}", record.export_date);
    println!("Source channels:    {}", record.total_source_count);
    println!("Imported:           {}", record.total_imported);
    println!("Remaining:          {}", record.remaining());
    println!(
        "Used today:         {daily_count}/{} (last run {})",
        settings.daily_limit, record.last_run_date
    );

    match SourceListReader::new(&settings.source_list).read() {
        Ok(channels) => println!(
            "Source list:        {} ({} entries)",
            settings.source_list.display(),
            channels.len()
        ),
        Err(e) => println!("Source list:        unavailable ({e})"),
    }

    if record.is_complete() {
        println!("Migration complete.");
    }
    Ok(())
}

pub fn logout(settings: &MigrationConfig, target: LogoutTarget) -> Result<()> {
    let roles: &[AccountRole] = match target {
        LogoutTarget::Source => &[AccountRole::Source],
        LogoutTarget::Destination => &[AccountRole::Destination],
        LogoutTarget::Both => &[AccountRole::Source, AccountRole::Destination],
    };

    for &role in roles {
        let path = settings.token_path(role)?;
        remove_token_file(&path)?;
        info!("Removed cached tokens at {}", path.display());
    }
    Ok(())
}

/// Cancel `token` on Ctrl-C; a second Ctrl-C exits immediately
fn spawn_interrupt_listener(token: CancellationToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;

    std::thread::Builder::new()
        .name("interrupt".into())
        .spawn(move || {
            runtime.block_on(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                warn!("Interrupt received; stopping after the current channel");
                token.cancel();

                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            });
        })
        .context("Failed to spawn signal listener")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_needs_no_client_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.json");
        let destination = dir.path().join("destination.json");
        std::fs::write(&source, "{}").unwrap();
        std::fs::write(&destination, "{}").unwrap();
        let settings = MigrationConfig {
            client_secrets_file: Some(dir.path().join("missing-secrets.json")),
            source_token_file: Some(source.clone()),
            destination_token_file: Some(destination.clone()),
            ..MigrationConfig::default()
        };

        logout(&settings, LogoutTarget::Destination).unwrap();
        assert!(source.exists());
        assert!(!destination.exists());

        logout(&settings, LogoutTarget::Both).unwrap();
        assert!(!source.exists());
    }
}
