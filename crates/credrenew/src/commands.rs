//! Command implementations.

use std::collections::HashMap;

use anyhow::{Context, bail};
use chrono::{SecondsFormat, Utc};
use credrenew_core::service::login_flow;
use credrenew_core::{
    AccountId, AccountStatus, Config, CredentialService, RenewalEngine, RunReport, Storage,
};
use credrenew_vault::{VaultKey, store_in_keyring};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use zeroize::Zeroizing;

use crate::cli::{Args, Commands};

/// Runs one command.
pub async fn execute(args: Args) -> anyhow::Result<()> {
    let path = args.config.unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&path)
        .await
        .with_context(|| format!("loading {}", path.display()))?;

    match args.command {
        Commands::Run => run(&config).await,
        Commands::Store { identifier } => store(&config, &identifier).await,
        Commands::Fetch { id } => fetch(&config, &id).await,
        Commands::Login { id } => login(&config, &id).await,
        Commands::SetStatus { id, status } => set_status(&config, &id, &status).await,
        Commands::Accounts => accounts(&config).await,
        Commands::History { id, limit } => history(&config, &id, limit).await,
        Commands::Prune => prune(&config).await,
        Commands::GenerateKey { save } => generate_key(save),
    }
}

async fn credential_service(config: &Config) -> anyhow::Result<CredentialService> {
    let (key, source) = config.resolve_vault_key()?;
    info!("Vault key loaded from {source:?}");
    let storage = Storage::open(config).await?;
    Ok(CredentialService::new(storage.accounts, key))
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let engine = RenewalEngine::from_config(config).await?;
    match engine.run_once().await? {
        RunReport::Idle => println!("No account is due for renewal"),
        RunReport::Processed(outcome) => {
            println!("{}: {} ({})", outcome.account_id, outcome.status, outcome.message);
        }
    }
    Ok(())
}

async fn store(config: &Config, identifier: &str) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let secret = Zeroizing::new(
        lines
            .next_line()
            .await?
            .context("expected the secret on the first line of stdin")?,
    );
    let otp_seed = Zeroizing::new(
        lines
            .next_line()
            .await?
            .context("expected the one-time-code seed on the second line of stdin")?,
    );

    let service = credential_service(config).await?;
    let id = service.store(identifier, &secret, &otp_seed).await?;
    println!("{id}");
    Ok(())
}

async fn fetch(config: &Config, id: &str) -> anyhow::Result<()> {
    let id: AccountId = id.parse()?;
    let credentials = credential_service(config).await?.fetch_decrypted(id).await?;
    println!("identifier: {}", credentials.identifier);
    println!("secret: {}", credentials.secret);
    println!("otp_seed: {}", credentials.otp_seed);
    Ok(())
}

async fn login(config: &Config, id: &str) -> anyhow::Result<()> {
    let id: AccountId = id.parse()?;
    let credentials = credential_service(config).await?.fetch_decrypted(id).await?;
    let flow = login_flow(config)?;

    let outcome = flow
        .attempt_login(&credentials.identifier, &credentials.secret, &credentials.otp_seed)
        .await;
    let trail: Vec<_> = outcome.trail.iter().map(ToString::to_string).collect();
    println!("{}: {}", outcome.terminal, outcome.message);
    println!("trail: {}", trail.join(" -> "));

    if !outcome.success {
        bail!("login failed for account {id}");
    }
    Ok(())
}

async fn set_status(config: &Config, id: &str, status: &str) -> anyhow::Result<()> {
    let id: AccountId = id.parse()?;
    let status: AccountStatus = status.parse()?;
    Storage::open(config)
        .await?
        .accounts
        .set_status(id, status)
        .await?;
    println!("{id}: {status}");
    Ok(())
}

async fn accounts(config: &Config) -> anyhow::Result<()> {
    let storage = Storage::open(config).await?;
    let states: HashMap<_, _> = storage
        .ledger
        .list_states()
        .await?
        .into_iter()
        .map(|s| (s.account_id, s))
        .collect();

    for account in storage.accounts.list().await? {
        let last = states.get(&account.id).map_or_else(
            || "never processed".to_string(),
            |s| {
                let at = s.last_processed_at.map_or_else(
                    || "-".to_string(),
                    |t| t.to_rfc3339_opts(SecondsFormat::Secs, true),
                );
                format!("{} at {at}: {}", s.last_status, s.last_message)
            },
        );
        println!(
            "{}  {:<8}  created {}  {last}",
            account.id,
            account.status.as_str(),
            account.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
    Ok(())
}

async fn history(config: &Config, id: &str, limit: u32) -> anyhow::Result<()> {
    let id: AccountId = id.parse()?;
    let storage = Storage::open(config).await?;
    for entry in storage.ledger.history(id, limit).await? {
        println!(
            "{}  {:<7}  {}",
            entry.processed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            entry.status.as_str(),
            entry.message
        );
    }
    Ok(())
}

async fn prune(config: &Config) -> anyhow::Result<()> {
    let removed = Storage::open(config)
        .await?
        .ledger
        .prune_expired(Utc::now())
        .await?;
    println!("Removed {removed} expired log entries");
    Ok(())
}

fn generate_key(save: bool) -> anyhow::Result<()> {
    let key = VaultKey::generate();
    if save {
        store_in_keyring(&key)?;
        println!("Vault key stored in the system keyring");
    } else {
        println!("{}", key.to_base64());
    }
    Ok(())
}
