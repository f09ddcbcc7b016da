//! `lumen` -- submit generation jobs and follow them to completion.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lumen_core::{FileSnapshotStore, JobEnvelope, JobStatus, ProviderId};
use lumen_engine::{EngineConfig, JobEvent, Orchestrator};

#[derive(Parser)]
#[command(name = "lumen", about = "Generation-job orchestrator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a job and stream its progress until it finishes.
    Submit {
        /// Target provider: sdxl, flux, playground, or llama-chat.
        #[arg(long)]
        provider: String,

        /// The prompt to generate from.
        #[arg(long)]
        prompt: String,

        /// Extra parameters as key=value pairs; values parse as JSON
        /// when possible, otherwise as strings (e.g. `--set steps=30`).
        #[arg(long = "set", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Show the persisted response history.
    History,

    /// Delete the persisted response history.
    ClearHistory,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    let snapshots = FileSnapshotStore::new(data_dir()).context("open data directory")?;

    let orchestrator = Orchestrator::with_http(&config);
    let restored = orchestrator
        .restore_state(&snapshots)
        .await
        .context("restore persisted state")?;
    tracing::info!(history_entries = restored, "State restored");

    match cli.command {
        Command::Submit {
            provider,
            prompt,
            params,
        } => submit(&orchestrator, &snapshots, &provider, &prompt, &params).await,
        Command::History => history(&orchestrator).await,
        Command::ClearHistory => {
            orchestrator.store().clear_history().await;
            orchestrator
                .persist_state(&snapshots)
                .await
                .context("persist cleared history")?;
            println!("History cleared.");
            Ok(())
        }
    }
}

/// Submit one envelope and print events until the job finishes.
async fn submit(
    orchestrator: &Orchestrator,
    snapshots: &FileSnapshotStore,
    provider: &str,
    prompt: &str,
    params: &[String],
) -> anyhow::Result<()> {
    let provider = ProviderId::parse(provider)
        .with_context(|| format!("unknown provider '{provider}' (expected one of: sdxl, flux, playground, llama-chat)"))?;
    let parameters = build_parameters(prompt, params)?;
    let envelope = JobEnvelope::new(provider, parameters);

    let mut handle = orchestrator.run_job(envelope).await?;
    let mut outcome = Ok(());
    // Server-assigned id of the running prediction, once known.
    let mut remote_id: Option<String> = None;

    loop {
        tokio::select! {
            maybe_event = handle.next_event() => {
                let Some(event) = maybe_event else { break };
                match event {
                    JobEvent::Update(state) => {
                        remote_id = Some(state.id.clone());
                        match state.progress_percent {
                            Some(percent) => {
                                println!("[{}] {} ({percent:.0}%)", state.id, state.status)
                            }
                            None => println!("[{}] {}", state.id, state.status),
                        }
                    }
                    JobEvent::Completed(state) => {
                        match state.status {
                            JobStatus::Succeeded => {
                                println!("[{}] succeeded", state.id);
                                for output in &state.outputs {
                                    println!("  {output}");
                                }
                            }
                            status => {
                                let message =
                                    state.error_message.as_deref().unwrap_or("no message");
                                println!("[{}] {status}: {message}", state.id);
                                outcome = Err(anyhow::anyhow!("job {status}: {message}"));
                            }
                        }
                        break;
                    }
                    JobEvent::Failed(err) => {
                        outcome = Err(anyhow::Error::new(err));
                        break;
                    }
                }
            }
            // Ctrl-C cancels remotely, then stops the watch.
            _ = tokio::signal::ctrl_c() => {
                if let Some(id) = &remote_id {
                    if let Err(e) = orchestrator.cancel_remote(provider, id).await {
                        tracing::warn!(error = %e, "Remote cancel failed");
                    }
                }
                handle.cancel();
                println!("Canceled.");
                outcome = Err(anyhow::anyhow!("job canceled"));
                break;
            }
        }
    }

    orchestrator
        .persist_state(snapshots)
        .await
        .context("persist state")?;
    outcome
}

/// Print the persisted history, newest last.
async fn history(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    let entries = orchestrator.store().history().await;
    if entries.is_empty() {
        println!("No history.");
        return Ok(());
    }
    for state in entries {
        let when = state.last_updated.format("%Y-%m-%d %H:%M:%S");
        println!("{when}  {:10}  {}", state.status.to_string(), state.id);
        for output in &state.outputs {
            println!("  {output}");
        }
        if let Some(message) = &state.error_message {
            println!("  error: {message}");
        }
    }
    Ok(())
}

/// Assemble the opaque parameter object from the prompt and overrides.
fn build_parameters(prompt: &str, params: &[String]) -> anyhow::Result<serde_json::Value> {
    let mut object = serde_json::Map::new();
    object.insert("prompt".into(), serde_json::Value::String(prompt.into()));

    for pair in params {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("--set expects KEY=VALUE, got '{pair}'");
        };
        // Numbers, booleans, arrays parse as JSON; anything else is a
        // plain string.
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        object.insert(key.to_string(), value);
    }

    Ok(serde_json::Value::Object(object))
}

/// Data directory for persisted snapshots.
///
/// `LUMEN_DATA_DIR` wins; otherwise `$XDG_DATA_HOME/lumen`, falling
/// back to `~/.local/share/lumen`.
fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("LUMEN_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(data_home) = std::env::var_os("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join("lumen");
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".local/share/lumen"),
        None => PathBuf::from(".lumen"),
    }
}
