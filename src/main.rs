//! PolicyPilot command-line client.
//!
//! Every subcommand goes through the ordered-fallback resolver: candidates are
//! tried in priority order and the first valid answer is printed as JSON on
//! stdout. Logs go to stderr.
//!
//! ```text
//! policy-pilot [--config FILE] [--host HOST] [--base-url URL]... [--race] <COMMAND>
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use policy_pilot_client::api::operation::DEFAULT_POLICY_LIMIT;
use policy_pilot_client::api::types::{ChatMessage, ChatRequest, CompanyProfile, PolicyContext};
use policy_pilot_client::api::{AnswerSource, PolicySource};
use policy_pilot_client::config::loader::load_config;
use policy_pilot_client::fallback;
use policy_pilot_client::health::Probe;
use policy_pilot_client::lifecycle::{shutdown_on_signal, Shutdown};
use policy_pilot_client::observability::{logging, metrics};
use policy_pilot_client::resolver::{Resolved, Strategy};
use policy_pilot_client::{ClientConfig, PolicyPilotClient};

#[derive(Parser)]
#[command(name = "policy-pilot")]
#[command(about = "Fallback-aware client for the PolicyPilot backend", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host the client is served from; selects remote or local candidates.
    #[arg(long)]
    host: Option<String>,

    /// Candidate base URL, in priority order. Replaces the configured lists.
    #[arg(short = 'b', long = "base-url")]
    base_urls: Vec<String>,

    /// Attempt all candidates concurrently; the highest-priority success wins.
    #[arg(long)]
    race: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check backend liveness
    Health,
    /// Ask the AI assistant; answers locally when no backend responds
    Chat {
        message: String,
        /// JSON file with the policy under discussion
        #[arg(long)]
        policy: Option<PathBuf>,
        /// JSON file with prior messages, oldest first
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// List policies
    Policies {
        #[arg(short, long, default_value_t = DEFAULT_POLICY_LIMIT)]
        limit: u32,
        /// Use the full dashboard chain, ending in the built-in catalogue
        #[arg(long)]
        fallback: bool,
        /// Company profile JSON; with --fallback, lists matched policies
        #[arg(long, requires = "fallback")]
        profile: Option<PathBuf>,
    },
    /// List policies with base scores
    Enhanced,
    /// Policy statistics
    Count {
        /// Compute statistics from the built-in catalogue if no backend answers
        #[arg(long)]
        fallback: bool,
    },
    /// Match policies against a company profile JSON file
    Match { profile: PathBuf },
    /// Keyword matching against a company profile JSON file
    MatchSimple { profile: PathBuf },
    /// Trigger a crawler refresh
    Refresh,
    /// Show one policy
    Policy { id: String },
    /// Probe every candidate's health endpoint
    Probe {
        /// Probe once and exit instead of running until Ctrl-C
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if !cli.base_urls.is_empty() {
        config.backends.remote = cli.base_urls.clone();
        config.backends.local = cli.base_urls.clone();
    }
    if cli.race {
        config.resolver.strategy = Strategy::Race;
    }

    logging::init_logging(&config.observability);

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let host = cli.host.clone().unwrap_or_else(|| config.backends.host.clone());
    let client = PolicyPilotClient::from_config(&config, &host)?;

    match cli.command {
        Commands::Health => print_resolved(client.health().await?)?,
        Commands::Chat {
            message,
            policy,
            history,
        } => {
            let mut request = ChatRequest::new(message);
            if let Some(path) = history {
                let history: Vec<ChatMessage> = read_json(&path)?;
                request = request.with_history(&history);
            }
            if let Some(path) = policy {
                let policy: PolicyContext = read_json(&path)?;
                request = request.with_policy(policy);
            }

            let answer = client.chat_or_fallback(&request).await;
            let source = match &answer.source {
                AnswerSource::Backend { base_url } => json!({ "backend": base_url }),
                AnswerSource::Fallback => json!("fallback"),
            };
            print_json(&json!({
                "response": answer.text,
                "tokens_used": answer.tokens_used,
                "source": source,
            }))?;
        }
        Commands::Policies {
            limit,
            fallback: full_chain,
            profile,
        } => {
            if full_chain {
                let profile: Option<CompanyProfile> =
                    profile.as_deref().map(read_json::<CompanyProfile>).transpose()?;
                let listing = client.policies_or_fallback(profile.as_ref()).await;
                print_json(&json!({
                    "source": source_name(listing.source),
                    "policies": listing.policies,
                }))?;
            } else {
                print_resolved(client.policies(limit).await?)?;
            }
        }
        Commands::Enhanced => print_resolved(client.enhanced_policies().await?)?,
        Commands::Count {
            fallback: use_catalogue,
        } => match client.policy_count().await {
            Ok(resolved) => print_resolved(resolved)?,
            Err(e) if use_catalogue => {
                tracing::warn!(error = %e, "Policy statistics unavailable, using catalogue");
                print_json(&fallback::catalogue::stats(&fallback::catalogue::policies()))?;
            }
            Err(e) => return Err(e.into()),
        },
        Commands::Match { profile } => {
            let profile: CompanyProfile = read_json(&profile)?;
            print_resolved(client.match_policies(&profile).await?)?;
        }
        Commands::MatchSimple { profile } => {
            let profile: CompanyProfile = read_json(&profile)?;
            print_resolved(client.match_simple(&profile).await?)?;
        }
        Commands::Refresh => print_resolved(client.refresh_crawler().await?)?,
        Commands::Policy { id } => print_resolved(client.policy(&id).await?)?,
        Commands::Probe { once } => {
            let probe = Probe::new(client.resolver(), &config.timeouts, config.health_check.clone());
            if once {
                print_json(&probe.check_all().await)?;
            } else {
                let shutdown = Shutdown::new();
                let receiver = shutdown.subscribe();
                tokio::spawn(shutdown_on_signal(shutdown));
                probe.run(receiver).await;
            }
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&content)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_resolved<T: Serialize>(resolved: Resolved<T>) -> Result<(), Box<dyn std::error::Error>> {
    let skipped: Vec<Value> = resolved
        .failures
        .iter()
        .map(|f| json!({ "base_url": f.base_url, "error": f.failure.to_string() }))
        .collect();

    print_json(&json!({
        "base_url": resolved.candidate.as_str(),
        "request_id": resolved.request_id,
        "elapsed_ms": resolved.elapsed.as_millis() as u64,
        "skipped": skipped,
        "data": resolved.value,
    }))
}

fn source_name(source: PolicySource) -> &'static str {
    match source {
        PolicySource::Matched => "matched",
        PolicySource::Enhanced => "enhanced",
        PolicySource::Basic => "basic",
        PolicySource::Catalogue => "catalogue",
    }
}
