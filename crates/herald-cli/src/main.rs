use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use herald_core::types::CampaignKind;
use herald_core::HeraldConfig;
use herald_dispatch::{
    Campaign, CollaborationInvitation, HttpDispatcher, LeadRequest, Payload, ProgressUpdate,
    Urgency,
};
use herald_history::{HistoryBucket, HistoryStore, InMemoryStore, JsonFileStore};
use tracing::info;

mod report;

#[derive(Debug, Parser)]
#[command(name = "herald", version, about = "Fan-out campaign dispatcher with delivery history")]
struct Cli {
    /// Config file (default: $HERALD_CONFIG, then ~/.herald/herald.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Keep history in memory for this run only; nothing is written to disk.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Broadcast a project progress update to every community endpoint.
    Broadcast {
        #[arg(long)]
        project: String,
        #[arg(long)]
        message: String,
        /// Completion percentage, 0–100.
        #[arg(long)]
        percent: f64,
        #[arg(long)]
        contributor: Option<String>,
    },
    /// Invite another agent to collaborate on a project.
    Invite {
        #[arg(long = "from")]
        inviting_agent: String,
        #[arg(long = "to")]
        target_agent: String,
        #[arg(long)]
        project: String,
        #[arg(long)]
        message: String,
    },
    /// Push a lead-generation request to every lead source.
    Leads {
        #[arg(long = "campaign")]
        campaign_name: String,
        #[arg(long)]
        lead_type: String,
        #[arg(long = "target")]
        target_description: String,
        /// low, medium or high.
        #[arg(long, default_value_t = Urgency::Medium)]
        urgency: Urgency,
    },
    /// Summarize persisted campaign history.
    History {
        /// Show the lead-generation history file instead.
        #[arg(long)]
        leads: bool,
    },
    /// List the configured endpoint registries.
    Endpoints,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "herald_cli=info,herald_dispatch=info,herald_history=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // explicit flag > HERALD_CONFIG env > ~/.herald/herald.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("HERALD_CONFIG").ok());
    let config = HeraldConfig::load(config_path.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Broadcast {
            project,
            message,
            percent,
            contributor,
        } => {
            let mut update = ProgressUpdate::new(project, message, percent);
            update.contributor = contributor;
            run_campaign(&config, cli.ephemeral, &update).await
        }
        Command::Invite {
            inviting_agent,
            target_agent,
            project,
            message,
        } => {
            let invitation = CollaborationInvitation {
                inviting_agent,
                target_agent,
                project,
                message,
            };
            run_campaign(&config, cli.ephemeral, &invitation).await
        }
        Command::Leads {
            campaign_name,
            lead_type,
            target_description,
            urgency,
        } => {
            let lead = LeadRequest {
                campaign_name,
                lead_type,
                target_description,
                urgency,
            };
            run_campaign(&config, cli.ephemeral, &lead).await
        }
        Command::History { leads } => {
            let (kind, buckets) = if leads {
                (CampaignKind::Lead, vec![HistoryBucket::Lead])
            } else {
                (
                    CampaignKind::Progress,
                    vec![HistoryBucket::Broadcast, HistoryBucket::Invitation],
                )
            };
            let store = JsonFileStore::new(config.history.path_for(kind));
            println!("{}", store.describe());
            print!("{}", report::render_history(&store.load(), &buckets));
            Ok(())
        }
        Command::Endpoints => {
            print!("{}", report::render_endpoints(&config.broadcast_registry()?));
            print!("{}", report::render_endpoints(&config.lead_registry()?));
            Ok(())
        }
    }
}

fn open_store(
    config: &HeraldConfig,
    kind: CampaignKind,
    ephemeral: bool,
) -> Arc<dyn HistoryStore> {
    if ephemeral {
        Arc::new(InMemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(config.history.path_for(kind)))
    }
}

async fn run_campaign<P: Payload>(
    config: &HeraldConfig,
    ephemeral: bool,
    payload: &P,
) -> anyhow::Result<()> {
    // Registry problems are fatal and must surface before any request goes out.
    let registry = config
        .registry_for(P::KIND)
        .context("building endpoint registry")?;
    let store = open_store(config, P::KIND, ephemeral);
    let dispatcher = HttpDispatcher::new(&config.dispatch);
    let campaign = Campaign::new(registry, dispatcher, Arc::clone(&store))
        .with_dispatch_config(&config.dispatch)
        .with_context(config.context.clone());
    info!(
        kind = %P::KIND,
        registry = %campaign.registry().family(),
        endpoints = campaign.registry().len(),
        store = %store.describe(),
        "running campaign"
    );

    let run = campaign.run(payload).await?;
    print!("{}", report::render_run(&run, &store.describe()));
    Ok(())
}
