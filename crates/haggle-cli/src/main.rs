//! Haggle CLI - watch two agents negotiate, pay, and ship
//!
//! The `scenario` command wires both roles into one process with the mock
//! gateway and runs a full conversation to its outcome. The `instruct` and
//! `catalog` commands talk to running services instead.
//!
//! # Quick Start
//!
//! ```bash
//! # Full in-process demo
//! haggle scenario
//!
//! # Tighter budget, different target
//! haggle scenario --budget 10 --instruction "buy the llm_paper"
//!
//! # Against running services
//! haggle catalog --server http://localhost:8080
//! haggle instruct "buy the housing dataset" --server http://localhost:8081
//! ```

use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use colored::*;
use haggle_agents::{
    AgentBrain, BuyerAgent, Conversation, InProcessLink, Outcome, SellerAgent,
};
use haggle_core::{Catalog, DirectResolver, SessionStore};
use haggle_llm::{LlmRouter, ProviderKind};
use haggle_payments::MockGateway;
use haggle_types::{Price, Resource};

/// Haggle CLI - agent-to-agent negotiation and payment handshake
#[derive(Parser)]
#[command(name = "haggle")]
#[command(version)]
#[command(about = "Two AI agents haggling over data, end to end", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full buyer/seller conversation in one process
    #[command(alias = "demo")]
    Scenario {
        /// What the buyer should go and get
        #[arg(long, default_value = "buy the housing dataset")]
        instruction: String,

        /// Buyer spending ceiling in whole dollars
        #[arg(long, default_value = "20")]
        budget: u64,

        /// LLM provider for transcript phrasing (ollama, openai_compat)
        #[arg(long)]
        llm: Option<String>,
    },

    /// Send an instruction to a running buyer service
    Instruct {
        /// The instruction text
        instruction: String,

        /// Buyer service URL
        #[arg(long, default_value = "http://localhost:8081")]
        server: String,
    },

    /// Show a running seller service's catalog
    Catalog {
        /// Seller service URL
        #[arg(long, default_value = "http://localhost:8080")]
        server: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Scenario {
            instruction,
            budget,
            llm,
        } => run_scenario(&instruction, budget, llm.as_deref()).await,
        Commands::Instruct {
            instruction,
            server,
        } => run_instruct(&instruction, &server).await,
        Commands::Catalog { server } => run_catalog(&server).await,
    }
}

async fn run_scenario(instruction: &str, budget: u64, llm: Option<&str>) -> anyhow::Result<()> {
    let gateway = Arc::new(MockGateway::new());
    let seller = Arc::new(SellerAgent::new(
        Arc::new(Catalog::demo()),
        Arc::new(SessionStore::new()),
        gateway.clone(),
        Arc::new(DirectResolver),
    ));

    let brain = match llm {
        Some(name) => {
            let kind = ProviderKind::parse(name)
                .ok_or_else(|| anyhow!("unknown LLM provider '{name}'"))?;
            AgentBrain::with_llm(LlmRouter::from_kind(kind))
        }
        None => AgentBrain::from_env(),
    };

    let buyer = BuyerAgent::with_brain(
        Price::new(budget),
        Arc::new(InProcessLink::new(seller)),
        gateway,
        brain,
    );

    println!();
    println!("{}", "Haggle - negotiation demo".bold());
    println!("  instruction: {}", instruction.italic());
    println!("  budget:      {}", Price::new(budget));
    println!();

    let conversation = buyer.run_instruction(instruction).await?;
    print_conversation(&conversation);
    Ok(())
}

async fn run_instruct(instruction: &str, server: &str) -> anyhow::Result<()> {
    let conversation: Conversation = reqwest::Client::new()
        .post(format!("{}/api/instruct", server.trim_end_matches('/')))
        .json(&serde_json::json!({ "instruction": instruction }))
        .send()
        .await
        .with_context(|| format!("buyer service unreachable at {server}"))?
        .error_for_status()?
        .json()
        .await?;

    print_conversation(&conversation);
    Ok(())
}

async fn run_catalog(server: &str) -> anyhow::Result<()> {
    let resources: Vec<Resource> = reqwest::Client::new()
        .get(format!("{}/api/catalog", server.trim_end_matches('/')))
        .send()
        .await
        .with_context(|| format!("seller service unreachable at {server}"))?
        .error_for_status()?
        .json()
        .await?;

    println!();
    println!("{}", "Catalog".bold());
    for resource in resources {
        println!(
            "  {}  {} ({}, {}) - list {}",
            resource.id.to_string().cyan(),
            resource.name,
            resource.format,
            resource.size,
            resource.list_price.to_string().green(),
        );
        println!("      {}", resource.description.dimmed());
    }
    println!();
    Ok(())
}

fn print_conversation(conversation: &Conversation) {
    for line in &conversation.transcript {
        let speaker = match line.speaker.as_str() {
            "buyer" => line.speaker.cyan().bold(),
            _ => line.speaker.yellow().bold(),
        };
        println!("  {speaker:>7}  {}", line.text);
    }
    println!();

    match &conversation.outcome {
        Outcome::Deal {
            resource,
            final_price,
            artifact,
        } => {
            println!(
                "{} {} at {} ({} steps)",
                "DEAL".green().bold(),
                resource,
                final_price.to_string().green(),
                conversation.steps,
            );
            println!("  url:        {}", artifact.url);
            println!("  access key: {}", artifact.access_key.to_string().dimmed());
            println!("  expires:    {}", artifact.expires_at);
        }
        Outcome::NoDeal { reason } => {
            println!(
                "{} {} ({} steps)",
                "NO DEAL".red().bold(),
                reason,
                conversation.steps,
            );
        }
    }
    println!();
}
