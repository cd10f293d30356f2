//! Haggle Server - run either negotiation role as an HTTP service
//!
//! One binary, two roles:
//!
//! ```bash
//! # Seller with catalog, gateway, and fulfillment (default port 8080)
//! haggle-server --role seller
//!
//! # Seller resolving fulfillment by receipt dereference
//! haggle-server --role seller --resolver receipt
//!
//! # Buyer pointed at a running seller
//! haggle-server --role buyer --port 8081 --seller-url http://localhost:8080
//!
//! # With an LLM phrasing the transcripts
//! HAGGLE_LLM_PROVIDER=ollama haggle-server --role buyer --port 8081
//! ```

mod buyer;
mod error;
mod seller;

use clap::{Parser, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Haggle Server - agent-to-agent negotiation over HTTP
#[derive(Parser, Debug)]
#[command(
    name = "haggle-server",
    about = "Run the Haggle seller or buyer agent as an HTTP service",
    version
)]
struct Args {
    /// Which agent role this process plays
    #[arg(long, value_enum, default_value = "seller", env = "HAGGLE_ROLE")]
    role: Role,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "HAGGLE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "HAGGLE_PORT")]
    port: u16,

    /// Fulfillment resolver variant (seller role)
    #[arg(long, value_enum, default_value = "direct", env = "HAGGLE_RESOLVER")]
    resolver: ResolverKind,

    /// Seller service to negotiate against (buyer role)
    #[arg(long, default_value = "http://localhost:8080", env = "HAGGLE_SELLER_URL")]
    seller_url: String,

    /// Buyer spending ceiling in whole dollars (buyer role)
    #[arg(long, default_value = "20", env = "HAGGLE_BUDGET")]
    budget: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Role {
    Seller,
    Buyer,
}

/// How the seller turns payment evidence back into a token
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ResolverKind {
    /// Look the quoted token up directly
    Direct,
    /// Recover the token embedded in the receipt via the gateway
    Receipt,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let app = match args.role {
        Role::Seller => {
            tracing::info!(resolver = ?args.resolver, "starting seller service");
            seller::router(args.resolver)
        }
        Role::Buyer => {
            tracing::info!(
                seller_url = %args.seller_url,
                budget = args.budget,
                "starting buyer service"
            );
            buyer::router(&args.seller_url, args.budget)
        }
    };

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("listening on http://{addr}");
    match args.role {
        Role::Seller => {
            tracing::info!("catalog:  GET  http://localhost:{}/api/catalog", args.port);
            tracing::info!("messages: POST http://localhost:{}/api/message", args.port);
        }
        Role::Buyer => {
            tracing::info!("instruct: POST http://localhost:{}/api/instruct", args.port);
        }
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
