use clap::Parser;
use huddle::{create_app, run_server};
use huddle_exec::ExecutionRouter;
use judge_client::JudgeConfig;
use std::{net::SocketAddr, time::Duration};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to listen on
    #[arg(short, long, env = "HUDDLE_ADDR", default_value = "0.0.0.0:3001")]
    addr: SocketAddr,

    /// Maximum number of concurrent runs
    #[arg(short, long, default_value = "10")]
    max_concurrent: usize,

    /// Base URL of the Judge0-compatible judging service
    #[arg(long, env = "JUDGE0_API_URL")]
    judge_url: Option<String>,

    /// API key for the judging service
    #[arg(long, env = "JUDGE0_API_KEY", hide_env_values = true)]
    judge_key: Option<String>,

    /// Value of the X-RapidAPI-Host header, when the judge sits behind RapidAPI
    #[arg(long, env = "JUDGE0_API_HOST")]
    judge_host: Option<String>,

    /// Upper bound on a single run, in seconds
    #[arg(long, default_value = "30")]
    deadline_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let judge = JudgeConfig::from_parts(args.judge_url, args.judge_key)
        .map(|config| config.with_api_host(args.judge_host));
    match &judge {
        Some(config) => info!("Remote judging enabled via {}", config.api_url),
        None => info!("No judge configured, all languages run locally"),
    }

    let router = ExecutionRouter::from_config(judge)?
        .with_deadline(Duration::from_secs(args.deadline_secs));

    let app = create_app(router, args.max_concurrent);
    run_server(app, args.addr).await?;

    Ok(())
}
