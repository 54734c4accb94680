use std::time::Duration;

use clap::Parser;
use pii_airlock::config::Config;
use pii_airlock::server::ServerState;

#[derive(Parser, Debug)]
#[command(name = "pii-airlock", about = "Policy-enforcing reverse proxy for LLM chat completion APIs")]
struct Cli {
	/// Override the listen address (defaults to PII_AIRLOCK_LISTEN_ADDR or 0.0.0.0:8080).
	#[arg(long)]
	listen: Option<String>,
}

fn init_tracing() {
	use tracing_subscriber::layer::SubscriberExt;
	use tracing_subscriber::util::SubscriberInitExt;
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().json())
		.init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	init_tracing();

	let cli = Cli::parse();
	let mut config = Config::from_env();
	if let Some(listen) = cli.listen {
		config.listen_addr = listen;
	}
	let listen_addr = config.listen_addr.clone();

	let state = ServerState::new(config)?;

	let (signal, watcher) = airlock_core::signal::new();
	let background_tasks = state.spawn_background_tasks(watcher);

	let app = pii_airlock::api::router(state);
	let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
	tracing::info!(%listen_addr, "pii-airlock listening");

	axum::serve(listener, app).with_graceful_shutdown(wait_for_ctrl_c()).await?;

	signal.shutdown();
	airlock_core::signal::join_within(background_tasks, Duration::from_secs(5)).await;

	Ok(())
}

async fn wait_for_ctrl_c() {
	tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
}
