//! Campus Hub management CLI

use anyhow::Context;
use campus_hub::apps::{accounts, catalog};
use campus_hub::config::settings::get_settings;
use campus_hub::config::urls::application;
use campus_hub::{AppState, db};
use campus_conf::{Settings, StorageBackendKind};
use campus_server::{HttpServer, shutdown_signal};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "manage")]
#[command(about = "Campus Hub management interface", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
	/// Start the HTTP server
	Runserver {
		/// Address to bind, overriding `server.addr`
		#[arg(long, value_name = "ADDR")]
		addr: Option<SocketAddr>,
	},
	/// Apply database migrations
	Migrate,
	/// Insert the default item categories
	SeedCategories,
	/// Provision the confirmed guest account used by "continue without login"
	CreateGuest,
	/// Check that the media storage backend is reachable
	CheckStorage,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let settings = get_settings().context("failed to load settings")?;
	init_tracing(&settings.log_level);

	match cli.command {
		Commands::Runserver { addr } => runserver(settings, addr).await,
		Commands::Migrate => {
			let pool = db::connect(&settings.database).await?;
			db::migrate(&pool).await?;
			Ok(())
		}
		Commands::SeedCategories => {
			let pool = db::connect(&settings.database).await?;
			let inserted = catalog::seed(&pool).await?;
			tracing::info!(inserted, "categories seeded");
			Ok(())
		}
		Commands::CreateGuest => {
			let state = build_state(settings).await?;
			let guest = accounts::repository::ensure_guest(&state.pool, state.hasher.as_ref(), state.now()).await?;
			tracing::info!(user_id = guest.id, username = %guest.username, "guest account ready");
			Ok(())
		}
		Commands::CheckStorage => {
			let state = build_state(settings).await?;
			state
				.media
				.check_connection()
				.await
				.with_context(|| format!("{} storage is not reachable", state.media.name()))?;
			tracing::info!(backend = state.media.name(), "storage connection OK");
			Ok(())
		}
	}
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer())
		.init();
}

async fn build_state(settings: Settings) -> anyhow::Result<AppState> {
	if settings.storage.backend == StorageBackendKind::Local {
		tokio::fs::create_dir_all(&settings.storage.local_dir)
			.await
			.with_context(|| format!("failed to create media directory {}", settings.storage.local_dir))?;
	}
	Ok(AppState::from_settings(settings).await?)
}

async fn runserver(settings: Settings, addr: Option<SocketAddr>) -> anyhow::Result<()> {
	let addr = match addr {
		Some(addr) => addr,
		None => settings
			.server
			.addr
			.parse()
			.with_context(|| format!("invalid server.addr {:?}", settings.server.addr))?,
	};

	let state = Arc::new(build_state(settings).await?);
	db::check_connection(&state.pool).await;
	db::migrate(&state.pool).await?;

	let handler = application(state)?;
	HttpServer::new(handler)
		.listen_with_shutdown(addr, shutdown_signal())
		.await?;
	Ok(())
}
