use std::{io, process, sync::Arc};

use arena_rating::{
    args::Args,
    database::db::DbClient,
    model::{structures::leaderboard_row::LeaderboardRow, LeaderboardService}
};
use clap::Parser;
use tokio::{
    signal,
    time::{self, MissedTickBehavior}
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .with_writer(io::stderr)
        .init();

    let Some(connection_string) = args.connection_string.as_deref().filter(|s| !s.trim().is_empty()) else {
        error!("CONNECTION_STRING environment variable must be set");
        process::exit(1);
    };

    let client = match DbClient::connect(connection_string).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            error!("Application cannot start without a valid database connection");
            process::exit(1);
        }
    };

    if let Err(e) = client.migrate().await {
        error!("Failed to prepare database schema: {}", e);
        process::exit(1);
    }

    let service = LeaderboardService::new(client.clone(), client).with_store_timeout(args.query_timeout());

    if args.once {
        refresh(&service).await;
        return;
    }

    let mut ticker = time::interval(args.refresh_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Refreshing leaderboards every {:?}", args.refresh_interval());

    loop {
        tokio::select! {
            _ = ticker.tick() => refresh(&service).await,
            _ = signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }
}

async fn refresh(service: &LeaderboardService) {
    for (category, result) in service.refresh_global().await {
        match result {
            Ok(Some(rows)) => {
                info!("{} leaderboard ({} models)", category, rows.len());
                log_rows(&rows);
            }
            Ok(None) => info!("No {} battles recorded yet", category),
            Err(e) => warn!("Could not refresh the {} leaderboard: {}", category, e)
        }
    }
}

fn log_rows(rows: &[LeaderboardRow]) {
    for row in rows {
        info!("{:>3}  {:<32} {}", row.rank, row.model, row.rating);
    }
}
