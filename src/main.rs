#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
mod arg_parse;
mod bot;
mod config;
mod digest;
mod error;
mod fanout;
mod newsapi;
mod repository;
mod schemas;
mod sender;

use std::sync::Arc;
use std::time::Duration;

use teloxide::Bot;
use tokio::sync::watch;

use crate::arg_parse::CmdArgs;
use crate::bot::BotState;
use crate::config::AppConfig;
use crate::digest::DigestEngine;
use crate::fanout::{run_scheduler, DeliveryFanout};
use crate::newsapi::prelude::NewsFetcher;
use crate::repository::Database;
use crate::sender::TelegramSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CmdArgs::parse(std::env::args().collect())?;
    let config = AppConfig::from_file(&args.config)?;

    let db = Database::open(&config.db_dsn)?;
    let bot = Bot::new(&config.telegram.token);
    let fetcher = NewsFetcher::new(&config.newsapi);

    let engine = DigestEngine::new(fetcher.clone(), db.clone());
    let fanout = DeliveryFanout::new(
        engine,
        db.clone(),
        TelegramSink::new(bot.clone()),
        config.digest_size,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let checker = tokio::spawn(run_scheduler(
        fanout,
        Duration::from_secs(config.check_interval_secs),
        shutdown_rx,
    ));

    let state = Arc::new(BotState {
        config,
        db,
        fetcher,
    });
    bot::run_listener(bot, state).await;

    // the listener returned (Ctrl-C): stop the digest checker as well
    shutdown_tx.send(true).ok();
    checker.await?;

    Ok(())
}
