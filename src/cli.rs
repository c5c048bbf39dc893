mod burrow;
mod control;
mod db;
mod device;
mod entsoe;
mod fetch;
mod monitor;

use clap::{Parser, Subcommand};

use crate::{
    cli::{burrow::BurrowArgs, fetch::FetchArgs, monitor::MonitorArgs},
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: keep the prices stored and switch the charging device until terminated.
    #[clap(name = "monitor")]
    Monitor(Box<MonitorArgs>),

    /// Fetch and store the prices of a single feed day.
    #[clap(name = "fetch")]
    Fetch(Box<FetchArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Monitor(args) => args.run().await,
            Self::Fetch(args) => args.run().await,
            Self::Burrow(args) => args.run().await,
        }
    }
}
