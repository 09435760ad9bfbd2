use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "equex")]
#[command(about = "Equex - an equity limit-order-book exchange core")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the exchange and run a scripted demo session
    Start {
        /// Path to the configuration file
        #[arg(short, long, default_value = "exchange.yaml")]
        config: PathBuf,
    },

    /// Validate configuration without starting the exchange
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "exchange.yaml")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "exchange.yaml")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
