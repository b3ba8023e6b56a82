use clap::Parser;

use crate::config::DEFAULT_MAX_PLAYERS;

use super::styles;

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

/// `servercontrol` provisions and supervises containerized game-server instances
#[derive(Debug, Parser)]
#[command(name = "servercontrol", author, styles=styles::styles())]
pub struct ServerControlArgs {
    /// The subcommand to run
    #[command(subcommand)]
    pub subcommand: Option<ServerControlSubcommand>,

    /// Enable verbose logging
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Show version
    #[arg(short = 'v', long)]
    pub version: bool,
}

/// Available subcommands for managing game-server instances
#[derive(Debug, Parser)]
pub enum ServerControlSubcommand {
    /// Serve the REST API
    #[command(name = "serve")]
    Serve {
        /// Address to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List managed instances
    #[command(name = "list", alias = "ls")]
    List,

    /// Provision and start a new instance
    #[command(name = "create")]
    Create {
        /// Display name of the game server
        #[arg(required = true)]
        name: String,

        /// Join password
        #[arg(long)]
        password: Option<String>,

        /// Player cap
        #[arg(long, default_value_t = DEFAULT_MAX_PLAYERS)]
        players: u32,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,

        /// Retry with another port if the allocated one turns out to be taken
        #[arg(long)]
        retry: bool,
    },

    /// Start an instance
    #[command(name = "start")]
    Start {
        /// Instance id or name
        #[arg(required = true)]
        id: String,
    },

    /// Stop an instance
    #[command(name = "stop")]
    Stop {
        /// Instance id or name
        #[arg(required = true)]
        id: String,
    },

    /// Stop and delete an instance
    #[command(name = "rm", alias = "delete")]
    Rm {
        /// Instance id or name
        #[arg(required = true)]
        id: String,
    },

    /// Show the most recent output of an instance
    #[command(name = "logs")]
    Logs {
        /// Instance id or name
        #[arg(required = true)]
        id: String,
    },
}

//-------------------------------------------------------------------------------------------------
// Tests
//-------------------------------------------------------------------------------------------------
