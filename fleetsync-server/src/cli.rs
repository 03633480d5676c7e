use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fleetsync",
    about = "fleetsync - leader/follower configuration sync for proxy fleets",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "FLEETSYNC_PORT", default_value = "8070", global = true)]
    pub port: u16,

    #[arg(long, env = "FLEETSYNC_HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    #[arg(long, env = "FLEETSYNC_DATA_DIR", global = true, help = "Defaults to ~/.fleetsync")]
    pub data_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "FLEETSYNC_DATABASE_URL",
        global = true,
        help = "Defaults to sqlite://<data-dir>/fleetsync.db"
    )]
    pub database_url: Option<String>,

    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the daemon (default if no command specified)")]
    Serve,

    #[command(subcommand, about = "Manage registered follower nodes (leader)")]
    Node(NodeCommands),

    #[command(subcommand, about = "Inspect or change this node's role")]
    Role(RoleCommands),

    #[command(about = "Print the digest of local configuration")]
    Digest {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(subcommand, about = "View and modify configuration")]
    Config(ConfigCommands),

    #[command(about = "Generate a new admin token")]
    GenerateToken,
}

#[derive(Subcommand)]
pub enum NodeCommands {
    #[command(about = "List registered nodes")]
    List {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Register a follower and print its API key")]
    Register {
        #[arg(help = "Unique node name")]
        name: String,

        #[arg(long, help = "Follower host")]
        host: String,

        #[arg(long, default_value = "8070", help = "Follower port")]
        node_port: u16,

        #[arg(long, help = "Sync interval in seconds (min 10)")]
        interval: Option<u32>,
    },

    #[command(about = "Remove a node and revoke its key")]
    Remove {
        #[arg(help = "Node id or name")]
        identifier: String,
    },

    #[command(about = "Enable or disable sync for a node")]
    Sync {
        #[arg(help = "Node id or name")]
        identifier: String,

        #[arg(long, conflicts_with = "disable", help = "Allow the node to pull")]
        enable: bool,

        #[arg(long, help = "Refuse the node's pulls")]
        disable: bool,
    },
}

#[derive(Subcommand)]
pub enum RoleCommands {
    #[command(about = "Show the current role")]
    Show {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Act as leader")]
    Leader,

    #[command(about = "Act as follower")]
    Follower,

    #[command(about = "Connect this follower to a leader")]
    Connect {
        #[arg(long, help = "Leader host (optionally with http:// or https://)")]
        leader_host: String,

        #[arg(long, default_value = "8070", help = "Leader port")]
        leader_port: u16,

        #[arg(long, env = "FLEETSYNC_LEADER_KEY", help = "API key issued by the leader")]
        api_key: String,

        #[arg(long, help = "Sync interval in seconds (min 10)")]
        interval: Option<u32>,
    },

    #[command(about = "Stop syncing from the leader")]
    Disconnect,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show current configuration")]
    Show {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Set a configuration value")]
    Set {
        #[arg(help = "Configuration key (e.g. 'admin_token', 'backoff_max_secs')")]
        key: String,

        #[arg(help = "New value")]
        value: String,
    },
}
