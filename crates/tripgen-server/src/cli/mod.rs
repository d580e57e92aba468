pub mod config_cmd;
pub mod generate;
pub mod trip;

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tripgen")]
#[command(version, about = "Generate travel itineraries and store them with their trips")]
pub struct Cli {
    /// Path to tripgen.toml
    #[arg(
        long,
        global = true,
        env = "TRIPGEN_CONFIG",
        default_value = "tripgen.toml"
    )]
    pub config: PathBuf,

    /// Path to data directory (overrides config file)
    #[arg(long, global = true, env = "TRIPGEN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// HTTP listen address (overrides config file)
    #[arg(long, global = true, env = "TRIPGEN_HTTP_ADDR")]
    pub http_addr: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve,
    /// Run the pipeline once for a request file
    Generate(RequestArgs),
    /// Print the prompt a request file would produce
    Prompt(RequestArgs),
    /// Trip record operations
    #[command(subcommand)]
    Trip(TripCommands),
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// JSON file holding a trip request (`-` for stdin)
    pub request: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum TripCommands {
    /// Create a PENDING trip record
    Create(TripIdArgs),
    /// Print a stored trip record
    Get(TripIdArgs),
}

#[derive(Args, Debug)]
pub struct TripIdArgs {
    pub trip_id: String,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Validate,
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from(["tripgen", "generate", "req.json"]).unwrap();
        match cli.command {
            Commands::Generate(args) => assert_eq!(args.request, PathBuf::from("req.json")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "tripgen",
            "--data-dir",
            "/tmp/trips",
            "--http-addr",
            "127.0.0.1:9000",
            "trip",
            "get",
            "t1",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/trips")));
        assert_eq!(cli.http_addr.map(|a| a.port()), Some(9000));
        match cli.command {
            Commands::Trip(TripCommands::Get(args)) => assert_eq!(args.trip_id, "t1"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
