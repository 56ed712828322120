//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// kurz - short-link redirect engine with click accounting
#[derive(Parser)]
#[command(name = "kurz")]
#[command(version)]
#[command(about = "Short-link redirect engine with asynchronous click accounting", long_about = None)]
pub struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// Print a sample configuration and exit
    #[arg(long)]
    pub generate_config: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List recorded click timestamps of a link (ascending)
    Clicks {
        /// <domain>/<keyword>
        link: String,

        /// Stop after N clicks
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clicks_command() {
        let cli = Cli::parse_from(["kurz", "-c", "prod.toml", "clicks", "short.ly/abc", "--limit", "5"]);
        assert_eq!(cli.config.as_deref(), Some("prod.toml"));
        match cli.command {
            Some(Commands::Clicks { link, limit }) => {
                assert_eq!(link, "short.ly/abc");
                assert_eq!(limit, Some(5));
            }
            None => panic!("expected clicks command"),
        }
    }

    #[test]
    fn test_no_command_runs_server() {
        let cli = Cli::parse_from(["kurz"]);
        assert!(cli.command.is_none());
        assert!(!cli.generate_config);
    }
}
