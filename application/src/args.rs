//! [`Args`] definitions.

use clap::{Parser, Subcommand};

/// Tracker of overseas trips.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Operation to perform.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Operation performed by the application.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Subcommand)]
pub enum Command {
    /// Runs the periodic trips transitions until stopped.
    #[default]
    Run,

    /// Transitions trips along their lifecycle once and exits.
    Transition,

    /// Logs the summary of trips starting today and completed yesterday.
    Summary,
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::{Args, Command};

    #[test]
    fn runs_by_default() {
        let args = Args::try_parse_from(["overseas-tracker"]).unwrap();

        assert_eq!(args.config, "config.toml");
        assert_eq!(args.command.unwrap_or_default(), Command::Run);
    }

    #[test]
    fn parses_subcommand() {
        let args = Args::try_parse_from([
            "overseas-tracker",
            "--config",
            "prod.toml",
            "summary",
        ])
        .unwrap();

        assert_eq!(args.config, "prod.toml");
        assert_eq!(args.command, Some(Command::Summary));
    }
}
