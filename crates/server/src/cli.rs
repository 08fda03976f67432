//! Clap command definition.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

use crate::config::Environment;

/// Parsed command-line options
#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    /// `--config`
    pub config: Option<PathBuf>,
    /// `--env`
    pub env: Environment,
}

/// Build the CLI command.
pub fn build_cli() -> Command {
    Command::new("tessera-server")
        .about("Multi-tenant document store front-end")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .help("Path to tessera.toml (default: built-in settings)"),
        )
        .arg(
            Arg::new("env")
                .long("env")
                .value_name("ENV")
                .value_parser(["dev", "prod", "test"])
                .default_value("dev")
                .help("Deployment environment; selects the default log level"),
        )
}

/// Extract options from parsed matches
pub fn options_from_matches(matches: &ArgMatches) -> Result<CliOptions, String> {
    let env = matches
        .get_one::<String>("env")
        .map(|s| s.parse::<Environment>())
        .transpose()?
        .unwrap_or_default();
    Ok(CliOptions {
        config: matches.get_one::<String>("config").map(PathBuf::from),
        env,
    })
}
