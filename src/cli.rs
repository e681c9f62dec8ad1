use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// VPAID 2.0 compliance probe
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging to file (default: vpaid-probe.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a scenario against a fresh ad unit (built-in compliance run if no file)
    Run {
        /// Scenario JSON file
        #[arg(value_name = "SCENARIO")]
        scenario: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP control panel for one ad unit
    Serve {
        /// Listen port (overrides settings)
        #[arg(short = 'p', long = "port", value_name = "N")]
        port: Option<u16>,

        /// Never send tracking beacons
        #[arg(long = "no-beacon")]
        no_beacon: bool,
    },

    /// List the event vocabulary and how each event maps to a control
    Events,
}
