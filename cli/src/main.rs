//! rfwd CLI - Discover dynamically allocated ssh remote-forward ports
//!
//! Runs commands with the rfwd shim preloaded, reports the ports OpenSSH
//! allocates for `-R 0:...` forwards, and reads back `SSH_RFWD`.

mod commands;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rfwd")]
#[command(author, version, about = "Publish ssh remote-forward ports as SSH_RFWD")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command with the shim preloaded and report allocated ports
    #[command(alias = "run")]
    Exec {
        /// Shim library to preload
        #[arg(long, value_name = "PATH", conflicts_with = "port")]
        lib: Option<PathBuf>,

        /// Remote port fixed on the command line (`-R N:...`); exported as
        /// SSH_RFWD without preloading the shim
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        port: Option<u32>,

        /// Command to run, e.g. `ssh -R 0:localhost:1000 host`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<OsString>,
    },

    /// Check one line against the trigger pattern
    Parse {
        /// The line, e.g. "Allocated port 44284 for remote forward to 127.0.0.1:1000"
        line: String,
    },

    /// Show the port currently published in SSH_RFWD
    Port,

    /// Show the shim library `exec` would preload
    Lib {
        /// Check this path instead of searching
        #[arg(long, value_name = "PATH")]
        lib: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Exec { lib, port, command } => {
            commands::exec::run(lib, port, command, cli.json).await
        }
        Commands::Parse { line } => commands::parse::run(&line, cli.json),
        Commands::Port => commands::port::run(cli.json),
        Commands::Lib { lib } => commands::library::run(lib, cli.json),
    }
}
