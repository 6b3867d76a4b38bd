//! Rofi Blocks - drive rofi's blocks mode from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use futures_util::StreamExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rofi_blocks::blocks::{BlocksClient, InputAction, UpdateCommand};
use rofi_blocks::config::{BlocksConfig, ConfigLoader};
use rofi_blocks::display;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputActionArg {
    Filter,
    Send,
}

impl From<InputActionArg> for InputAction {
    fn from(arg: InputActionArg) -> Self {
        match arg {
            InputActionArg::Filter => InputAction::Filter,
            InputActionArg::Send => InputAction::Send,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "rofi-blocks",
    about = "Drive rofi's blocks mode over line-delimited JSON",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch rofi, send an initial update, and print its events as JSON lines.
    Run {
        #[command(flatten)]
        update: UpdateArgs,
        /// Invocation prefix replacing the configured one (after `--`).
        #[arg(last = true)]
        prefix: Vec<String>,
    },
    /// Print the wire line for an update without launching anything.
    Encode {
        #[command(flatten)]
        update: UpdateArgs,
    },
}

#[derive(Args, Debug, Default)]
struct UpdateArgs {
    /// Message shown above the entries.
    #[arg(long)]
    message: Option<String>,
    /// Overlay text.
    #[arg(long)]
    overlay: Option<String>,
    /// Prompt text.
    #[arg(long)]
    prompt: Option<String>,
    /// Input box text.
    #[arg(long)]
    input: Option<String>,
    /// What rofi does with the input text.
    #[arg(long, value_enum)]
    input_action: Option<InputActionArg>,
    /// Index of the highlighted entry.
    #[arg(long)]
    active_entry: Option<i64>,
    /// Entry line (repeatable).
    #[arg(long = "line")]
    lines: Vec<String>,
}

impl From<UpdateArgs> for UpdateCommand {
    fn from(args: UpdateArgs) -> Self {
        Self {
            message: args.message,
            overlay: args.overlay,
            prompt: args.prompt,
            input: args.input,
            input_action: args.input_action.map(Into::into),
            active_entry: args.active_entry,
            lines: (!args.lines.is_empty()).then_some(args.lines),
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(mut config: BlocksConfig, update: UpdateCommand, prefix: Vec<String>) -> ExitCode {
    if !prefix.is_empty() {
        config.command = prefix;
    }

    let client = match BlocksClient::start(config.to_command()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, command = ?config.command, "Failed to launch peer");
            return ExitCode::FAILURE;
        }
    };
    display::print_peer_start(client.pid(), &client.command().args());

    if !update.is_empty() {
        client.update(&update).await;
        display::print_update(&update);
    }

    let mut events = client.interact();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => display::print_event(&event),
                None => break,
            },
            _ = &mut ctrl_c => {
                display::print_interrupted();
                break;
            }
        }
    }
    drop(events);

    match client.shutdown_gracefully(config.terminate_timeout()).await {
        Some(exit) => {
            display::print_peer_exit(&exit);
            if exit.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => ExitCode::SUCCESS,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Run { update, prefix } => {
            tracing::info!(command = ?config.command, "Starting rofi blocks session");
            run(config, update.into(), prefix).await
        }
        Commands::Encode { update } => {
            let update: UpdateCommand = update.into();
            match update.encode_line() {
                Ok(line) => {
                    print!("{line}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode update");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
