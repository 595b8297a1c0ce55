mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::install::InstallRequest;
use commands::{exit_code_for, EXIT_FAILURE};
use simsync_core::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "simsync",
    version,
    about = "Install app bundles on iOS simulators, skipping installs that would change nothing"
)]
struct Cli {
    /// Directory for device locks and mock backend state.
    #[arg(long, default_value = "~/.local/share/simsync", global = true)]
    state_dir: String,

    /// Device backend to use (simctl or mock). Overrides the config file.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Install an .app bundle, reinstalling only when the device copy differs.
    Install {
        /// Path to the .app bundle.
        #[arg(long)]
        app: PathBuf,
        /// Simulator UDID or instruments identifier, e.g. "iPhone 15 (17.0)".
        #[arg(long)]
        device: Option<String>,
        /// Uninstall and reinstall even if the installed copy is identical.
        #[arg(long, default_value_t = false)]
        force: bool,
        /// Log digests and install decisions.
        #[arg(long, default_value_t = false)]
        debug: bool,
        /// Total attempts when the simulator tools fail (overrides config).
        #[arg(long)]
        retries: Option<u32>,
    },
    /// Print the first booted simulator.
    Booted,
    /// Follow the booted simulator's system log.
    Tail,
    /// List known devices.
    Devices,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[allow(clippy::too_many_lines)]
fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let install_debug = matches!(cli.command, Commands::Install { debug: true, .. });
    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose || install_debug {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SIMSYNC_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Commands::Completions { shell } = cli.command {
        return finish(commands::completions::run::<Cli>(shell));
    }

    let mut config = match Config::load_default() {
        Ok(c) => c,
        Err(e) => return finish(Err(e.to_string())),
    };
    if let Some(name) = &cli.backend {
        config.backend.clone_from(name);
    }

    if config.backend == "simctl" && std::env::var("SIMSYNC_SKIP_PREREQS").as_deref() != Ok("1")
    {
        let missing = simsync_device::check_simctl_prereqs();
        if !missing.is_empty() {
            eprintln!("error: {}", simsync_device::format_missing(&missing));
            return ExitCode::from(EXIT_FAILURE);
        }
    }

    let state_dir = expand_tilde(&cli.state_dir);
    let backend = match simsync_device::select_backend(&config.backend, &state_dir) {
        Ok(b) => b,
        Err(e) => return finish(Err(simsync_core::CoreError::from(e).to_string())),
    };
    tracing::debug!("using the {} backend", backend.name());
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Install {
            app,
            device,
            force,
            debug: _,
            retries,
        } => {
            let mut retry = config.retry;
            if let Some(n) = retries {
                retry.attempts = n;
            }
            commands::install::run(
                backend.as_ref(),
                &config,
                &state_dir,
                &InstallRequest {
                    app: &app,
                    device: device.as_deref(),
                    force,
                    retry,
                },
                json_output,
            )
        }
        Commands::Booted => commands::booted::run(backend.as_ref(), json_output),
        Commands::Tail => commands::tail::run(backend.as_ref()),
        Commands::Devices => commands::devices::run(backend.as_ref(), json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    finish(result)
}

fn finish(result: Result<u8, String>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
