use clap::{Parser, Subcommand};
use startrelay::app::App;
use startrelay::config::RelayConfig;
use startrelay::errors::RelayError;
use startrelay::managers::flow::FlowResult;
use startrelay::rpc::server::RelayServer;
use startrelay::services::logger::{LogLevel, Logger};
use startrelay::utils::text::{mask_token, or_empty_marker};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "startrelay")]
#[command(about = "Refresh a session token and replay it into the StartSession call", long_about = None)]
#[command(version)]
struct Cli {
    /// Diagnostic log level (error, warn, info, debug)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Recipe that returns the fresh token [env: INITSEND_FILE]
    #[arg(long)]
    initsend: Option<PathBuf>,

    /// Template whose bearer credential gets replaced [env: START_TEMPLATE_FILE]
    #[arg(long)]
    template: Option<PathBuf>,

    /// Directory holding startserver.jsonl [env: STARTSERVER_LOG_DIR]
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// curl binary to launch instead of the one on PATH [env: STARTSERVER_CURL_BIN]
    #[arg(long)]
    curl_bin: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the flow once and print both exchanges
    Run {
        #[command(flatten)]
        sources: SourceArgs,

        /// Print the full token instead of a masked preview
        #[arg(long)]
        show_token: bool,
    },

    /// Serve line-delimited JSON-RPC requests on stdio
    Serve {
        #[command(flatten)]
        sources: SourceArgs,

        /// Abort a flow that takes longer than this [env: STARTSERVER_TIMEOUT_MS]
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

fn apply_sources(config: &mut RelayConfig, sources: SourceArgs) {
    if let Some(path) = sources.initsend {
        config.initsend_path = path;
    }
    if let Some(path) = sources.template {
        config.template_path = path;
    }
    if let Some(dir) = sources.log_dir {
        config.log_path = startrelay::utils::paths::flow_log_path_in(&dir);
    }
    if sources.curl_bin.is_some() {
        config.curl_bin = sources.curl_bin;
    }
}

fn print_report(result: &FlowResult, show_token: bool) {
    println!("Start server flow completed successfully.");
    if show_token {
        println!("JWT: {}", result.token);
    } else {
        println!("JWT (masked): {}", mask_token(&result.token));
    }
    match (&result.log, &result.log_error) {
        (Some(reference), _) => println!("Log file: {}\n", reference.path.display()),
        (None, Some(err)) => println!("Log file: <not written: {}>\n", err),
        (None, None) => println!(),
    }

    println!("---- initsend stdout ----");
    println!("{}", or_empty_marker(&result.initsend.stdout));
    println!("---- initsend stderr ----");
    println!("{}", or_empty_marker(&result.initsend.stderr));
    println!();

    println!("---- startserver stdout ----");
    println!("{}", or_empty_marker(&result.startserver.stdout));
    println!("---- startserver stderr ----");
    println!("{}", or_empty_marker(&result.startserver.stderr));
    if !result.final_succeeded() {
        println!();
        println!("startserver exit code: {}", result.startserver.returncode);
    }
}

fn report_error(err: &RelayError) {
    eprintln!("[ERROR] {}", err);
    if let Some(hint) = &err.hint {
        eprintln!("hint: {}", hint);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut logger = Logger::new("startrelay");
    if let Some(level) = cli.log_level {
        logger = logger.with_level(level);
    }
    let mut config = RelayConfig::from_env();

    let outcome = match cli.command {
        Commands::Run {
            sources,
            show_token,
        } => {
            apply_sources(&mut config, sources);
            let app = App::initialize(config, logger);
            app.flow_runner
                .run()
                .await
                .map(|result| print_report(&result, show_token || app.config.expose_full_token))
        }
        Commands::Serve {
            sources,
            timeout_ms,
        } => {
            apply_sources(&mut config, sources);
            if timeout_ms.is_some() {
                config.timeout_ms = timeout_ms.filter(|ms| *ms > 0);
            }
            let app = App::initialize(config, logger);
            RelayServer::new(&app).run_stdio().await
        }
    };

    if let Err(err) = outcome {
        report_error(&err);
        std::process::exit(1);
    }
}
