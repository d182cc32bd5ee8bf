//! Codepad CLI - serves the practice catalog and inspects saved progress

use clap::{Arg, ArgMatches, Command};
use codepad_core::{
    aggregate, Catalog, CodepadError, Config, FileStorage, KeyValueSessionStore, ProgressSummary,
    Result,
};
use codepad_server::CatalogServer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, Level};

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct Args {
    pub data_dir: Option<PathBuf>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub config_file: Option<PathBuf>,
    pub dev_mode: bool,
    pub list_tasks: bool,
    pub progress: bool,
    pub storage: Option<PathBuf>,
    pub validate_config: bool,
}

fn build_command() -> Command {
    Command::new("codepad")
        .version("0.1.0")
        .about("Practice catalog server and progress tools for the Codepad editor")
        .long_about(
            "Codepad serves the task and template catalog of a programming-practice site \
            as a JSON API, and can report per-task progress from a saved-code storage file.",
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Directory containing tasks.json and templates.json")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("hostname")
                .short('H')
                .long("hostname")
                .help("Hostname or IP address to bind the server to [default: 127.0.0.1]")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port number to bind the server to [default: 3000]")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file (JSON format)")
                .long_help(
                    "Path to a JSON configuration file with `server` and `editor` sections. \
                    Environment variables (CODEPAD_*) override the file, and CLI arguments \
                    override both.",
                )
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dev-mode")
                .long("dev-mode")
                .help("Enable development mode with debug logging")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-tasks")
                .long("list-tasks")
                .help("List catalog tasks and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .value_name("STORAGE.json")
                .help(
                    "Report per-task progress from a saved-code storage file and exit \
                    (defaults to editor.storage_path)",
                )
                .num_args(0..=1)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("validate-config")
                .long("validate-config")
                .help("Validate configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .after_help(
            "EXAMPLES:\n    \
            codepad                                   Serve ./static/data on 127.0.0.1:3000\n    \
            codepad --data-dir site/data -p 8080      Serve another catalog on port 8080\n    \
            codepad --list-tasks                      Show the tasks in the catalog\n    \
            codepad --progress storage.json           Show saved progress per task\n    \
            codepad --validate-config -c config.json  Validate a configuration file",
        )
}

impl Args {
    /// Parse command line arguments
    pub fn parse() -> Self {
        Self::from_matches(&build_command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            data_dir: matches.get_one::<PathBuf>("data-dir").cloned(),
            hostname: matches.get_one::<String>("hostname").cloned(),
            port: matches.get_one::<u16>("port").copied(),
            config_file: matches.get_one::<PathBuf>("config").cloned(),
            dev_mode: matches.get_flag("dev-mode"),
            list_tasks: matches.get_flag("list-tasks"),
            progress: matches.contains_id("progress"),
            storage: matches.get_one::<PathBuf>("progress").cloned(),
            validate_config: matches.get_flag("validate-config"),
        }
    }

    /// Overrides in the dotted-key form understood by [`Config::apply_cli_overrides`]
    fn cli_overrides(&self) -> HashMap<String, serde_json::Value> {
        let mut overrides = HashMap::new();
        if let Some(hostname) = &self.hostname {
            overrides.insert("server.hostname".to_string(), hostname.clone().into());
        }
        if let Some(port) = self.port {
            overrides.insert("server.port".to_string(), port.into());
        }
        if let Some(dir) = &self.data_dir {
            overrides.insert(
                "server.data_dir".to_string(),
                dir.to_string_lossy().into_owned().into(),
            );
        }
        if let Some(storage) = &self.storage {
            overrides.insert(
                "editor.storage_path".to_string(),
                storage.to_string_lossy().into_owned().into(),
            );
        }
        overrides
    }

    /// Load configuration: file, then environment, then CLI arguments
    pub fn load_config(&self) -> Result<Config> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(CodepadError::config(format!(
                    "Configuration file not found: {}\n\n\
                    Example: codepad --validate-config --config config.json",
                    config_file.display()
                )));
            }
            info!("Loading configuration from: {}", config_file.display());
        }

        let mut config = Config::load_or_default(self.config_file.as_deref()).map_err(|e| {
            CodepadError::config(format!(
                "Failed to load configuration: {}\n\n\
                Please check that the file contains valid JSON.",
                e
            ))
        })?;

        config.apply_process_environment()?;
        config.apply_cli_overrides(&self.cli_overrides())?;
        Ok(config)
    }
}

/// Print the catalog's tasks
fn list_tasks(config: &Config) -> Result<()> {
    let catalog = Catalog::load(&config.server.data_dir)?;

    println!("Tasks in {}\n", config.server.data_dir.display());
    for task in catalog.tasks() {
        println!("  {:>4}  {} ({} problems)", task.id, task.title, task.problems.len());
    }
    println!("\n{} tasks, {} templates", catalog.tasks().len(), catalog.templates().len());
    Ok(())
}

/// Progress of every catalog task against a storage file
fn collect_progress(config: &Config, storage: &Path) -> Result<Vec<(String, ProgressSummary)>> {
    let catalog = Catalog::load(&config.server.data_dir)?;
    let backend = FileStorage::open(storage)?;
    let store =
        KeyValueSessionStore::with_prefix(Arc::new(backend), config.editor.storage_prefix.clone());

    Ok(catalog
        .tasks()
        .iter()
        .map(|task| {
            let summary = aggregate(&store, &task.id, task.problem_ids());
            (format!("{} {}", task.id, task.title), summary)
        })
        .collect())
}

fn progress_bar(summary: &ProgressSummary, width: usize) -> String {
    let filled = if summary.total == 0 {
        0
    } else {
        summary.completed * width / summary.total
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn report_progress(config: &Config, storage: &Path) -> Result<()> {
    for (label, summary) in collect_progress(config, storage)? {
        println!(
            "{} {:>3}%  {}/{}  {}",
            progress_bar(&summary, 20),
            summary.percent(),
            summary.completed,
            summary.total,
            label
        );
    }
    Ok(())
}

/// Validate configuration and print the findings
fn validate_config(args: &Args) -> Result<()> {
    let config = args.load_config()?;
    let result = config.validate()?;

    println!("Server: {}:{}", config.server.hostname, config.server.port);
    println!("Data directory: {}", config.server.data_dir.display());
    println!(
        "Run endpoint: {}",
        config.editor.run_endpoint.as_deref().unwrap_or("(not configured)")
    );

    for warning in &result.warnings {
        println!("  warning: {}", warning);
    }

    println!("\nConfiguration is valid");
    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let validation = config.validate()?;
    for warning in &validation.warnings {
        tracing::warn!("Configuration: {}", warning);
    }

    let catalog = Catalog::load(&config.server.data_dir)?;
    let mut server = CatalogServer::new(config.server.clone(), catalog).await;
    let addr = server.start().await?;

    println!("Codepad catalog server");
    println!("Data: {}", config.server.data_dir.display());
    println!("Server: http://{}", addr);
    println!("\nPress Ctrl+C to stop.\n");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    server.shutdown().await;
    info!("Codepad shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.dev_mode {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(args.dev_mode)
        .with_line_number(args.dev_mode)
        .with_file(args.dev_mode);

    if args.dev_mode {
        subscriber.with_ansi(true).pretty().init();
        info!("Development mode enabled");
    } else {
        subscriber.with_ansi(true).init();
    }

    if args.validate_config {
        if let Err(e) = validate_config(&args) {
            eprintln!("Configuration validation failed:\n{}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = if args.list_tasks {
        list_tasks(&config)
    } else if args.progress {
        match &config.editor.storage_path {
            Some(storage) => report_progress(&config, storage),
            None => Err(CodepadError::config(
                "No storage file: pass --progress STORAGE.json or set editor.storage_path",
            )),
        }
    } else {
        serve(config).await
    };

    if let Err(e) = outcome {
        error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}
