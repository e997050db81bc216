use anyhow::Result;
use clap::{Parser, Subcommand};

use gridcast::cli::{self, OutputFormat, PredictArgs};
use gridcast::web;

#[derive(Debug, Parser)]
#[command(name = "gridcast")]
#[command(about = "POWERGRID material forecast dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in with one of the dashboard accounts
    Login {
        username: String,
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Request a material forecast and record it in the history
    Predict {
        /// Project budget in crore (1-100)
        #[arg(long)]
        budget: String,
        #[arg(long, default_value = "Delhi")]
        location: String,
        /// 132kV, 220kV or 400kV
        #[arg(long, default_value = "132kV")]
        tower_type: String,
        /// AIS or GIS
        #[arg(long, default_value = "AIS")]
        substation_type: String,
        /// Also write a report file for the new prediction
        #[arg(long)]
        export: bool,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List recent predictions, newest first
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show derived statistics over the history
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Delete all prediction history
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Write a forecast report for a history entry (default: newest)
    Export {
        #[arg(long)]
        id: Option<i64>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Launch the web dashboard
    Web {
        /// Listen address (default from config, 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file to ~/.gridcast/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `predictor.url http://localhost:8000/predict`
    Set { key: String, value: String },
    /// Restore the default config file
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Login { username, password } => cli::run_login(&username, &password),
        Commands::Logout => cli::run_logout(),
        Commands::Whoami => cli::run_whoami(),
        Commands::Predict {
            budget,
            location,
            tower_type,
            substation_type,
            export,
            format,
        } => cli::run_predict(
            PredictArgs {
                budget,
                location,
                tower_type,
                substation_type,
                export,
            },
            OutputFormat::from_str_opt(Some(&format)),
        ),
        Commands::History { format } => cli::run_history(OutputFormat::from_str_opt(Some(&format))),
        Commands::Stats { format } => cli::run_stats(OutputFormat::from_str_opt(Some(&format))),
        Commands::Clear { yes } => cli::run_clear(yes),
        Commands::Export { id } => cli::run_export(id),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Web { addr } => {
            let config = gridcast::config::load();
            let addr = addr.unwrap_or_else(|| config.web.addr.clone());
            web::serve(config, &addr)
        }
    }
}
