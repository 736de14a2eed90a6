use anyhow::Result;
use clap::{Parser, Subcommand};

use ozon_dash::auth::Credentials;
use ozon_dash::cli;
use ozon_dash::models::Period;

#[derive(Debug, Parser)]
#[command(name = "ozon-dash")]
#[command(about = "Sales, margin and ROI dashboard for Ozon marketplace sellers")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the web dashboard
    Web {
        /// Address to bind (overrides web.bind)
        #[arg(long)]
        bind: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_open: bool,
    },
    /// List products with cost, profit, margin and ROI
    Products {
        /// Case-insensitive search on name and offer id
        #[arg(long)]
        search: Option<String>,
        /// Only show products in this category
        #[arg(long)]
        category: Option<String>,
        /// Page to show (1-based)
        #[arg(long)]
        page: Option<u32>,
        /// Products per page
        #[arg(long)]
        limit: Option<u32>,
        /// Reporting period: day, week, month, year
        #[arg(long, value_parser = parse_period)]
        period: Option<Period>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show analytics for a period
    Analytics {
        /// Reporting period: day, week, month, year
        #[arg(long, value_parser = parse_period)]
        period: Option<Period>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Set the cost of one product
    Cost {
        /// Offer id of the product
        offer_id: String,
        /// New cost
        cost: f64,
    },
    /// Set one cost for several products
    BulkCost {
        /// New cost
        #[arg(long)]
        cost: f64,
        /// Offer ids to update
        #[arg(required = true)]
        offer_ids: Vec<String>,
    },
    /// Save every product cost to the backend
    SaveCosts,
    /// Sign in with marketplace API credentials
    Login {
        /// Ozon API token
        #[arg(long)]
        token: String,
        /// Ozon client id
        #[arg(long)]
        client_id: String,
        /// Backend API key
        #[arg(long)]
        api_key: Option<String>,
        /// Telegram bot token for reports
        #[arg(long)]
        bot_token: Option<String>,
        /// Telegram chat id for reports
        #[arg(long)]
        chat_id: Option<String>,
    },
    /// Forget stored credentials
    Logout,
    /// Sign in with tokens held by the Telegram bot
    TelegramLogin {
        /// Telegram user id
        user_id: u64,
    },
    /// Send a report to Telegram
    Report,
    /// Check system health: backend, config, session, storage
    Health,
    /// Show or change the dashboard theme (dark, light, toggle)
    Theme { value: Option<String> },
    /// Show recent events
    Events {
        /// Number of events to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file to ~/.ozon-dash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a config value, e.g. `dashboard.page_size 50`
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

fn parse_period(s: &str) -> Result<Period, String> {
    Period::parse(s).ok_or_else(|| format!("unknown period '{s}' (expected day, week, month, year)"))
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Web { bind, no_open } => cli::run_web(bind.as_deref(), no_open),
        Commands::Products {
            search,
            category,
            page,
            limit,
            period,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            let args = cli::ProductsArgs {
                search,
                category,
                page,
                limit,
                period,
            };
            cli::run_products(&args, fmt)
        }
        Commands::Analytics { period, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_analytics(period, fmt)
        }
        Commands::Cost { offer_id, cost } => cli::run_cost(&offer_id, cost),
        Commands::BulkCost { cost, offer_ids } => cli::run_bulk_cost(&offer_ids, cost),
        Commands::SaveCosts => cli::run_save_costs(),
        Commands::Login {
            token,
            client_id,
            api_key,
            bot_token,
            chat_id,
        } => {
            let mut credentials = Credentials::new(&token, &client_id);
            credentials.telegram_bot_token = bot_token;
            credentials.telegram_chat_id = chat_id;
            cli::run_login(credentials, api_key.as_deref())
        }
        Commands::Logout => cli::run_logout(),
        Commands::TelegramLogin { user_id } => cli::run_telegram_login(user_id),
        Commands::Report => cli::run_report(),
        Commands::Health => cli::run_health(),
        Commands::Theme { value } => cli::run_theme(value.as_deref()),
        Commands::Events { limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_events(limit, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
