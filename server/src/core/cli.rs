use clap::{Args, Parser, Subcommand, ValueEnum};

use std::path::PathBuf;

use chrono::NaiveDate;

use super::constants::{DATE_FORMAT, ENV_CONFIG, ENV_DB, ENV_PAGE_SIZE, USER_ROLES};
use crate::data::filters::columns;

#[derive(Parser)]
#[command(name = "jogtrack")]
#[command(version, about = "Jogging tracker with a textual filter language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database path (`:memory:` for a throwaway database)
    #[arg(long, global = true, env = ENV_DB)]
    pub db: Option<String>,

    /// Default page size for list commands
    #[arg(long, global = true, env = ENV_PAGE_SIZE)]
    pub page_size: Option<u32>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,
}

/// Filterable model selected on the command line
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Model {
    #[default]
    Jogging,
    User,
}

impl Model {
    pub fn schema(&self) -> &'static columns::ModelSchema {
        match self {
            Self::Jogging => &columns::JOGGING,
            Self::User => &columns::USER,
        }
    }

    pub fn name(&self) -> &'static str {
        self.schema().model
    }
}

/// Filter and paging options shared by list commands
#[derive(Args, Clone, Debug, Default)]
pub struct ListArgs {
    /// Filter expression, e.g. "(distance > 2500) or (weather == 'Rain')"
    #[arg(long, short = 'f')]
    pub filter: Option<String>,

    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<u32>,
}

/// Parse a `YYYY-MM-DD` date argument
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| format!("Invalid date '{}'. Expected YYYY-MM-DD", s))
}

/// Parse a user role argument
fn parse_role(s: &str) -> Result<String, String> {
    let role = s.to_lowercase();
    if USER_ROLES.contains(&role.as_str()) {
        Ok(role)
    } else {
        Err(format!(
            "Invalid role '{}'. Valid options: {}",
            s,
            USER_ROLES.join(", ")
        ))
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Parse a filter and print the resulting tree as JSON
    Parse {
        #[arg(long, short = 'f')]
        filter: String,
    },
    /// Show the SQL and parameters a filter binds to
    Explain {
        #[arg(long, short = 'f')]
        filter: String,

        #[arg(long, short = 'm', value_enum, default_value_t = Model::Jogging)]
        model: Model,
    },
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that open the database
#[derive(Subcommand, Clone, Debug)]
pub enum StoreCommand {
    /// List jogging records
    Records {
        #[command(flatten)]
        list: ListArgs,

        /// Only records owned by this user
        #[arg(long, short = 'u')]
        user: Option<String>,
    },
    /// List users
    Users {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Weekly distance, time and speed totals for one user
    Report {
        #[arg(long, short = 'u')]
        user: String,

        /// First day of the week (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        week_start: NaiveDate,
    },
    /// Create a user
    AddUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        forename: Option<String>,

        #[arg(long)]
        surname: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, value_parser = parse_role, default_value = "user")]
        role: String,
    },
    /// Change a user's details; omitted fields are kept
    UpdateUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        forename: Option<String>,

        #[arg(long)]
        surname: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, value_parser = parse_role)]
        role: Option<String>,
    },
    /// Delete a user without records
    DeleteUser {
        #[arg(long)]
        username: String,
    },
    /// Create a jogging record
    AddRecord {
        #[arg(long, short = 'u')]
        user: String,

        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Meters
        #[arg(long)]
        distance: i64,

        /// Minutes
        #[arg(long)]
        time: i64,

        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        #[arg(long)]
        weather: Option<String>,
    },
    /// Change a jogging record; omitted fields are kept
    UpdateRecord {
        #[arg(long)]
        rid: i64,

        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long)]
        distance: Option<i64>,

        #[arg(long)]
        time: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        #[arg(long)]
        weather: Option<String>,
    },
    /// Delete a jogging record
    DeleteRecord {
        #[arg(long)]
        rid: i64,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db: Option<String>,
    pub page_size: Option<u32>,
    pub config: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        db: cli.db,
        page_size: cli.page_size,
        config: cli.config,
    };
    (config, cli.command)
}
