//! Core application

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::cli::{self, CliConfig, Commands, ListArgs, Model, StoreCommand};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, DEFAULT_PAGE, ENV_LOG};
use crate::data::filters::{FilterError, FilterSpec, SelectQuery, filter_query, parse};
use crate::data::sqlite::{SqliteError, SqliteService, repositories};
use crate::data::types::{JoggingUpdate, NewJoggingRecord, NewUser, Page, UserUpdate};
use crate::domain::report::{ReportError, weekly_report};

pub struct CoreApp {
    pub config: AppConfig,
    pub database: SqliteService,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!(app = APP_NAME, "Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        // Filter inspection needs no database
        match command {
            Commands::Parse { filter } => Self::print_parse(&filter),
            Commands::Explain { filter, model } => Self::print_explain(&filter, model),
            Commands::Store(command) => {
                let app = Self::init(&cli_config).await?;
                let result = app.handle_command(command).await;
                app.database.close().await;
                result
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let database = SqliteService::init(&config.database.path)
            .await
            .with_context(|| format!("Failed to open database: {}", config.database.path))?;
        Ok(Self { config, database })
    }

    fn init_logging() {
        let default_filter = format!("warn,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn handle_command(&self, command: StoreCommand) -> Result<()> {
        let pool = self.database.pool();

        match command {
            StoreCommand::Records { list, user } => {
                let filter = parse_filter(&list)?;
                let page = self.page(&list);
                let rows = match user {
                    Some(user) => {
                        repositories::list_records_of_user(pool, &user, filter.as_ref(), page).await
                    }
                    None => repositories::list_records(pool, filter.as_ref(), page).await,
                }
                .map_err(storage_error)?;
                print_json(&rows)
            }
            StoreCommand::Users { list } => {
                let filter = parse_filter(&list)?;
                let rows = repositories::list_users(pool, filter.as_ref(), self.page(&list))
                    .await
                    .map_err(storage_error)?;
                print_json(&rows)
            }
            StoreCommand::Report { user, week_start } => {
                let report = weekly_report(pool, &user, week_start)
                    .await
                    .map_err(|e| match e {
                        ReportError::Storage(e) => storage_error(e),
                        other => anyhow::Error::from(other),
                    })?;
                print_json(&report)
            }
            StoreCommand::AddUser {
                username,
                password,
                forename,
                surname,
                email,
                role,
            } => {
                let user = NewUser {
                    username,
                    password,
                    forename,
                    surname,
                    email,
                    role,
                };
                let row = repositories::create_user(pool, &user)
                    .await
                    .map_err(storage_error)?;
                print_json(&row)
            }
            StoreCommand::UpdateUser {
                username,
                password,
                forename,
                surname,
                email,
                role,
            } => {
                let changes = UserUpdate {
                    password,
                    forename,
                    surname,
                    email,
                    role,
                };
                let row = repositories::update_user(pool, &username, &changes)
                    .await
                    .map_err(storage_error)?;
                print_json(&row)
            }
            StoreCommand::DeleteUser { username } => {
                repositories::delete_user(pool, &username)
                    .await
                    .map_err(storage_error)?;
                print_json(&serde_json::json!({ "deleted": username }))
            }
            StoreCommand::AddRecord {
                user,
                date,
                distance,
                time,
                lat,
                lon,
                weather,
            } => {
                let record = NewJoggingRecord {
                    username: user,
                    date,
                    lat,
                    lon,
                    distance,
                    time,
                    weather,
                };
                let row = repositories::create_record(pool, &record)
                    .await
                    .map_err(storage_error)?;
                print_json(&row)
            }
            StoreCommand::UpdateRecord {
                rid,
                date,
                distance,
                time,
                lat,
                lon,
                weather,
            } => {
                let changes = JoggingUpdate {
                    date,
                    lat,
                    lon,
                    distance,
                    time,
                    weather,
                };
                let row = repositories::update_record(pool, rid, &changes)
                    .await
                    .map_err(storage_error)?;
                print_json(&row)
            }
            StoreCommand::DeleteRecord { rid } => {
                repositories::delete_record(pool, rid)
                    .await
                    .map_err(storage_error)?;
                print_json(&serde_json::json!({ "deleted": rid }))
            }
        }
    }

    fn page(&self, list: &ListArgs) -> Page {
        Page::new(
            list.page.unwrap_or(DEFAULT_PAGE),
            self.config.listing.page_size,
        )
    }

    fn print_parse(text: &str) -> Result<()> {
        let spec = parse(Some(text)).map_err(filter_error)?;
        print_json(&spec)
    }

    fn print_explain(text: &str, model: Model) -> Result<()> {
        #[derive(Serialize)]
        struct Explain<'a> {
            model: &'a str,
            sql: String,
            params: Vec<crate::data::filters::SqlValue>,
        }

        let spec: Option<FilterSpec> = parse(Some(text)).map_err(filter_error)?;
        let schema = model.schema();
        let query = SelectQuery::new(schema.table, schema.columns);
        let query = filter_query(query, spec.as_ref(), schema).map_err(filter_error)?;
        let (sql, params) = query.to_sql();

        print_json(&Explain {
            model: model.name(),
            sql,
            params,
        })
    }
}

fn parse_filter(list: &ListArgs) -> Result<Option<FilterSpec>> {
    parse(list.filter.as_deref()).map_err(filter_error)
}

fn filter_error(e: FilterError) -> anyhow::Error {
    anyhow::anyhow!("[{}] {}", e.code(), e)
}

fn storage_error(e: SqliteError) -> anyhow::Error {
    if !e.is_client_error() {
        tracing::error!(error = %e, "Storage failure");
    }
    match e {
        SqliteError::Filter(e) => filter_error(e),
        other => anyhow::anyhow!("[{}] {}", other.code(), other),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
