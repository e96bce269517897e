//! CLI credkeep
//!
//! Управление персистентным хранилищем учётных записей (создание,
//! аутентификация, смена пароля, просмотр) и демонстрация in-memory слоя
//! контроля доступа.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credkeep::{
    init_logging, AccessControl, Account, AccountError, AccountRecord, AccountView, ErrorExt,
    KindDetail, LoggingConfig, LoggingHandle, Permissions, Settings,
};
use serde::Serialize;
use tracing::debug;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CREDKEEP_GIT_COMMIT"),
    ", built ",
    env!("CREDKEEP_BUILD_TIME"),
    ")"
);

/// Аргументы командной строки
#[derive(Parser, Debug)]
#[command(name = "credkeep")]
#[command(version = VERSION)]
#[command(about = "credkeep - credential store and access control", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Путь к файлу БД (перекрывает настройки и CREDKEEP_DATABASE_PATH)
    #[arg(long, help = "Путь к файлу базы учётных записей")]
    db: Option<PathBuf>,
    /// TOML-файл настроек
    #[arg(
        short,
        long,
        env = "CREDKEEP_CONFIG",
        help = "Файл настроек в формате TOML"
    )]
    config: Option<PathBuf>,
    #[arg(short, long, help = "Включить подробный вывод для отладки")]
    verbose: bool,
    #[arg(short = 'q', long, help = "Подавить логирование (только error)")]
    quiet: bool,
    /// Формат вывода результатов
    #[arg(long, value_enum, default_value = "pretty", help = "Формат вывода")]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

/// Формат вывода CLI
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Человекочитаемый формат
    Pretty,
    /// JSON формат
    Json,
}

/// Подкоманды CLI
#[derive(Subcommand, Debug)]
enum Commands {
    /// Создать учётную запись
    Add {
        login: String,
        #[arg(help = "Отображаемое имя")]
        display_name: String,
        #[arg(long, env = "CREDKEEP_PASSWORD", help = "Пароль новой учётной записи")]
        password: String,
    },
    /// Проверить логин и пароль
    Auth {
        login: String,
        #[arg(long, env = "CREDKEEP_PASSWORD", help = "Пароль для проверки")]
        password: String,
    },
    /// Сменить пароль
    Passwd {
        login: String,
        #[arg(long, env = "CREDKEEP_NEW_PASSWORD", help = "Новый пароль")]
        new_password: String,
    },
    /// Проверить существование логина
    Exists { login: String },
    /// Количество учётных записей
    Count,
    /// Все учётные записи по времени создания
    #[command(alias = "ls")]
    List,
    /// Демонстрация in-memory контроля доступа
    Demo,
}

/// Результат одной попытки аутентификации в демо.
#[derive(Debug, Serialize)]
struct DemoAttempt {
    login: &'static str,
    outcome: String,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    accounts: Vec<AccountView>,
    attempts: Vec<DemoAttempt>,
}

/// Ответ на неуспешную операцию в JSON-режиме.
#[derive(Debug, Serialize)]
struct ErrorReply<'a> {
    error: &'a str,
    code: u32,
    message: String,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings = load_settings(&cli)?;
    let logging = init_logging(logging_config(&cli, &settings))
        .context("Failed to initialize logging")?;

    debug!(?settings, "Settings loaded");

    let result = run(&cli, &settings);
    Ok(finish(cli.output, logging, result))
}

/// Печатает ошибку команды и сбрасывает логи до выхода из процесса, чтобы
/// события о сбое успели попасть в файловый sink.
fn finish(
    output: OutputFormat,
    logging: LoggingHandle,
    result: Result<()>,
) -> ExitCode {
    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(output, &e);
            ExitCode::FAILURE
        }
    };
    logging.shutdown();
    code
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load().context("Failed to load settings")?,
    };
    if let Some(db) = &cli.db {
        settings.database_path = db.display().to_string();
    }
    Ok(settings)
}

fn logging_config(
    cli: &Cli,
    settings: &Settings,
) -> LoggingConfig {
    let mut config = settings.logging_config();
    if cli.quiet {
        config.level = "error".into();
    } else if cli.verbose {
        config.level = "debug".into();
    }
    config
}

fn run(
    cli: &Cli,
    settings: &Settings,
) -> Result<()> {
    let store = match &cli.command {
        Commands::Demo => return run_demo(cli.output, settings),
        _ => credkeep::CredentialStore::open(&settings.database_path)?,
    };

    match &cli.command {
        Commands::Add {
            login,
            display_name,
            password,
        } => {
            store.create_account(login, password, display_name)?;
            emit(cli.output, &serde_json::json!({ "created": login.trim() }), || {
                format!("Account created: {}", login.trim())
            })
        }
        Commands::Auth { login, password } => {
            let record = store.authenticate_account(login, password)?;
            emit(cli.output, &record, || {
                format!("Authenticated: {} ({})", record.login, record.display_name)
            })
        }
        Commands::Passwd {
            login,
            new_password,
        } => {
            store.update_password(login, new_password)?;
            emit(cli.output, &serde_json::json!({ "updated": login.trim() }), || {
                format!("Password updated: {}", login.trim())
            })
        }
        Commands::Exists { login } => {
            let found = store.exists(login)?;
            emit(cli.output, &serde_json::json!({ "exists": found }), || {
                found.to_string()
            })
        }
        Commands::Count => {
            let count = store.count()?;
            emit(cli.output, &serde_json::json!({ "count": count }), || {
                count.to_string()
            })
        }
        Commands::List => {
            let records = store.list_all()?;
            emit(cli.output, &records, || format_records(&records))
        }
        Commands::Demo => Ok(()),
    }
}

/// Печатает значение как JSON или человекочитаемую строку.
fn emit<T: Serialize>(
    output: OutputFormat,
    value: &T,
    pretty: impl FnOnce() -> String,
) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Pretty => println!("{}", pretty()),
    }
    Ok(())
}

fn format_records(records: &[AccountRecord]) -> String {
    if records.is_empty() {
        return "(no accounts)".to_string();
    }
    records
        .iter()
        .map(|r| {
            format!(
                "{:<20} {:<30} {}",
                r.login,
                r.display_name,
                r.created_at.format("%Y-%m-%d %H:%M:%S")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ошибки учётных записей печатаются безопасным для клиента сообщением,
/// остальные целиком.
fn report_error(
    output: OutputFormat,
    err: &anyhow::Error,
) {
    match (output, err.downcast_ref::<AccountError>()) {
        (OutputFormat::Json, Some(account_err)) => {
            let reply = ErrorReply {
                error: account_err.kind(),
                code: account_err.status_code().code(),
                message: account_err.client_message(),
            };
            match serde_json::to_string_pretty(&reply) {
                Ok(json) => println!("{json}"),
                Err(_) => eprintln!("Error: {}", reply.message),
            }
        }
        (OutputFormat::Pretty, Some(account_err)) => {
            eprintln!("Error: {}", account_err.client_message());
        }
        (_, None) => eprintln!("Error: {err:#}"),
    }
}

/// Регистрирует набор учётных записей всех видов и прогоняет
/// успешные и неуспешные попытки входа.
fn run_demo(
    output: OutputFormat,
    settings: &Settings,
) -> Result<()> {
    let mut access = AccessControl::with_policy(settings.access_policy());

    access.register(Account::administrator(
        "admin",
        "admin123",
        Permissions::new(["full_access", "user_management"]),
    )?)?;
    access.register(Account::regular("john_doe", "password123")?)?;
    access.register_default_guest()?;
    access.register(Account::regular("inactive_user", "pass123")?.with_active(false))?;

    let scenarios: [(&'static str, &str); 6] = [
        ("admin", "admin123"),
        ("john_doe", "password123"),
        ("guest", "guest"),
        ("admin", "wrongpass"),
        ("nonexistent", "pass"),
        ("inactive_user", "pass123"),
    ];

    let mut attempts = Vec::with_capacity(scenarios.len());
    for (login, password) in scenarios {
        let outcome = match access.authenticate(login, password) {
            Ok(view) => format!("ok: {view}"),
            Err(e) => format!("{}: {e}", e.kind()),
        };
        attempts.push(DemoAttempt { login, outcome });
    }

    let report = DemoReport {
        accounts: access.list_all(),
        attempts,
    };

    emit(output, &report, || {
        let mut out = String::from("--- Accounts ---\n");
        for view in &report.accounts {
            out.push_str(&format!("{view}\n    {}\n", view.detail_line()));
        }
        out.push_str("\n--- Authentication ---\n");
        for attempt in &report.attempts {
            out.push_str(&format!("{:<15} {}\n", attempt.login, attempt.outcome));
        }
        for view in &report.accounts {
            if let KindDetail::Administrator { .. } = view.detail {
                let has = access
                    .has_permission(&view.login, "user_management")
                    .unwrap_or(false);
                out.push_str(&format!(
                    "\n{} has 'user_management' permission: {has}",
                    view.login
                ));
            }
        }
        out
    })
}
