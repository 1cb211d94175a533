use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use domain::adapters::memory_repo::InMemoryRecordRepo;
use domain::id::SequentialIdGenerator;
use domain::service::RecordService;
use domain::{IdGenerator, Record, RecordRepository};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

#[derive(Debug, Parser)]
#[command(
    name = "record-cli",
    version,
    about = "Save and list records in the configured store",
    long_about = "Save and list records in the configured store.\n\n\
                  Storage is MongoDB when MONGODB_URI is set (or STORAGE_PROVIDER=mongo), \
                  otherwise an in-memory store that is discarded when the command exits."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Save a record under a caller-chosen id, replacing any previous value
    Save { id: String, name: String },
    /// Save a record under a freshly generated id
    Register { name: String },
    /// List all stored records
    List {
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Check that the storage backend is reachable
    Ping,
}

/// Random ids for stores that outlive the process.
struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

type Service = RecordService<Box<dyn RecordRepository>, Box<dyn IdGenerator>>;

fn main() {
    let cli = Cli::parse();

    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    let result = build_service(&cfg)
        .and_then(|svc| execute(&svc, cli.command, &mut io::stdout().lock()));
    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so command output on stdout stays machine-readable.
    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(io::stderr),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(fmt::layer().with_target(true).with_writer(io::stderr))
                .init();
        }
    }
}

// Construct the service for the configured backend.
fn build_service(cfg: &config::Config) -> Result<Service> {
    match cfg.storage_provider {
        config::StorageProvider::Memory => Ok(RecordService::new(
            Box::new(InMemoryRecordRepo::new()),
            Box::new(SequentialIdGenerator::new("rec", 0)),
        )),
        config::StorageProvider::Mongo => Ok(RecordService::new(
            connect_mongo(cfg)?,
            Box::new(UuidIdGenerator),
        )),
    }
}

#[cfg(feature = "mongo")]
fn connect_mongo(cfg: &config::Config) -> Result<Box<dyn RecordRepository>> {
    let uri = cfg
        .mongodb_uri
        .as_deref()
        .context("MONGODB_URI is not set")?;
    let repo = mongo_adapter::MongoRepo::connect_to(uri, &cfg.mongodb_database)?;
    repo.ping().context("mongodb is unreachable")?;
    info!(database = %cfg.mongodb_database, "connected to mongodb");
    Ok(Box::new(repo))
}

#[cfg(not(feature = "mongo"))]
fn connect_mongo(_cfg: &config::Config) -> Result<Box<dyn RecordRepository>> {
    anyhow::bail!("record-cli was built without the `mongo` feature")
}

fn execute<W: Write>(svc: &Service, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Save { id, name } => {
            let record = Record::new(id, name);
            svc.save(record.clone())
                .with_context(|| format!("saving record {}", record.id))?;
            info!(id = %record.id, "record saved");
            writeln!(out, "saved: {} -> {}", record.id, record.name)?;
        }
        Command::Register { name } => {
            let record = svc.register(&name).context("registering record")?;
            info!(id = %record.id, "record registered");
            writeln!(out, "saved: {} -> {}", record.id, record.name)?;
        }
        Command::List { json } => {
            let records = svc.list().context("listing records")?;
            for record in &records {
                if json {
                    writeln!(out, "{}", serde_json::to_string(record)?)?;
                } else {
                    writeln!(out, "{}\t{}", record.id, record.name)?;
                }
            }
            info!(count = records.len(), "records listed");
        }
        Command::Ping => {
            writeln!(out, "ok")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_service() -> Service {
        RecordService::new(
            Box::new(InMemoryRecordRepo::new()),
            Box::new(SequentialIdGenerator::new("rec", 0)),
        )
    }

    fn run(svc: &Service, command: Command) -> String {
        let mut out = Vec::new();
        execute(svc, command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["record-cli", "save", "abc-123", "Joe"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Save { ref id, ref name } if id == "abc-123" && name == "Joe"
        ));
        let cli = Cli::try_parse_from(["record-cli", "list", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::List { json: true }));
        assert!(Cli::try_parse_from(["record-cli", "save", "only-id"]).is_err());
    }

    #[test]
    fn save_then_list() {
        let svc = memory_service();
        assert_eq!(
            run(
                &svc,
                Command::Save {
                    id: "abc-123".into(),
                    name: "Joe".into(),
                }
            ),
            "saved: abc-123 -> Joe\n"
        );
        assert_eq!(run(&svc, Command::List { json: false }), "abc-123\tJoe\n");
        assert_eq!(
            run(&svc, Command::List { json: true }),
            "{\"id\":\"abc-123\",\"name\":\"Joe\"}\n"
        );
    }

    #[test]
    fn register_uses_generated_id() {
        let svc = memory_service();
        assert_eq!(
            run(&svc, Command::Register { name: "Joe".into() }),
            "saved: rec-0 -> Joe\n"
        );
    }

    #[test]
    fn invalid_record_is_an_error() {
        let svc = memory_service();
        let mut out = Vec::new();
        let err = execute(
            &svc,
            Command::Save {
                id: String::new(),
                name: "Joe".into(),
            },
            &mut out,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("invalid record"));
        assert!(out.is_empty());
    }

    #[test]
    fn uuid_ids_are_unique() {
        let g = UuidIdGenerator;
        assert_ne!(g.next_id(), g.next_id());
    }
}
