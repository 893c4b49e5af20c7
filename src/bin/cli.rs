//! FlatKV CLI
//!
//! Command-line interface for reading and editing a FlatKV file.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flatkv::{Config, Result, Store, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// FlatKV CLI
#[derive(Parser, Debug)]
#[command(name = "flatkv")]
#[command(about = "Flat-file key-value store with named domains")]
#[command(version)]
struct Args {
    /// Backing store file
    #[arg(short, long)]
    file: String,

    /// Active domain (defaults to "default")
    #[arg(short, long)]
    domain: Option<String>,

    /// Hold an advisory lock on the file while writing
    #[arg(long)]
    lock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set (JSON, or taken as a plain string)
        value: String,
    },

    /// Check whether a key exists
    Exists {
        /// The key to check
        key: String,
    },

    /// Delete a key
    Remove {
        /// The key to delete
        key: String,
    },

    /// List keys of the active domain
    Keys,

    /// List all domains
    Domains,

    /// Create a domain
    DomainAdd {
        /// The domain name
        name: String,
    },

    /// Delete a domain and all of its keys
    DomainRemove {
        /// The domain name
        name: String,
    },

    /// Check whether a domain exists
    DomainExists {
        /// The domain name
        name: String,
    },

    /// Open the file and report its metadata
    Verify,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder().path(&args.file).lock_on_flush(args.lock);
    if let Some(domain) = &args.domain {
        builder = builder.domain(domain);
    }

    match Store::scoped(builder.build(), |store| run(store, args.command)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute one command, returning whether it succeeded
fn run(store: &mut Store, command: Commands) -> Result<bool> {
    let ok = match command {
        Commands::Get { key } => match store.get(&key, None) {
            Some(value) => {
                println!("{}", value);
                true
            }
            None => false,
        },
        Commands::Put { key, value } => store.put(&key, parse_value(&value), None),
        Commands::Exists { key } => report(store.exists(&key, None)),
        Commands::Remove { key } => store.remove(&key, None),
        Commands::Keys => match store.keys(None) {
            Some(keys) => {
                keys.iter().for_each(|key| println!("{}", key));
                true
            }
            None => false,
        },
        Commands::Domains => {
            store.domains().iter().for_each(|name| println!("{}", name));
            true
        }
        Commands::DomainAdd { name } => store.domain_add(&name),
        Commands::DomainRemove { name } => store.domain_remove(&name),
        Commands::DomainExists { name } => report(store.domain_exists(&name)),
        Commands::Verify => {
            println!("file:     {}", store.path().display());
            println!("updated:  {}", store.updated().unwrap_or("never"));
            println!("checksum: {}", store.checksum().unwrap_or("none"));
            println!("domains:  {}", store.domains().len());
            true
        }
    };

    Ok(ok)
}

fn report(found: bool) -> bool {
    println!("{}", found);
    found
}

/// Values are JSON when they parse as JSON, plain strings otherwise
fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw))
}
