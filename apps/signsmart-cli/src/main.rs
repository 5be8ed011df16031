//! SignSmart CLI
//!
//! Prepare documents for signature, hand out signing links, and record
//! signatures against a local document store.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use signsmart_core::{FieldType, SigningOrder};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "signsmart")]
#[command(version, about = "Prepare, share and sign documents")]
struct Args {
    /// Config file (defaults to ./signsmart.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a .pdf, .doc or .docx file as a new document
    Upload { file: PathBuf },

    /// List documents
    List {
        /// Case-insensitive title filter
        #[arg(short, long, default_value = "")]
        query: String,
        /// Show completed documents instead of active ones
        #[arg(long)]
        archived: bool,
    },

    /// Print a document as JSON
    Show { document: String },

    /// Change document settings
    Settings {
        document: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        order: Option<SigningOrder>,
        #[arg(long)]
        reminders: Option<bool>,
    },

    /// Manage a document's signers
    #[command(subcommand)]
    Signer(SignerCommand),

    /// Place and edit fields
    #[command(subcommand)]
    Field(FieldCommand),

    /// Finish editing and mark the document as out for signature
    Send { document: String },

    /// Build a signing link or prefilled message for one signer
    Share {
        document: String,
        signer: String,
        #[arg(long, value_enum, default_value = "link")]
        channel: ShareChannel,
        /// Lead the message with a generated reminder
        #[arg(long)]
        remind: bool,
    },

    /// Resolve a signing URL the way the app would on load
    Open { url: String },

    /// Fill every field and complete the document
    Sign {
        document: String,
        #[arg(long)]
        signer: Option<String>,
        /// Typed value, FIELD_ID=VALUE
        #[arg(long = "value", value_parser = parse_key_val)]
        values: Vec<(String, String)>,
        /// Drawn signature, FIELD_ID=STROKES_JSON_FILE
        #[arg(long = "signature", value_parser = parse_key_val)]
        signatures: Vec<(String, String)>,
    },

    /// Short description of a document
    Summary { document: String },

    /// Place fields suggested by the document's text
    Suggest {
        document: String,
        /// Plain-text rendition of the document
        #[arg(long)]
        text_file: PathBuf,
    },

    /// Saved contacts
    #[command(subcommand)]
    Contacts(ContactsCommand),

    /// Document counts per status
    Stats,

    /// Apply the reminder schedule: escalate or expire overdue documents
    Sweep,

    /// Delete a document
    Delete { document: String },
}

#[derive(Subcommand, Debug)]
enum SignerCommand {
    Add {
        document: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// Copy identity from a saved contact
        #[arg(long, conflicts_with_all = ["name", "email", "phone"])]
        contact: Option<String>,
    },
    Update {
        document: String,
        signer: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        order: Option<u32>,
    },
    /// Remove a signer and the fields assigned to them
    Remove { document: String, signer: String },
}

#[derive(Subcommand, Debug)]
enum FieldCommand {
    Add {
        document: String,
        #[arg(long = "type")]
        field_type: FieldType,
        /// Horizontal position, percent of page width
        #[arg(long, default_value_t = 50.0)]
        x: f64,
        /// Vertical position, percent of page height
        #[arg(long, default_value_t = 50.0)]
        y: f64,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Assign to this signer instead of the first
        #[arg(long)]
        signer: Option<String>,
        #[arg(long)]
        label: Option<String>,
    },
    Move {
        document: String,
        field: String,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },
    Assign {
        document: String,
        field: String,
        signer: String,
    },
    Remove {
        document: String,
        field: String,
    },
}

#[derive(Subcommand, Debug)]
enum ContactsCommand {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    Delete {
        contact: String,
    },
    /// Save a document's signers as contacts
    Import {
        document: String,
    },
    /// Add a contact as a signer on an existing document, send it, and
    /// print their signing link
    Send {
        contact: String,
        document: String,
    },
    /// Upload a new document with a contact as its first signer
    Upload {
        contact: String,
        file: PathBuf,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ShareChannel {
    Link,
    Whatsapp,
    Email,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {}", s))?;
    if key.trim().is_empty() {
        return Err(format!("missing key in {}", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Results go to stdout; keep logs on stderr
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("signsmart=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(args.config.as_deref())?;
    tracing::debug!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let mut app = commands::App::open(config)?;
    app.run(args.command).await
}
