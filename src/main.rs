use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use novaticket::commands;
use novaticket::models::{Priority, Status};
use novaticket::session::SessionGate;
use novaticket::storage::{FileStorage, Storage};
use novaticket::store::TicketStore;
use novaticket::sync::SyncBroadcaster;

#[derive(Parser)]
#[command(name = "novaticket")]
#[command(about = "A local-first support ticket tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a ticket workspace in the current directory
    Init,

    /// Create an account
    Signup {
        /// Email address
        email: String,
        /// Full name
        full_name: String,
        /// Password
        password: String,
    },

    /// Log in and start a session
    Login {
        /// Email address
        email: String,
        /// Password
        password: String,
    },

    /// End the current session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Create a new ticket
    Create {
        /// Ticket title
        title: String,
        /// Ticket description
        #[arg(short, long)]
        description: Option<String>,
        /// Status (open, in_progress, closed)
        #[arg(short, long, value_enum, default_value_t = Status::Open)]
        status: Status,
        /// Priority (low, medium, high, critical)
        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
    },

    /// List tickets
    List {
        /// Case-insensitive search over title and description
        #[arg(long, default_value = "")]
        search: String,
        /// Filter by status; omit for all
        #[arg(short, long, value_enum)]
        status: Option<Status>,
    },

    /// Show ticket details
    Show {
        /// Ticket ID
        id: i64,
    },

    /// Update a ticket
    Update {
        /// Ticket ID
        id: i64,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New status
        #[arg(short, long, value_enum)]
        status: Option<Status>,
        /// New priority
        #[arg(short, long, value_enum)]
        priority: Option<Priority>,
    },

    /// Delete a ticket
    Delete {
        /// Ticket ID
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Show dashboard statistics
    Stats,

    /// Watch for changes from other contexts and reprint statistics
    Watch {
        /// Poll interval in seconds
        #[arg(short, long, default_value_t = 2)]
        interval: u64,
    },
}

struct App {
    storage: Arc<dyn Storage>,
    store: TicketStore,
    gate: SessionGate,
}

fn find_data_dir() -> Result<PathBuf> {
    let mut current = env::current_dir()?;

    loop {
        let candidate = current.join(commands::init::DATA_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not a novaticket workspace (or any parent). Run 'novaticket init' first.");
        }
    }
}

fn open_app() -> Result<App> {
    let data_dir = find_data_dir()?;
    let storage = Arc::new(
        FileStorage::open(&data_dir).context("Failed to open storage partition")?,
    ) as Arc<dyn Storage>;
    let broadcaster = Arc::new(SyncBroadcaster::new(storage.clone()));
    Ok(App {
        store: TicketStore::new(storage.clone(), broadcaster),
        gate: SessionGate::new(storage.clone()),
        storage,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let cwd = env::current_dir()?;
            commands::init::run(&cwd)
        }

        Commands::Signup {
            email,
            full_name,
            password,
        } => {
            let app = open_app()?;
            commands::session::sign_up(&app.gate, &email, &full_name, &password)
        }

        Commands::Login { email, password } => {
            let app = open_app()?;
            commands::session::log_in(&app.gate, &email, &password)
        }

        Commands::Logout => {
            let app = open_app()?;
            commands::session::log_out(&app.gate)
        }

        Commands::Whoami => {
            let app = open_app()?;
            commands::session::whoami(&app.gate)
        }

        Commands::Create {
            title,
            description,
            status,
            priority,
        } => {
            let app = open_app()?;
            commands::create::run(
                &app.store,
                &app.gate,
                &title,
                description.as_deref(),
                status,
                priority,
            )
        }

        Commands::List { search, status } => {
            let app = open_app()?;
            commands::list::run(&app.store, &app.gate, &search, status)
        }

        Commands::Show { id } => {
            let app = open_app()?;
            commands::show::run(&app.store, &app.gate, id)
        }

        Commands::Update {
            id,
            title,
            description,
            status,
            priority,
        } => {
            let app = open_app()?;
            commands::update::run(
                &app.store,
                &app.gate,
                id,
                title.as_deref(),
                description.as_deref(),
                status,
                priority,
            )
        }

        Commands::Delete { id, force } => {
            let app = open_app()?;
            commands::delete::run(&app.store, &app.gate, id, force)
        }

        Commands::Stats => {
            let app = open_app()?;
            commands::stats::run(&app.store, &app.gate)
        }

        Commands::Watch { interval } => {
            let app = open_app()?;
            commands::watch::run(&app.store, app.storage.clone(), &app.gate, interval)
        }
    }
}
