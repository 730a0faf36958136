mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    Toggle, cmd_bed_add, cmd_bed_delete, cmd_bed_edit, cmd_bed_list, cmd_bed_show, cmd_history,
    cmd_plant_add, cmd_plant_list, cmd_plant_options, cmd_reminders, cmd_task_add,
    cmd_task_delete, cmd_task_done, cmd_task_edit, cmd_task_list, cmd_task_photo, cmd_task_types,
};
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "garden",
    version,
    about = "A small garden journal: beds, plants, and maintenance tasks"
)]
struct Cli {
    /// Directory holding the database and uploaded photos
    #[arg(long, global = true, value_name = "PATH", env = "GARDEN_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage garden beds
    Bed {
        #[command(subcommand)]
        action: BedAction,
    },
    /// Manage plants in a bed
    Plant {
        #[command(subcommand)]
        action: PlantAction,
    },
    /// Manage maintenance tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Show today's reminders, or switch reminders on/off
    Reminders {
        /// Turn reminders on or off
        #[arg(value_enum)]
        toggle: Option<Toggle>,
        /// Day to check (YYYY-MM-DD, today/yesterday/tomorrow; default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show completed tasks, most recent first
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[derive(Subcommand)]
enum BedAction {
    /// Create a bed
    Add {
        /// Bed name
        name: String,
        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,
        /// Where the bed is (e.g. "by the greenhouse")
        #[arg(short, long)]
        location: Option<String>,
        /// Photo file to attach
        #[arg(long, value_name = "PATH")]
        photo: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List beds, newest first
    List {
        /// Case-insensitive filter on the bed name
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a bed with its plants and planned tasks
    Show {
        /// Bed ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a bed
    Edit {
        /// Bed ID
        id: i64,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New location hint
        #[arg(short, long)]
        location: Option<String>,
        /// Replace the photo
        #[arg(long, value_name = "PATH")]
        photo: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a bed together with its plants and tasks
    Delete {
        /// Bed ID
        id: i64,
        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlantAction {
    /// Add a plant to a bed
    Add {
        /// Bed ID
        bed_id: i64,
        /// Plant name (one of `garden plant options`, or any custom name)
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List plants in a bed
    List {
        /// Bed ID
        bed_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the suggested plant names
    Options {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Plan a task for a bed
    Add {
        /// Bed ID
        bed_id: i64,
        /// Task type (see `garden task types`)
        task_type: String,
        /// Planned date (YYYY-MM-DD, today/yesterday/tomorrow; default: none)
        #[arg(long)]
        date: Option<String>,
        /// Photo file to attach
        #[arg(long, value_name = "PATH")]
        photo: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List planned tasks for a bed
    List {
        /// Bed ID
        bed_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as done
    Done {
        /// Task ID
        id: i64,
        /// Completion date (YYYY-MM-DD, today/yesterday/tomorrow; default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a task's type or date
    Edit {
        /// Task ID
        id: i64,
        /// New task type
        #[arg(short = 't', long = "type")]
        task_type: Option<String>,
        /// New planned date
        #[arg(long)]
        date: Option<String>,
        /// Clear the planned date
        #[arg(long)]
        no_date: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Attach a photo to a task
    Photo {
        /// Task ID
        id: i64,
        /// Photo file
        path: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the allowed task types
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            "garden=debug,garden_core=debug,tower_http=debug".to_string()
        } else {
            "garden=info,garden_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir)?;
    let svc = config.open_service()?;
    tracing::debug!(data_dir = %config.data_dir.display(), "opened garden database");

    match cli.command {
        Commands::Bed { action } => match action {
            BedAction::Add {
                name,
                description,
                location,
                photo,
                json,
            } => cmd_bed_add(&svc, &name, description, location, photo.as_deref(), json),
            BedAction::List { search, json } => cmd_bed_list(&svc, search.as_deref(), json),
            BedAction::Show { id, json } => cmd_bed_show(&svc, id, json),
            BedAction::Edit {
                id,
                name,
                description,
                location,
                photo,
                json,
            } => cmd_bed_edit(&svc, id, name, description, location, photo.as_deref(), json),
            BedAction::Delete { id, yes, json } => cmd_bed_delete(&svc, id, yes, json),
        },
        Commands::Plant { action } => match action {
            PlantAction::Add { bed_id, name, json } => cmd_plant_add(&svc, bed_id, &name, json),
            PlantAction::List { bed_id, json } => cmd_plant_list(&svc, bed_id, json),
            PlantAction::Options { json } => cmd_plant_options(json),
        },
        Commands::Task { action } => match action {
            TaskAction::Add {
                bed_id,
                task_type,
                date,
                photo,
                json,
            } => cmd_task_add(&svc, bed_id, &task_type, date, photo.as_deref(), json),
            TaskAction::List { bed_id, json } => cmd_task_list(&svc, bed_id, json),
            TaskAction::Done { id, date, json } => cmd_task_done(&svc, id, date, json),
            TaskAction::Edit {
                id,
                task_type,
                date,
                no_date,
                json,
            } => cmd_task_edit(&svc, id, task_type, date, no_date, json),
            TaskAction::Delete { id, json } => cmd_task_delete(&svc, id, json),
            TaskAction::Photo { id, path, json } => cmd_task_photo(&svc, id, &path, json),
            TaskAction::Types { json } => cmd_task_types(json),
        },
        Commands::Reminders { toggle, date, json } => cmd_reminders(&svc, toggle, date, json),
        Commands::History { json } => cmd_history(&svc, json),
        Commands::Serve { port, bind } => server::start_server(svc, port, &bind).await,
    }
}
