use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use todo_board::categories::fetch_or_empty;
use todo_board::config::{Backend, Config, Overrides};
use todo_board::form::TaskForm;
use todo_board::server::{self, AppState};
use todo_board::theme::{self, ThemeMode, ThemeStore};
use todo_board::{Task, TaskError, TaskFilter, TaskId, TaskStore};

#[derive(Parser)]
#[command(name = "tb")]
#[command(about = "Todo Board (tb) - tasks with deadlines and categories")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, global = true)]
    debug: bool,
    #[arg(long, global = true, env = "TODO_BOARD_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[arg(long, global = true, env = "TODO_BOARD_BACKEND", value_enum)]
    backend: Option<Backend>,
    #[arg(long, global = true, env = "TODO_BOARD_CATEGORIES_URL")]
    categories_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    Add { name: String, deadline: String, category: String },
    List {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long, value_parser = ["Pending", "Completed"])]
        status: Option<String>,
    },
    Show { id: TaskId },
    Toggle { id: TaskId },
    Delete { id: TaskId },
    Categories,
    Theme { #[command(subcommand)] action: Option<ThemeCommands> },
    Config,
    Serve { #[arg(short, long)] port: Option<u16> },
}

#[derive(Subcommand)]
enum ThemeCommands { Show, Toggle, Light, Dark }

fn init_logging(debug: bool) {
    if debug {
        env::set_var("RUST_LOG", "debug");
    } else if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
}

/// Logs the detail, shows the user only the friendly text.
fn fail(e: TaskError) -> anyhow::Error {
    log::warn!("{}", e);
    anyhow::anyhow!("{}", e.user_message())
}

fn print_task(task: &Task) {
    let marker = if task.status.is_completed() { "✅" } else { "⏳" };
    println!("{} [{}] {} | due {} ({})", marker, task.id, task.name, task.deadline, task.category);
}

fn print_theme(theme: &ThemeStore) {
    let palette = theme.palette();
    println!("🎨 Theme: {:?}", theme.current());
    println!("   background {} | text {} | input {} | button {}", palette.background, palette.text, palette.input_background, palette.button);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = Config::load(Overrides {
        data_dir: cli.data_dir,
        backend: cli.backend,
        categories_url: cli.categories_url,
    })?;
    let storage = config.open_storage().context("opening task storage")?;

    let mut store = TaskStore::new(storage.clone());
    if let Err(e) = store.load() {
        println!("⚠️  {} Starting with an empty list.", e.user_message());
    }
    let theme_store = theme::restore(storage.as_ref());
    theme::persist_changes(&theme_store, storage.clone());
    let categories = config.category_provider();

    match cli.command {
        Commands::Add { name, deadline, category } => {
            let (known, fetch_err) = fetch_or_empty(categories.as_ref());
            if let Some(e) = fetch_err {
                println!("⚠️  {} Any category will be accepted.", e.user_message());
            }
            let tasks = TaskForm::new(&name, &deadline, &category).submit(&mut store, &known).map_err(fail)?;
            if let Some(task) = tasks.last() {
                println!("✅ Task [{}] added.", task.id);
            }
        }
        Commands::List { search, category, status } => {
            let counts = store.counts();
            let filter = TaskFilter::new(
                search.as_deref().unwrap_or(""),
                category.as_deref().unwrap_or(""),
                status.as_deref().unwrap_or(""),
            );
            let visible = filter.apply(store.tasks());
            println!("TODO BOARD: {} total | ⏳ {} pending | ✅ {} completed", counts.total, counts.pending, counts.completed);
            if visible.is_empty() {
                println!("(No matching tasks)");
            }
            for task in &visible {
                print_task(task);
            }
        }
        Commands::Show { id } => match store.get(id) {
            Some(task) => {
                println!("--- TASK {} ---", task.id);
                println!("Name: {}", task.name);
                println!("Deadline: {}", task.deadline);
                println!("Category: {}", task.category);
                println!("Status: {}", task.status);
            }
            None => println!("❌ Task not found."),
        },
        Commands::Toggle { id } => {
            store.toggle_status(id).map_err(fail)?;
            match store.get(id) {
                Some(task) => println!("🔁 Task [{}] is now {}.", id, task.status),
                None => println!("❌ Task not found."),
            }
        }
        Commands::Delete { id } => {
            let existed = store.get(id).is_some();
            store.delete(id).map_err(fail)?;
            if existed {
                println!("🗑️ Task [{}] deleted.", id);
            } else {
                println!("❌ Task not found.");
            }
        }
        Commands::Categories => {
            let (known, fetch_err) = fetch_or_empty(categories.as_ref());
            if let Some(e) = fetch_err {
                println!("⚠️  {}", e.user_message());
            }
            println!("CATEGORIES:");
            for label in known.labels() {
                println!("- {}", label);
            }
        }
        Commands::Theme { action } => {
            match action.unwrap_or(ThemeCommands::Show) {
                ThemeCommands::Show => {}
                ThemeCommands::Toggle => {
                    theme_store.toggle();
                }
                ThemeCommands::Light => theme_store.set_mode(ThemeMode::Light),
                ThemeCommands::Dark => theme_store.set_mode(ThemeMode::Dark),
            }
            print_theme(&theme_store);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            let state = AppState::new(store, theme_store, categories);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::start_server(port, state))?;
        }
    }
    Ok(())
}
