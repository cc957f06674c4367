use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use localstore::{Config, KeyValueStore, Medium, RemoveOutcome, Task, TaskId, UpdateOutcome, now_ms};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "localstore")]
#[command(about = "localstore CLI - JSON record collections in a key-value store")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Directory holding the store (overrides the config file)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Config file (default: <config dir>/localstore/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored keys
    Keys,

    /// Print the raw value under a key
    Get { key: String },

    /// Store a raw value under a key
    Set { key: String, data: String },

    /// Delete a key
    Remove { key: String },

    /// Create an empty collection if the key is absent
    Init { key: String },

    /// Pretty-print the collection under a key
    List { key: String },

    /// Print the record with the given id
    Find { key: String, id: String },

    /// Append a JSON value to an existing collection
    Append { key: String, json: String },

    /// Replace the record with the given id (the id itself is kept)
    Update { key: String, id: String, json: String },

    /// Delete the record with the given id
    Delete { key: String, id: String },

    /// Add a task
    AddTask {
        description: String,

        /// Task id (default: a new UUID)
        #[arg(long)]
        id: Option<String>,

        #[arg(short, long, default_value_t = 0.0)]
        priority: f64,

        #[arg(short, long, default_value = "tasks")]
        key: String,
    },

    /// Mark a task completed
    Complete {
        id: String,

        #[arg(short, long, default_value = "tasks")]
        key: String,
    },

    /// Show tasks
    Tasks {
        #[arg(short, long, default_value = "tasks")]
        key: String,

        /// Include archived tasks
        #[arg(short, long)]
        all: bool,
    },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.store_path {
        config.store_path = Some(path);
    }

    let mut store = config.open_store()?;
    run(&mut store, cli.command)
}

fn run<M: Medium>(store: &mut KeyValueStore<M>, command: Commands) -> Result<()> {
    match command {
        Commands::Keys => {
            for key in store.keys()? {
                println!("{}", key);
            }
        }
        Commands::Get { key } => match store.get_raw(&key)? {
            Some(raw) => println!("{}", raw),
            None => println!("{}", "(absent)".dimmed()),
        },
        Commands::Set { key, data } => {
            store.set_raw(&key, &data)?;
        }
        Commands::Remove { key } => {
            store.remove_raw(&key)?;
        }
        Commands::Init { key } => {
            if store.init_collection(&key)? {
                println!("Created collection {}", key.bold());
            } else {
                println!("Collection {} already exists", key.bold());
            }
        }
        Commands::List { key } => match store.find_all(&key)? {
            Some(items) => println!("{}", serde_json::to_string_pretty(&items)?),
            None => println!("{}", "(absent)".dimmed()),
        },
        Commands::Find { key, id } => match store.find_by_id(&key, parse_id(&id))? {
            Some(item) => println!("{}", serde_json::to_string_pretty(&item)?),
            None => println!("{}", "not found".yellow()),
        },
        Commands::Append { key, json } => {
            let value = parse_json(&json)?;
            store.save(&key, &value)?;
        }
        Commands::Update { key, id, json } => {
            let value = parse_json(&json)?;
            report_update(store.update_by_id(&key, parse_id(&id), &value)?, &key)?;
        }
        Commands::Delete { key, id } => match store.remove_by_id(&key, parse_id(&id))? {
            RemoveOutcome::Removed => println!("{}", "removed".green()),
            RemoveOutcome::NotFound => println!("{}", "not found".yellow()),
            RemoveOutcome::CollectionMissing => return Err(eyre!("collection '{}' does not exist", key)),
        },
        Commands::AddTask {
            description,
            id,
            priority,
            key,
        } => {
            let id = match id {
                Some(raw) => serde_json::from_value(parse_id(&raw)).unwrap_or(TaskId::Text(raw)),
                None => TaskId::Text(uuid::Uuid::now_v7().to_string()),
            };
            let task = Task::new(id, description, false, false, priority);

            store.init_collection(&key)?;
            store.save(&key, &task)?;
            println!("Added task {}", task.id().to_string().bold());
        }
        Commands::Complete { id, key } => {
            let id = parse_id(&id);
            let mut task: Task = store
                .find_by_id_as(&key, id.clone())
                .context("Stored record is not a task")?
                .ok_or_else(|| eyre!("task {} not found", id))?;

            task.set_completed(true);
            task.set_updated_at(now_ms());
            report_update(store.update_by_id(&key, id, &task)?, &key)?;
        }
        Commands::Tasks { key, all } => {
            let tasks: Vec<Task> = store
                .find_all_as(&key)
                .context("Stored records are not tasks")?
                .unwrap_or_default();

            for task in tasks.iter().filter(|t| all || !t.archived()) {
                println!("{}", format_task(task));
            }
        }
    }

    Ok(())
}

fn report_update(outcome: UpdateOutcome, key: &str) -> Result<()> {
    match outcome {
        UpdateOutcome::Updated => println!("{}", "updated".green()),
        UpdateOutcome::NotFound => println!("{}", "not found".yellow()),
        UpdateOutcome::CollectionMissing => return Err(eyre!("collection '{}' does not exist", key)),
    }
    Ok(())
}

/// Ids that parse as JSON are used as-is (`2`, `"2"`); anything else is a string
fn parse_id(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("Argument is not valid JSON")
}

fn format_task(task: &Task) -> String {
    let mark = if task.completed() {
        "[x]".green().to_string()
    } else {
        "[ ]".to_string()
    };

    let updated = DateTime::<Utc>::from_timestamp_millis(task.updated_at())
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    let line = format!(
        "{} {} {} (p{}, updated {})",
        mark,
        task.id().to_string().bold(),
        task.description(),
        task.priority(),
        updated
    );

    if task.archived() { line.dimmed().to_string() } else { line }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localstore::MemoryMedium;
    use serde_json::json;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("2"), json!(2));
        assert_eq!(parse_id("\"2\""), json!("2"));
        assert_eq!(parse_id("abc-1"), json!("abc-1"));
    }

    #[test]
    fn test_add_and_complete_task() {
        let mut store = KeyValueStore::new(MemoryMedium::new());

        run(
            &mut store,
            Commands::AddTask {
                description: "ship it".to_string(),
                id: Some("5".to_string()),
                priority: 2.5,
                key: "tasks".to_string(),
            },
        )
        .unwrap();

        run(
            &mut store,
            Commands::Complete {
                id: "5".to_string(),
                key: "tasks".to_string(),
            },
        )
        .unwrap();

        let task: Task = store.find_by_id_as("tasks", 5).unwrap().unwrap();
        assert!(task.completed());
        assert_eq!(task.priority(), 2.5);
        assert!(task.updated_at() >= task.created_at());
    }

    #[test]
    fn test_add_task_id_forms() {
        let mut store = KeyValueStore::new(MemoryMedium::new());

        for id in ["1.0", "abc", "1.5", "\"7\""] {
            run(
                &mut store,
                Commands::AddTask {
                    description: format!("task {}", id),
                    id: Some(id.to_string()),
                    priority: 0.0,
                    key: "tasks".to_string(),
                },
            )
            .unwrap();
        }

        let ids: Vec<TaskId> = store.records::<Task>().unwrap().into_iter().map(|t| t.id().clone()).collect();
        assert_eq!(
            ids,
            vec![
                TaskId::Int(1),
                TaskId::Text("abc".to_string()),
                TaskId::Text("1.5".to_string()),
                TaskId::Text("7".to_string()),
            ]
        );
    }

    #[test]
    fn test_update_on_missing_collection_is_an_error() {
        let mut store = KeyValueStore::new(MemoryMedium::new());
        let result = run(
            &mut store,
            Commands::Update {
                key: "tasks".to_string(),
                id: "1".to_string(),
                json: "{}".to_string(),
            },
        );
        assert!(result.is_err());
    }
}
