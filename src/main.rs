use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use questor::builtins::{ToolContext, standard_registry};
use questor::catalog::ToolCatalog;
use questor::cli::Cli;
use questor::cli::commands::{Commands, TodoCommands, ToolCommands, VaultCommands};
use questor::config::Config;
use questor::exec::ExecutionAdapter;
use questor::improve::LearningStore;
use questor::library::{LibraryToolUpdate, ToolKind, ToolLibrary, new_tool};
use questor::retrieval::RetrievalEngine;
use questor::store::Database;
use questor::todos::{TodoStatus, TodoStore};
use questor::vault::ResearchVault;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("questor")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("questor.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let db = Database::open(&config.storage.database_path)
        .context("Failed to open questor database")?;

    match &cli.command {
        Commands::Retrieve { task } => handle_retrieve(task, config, &db),
        Commands::Tool { command } => handle_tool_command(command, config, &db).await,
        Commands::Vault { command } => handle_vault_command(command, &db),
        Commands::Todo { command } => handle_todo_command(command, &db),
        Commands::Learnings { category } => handle_learnings(category.as_deref(), &db),
    }
}

fn handle_retrieve(task: &str, config: &Config, db: &Database) -> Result<()> {
    info!("Previewing retrieval for task: {}", task);

    let library = ToolLibrary::new(db.clone());
    let mut catalog: ToolCatalog = standard_registry().descriptors().into_iter().collect();
    for descriptor in library.descriptors()? {
        catalog.add(descriptor);
    }

    let engine = RetrievalEngine::new(config.retrieval.to_retrieval_config());
    let candidates = engine.retrieve(task, &catalog);

    if candidates.is_empty() {
        println!("{}", "No candidate tools".yellow());
        return Ok(());
    }

    println!("{} {}", "Candidates for:".green(), task);
    for descriptor in candidates {
        let risk = match descriptor.risk {
            questor::catalog::RiskLevel::Low => "low".normal(),
            questor::catalog::RiskLevel::Medium => "medium".yellow(),
            questor::catalog::RiskLevel::High => "high".red(),
        };
        let sticky = if descriptor.sticky { " (sticky)" } else { "" };
        println!("  {} [{}]{} - {}", descriptor.name.cyan(), risk, sticky, descriptor.description);
    }
    Ok(())
}

async fn handle_tool_command(command: &ToolCommands, config: &Config, db: &Database) -> Result<()> {
    let library = ToolLibrary::new(db.clone());

    match command {
        ToolCommands::Create {
            name,
            description,
            kind,
            body,
            schema,
            timeout,
        } => {
            let Some(kind) = ToolKind::from_str(kind) else {
                bail!("unknown tool kind '{}' (expected shell or python)", kind);
            };
            let mut tool = new_tool(name, description, kind, body);
            if let Some(schema) = schema {
                tool.args_schema = serde_json::from_str(schema).context("Failed to parse args schema")?;
            }
            if let Some(timeout) = timeout {
                tool.timeout_seconds = *timeout;
            }
            library.create(tool)?;
            println!("{} {}", "Created tool:".green(), name);
        }
        ToolCommands::Show { name } => {
            let tool = library.show(name)?;
            println!("{} {}", "Tool:".green(), tool.name.cyan());
            println!("  kind: {}", tool.kind.as_str());
            println!("  description: {}", tool.description);
            println!("  timeout: {}s", tool.timeout_seconds);
            println!("  schema: {}", tool.args_schema);
            println!("  body:\n{}", tool.body);
        }
        ToolCommands::List { kind } => {
            let kind = match kind.as_deref() {
                Some(k) => match ToolKind::from_str(k) {
                    Some(kind) => Some(kind),
                    None => bail!("unknown tool kind '{}' (expected shell or python)", k),
                },
                None => None,
            };
            let tools = library.list(kind)?;
            if tools.is_empty() {
                println!("{}", "No library tools".yellow());
            }
            for tool in tools {
                println!("{} [{}] - {}", tool.name.cyan(), tool.kind.as_str(), tool.description);
            }
        }
        ToolCommands::Update {
            name,
            description,
            kind,
            body,
            schema,
            timeout,
        } => {
            let kind = match kind.as_deref() {
                Some(k) => match ToolKind::from_str(k) {
                    Some(kind) => Some(kind),
                    None => bail!("unknown tool kind '{}' (expected shell or python)", k),
                },
                None => None,
            };
            let args_schema = match schema {
                Some(schema) => {
                    Some(serde_json::from_str(schema).context("Failed to parse args schema")?)
                }
                None => None,
            };
            library.update(
                name,
                LibraryToolUpdate {
                    description: description.clone(),
                    kind,
                    body: body.clone(),
                    args_schema,
                    metadata: None,
                    timeout_seconds: *timeout,
                },
            )?;
            println!("{} {}", "Updated tool:".green(), name);
        }
        ToolCommands::Delete { name } => {
            library.delete(name)?;
            println!("{} {}", "Deleted tool:".red(), name);
        }
        ToolCommands::Run { name, args, timeout } => {
            let args: serde_json::Value =
                serde_json::from_str(args).context("Failed to parse args as JSON")?;

            let root = std::env::current_dir().context("Failed to resolve working directory")?;
            let ctx = ToolContext::new(root, TodoStore::new(db.clone()));
            let adapter = ExecutionAdapter::new(Arc::new(standard_registry()), library.clone())
                .with_config(config.exec.to_exec_config());

            let observation = library.run(name, &args, *timeout, &adapter, &ctx).await?;
            if observation.ok {
                println!("{}", observation.output);
            } else {
                println!(
                    "{} {}",
                    "Failed:".red(),
                    observation.error.as_deref().unwrap_or("unknown error")
                );
                if !observation.output.is_empty() {
                    println!("{}", observation.output);
                }
            }
        }
    }
    Ok(())
}

fn handle_vault_command(command: &VaultCommands, db: &Database) -> Result<()> {
    let vault = ResearchVault::new(db.clone());

    match command {
        VaultCommands::Set { key, content, namespace } => {
            let note = vault.set(namespace.as_deref(), key, content)?;
            println!("{} {}/{}", "Set:".green(), note.namespace, note.key);
        }
        VaultCommands::Append { key, content, namespace } => {
            let note = vault.append(namespace.as_deref(), key, content)?;
            println!("{} {}/{} ({} chars)", "Appended:".green(), note.namespace, note.key, note.content.len());
        }
        VaultCommands::Get { key, namespace } => {
            let note = vault.get(namespace.as_deref(), key)?;
            println!("{}", note.content);
        }
        VaultCommands::List { namespace } => {
            let notes = vault.list(namespace.as_deref())?;
            if notes.is_empty() {
                println!("{}", "No notes".yellow());
            }
            for note in notes {
                println!("{} ({} chars, updated {})", note.key.cyan(), note.content.len(), note.updated_at);
            }
        }
        VaultCommands::Delete { key, namespace } => {
            vault.delete(namespace.as_deref(), key)?;
            println!("{} {}", "Deleted:".red(), key);
        }
    }
    Ok(())
}

fn handle_todo_command(command: &TodoCommands, db: &Database) -> Result<()> {
    let todos = TodoStore::new(db.clone());

    match command {
        TodoCommands::Add { content } => {
            let todo = todos.add(content)?;
            println!("{} #{} {}", "Added:".green(), todo.id, todo.content);
        }
        TodoCommands::Update { id, status, content } => {
            let status = match status.as_deref() {
                Some(s) => match TodoStatus::from_str(s) {
                    Some(status) => Some(status),
                    None => bail!("unknown status '{}' (expected pending, in_progress, completed)", s),
                },
                None => None,
            };
            let todo = todos.update(*id, status, content.as_deref())?;
            println!("{} #{} {} ({})", "Updated:".green(), todo.id, todo.content, todo.status.as_str());
        }
        TodoCommands::List { status } => {
            let filter = match status.as_deref() {
                Some(s) => match TodoStatus::from_str(s) {
                    Some(status) => Some(status),
                    None => bail!("unknown status '{}' (expected pending, in_progress, completed)", s),
                },
                None => None,
            };
            let items = todos.list(filter)?;
            if items.is_empty() {
                println!("{}", "No todos".yellow());
            }
            for todo in items {
                println!("#{} [{}] {}", todo.id, todo.status.as_str(), todo.content);
            }
        }
        TodoCommands::ClearCompleted => {
            let removed = todos.clear_completed()?;
            println!("{} {} todo(s)", "Cleared:".green(), removed);
        }
    }
    Ok(())
}

fn handle_learnings(category: Option<&str>, db: &Database) -> Result<()> {
    let store = LearningStore::new(db.clone());
    let learnings = match category {
        Some(category) => store.for_category(category)?,
        None => store.all()?,
    };

    if learnings.is_empty() {
        println!("{}", "No learnings".yellow());
    }
    for learning in learnings {
        println!(
            "{} [{}] {}",
            format!("#{}", learning.id).cyan(),
            learning.category,
            learning.content
        );
        println!("  task: {} ({})", learning.task_description, learning.created_at);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
