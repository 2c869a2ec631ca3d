use finance_buddy::{
    chat::ChatSession,
    config::AppConfig,
    conversation::ConversationService,
    format::{format_date, format_message_time},
    models::Message,
    openai::ModelBackend,
    profile::{FinancialProfile, ProfileField},
    storage::{open_store, MessageStore, ProfileStore, TaskStore},
    tasks::TaskBoard,
};
use chrono::Local;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Commands:
  /profile              show your financial profile
  /set <field> <value>  edit one profile field (e.g. /set assets.investments 2500)
  /tasks                show the task checklist
  /toggle <id>          mark a task done or not done
  /help                 show this help
  /quit                 exit
Anything else is sent to your financial buddy.";

fn print_message(msg: &Message) {
    let local = msg.timestamp.with_timezone(&Local);
    let marker = if msg.is_error { " (error)" } else { "" };
    println!(
        "[{}] {}{}: {}",
        format_message_time(&local),
        msg.sender,
        marker,
        msg.text
    );
}

fn print_profile(profile: &FinancialProfile) {
    let mut section = "";
    for field in ProfileField::all() {
        if field.section() != section {
            section = field.section();
            println!("\n== {} ==", section);
        }
        println!("  {:<28} {}", field.label(), field.display(profile));
    }
}

fn print_tasks(board: &TaskBoard) {
    for task in board.tasks() {
        let mark = if task.completed { "x" } else { " " };
        println!("  [{}] {:>2}. {} ({})", mark, task.id, task.title, task.category);
        println!("         {}", task.description);
    }

    let progress = board.progress();
    println!(
        "  {} of {} done ({}%)",
        progress.completed, progress.total, progress.percent
    );
    if progress.all_done {
        println!("  Congratulations! You've completed all your financial tasks.");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Create components
    let slots = open_store(config.database_url.as_deref()).await;
    let profiles = ProfileStore::new(slots.clone());
    let model = ModelBackend::from_config(&config.llm)?;
    let service = Arc::new(ConversationService::new(model, profiles.clone()));

    let mut chat = ChatSession::open(service, MessageStore::messages(slots.clone())).await;
    let mut board = TaskBoard::open(TaskStore::tasks(slots)).await;

    info!("Finance Buddy terminal session started");

    // Transcript with a date line whenever the day changes
    let mut day = String::new();
    for msg in chat.messages() {
        let date = format_date(&msg.timestamp.with_timezone(&Local));
        if date != day {
            println!("--- {} ---", date);
            day = date;
        }
        print_message(msg);
    }
    println!("\n{}\n", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/profile" => print_profile(&profiles.load().await),
            "/tasks" => print_tasks(&board),
            "/toggle" => match board.toggle(rest.trim()).await {
                Ok(task) => println!(
                    "  {} marked {}",
                    task.title,
                    if task.completed { "done" } else { "not done" }
                ),
                Err(e) => println!("  {}", e),
            },
            "/set" => {
                let (path, value) = rest.trim().split_once(' ').unwrap_or((rest.trim(), ""));
                let result = match path.parse::<ProfileField>() {
                    Ok(field) => profiles
                        .edit(field, value)
                        .await
                        .map(|profile| (field, profile)),
                    Err(e) => Err(e),
                };
                match result {
                    Ok((field, profile)) => {
                        println!("  {}: {}", field.label(), field.display(&profile))
                    }
                    Err(e) => println!("  {}", e),
                }
            }
            _ => {
                if let Some(reply) = chat.send(line).await {
                    print_message(&reply);
                }
            }
        }
    }

    Ok(())
}
