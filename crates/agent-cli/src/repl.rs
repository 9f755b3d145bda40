//! Interactive chat loop

use std::io::Write as _;
use std::sync::Arc;

use agent_core::session::SessionId;
use agent_core::{
    Agent, AgentBuilder, AgentError, ChatSession, FileSessionStore, LlmProvider,
    MemorySessionStore, Session, SessionStore, TurnReport,
};
use agent_runtime::OllamaProvider;
use agent_tools::presets::chat_instructions;
use agent_tools::{Personality, Preset};
use anyhow::Context as _;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::Cli;

const PREVIEW_CHARS: usize = 200;

const SESSION_LIST_LIMIT: usize = 20;

enum Input {
    Exit,
    Reset,
    Empty,
    Personality(String),
    Message(String),
}

/// `personalities` enables the `personality:NAME` command
fn classify(line: &str, personalities: bool) -> Input {
    let line = line.trim();
    if personalities {
        if let Some(name) = line.strip_prefix("personality:") {
            return Input::Personality(name.trim().to_lowercase());
        }
    }
    match line.to_lowercase().as_str() {
        "exit" | "quit" => Input::Exit,
        "reset" => Input::Reset,
        "" => Input::Empty,
        _ => Input::Message(line.to_string()),
    }
}

/// Sessions live on disk with `--session-dir`, otherwise only for this process
fn open_store(cli: &Cli) -> anyhow::Result<Box<dyn SessionStore>> {
    match &cli.session_dir {
        Some(dir) => {
            let store = FileSessionStore::open(dir)
                .with_context(|| format!("cannot open session directory {}", dir.display()))?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(MemorySessionStore::new())),
    }
}

/// A stored session by id, or the most recently active one for `latest`
fn find_session(store: &dyn SessionStore, wanted: &str) -> anyhow::Result<Session> {
    let found = if wanted.eq_ignore_ascii_case("latest") {
        store.list(None, 1)?.into_iter().next()
    } else {
        store.load(&SessionId::from_string(wanted))?
    };
    found.with_context(|| format!("no stored session '{wanted}'"))
}

fn open_chat(
    cli: &Cli,
    agent: Arc<Agent>,
    store: &dyn SessionStore,
) -> anyhow::Result<ChatSession> {
    match &cli.resume {
        Some(wanted) => Ok(ChatSession::resume(agent, find_session(store, wanted)?)),
        None => Ok(ChatSession::new(agent)),
    }
}

pub async fn run(cli: &Cli, provider: Arc<OllamaProvider>) -> anyhow::Result<()> {
    let tools = cli.agent.registry(cli.workdir.clone())?;
    let agent = AgentBuilder::new()
        .provider(provider.clone())
        .tools(tools)
        .config(cli.agent_config())
        .build()?;
    let agent = Arc::new(agent);

    let store = open_store(cli)?;
    let mut chat = open_chat(cli, agent.clone(), store.as_ref())?;
    let personalities = cli.agent == Preset::Chat;

    print_banner(cli, agent.tools().len(), &chat);
    if !provider.health_check().await.unwrap_or(false) {
        println!(
            "{} Ollama is not reachable at {}. Start it with `ollama serve`.\n",
            style("!").yellow(),
            style(provider.config().base_url()).cyan()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", style("You: ").green());
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("{}", style("\n\nSession terminated by user.").cyan());
                return Ok(());
            }
        };

        // EOF behaves like `exit`
        let input = line.map_or(Input::Exit, |l| classify(&l, personalities));

        match input {
            Input::Exit => {
                println!("{}", style("\nGoodbye!").cyan());
                break;
            }
            Input::Empty => {}
            Input::Reset => {
                chat.reset();
                println!("{}", style("Conversation reset.").yellow());
                save(store.as_ref(), &chat);
            }
            Input::Personality(name) => {
                let reply = change_personality(&mut chat, &name);
                println!("{}", style(format!("\nSystem: {reply}\n")).yellow());
                save(store.as_ref(), &chat);
            }
            Input::Message(text) => {
                let result = tokio::select! {
                    result = chat.send_with_report(&text) => result,
                    _ = tokio::signal::ctrl_c() => {
                        println!("{}", style("\n\nSession terminated by user.").cyan());
                        return Ok(());
                    }
                };

                match result {
                    Ok(report) => {
                        if cli.verbose {
                            print_tool_rounds(&report);
                        }
                        println!("{}", style(format!("\nAgent: {}\n", report.answer)).blue());
                        save(store.as_ref(), &chat);
                    }
                    Err(e) => print_error(&e),
                }
            }
        }
    }

    Ok(())
}

/// Switch the chat preset's tone; memory starts over under the new prompt
fn change_personality(chat: &mut ChatSession, name: &str) -> String {
    match name.parse::<Personality>() {
        Ok(personality) => {
            chat.change_instructions(&chat_instructions(personality));
            format!("Personality changed to '{personality}'.")
        }
        Err(e) => e.to_string(),
    }
}

fn print_banner(cli: &Cli, tool_count: usize, chat: &ChatSession) {
    let title = format!("\n===== {} Agent =====\n", capitalize(cli.agent.name()));
    println!("{}", style(title).cyan().bold());
    println!("{}", style(format!("Using model: {}", cli.model)).cyan());
    println!("{}", style(format!("Tools available: {tool_count}")).cyan());
    if cli.resume.is_some() {
        let session = chat.session();
        let resumed = format!("Resumed: {} ({} turns)", session.title(), session.turn_count());
        println!("{}", style(resumed).cyan());
    }
    println!("{}", style("Type 'exit' or 'quit' to end the session.").cyan());
    println!("{}", style("Type 'reset' to reset the conversation.").cyan());
    if cli.agent == Preset::Chat {
        println!("{}", style(format!("Chat agent personality: {}", cli.personality)).cyan());
        println!("{}", style("Type 'personality:NAME' to change personality.").cyan());
    }
    println!();
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

fn print_tool_rounds(report: &TurnReport) {
    for round in &report.tool_rounds {
        let marker = if round.success {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "  {marker} {} {}",
            style(&round.tool).cyan(),
            style(preview(&round.output, PREVIEW_CHARS)).dim()
        );
    }
    if report.budget_exhausted {
        println!("  {}", style("Tool budget exhausted").yellow());
    }
}

fn print_error(err: &AgentError) {
    println!("{}", style(format!("\nError: {err}\n")).red());
    if err.is_retryable() {
        println!("{}", style(err.user_message()).dim());
    }
}

/// First `max` characters on one line
fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > max {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

fn save(store: &dyn SessionStore, chat: &ChatSession) {
    if let Err(e) = store.save(chat.session()) {
        tracing::warn!(session = %chat.session().id, error = %e, "Session not saved");
        println!("{} Session not saved: {e}", style("!").yellow());
    }
}

/// Print stored sessions, most recently active first
pub fn list_sessions(cli: &Cli) -> anyhow::Result<()> {
    if cli.session_dir.is_none() {
        println!("No session directory. Pass --session-dir or set AGENT_SESSION_DIR.");
        return Ok(());
    }
    let store = open_store(cli)?;
    let sessions = store.list(None, SESSION_LIST_LIMIT)?;
    if sessions.is_empty() {
        println!("No stored sessions.");
    }
    for session in sessions {
        println!(
            "  {} {} {}",
            style(session.id.as_str()).cyan(),
            session.title(),
            style(format!(
                "({} turns, {})",
                session.turn_count(),
                session.updated_at.format("%Y-%m-%d %H:%M")
            ))
            .dim()
        );
    }
    Ok(())
}

/// Print the models Ollama has installed
pub async fn list_models(provider: &dyn LlmProvider) -> anyhow::Result<()> {
    let models = provider.list_models().await?;
    if models.is_empty() {
        println!("No models installed. Pull one with `ollama pull llama3`.");
        return Ok(());
    }
    for model in models {
        let size = model.size.map(format_size).unwrap_or_default();
        println!("  {} {}", style(&model.name).cyan(), style(size).dim());
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else {
        format!("{:.0} MB", bytes / MB)
    }
}
