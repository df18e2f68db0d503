use anyhow::Result;
use colored::Colorize;
use parley_core::models::{Message, Role, TurnOutcome};
use parley_core::{ConversationSession, ParleyCore};
use parley_traits::GenerationClient;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::ChatArgs;
use crate::commands::history::resolve_conversation_id_optional;
use crate::commands::utils::message_line;

const QUIT_COMMAND: &str = "/quit";

pub async fn run(
    core: Arc<ParleyCore>,
    args: ChatArgs,
    generator: Arc<dyn GenerationClient>,
) -> Result<()> {
    let model = generator.model().to_string();
    let session = open_session(&core, args.conversation.as_deref(), generator).await?;

    println!(
        "{} {} {}",
        "Conversation".bold(),
        session.conversation_id(),
        format!("({model})").dimmed()
    );
    println!("{}", format!("Type {QUIT_COMMAND} to exit.").dimmed());

    let loaded = session.load_history().await;
    if loaded > 0 {
        println!();
        for entry in session.snapshot().messages {
            println!("{}", message_line(&entry.message));
        }
    }
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".dimmed());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let text = line.trim();
        if text == QUIT_COMMAND {
            break;
        }
        if text.is_empty() {
            continue;
        }

        submit_turn(&session, text).await;
    }

    Ok(())
}

async fn open_session(
    core: &Arc<ParleyCore>,
    conversation: Option<&str>,
    generator: Arc<dyn GenerationClient>,
) -> Result<ConversationSession> {
    let Some(requested) = conversation else {
        return Ok(core.start_session(generator));
    };

    let conversation_id = resolve_conversation_id_optional(core, requested)
        .await?
        .unwrap_or_else(|| requested.to_string());
    Ok(core.resume_session(&conversation_id, generator))
}

async fn submit_turn(session: &ConversationSession, text: &str) {
    let echoed = Message {
        id: String::new(),
        conversation_id: session.conversation_id().to_string(),
        role: Role::User,
        content: text.to_string(),
        created_at: chrono::Utc::now().timestamp_millis(),
        tokens_used: None,
    };
    println!("{}", message_line(&echoed));

    match session.submit(text).await {
        Ok(TurnOutcome::Replied(reply)) => println!("{}", message_line(&reply)),
        Ok(TurnOutcome::Failed { apology }) => {
            println!("{}", message_line(&apology).red());
        }
        Err(err) => eprintln!("{} {}", "Warning:".yellow().bold(), err),
    }
}
