use anyhow::{Result, bail};
use comfy_table::{Cell, Table};
use serde::Serialize;
use std::sync::Arc;

use crate::cli::HistoryCommands;
use crate::commands::utils::{format_timestamp, message_line, short_id};
use crate::output::{OutputFormat, json::print_json};
use parley_core::ParleyCore;
use parley_core::history::{date_label, local_today};
use parley_core::models::ConversationGroup;

#[derive(Debug, Serialize)]
struct ConversationSummary {
    conversation_id: String,
    preview: String,
    date: Option<String>,
    latest_at: Option<i64>,
    message_count: usize,
    user_count: usize,
    assistant_count: usize,
    total_tokens: u64,
}

impl ConversationSummary {
    fn from_group(group: &ConversationGroup, today: chrono::NaiveDate) -> Self {
        Self {
            conversation_id: group.conversation_id.clone(),
            preview: group.preview.clone(),
            date: group
                .latest_at()
                .and_then(|ts| date_label(ts, today))
                .map(|label| label.to_string()),
            latest_at: group.latest_at(),
            message_count: group.message_count(),
            user_count: group.stats.user_count,
            assistant_count: group.stats.assistant_count,
            total_tokens: group.stats.total_tokens,
        }
    }
}

pub async fn run(
    core: Arc<ParleyCore>,
    command: HistoryCommands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        HistoryCommands::List { limit } => list_conversations(&core, limit, format).await,
        HistoryCommands::Show { id } => show_conversation(&core, &id, format).await,
    }
}

async fn list_conversations(
    core: &Arc<ParleyCore>,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let history = core.history();
    let groups = match limit {
        Some(limit) => history.load_with_limit(limit).await?,
        None => history.load().await?,
    };

    let today = local_today();
    let summaries: Vec<ConversationSummary> = groups
        .iter()
        .map(|group| ConversationSummary::from_group(group, today))
        .collect();

    if format.is_json() {
        return print_json(&summaries);
    }

    if summaries.is_empty() {
        println!("No conversations yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Preview", "Date", "Messages", "Tokens"]);

    for summary in summaries {
        table.add_row(vec![
            Cell::new(short_id(&summary.conversation_id)),
            Cell::new(summary.preview),
            Cell::new(summary.date.unwrap_or_else(|| "-".to_string())),
            Cell::new(summary.message_count),
            Cell::new(summary.total_tokens),
        ]);
    }

    crate::output::table::print_table(table)
}

async fn show_conversation(core: &Arc<ParleyCore>, id: &str, format: OutputFormat) -> Result<()> {
    let group = resolve_conversation(core, id).await?;

    if format.is_json() {
        return print_json(&group);
    }

    println!("Conversation: {}", group.conversation_id);
    println!(
        "Messages: {} ({} from you, {} replies)",
        group.message_count(),
        group.stats.user_count,
        group.stats.assistant_count
    );
    println!("Tokens: {}", group.stats.total_tokens);
    println!("Last message: {}", format_timestamp(group.latest_at()));

    let today = local_today();
    let mut current_label = None;
    for message in group.chronological() {
        let label = date_label(message.created_at, today);
        if label != current_label {
            println!();
            if let Some(label) = label {
                println!("{label}");
            }
            current_label = label;
        }
        println!("{}", message_line(message));
    }

    Ok(())
}

async fn resolve_conversation(core: &Arc<ParleyCore>, id: &str) -> Result<ConversationGroup> {
    let groups = core.history().load().await?;
    match pick_conversation(groups, id)? {
        Some(group) => Ok(group),
        None => bail!("Conversation not found: {}", id),
    }
}

/// Full conversation id for `id`, if it names a stored conversation.
pub async fn resolve_conversation_id_optional(
    core: &Arc<ParleyCore>,
    id: &str,
) -> Result<Option<String>> {
    let groups = core.history().load().await?;
    Ok(pick_conversation(groups, id)?.map(|group| group.conversation_id))
}

/// Exact id first, then a unique prefix.
fn pick_conversation(groups: Vec<ConversationGroup>, id: &str) -> Result<Option<ConversationGroup>> {
    if let Some(index) = groups.iter().position(|group| group.conversation_id == id) {
        return Ok(groups.into_iter().nth(index));
    }

    let mut matches = groups
        .into_iter()
        .filter(|group| group.conversation_id.starts_with(id))
        .collect::<Vec<_>>();

    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches.remove(0))),
        _ => bail!("Conversation id is ambiguous: {}", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::models::ConversationStats;

    fn group(id: &str) -> ConversationGroup {
        ConversationGroup {
            conversation_id: id.to_string(),
            messages: Vec::new(),
            stats: ConversationStats::default(),
            preview: "New conversation".to_string(),
        }
    }

    #[test]
    fn test_pick_exact_and_prefix() {
        let groups = vec![group("conv_abc1"), group("conv_abd2"), group("default")];

        let exact = pick_conversation(groups.clone(), "default").unwrap();
        assert_eq!(exact.unwrap().conversation_id, "default");

        let prefixed = pick_conversation(groups.clone(), "conv_abd").unwrap();
        assert_eq!(prefixed.unwrap().conversation_id, "conv_abd2");

        assert!(pick_conversation(groups.clone(), "missing").unwrap().is_none());
        assert!(pick_conversation(groups, "conv_ab").is_err());
    }
}
