use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("api key not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Set your API key with:");
        eprintln!("  {} export OPENAI_API_KEY=<value>", "$".dimmed());
        eprintln!("  or chat without the service:");
        eprintln!("  {} parley chat --offline", "$".dimmed());
    }

    if msg.contains("conversation not found") || msg.contains("ambiguous") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  List recent conversations with:");
        eprintln!("  {} parley history list", "$".dimmed());
    }

    if msg.contains("database") || msg.contains("lock") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check that no other parley process is using the database,");
        eprintln!("  or point at another file with --db-path.");
    }

    if msg.contains("connection refused") || msg.contains("network") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check your internet connection and try again.");
    }

    std::process::exit(1);
}
