//! Terminal output: progress bars and result rendering

use crate::core::descriptor::{AiAnnotation, MediaDescriptor};
use crate::core::history::HistoryEntry;
use crate::core::queue::{ItemStatus, QueueItem};
use crate::fallback::ManualPrompt;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Create the download progress bar; hidden when progress output is off
pub fn download_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}

/// Print the resolved media card
pub fn print_descriptor(descriptor: &MediaDescriptor) {
    println!();
    println!("  {}", descriptor.title.bold());
    println!("  {} {}", "by".dimmed(), descriptor.author.cyan());
    println!(
        "  {} {}  {} {}  {} {}",
        "likes".dimmed(),
        descriptor.stats.likes,
        "comments".dimmed(),
        descriptor.stats.comments,
        "shares".dimmed(),
        descriptor.stats.shares
    );
    println!("  {} {}", "source".dimmed(), descriptor.provider);

    if let Some(annotation) = &descriptor.annotation {
        print_annotation(annotation);
    }
    println!();
}

/// Print the AI annotation lines; shown separately when enrichment settles
/// after the base card
pub fn print_annotation(annotation: &AiAnnotation) {
    println!(
        "  {} {}  {} {}/100",
        "tags".dimmed(),
        annotation.tags.join(" ").magenta(),
        "viral".dimmed(),
        annotation.viral_score
    );
    println!("  {}", annotation.summary.italic());
}

fn status_label(item: &QueueItem) -> String {
    match item.status {
        ItemStatus::Pending => "pending".dimmed().to_string(),
        ItemStatus::Analyzing => "analyzing".yellow().to_string(),
        ItemStatus::Ready => {
            if item.show_bypass {
                "ready (manual link available)".yellow().to_string()
            } else {
                "ready".cyan().to_string()
            }
        }
        ItemStatus::Downloading => format!("{} {}%", "downloading".blue(), item.progress),
        ItemStatus::Completed => "done".green().to_string(),
        ItemStatus::Failed => "failed".red().to_string(),
    }
}

/// Print one line per queue item
pub fn print_queue(items: &[QueueItem]) {
    for item in items {
        let name = item.title.as_deref().unwrap_or(&item.url);
        let mut line = format!("  {} {}", status_label(item), name);
        if let Some(error) = &item.error {
            line.push_str(&format!("  {}", error.red()));
        }
        println!("{}", line);
    }
}

/// Print the duplicate-removal notice for bulk input
pub fn print_duplicates_notice(removed: usize) {
    if removed > 0 {
        println!(
            "{} {} duplicate link(s) removed",
            "note:".yellow(),
            removed
        );
    }
}

/// Print the manual-bypass prompt after exhaustion
pub fn print_manual_prompt(prompt: &ManualPrompt) {
    println!();
    println!("{}", "Automatic download failed on every route.".yellow());
    println!(
        "  {} {} {} {}",
        prompt.title.bold(),
        "by".dimmed(),
        prompt.author,
        format!("({})", prompt.kind).dimmed()
    );
    println!("  Open this link in a browser to save it manually:");
    println!("  {}", prompt.url.underline().cyan());
    println!();
}

/// Print the download history, most recent first
pub fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("{}", "History is empty.".dimmed());
        return;
    }
    for entry in entries {
        let when = chrono::DateTime::from_timestamp_millis(entry.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let quality = entry
            .quality
            .map(|q| q.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {}  {}  {} {}",
            when.dimmed(),
            entry.kind,
            quality,
            entry.title.bold(),
            format!("by {}", entry.author).dimmed()
        );
    }
}
