//! Terminal output.

use colored::*;
use serde_json::Value;
use tml_delta::{ChangeBlock, ChangeType, DeltaTracker};

pub fn header(text: &str) {
    let bar = "═".repeat(60);
    println!("\n{}", bar.bright_cyan());
    println!("  {}", text.bold().bright_white());
    println!("{}", bar.bright_cyan());
}

pub fn section(text: &str) {
    println!("\n{} {}", "▸".bright_yellow(), text.bold());
}

pub fn step(text: &str) {
    println!("  {} {}", "•".bright_green(), text);
}

pub fn warning(text: &str) {
    println!("  {} {}", "!".bright_red(), text);
}

/// The tracker's units, one colored symbol each.
pub fn units(tracker: &DeltaTracker<Value>) -> String {
    tracker
        .to_string()
        .chars()
        .map(|symbol| {
            let text = symbol.to_string();
            match symbol {
                '+' => text.bright_green().bold().to_string(),
                'U' => text.bright_yellow().bold().to_string(),
                'X' => text.bright_red().bold().to_string(),
                _ => text.dimmed().to_string(),
            }
        })
        .collect()
}

fn value(value: &Option<Value>) -> String {
    value
        .as_ref()
        .map_or_else(|| "?".dimmed().to_string(), Value::to_string)
}

pub fn block(block: &ChangeBlock<Value>) -> String {
    let kind = match block.change_type {
        ChangeType::Insert => "INSERT".bright_green(),
        ChangeType::Update => "UPDATE".bright_yellow(),
        ChangeType::Delete => "DELETE".bright_red(),
    };
    let values = match block.change_type {
        ChangeType::Insert => format!("new={}", value(&block.new_value)),
        ChangeType::Update => format!(
            "old={} new={}",
            value(&block.old_value),
            value(&block.new_value)
        ),
        ChangeType::Delete => format!("old={}", value(&block.old_value)),
    };
    format!("{} {:>4}..{:<4} {}", kind.bold(), block.start, block.end, values)
}

pub fn show_tracker(tracker: &DeltaTracker<Value>) {
    let border = "─".repeat(44);
    println!("  ┌{}┐", border);
    println!("  │ units   {}", units(tracker));
    println!(
        "  │ source  {:<6} target  {:<6} changed  {}",
        tracker.source_size(),
        tracker.target_size(),
        tracker.change_count()
    );
    println!("  ├{}┤", border);
    let mut empty = true;
    for change in tracker.blocks() {
        println!("  │ {}", block(&change));
        empty = false;
    }
    if empty {
        println!("  │ {}", "(no changes)".dimmed());
    }
    println!("  └{}┘", border);
}
