use colored::Colorize;
use curedoc_client::types::{EntryKind, HistoryEntry};
use curedoc_client::SidebarItem;

pub fn user(text: &str) {
    println!("{} {}", "You:".bright_green().bold(), text);
}

pub fn assistant(text: &str) {
    println!("\n{} {}\n", "CureBot:".bright_blue().bold(), text);
}

pub fn error(text: &str) {
    eprintln!("{} {}", "❌".bright_red(), text);
}

pub fn info(text: &str) {
    println!("{} {}", "💡".bright_yellow(), text.bright_black());
}

/// Lines of the `/history` listing, newest first, numbered 1-based
pub fn history_lines(items: &[SidebarItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let marker = if item.is_image { "[img]" } else { "[txt]" };
            format!("{:>3}. {} {}", item.index + 1, marker, item.label)
        })
        .collect()
}

/// Print a stored exchange the way it appeared when it happened
pub fn entry(entry: &HistoryEntry) {
    let time = entry.timestamp.format("%Y-%m-%d %H:%M");
    println!("{}", format!("--- {} ---", time).bright_black());
    if entry.kind == EntryKind::Image {
        let name = entry.image_ref.as_deref().unwrap_or("image");
        user(&format!("[uploaded {}]", name));
        if entry.has_custom_prompt() {
            user(&entry.query);
        }
    } else {
        user(&entry.query);
    }
    assistant(entry.display_response().unwrap_or("No response recorded"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_lines_are_one_based() {
        let items = vec![
            SidebarItem { index: 1, label: "chest x-ray".to_string(), is_image: true },
            SidebarItem { index: 0, label: "headache".to_string(), is_image: false },
        ];
        assert_eq!(
            history_lines(&items),
            vec!["  2. [img] chest x-ray".to_string(), "  1. [txt] headache".to_string()]
        );
    }
}
