use chrono::{DateTime, Utc};
use curedoc_types::HistoryEntry;

use crate::config::ClientConfig;

/// Plain-text consultation report built from local history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReport {
    pub filename: String,
    pub content: String,
}

/// What the download action should fetch or save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// Server-rendered PDF at this absolute URL
    Pdf(String),
    /// No session to report on; save a locally built text report
    TextReport(TextReport),
}

/// Pick the download target: the server's PDF link first, then the PDF
/// of the active session, then a text report over the whole history.
pub fn resolve_download(
    config: &ClientConfig,
    pdf_link: Option<&str>,
    session_id: Option<&str>,
    history: &[HistoryEntry],
    now: DateTime<Utc>,
) -> DownloadTarget {
    if let Some(link) = pdf_link {
        return DownloadTarget::Pdf(config.resolve_link(link));
    }
    if let Some(session_id) = session_id {
        return DownloadTarget::Pdf(config.pdf_url(session_id));
    }
    DownloadTarget::TextReport(text_report(history, now))
}

pub fn text_report(history: &[HistoryEntry], now: DateTime<Utc>) -> TextReport {
    let mut content = String::from("=== CureBot Medical Consultation Report ===\n\n");
    content.push_str(&format!("Generated: {}\n\n", now.format("%Y-%m-%d %H:%M:%S UTC")));

    for entry in history {
        content.push_str(&format!(
            "[{}] {}\n",
            entry.timestamp.format("%H:%M:%S"),
            entry.kind.report_heading()
        ));
        content.push_str(&format!("You: {}\n", entry.query));
        content.push_str(&format!(
            "CureBot: {}\n",
            entry.display_response().unwrap_or("No response recorded")
        ));
        if let Some(solution) = entry.final_solution.as_deref() {
            if !entry.response.is_empty() && !solution.is_empty() {
                content.push_str(&format!("Final solution: {}\n", solution));
            }
        }
        content.push('\n');
    }

    TextReport {
        filename: format!("curebot_report_{}.txt", now.format("%Y-%m-%d")),
        content,
    }
}
