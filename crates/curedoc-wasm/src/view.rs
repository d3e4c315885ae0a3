use curedoc_client::{FollowupError, SidebarItem};
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::dom;
use crate::markdown;
use crate::utils;

pub const CHAT_BOX: &str = "chatBox";
pub const WELCOME: &str = "welcomeMessage";
pub const HISTORY_LIST: &str = "chatHistoryContainer";
pub const REPORT_SECTION: &str = "reportSection";
pub const LOADING: &str = "loading";

/// Who a chat turn belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    fn class(&self) -> &'static str {
        match self {
            Sender::User => "message user-message",
            Sender::Assistant => "message bot-message",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "CureBot",
        }
    }
}

/// Inner HTML of a text turn
pub fn turn_html(sender: Sender, content: &str, time: &str) -> String {
    let body = markdown::render_turn_content(content, sender == Sender::Assistant);
    format!(
        r#"<strong>{}:</strong> <div class="message-content">{}</div><span class="message-time">{}</span>"#,
        sender.name(),
        body,
        utils::escape_html(time)
    )
}

/// Inner HTML of the turn announcing an uploaded image.
///
/// `preview_url` is only known for images picked in this page load; stored
/// entries fall back to the file name.
pub fn image_turn_html(preview_url: Option<&str>, file_name: Option<&str>, time: &str) -> String {
    let body = match (preview_url, file_name) {
        (Some(url), _) => format!(
            r#"<div class="uploaded-image"><img src="{}" alt="Uploaded medical image"></div>"#,
            utils::escape_html(url)
        ),
        (None, Some(name)) => format!("Uploaded medical image ({})", utils::escape_html(name)),
        (None, None) => "Uploaded medical image".to_string(),
    };
    format!(
        r#"<strong>You:</strong> {}<span class="message-time">{}</span>"#,
        body,
        utils::escape_html(time)
    )
}

/// A click on one of a sidebar row's buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarAction {
    View(usize),
    Delete(usize),
}

impl SidebarAction {
    /// Decode a click from the button's class list and the `data-index` of
    /// its row
    pub fn from_button(class_name: &str, row_index: Option<&str>) -> Option<Self> {
        let index = row_index?.trim().parse().ok()?;
        let mut classes = class_name.split_whitespace();
        if classes.clone().any(|c| c == "history-delete") {
            Some(SidebarAction::Delete(index))
        } else if classes.any(|c| c == "history-view") {
            Some(SidebarAction::View(index))
        } else {
            None
        }
    }
}

/// Assistant turn shown when a follow-up submission is refused locally
pub fn followup_rejected_turn(error: &FollowupError) -> String {
    match error {
        FollowupError::Blank(_) => error.to_string(),
        FollowupError::NotAwaiting | FollowupError::CountMismatch { .. } => {
            "These follow-up questions are no longer active. Please ask your question again.".to_string()
        }
    }
}

/// Inner HTML of one history sidebar row
pub fn sidebar_item_html(item: &SidebarItem, full_query: &str) -> String {
    let icon = if item.is_image { "fa-image" } else { "fa-comment-alt" };
    format!(
        r#"<div class="history-item-content">
            <i class="fas {}"></i>
            <div class="history-item-text" title="{}">{}</div>
        </div>
        <div class="history-item-actions">
            <button class="history-view" title="View"><i class="fas fa-eye"></i></button>
            <button class="history-delete" title="Delete"><i class="fas fa-trash-alt"></i></button>
        </div>"#,
        icon,
        utils::escape_html(full_query),
        utils::escape_html(&item.label)
    )
}

/// Inner HTML of the follow-up form; inputs are matched to questions by
/// their `data-index`
pub fn followup_form_html(questions: &[String]) -> String {
    let items: String = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            format!(
                r#"<li><div class="followup-question">{}</div><input type="text" class="followup-input" placeholder="Your answer..." data-index="{}"></li>"#,
                utils::escape_html(question),
                index
            )
        })
        .collect();

    format!(
        r#"<h3>Follow-up Questions</h3>
        <ul class="followup-list">{}</ul>
        <div class="followup-button-container">
            <button class="followup-cancel">Cancel</button>
            <button class="followup-submit">Submit Answers</button>
        </div>"#,
        items
    )
}

/// Append a text turn to the chat box
pub fn append_turn(document: &Document, sender: Sender, content: &str) -> Result<Element, JsValue> {
    append_html(document, sender.class(), &turn_html(sender, content, &utils::format_turn_time()))
}

/// Append the uploaded-image turn to the chat box
pub fn append_image_turn(
    document: &Document,
    preview_url: Option<&str>,
    file_name: Option<&str>,
) -> Result<Element, JsValue> {
    let html = image_turn_html(preview_url, file_name, &utils::format_turn_time());
    append_html(document, Sender::User.class(), &html)
}

fn append_html(document: &Document, class: &str, html: &str) -> Result<Element, JsValue> {
    let container = dom::get_element_by_id(document, CHAT_BOX)?;
    let turn = dom::create_element_with_class(document, "div", class)?;
    turn.set_inner_html(html);
    container.append_child(&turn)?;
    dom::scroll_to_bottom(&container);
    Ok(turn)
}

pub fn set_loading(document: &Document, loading: bool) {
    dom::set_visible(document, LOADING, loading);
}

/// Hide the welcome banner once the user starts interacting
pub fn hide_welcome(document: &Document) {
    dom::set_visible(document, WELCOME, false);
}

/// Empty the chat box and put the welcome banner back in it
pub fn reset_chat_box(document: &Document) -> Result<(), JsValue> {
    let container = dom::get_element_by_id(document, CHAT_BOX)?;
    dom::clear_element(&container);
    if let Ok(welcome) = dom::get_html_element_by_id(document, WELCOME) {
        dom::show_element(&welcome);
        container.append_child(&welcome)?;
    }
    dom::set_visible(document, REPORT_SECTION, false);
    Ok(())
}
