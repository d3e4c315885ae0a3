use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use curedoc_client::types::{EntryKind, HistoryEntry};
use curedoc_client::{
    ClientConfig, ClientError, ClientState, DeleteOutcome, Dispatcher, FollowupError, Operation,
    FOLLOWUP_INTRO,
};
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, File, HtmlElement, HtmlInputElement, KeyboardEvent, Url};

use crate::dom;
use crate::download;
use crate::storage::LocalStorageStore;
use crate::transport::FetchTransport;
use crate::utils;
use crate::view::{self, Sender, SidebarAction};

const FOLLOWUP_DELAY_MS: u32 = 500;

/// Image picked in the file input, waiting to be analysed
struct PickedImage {
    file: File,
    preview_url: String,
}

/// The chat page. Cloning is cheap; every handler holds its own handle.
///
/// Client state is only borrowed between awaits, never across one.
#[derive(Clone)]
pub struct ChatApp {
    document: Document,
    dispatcher: Rc<Dispatcher<FetchTransport>>,
    state: Rc<RefCell<ClientState<LocalStorageStore>>>,
    picked: Rc<RefCell<Option<PickedImage>>>,
    /// The one follow-up form on the page, while questions are pending
    followup_form: Rc<RefCell<Option<Element>>>,
}

impl ChatApp {
    pub fn new(config: ClientConfig) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;

        let store = LocalStorageStore::open()?;
        let state = ClientState::load(store, &config).map_err(utils::js_error)?;

        Ok(Self {
            document,
            dispatcher: Rc::new(Dispatcher::new(FetchTransport, config)),
            state: Rc::new(RefCell::new(state)),
            picked: Rc::new(RefCell::new(None)),
            followup_form: Rc::new(RefCell::new(None)),
        })
    }

    pub fn start(self) -> Result<(), JsValue> {
        self.setup_query_input()?;
        self.setup_image_picker()?;
        self.setup_toolbar()?;
        self.setup_sidebar()?;

        self.render_sidebar()?;

        // Show the most recent exchange, if any
        let count = self.state.borrow().history().len();
        if count > 0 {
            self.show_entry(count - 1)?;
        }

        Ok(())
    }

    fn setup_query_input(&self) -> Result<(), JsValue> {
        let send_btn = dom::get_element_by_id(&self.document, "sendButton")?;
        let app = self.clone();
        dom::add_click_listener(&send_btn, move || app.spawn_ask())?;

        let input = dom::get_element_by_id(&self.document, "queryInput")?;
        let app = self.clone();
        dom::add_listener(&input, "keydown", move |event| {
            if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                if event.key() == "Enter" {
                    event.prevent_default();
                    app.spawn_ask();
                }
            }
        })?;

        Ok(())
    }

    fn setup_image_picker(&self) -> Result<(), JsValue> {
        let picker = dom::get_element_by_id(&self.document, "imageUpload")?;
        let app = self.clone();
        dom::add_listener(&picker, "change", move |_| {
            if let Err(e) = app.handle_image_picked() {
                log::error!("Failed to preview image: {:?}", e);
            }
        })?;

        let cancel_btn = dom::get_element_by_id(&self.document, "cancelImageButton")?;
        let app = self.clone();
        dom::add_click_listener(&cancel_btn, move || app.cancel_image())?;

        let analyze_btn = dom::get_element_by_id(&self.document, "analyzeImageButton")?;
        let app = self.clone();
        dom::add_click_listener(&analyze_btn, move || {
            let app = app.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = app.upload().await {
                    log::error!("Failed to upload image: {:?}", e);
                }
            });
        })?;

        Ok(())
    }

    fn setup_toolbar(&self) -> Result<(), JsValue> {
        let new_chat_btn = dom::get_element_by_id(&self.document, "newChatButton")?;
        let app = self.clone();
        dom::add_click_listener(&new_chat_btn, move || {
            if let Err(e) = app.new_chat() {
                log::error!("Failed to start new chat: {:?}", e);
            }
        })?;

        let download_btn = dom::get_element_by_id(&self.document, "downloadReportButton")?;
        let app = self.clone();
        dom::add_click_listener(&download_btn, move || {
            let target = app
                .state
                .borrow()
                .download_target(app.dispatcher.config(), Utc::now());
            if let Err(e) = download::start_download(&app.document, target) {
                log::error!("Failed to download report: {:?}", e);
            }
        })?;

        Ok(())
    }

    /// One delegated listener serves every row, however often the list is
    /// redrawn
    fn setup_sidebar(&self) -> Result<(), JsValue> {
        let list = dom::get_element_by_id(&self.document, view::HISTORY_LIST)?;
        let app = self.clone();
        dom::add_listener(&list, "click", move |event| {
            let Some(action) = sidebar_action(&event) else {
                return;
            };
            let result = match action {
                SidebarAction::View(index) => app.show_entry(index),
                SidebarAction::Delete(index) => app.delete_entry(index),
            };
            if let Err(e) = result {
                log::error!("Failed to handle {:?}: {:?}", action, e);
            }
        })
    }

    fn spawn_ask(&self) {
        let app = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = app.ask().await {
                log::error!("Failed to send query: {:?}", e);
            }
        });
    }

    async fn ask(&self) -> Result<(), JsValue> {
        let input = dom::get_input_by_id(&self.document, "queryInput")?;
        let query = input.value().trim().to_string();
        if query.is_empty() {
            return Ok(());
        }

        view::hide_welcome(&self.document);
        view::append_turn(&self.document, Sender::User, &query)?;
        input.set_value("");

        view::set_loading(&self.document, true);
        let result = self.dispatcher.ask(&query).await;
        view::set_loading(&self.document, false);

        let outcome = result.and_then(|reply| {
            self.state
                .borrow_mut()
                .record_ask(&query, reply, Utc::now())
                .map_err(ClientError::from)
        });

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                view::append_turn(&self.document, Sender::Assistant, &Operation::Ask.error_turn(&e))?;
                return Ok(());
            }
        };

        self.close_followup_form();
        view::append_turn(&self.document, Sender::Assistant, &outcome.response)?;
        self.render_sidebar()?;

        if !outcome.followups.is_empty() {
            TimeoutFuture::new(FOLLOWUP_DELAY_MS).await;
            view::append_turn(&self.document, Sender::Assistant, FOLLOWUP_INTRO)?;
            self.show_followup_form(&outcome.followups)?;
        }

        Ok(())
    }

    fn handle_image_picked(&self) -> Result<(), JsValue> {
        let picker = dom::get_input_by_id(&self.document, "imageUpload")?;
        let Some(file) = picker.files().and_then(|files| files.get(0)) else {
            return Ok(());
        };

        let preview_url = Url::create_object_url_with_blob(&file)?;
        let preview = dom::get_element_by_id(&self.document, "imagePreview")?;
        preview.set_attribute("src", &preview_url)?;
        dom::set_visible(&self.document, "imagePreviewContainer", true);
        dom::set_visible(&self.document, "promptContainer", true);

        *self.picked.borrow_mut() = Some(PickedImage { file, preview_url });
        Ok(())
    }

    fn cancel_image(&self) {
        if let Ok(picker) = dom::get_input_by_id(&self.document, "imageUpload") {
            picker.set_value("");
        }
        dom::set_visible(&self.document, "imagePreviewContainer", false);
        *self.picked.borrow_mut() = None;
    }

    async fn upload(&self) -> Result<(), JsValue> {
        let picked = self
            .picked
            .borrow()
            .as_ref()
            .map(|p| (p.file.clone(), p.preview_url.clone()));
        let Some((file, preview_url)) = picked else {
            let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
            window.alert_with_message("Please select an image first")?;
            return Ok(());
        };

        let prompt_input = dom::get_input_by_id(&self.document, "customPrompt")?;
        let prompt = prompt_input.value().trim().to_string();
        let prompt = (!prompt.is_empty()).then_some(prompt);

        view::set_loading(&self.document, true);
        let result = self.dispatcher.upload(&file, prompt.as_deref()).await;
        view::set_loading(&self.document, false);

        let recorded = result.and_then(|reply| {
            self.state
                .borrow_mut()
                .record_upload(prompt.as_deref(), Some(file.name()), reply, Utc::now())
                .map(|entry| entry.response.clone())
                .map_err(ClientError::from)
        });

        let response = match recorded {
            Ok(response) => response,
            Err(e) => {
                view::append_turn(&self.document, Sender::Assistant, &Operation::Upload.error_turn(&e))?;
                return Ok(());
            }
        };

        self.close_followup_form();
        view::hide_welcome(&self.document);
        view::append_image_turn(&self.document, Some(&preview_url), Some(&file.name()))?;
        if let Some(prompt) = prompt.as_deref() {
            view::append_turn(&self.document, Sender::User, &format!("Analysis request: {}", prompt))?;
        }
        view::append_turn(&self.document, Sender::Assistant, &response)?;

        dom::set_visible(&self.document, view::REPORT_SECTION, true);
        self.cancel_image();
        self.render_sidebar()?;

        Ok(())
    }

    fn show_followup_form(&self, questions: &[String]) -> Result<(), JsValue> {
        let container = dom::get_element_by_id(&self.document, view::CHAT_BOX)?;
        self.close_followup_form();
        let form = dom::create_element_with_class(&self.document, "div", "followup-container")?;
        form.set_inner_html(&view::followup_form_html(questions));
        container.append_child(&form)?;
        *self.followup_form.borrow_mut() = Some(form.clone());

        if let Some(cancel) = form.query_selector(".followup-cancel")? {
            let app = self.clone();
            dom::add_click_listener(&cancel, move || app.cancel_followups())?;
        }

        if let Some(submit) = form.query_selector(".followup-submit")? {
            let app = self.clone();
            dom::add_click_listener(&submit, move || app.spawn_submit_followups())?;
        }

        // Enter moves to the next answer, and submits from the last one
        let inputs = followup_inputs(&form)?;
        for (index, input) in inputs.iter().enumerate() {
            let app = self.clone();
            let next = inputs.get(index + 1).cloned();
            dom::add_listener(input, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if event.key() != "Enter" {
                    return;
                }
                event.prevent_default();
                match next.as_ref().and_then(|n| n.dyn_ref::<HtmlElement>()) {
                    Some(next) => {
                        let _ = next.focus();
                    }
                    _ => app.spawn_submit_followups(),
                }
            })?;
        }

        if let Some(first) = inputs.first().and_then(|i| i.dyn_ref::<HtmlElement>()) {
            let _ = first.focus();
        }
        dom::scroll_to_bottom(&container);

        Ok(())
    }

    fn spawn_submit_followups(&self) {
        let app = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = app.submit_followups().await {
                log::error!("Failed to submit follow-up answers: {:?}", e);
            }
        });
    }

    async fn submit_followups(&self) -> Result<(), JsValue> {
        let form = self.followup_form.borrow().clone();
        let Some(form) = form else {
            return Ok(());
        };

        let inputs = followup_inputs(&form)?;
        let mut answers = Vec::with_capacity(inputs.len());
        for input in &inputs {
            let value = input
                .dyn_ref::<HtmlInputElement>()
                .map(|i| i.value())
                .unwrap_or_default();
            answers.push(value);
        }

        let prepared = self.state.borrow().prepare_answers(&answers);
        let request = match prepared {
            Ok(request) => {
                for input in &inputs {
                    dom::toggle_class(input, "error", false);
                }
                request
            }
            Err(FollowupError::Blank(blank)) => {
                for (index, input) in inputs.iter().enumerate() {
                    dom::toggle_class(input, "error", blank.contains(&index));
                }
                let turn = view::followup_rejected_turn(&FollowupError::Blank(blank));
                view::append_turn(&self.document, Sender::Assistant, &turn)?;
                return Ok(());
            }
            Err(e) => {
                log::warn!("Follow-up submission rejected: {}", e);
                self.cancel_followups();
                view::append_turn(&self.document, Sender::Assistant, &view::followup_rejected_turn(&e))?;
                return Ok(());
            }
        };

        view::set_loading(&self.document, true);
        let result = self.dispatcher.answer(&request).await;
        view::set_loading(&self.document, false);

        // Another exchange may have replaced these questions meanwhile
        if !self.state.borrow().is_pending(&request) {
            log::warn!("Dropping answer reply for superseded questions about {:?}", request.query);
            return Ok(());
        }

        let recorded = result.and_then(|reply| {
            let final_solution = reply.final_solution.clone();
            self.state.borrow_mut().record_answer(reply)?;
            Ok(final_solution)
        });

        match recorded {
            Ok(final_solution) => {
                self.close_followup_form();
                view::append_turn(&self.document, Sender::Assistant, &final_solution)?;
                dom::set_visible(&self.document, view::REPORT_SECTION, true);
                self.render_sidebar()?;
            }
            Err(e) => {
                view::append_turn(&self.document, Sender::Assistant, &Operation::Answer.error_turn(&e))?;
            }
        }

        Ok(())
    }

    fn close_followup_form(&self) {
        if let Some(form) = self.followup_form.borrow_mut().take() {
            form.remove();
        }
    }

    fn cancel_followups(&self) {
        self.close_followup_form();
        self.state.borrow_mut().cancel_followups();
    }

    fn render_sidebar(&self) -> Result<(), JsValue> {
        let container = dom::get_element_by_id(&self.document, view::HISTORY_LIST)?;
        dom::clear_element(&container);

        let state = self.state.borrow();
        for item in state.history().sidebar() {
            let full_query = state
                .history()
                .get(item.index)
                .map(|e| e.query.as_str())
                .unwrap_or_default();

            let row = dom::create_element_with_class(&self.document, "div", "history-item")?;
            row.set_attribute("data-index", &item.index.to_string())?;
            row.set_inner_html(&view::sidebar_item_html(&item, full_query));
            container.append_child(&row)?;
        }

        Ok(())
    }

    fn show_entry(&self, index: usize) -> Result<(), JsValue> {
        let entry: Option<HistoryEntry> = self.state.borrow_mut().view(index).cloned();
        let Some(entry) = entry else {
            return Ok(());
        };

        // The chat box is redrawn, so an open follow-up form goes with it
        if self.followup_form.borrow().is_some() {
            self.cancel_followups();
        }

        let container = dom::get_element_by_id(&self.document, view::CHAT_BOX)?;
        dom::clear_element(&container);
        view::hide_welcome(&self.document);

        match entry.kind {
            EntryKind::Image => {
                view::append_image_turn(&self.document, None, entry.image_ref.as_deref())?;
                if entry.has_custom_prompt() {
                    view::append_turn(&self.document, Sender::User, &format!("Analysis request: {}", entry.query))?;
                }
            }
            EntryKind::Text => {
                view::append_turn(&self.document, Sender::User, &entry.query)?;
            }
        }

        let response = entry.display_response().unwrap_or("No response available");
        view::append_turn(&self.document, Sender::Assistant, response)?;

        dom::set_visible(&self.document, view::REPORT_SECTION, entry.has_report());
        Ok(())
    }

    fn delete_entry(&self, index: usize) -> Result<(), JsValue> {
        let outcome = self
            .state
            .borrow_mut()
            .delete(index)
            .map_err(utils::js_error)?;

        if !self.state.borrow().followups().is_awaiting() {
            self.close_followup_form();
        }

        self.render_sidebar()?;
        if outcome == DeleteOutcome::RemovedViewed {
            view::reset_chat_box(&self.document)?;
        }
        Ok(())
    }

    fn new_chat(&self) -> Result<(), JsValue> {
        self.close_followup_form();
        self.state.borrow_mut().new_chat();
        view::reset_chat_box(&self.document)
    }
}

/// Which sidebar button, if any, a click inside the history list hit
fn sidebar_action(event: &Event) -> Option<SidebarAction> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let button = target.closest(".history-view, .history-delete").ok().flatten()?;
    let row = button.closest(".history-item").ok().flatten()?;
    SidebarAction::from_button(&button.class_name(), row.get_attribute("data-index").as_deref())
}

fn followup_inputs(form: &Element) -> Result<Vec<Element>, JsValue> {
    let nodes = form.query_selector_all(".followup-input")?;
    let mut inputs = Vec::with_capacity(nodes.length() as usize);
    for i in 0..nodes.length() {
        if let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
            inputs.push(element);
        }
    }
    Ok(inputs)
}
