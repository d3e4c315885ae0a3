use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use colored::Colorize;
use curedoc_client::{
    ClientState, DeleteOutcome, Dispatcher, DownloadTarget, FollowupError, KeyValueStore, Operation,
    FOLLOWUP_INTRO,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::command::{self, Command, HELP};
use crate::render;
use crate::transport::{ImageFile, ReqwestTransport};

/// What the user did at a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Interrupted,
    Eof,
}

/// Where REPL lines come from
pub trait LineSource {
    fn read(&mut self, prompt: &str) -> Result<Input>;
}

/// Interactive terminal input with line editing and history
pub struct Terminal {
    editor: DefaultEditor,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        Ok(Self { editor: DefaultEditor::new()? })
    }
}

impl LineSource for Terminal {
    fn read(&mut self, prompt: &str) -> Result<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(e) => Err(e.into()),
        }
    }
}

/// How a request made on the user's behalf ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Completed,
    /// The service could not be reached or rejected the request; the
    /// error turn has already been shown
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The terminal chat: dispatches commands against the shared client state
pub struct Repl<S> {
    dispatcher: Dispatcher<ReqwestTransport>,
    state: ClientState<S>,
}

impl<S: KeyValueStore> Repl<S> {
    pub fn new(dispatcher: Dispatcher<ReqwestTransport>, state: ClientState<S>) -> Self {
        Self { dispatcher, state }
    }

    pub fn state(&self) -> &ClientState<S> {
        &self.state
    }

    pub async fn run<L: LineSource>(&mut self, lines: &mut L) -> Result<()> {
        println!(
            "{} {}",
            "🩺".bright_cyan(),
            "CureBot is ready. Describe your symptoms, or type /help.".bright_cyan()
        );

        loop {
            let line = match lines.read(&format!("{} ", "You:".bright_green().bold()))? {
                Input::Line(line) => line,
                Input::Interrupted => {
                    println!("{}", "^C".bright_black());
                    continue;
                }
                Input::Eof => break,
            };

            let command = match command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    render::error(&message);
                    continue;
                }
            };

            match self.handle(command, lines).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => render::error(&format!("{:#}", e)),
            }
        }

        println!("{}", "Goodbye!".bright_cyan());
        Ok(())
    }

    pub async fn handle<L: LineSource>(&mut self, command: Command, lines: &mut L) -> Result<Flow> {
        match command {
            Command::Ask(query) => {
                self.ask(&query, lines).await?;
            }
            Command::Image { path, prompt } => {
                self.upload(&path, prompt.as_deref()).await?;
            }
            Command::History => self.show_history(),
            Command::View(index) => match self.state.view(index) {
                Some(entry) => render::entry(entry),
                None => render::error(&format!("No consultation #{}", index + 1)),
            },
            Command::Delete(index) => match self.state.delete(index)? {
                DeleteOutcome::Missing => render::error(&format!("No consultation #{}", index + 1)),
                DeleteOutcome::Removed => render::info("Consultation deleted."),
                DeleteOutcome::RemovedViewed => render::info("Consultation deleted. Started a new chat."),
            },
            Command::New => {
                self.state.new_chat();
                render::info("Started a new chat.");
            }
            Command::Download(file) => {
                let path = self.download(file).await?;
                render::info(&format!("Report saved to {}", path.display()));
            }
            Command::Answer => {
                self.answer_followups(lines).await?;
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Ask a question and walk through any follow-up questions.
    ///
    /// `Exchange::Failed` means either request failed.
    pub async fn ask<L: LineSource>(&mut self, query: &str, lines: &mut L) -> Result<Exchange> {
        let reply = match self.dispatcher.ask(query).await {
            Ok(reply) => reply,
            Err(e) => {
                render::error(&Operation::Ask.error_turn(&e));
                return Ok(Exchange::Failed);
            }
        };

        let outcome = self.state.record_ask(query, reply, Utc::now())?;
        render::assistant(&outcome.response);

        if outcome.followups.is_empty() {
            return Ok(Exchange::Completed);
        }
        self.answer_followups(lines).await
    }

    pub async fn upload(&mut self, path: &Path, prompt: Option<&str>) -> Result<Exchange> {
        let image = ImageFile::read(path)?;

        let reply = match self.dispatcher.upload(&image, prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                render::error(&Operation::Upload.error_turn(&e));
                return Ok(Exchange::Failed);
            }
        };

        let entry = self
            .state
            .record_upload(prompt, Some(image.name.clone()), reply, Utc::now())?;
        render::assistant(entry.display_response().unwrap_or("No response recorded"));
        render::info("Type /download to save the report.");
        Ok(Exchange::Completed)
    }

    /// Ask the pending follow-up questions one by one and submit the answers.
    ///
    /// Blank answers are asked again; `/cancel`, Ctrl-C or end of input
    /// abandons the flow.
    pub async fn answer_followups<L: LineSource>(&mut self, lines: &mut L) -> Result<Exchange> {
        let Some(pending) = self.state.followups().pending().cloned() else {
            render::info("No follow-up questions are waiting.");
            return Ok(Exchange::Completed);
        };

        println!("{}", FOLLOWUP_INTRO.bright_cyan());
        let mut answers = vec![String::new(); pending.questions.len()];
        let mut to_ask: Vec<usize> = (0..pending.questions.len()).collect();

        let request = loop {
            for &i in &to_ask {
                let prompt = format!("  {}. {} > ", i + 1, pending.questions[i]);
                match lines.read(&prompt)? {
                    Input::Line(line) if line.trim() == "/cancel" => {
                        self.cancel_followups();
                        return Ok(Exchange::Completed);
                    }
                    Input::Line(line) => answers[i] = line,
                    Input::Interrupted | Input::Eof => {
                        self.cancel_followups();
                        return Ok(Exchange::Completed);
                    }
                }
            }

            match self.state.prepare_answers(&answers) {
                Ok(request) => break request,
                Err(FollowupError::Blank(blank)) => {
                    let numbers: Vec<String> = blank.iter().map(|i| (i + 1).to_string()).collect();
                    render::error(&format!("Please answer every question. Missing: {}", numbers.join(", ")));
                    to_ask = blank;
                }
                Err(e) => return Err(e.into()),
            }
        };

        match self.dispatcher.answer(&request).await {
            Ok(reply) => {
                let solution = reply.final_solution.clone();
                self.state.record_answer(reply)?;
                render::assistant(&solution);
                render::info("Type /download to save the report.");
                Ok(Exchange::Completed)
            }
            Err(e) => {
                render::error(&Operation::Answer.error_turn(&e));
                render::info("Type /answer to try again.");
                Ok(Exchange::Failed)
            }
        }
    }

    fn cancel_followups(&mut self) {
        self.state.cancel_followups();
        render::info("Follow-up questions cancelled.");
    }

    fn show_history(&self) {
        let items = self.state.history().sidebar();
        if items.is_empty() {
            render::info("No consultations yet.");
            return;
        }
        for line in render::history_lines(&items) {
            println!("{}", line);
        }
    }

    /// Save the report for the active session, or the text report over the
    /// whole history when there is none. Returns the file written.
    pub async fn download(&self, file: Option<PathBuf>) -> Result<PathBuf> {
        if !self.state.can_download() && self.state.history().is_empty() {
            return Err(anyhow!("Nothing to download yet"));
        }

        match self.state.download_target(self.dispatcher.config(), Utc::now()) {
            DownloadTarget::Pdf(url) => {
                let bytes = self
                    .dispatcher
                    .transport()
                    .fetch_bytes(&url)
                    .await
                    .with_context(|| format!("Failed to download {}", url))?;
                let path = file.unwrap_or_else(|| PathBuf::from(pdf_file_name(&url)));
                std::fs::write(&path, bytes)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(path)
            }
            DownloadTarget::TextReport(report) => {
                let path = file.unwrap_or_else(|| PathBuf::from(&report.filename));
                std::fs::write(&path, report.content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(path)
            }
        }
    }
}

/// Local file name for a PDF served at `url`
pub fn pdf_file_name(url: &str) -> String {
    let id = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("session");
    let id = id.trim_end_matches(".pdf");
    format!("curebot_report_{}.pdf", id)
}
