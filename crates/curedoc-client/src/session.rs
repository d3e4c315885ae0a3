use chrono::{DateTime, Utc};
use curedoc_types::{
    AnswerRequest, AnswerResponse, AskResponse, HistoryEntry, UploadResponse, DEFAULT_IMAGE_QUERY,
};

use crate::config::ClientConfig;
use crate::error::{FollowupError, StorageError};
use crate::followup::{FollowupState, PendingFollowups};
use crate::history::HistoryStore;
use crate::report::{resolve_download, DownloadTarget};
use crate::storage::KeyValueStore;

/// Result of a recorded `/ask` exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOutcome {
    pub response: String,
    /// Questions now awaiting answers; empty when none were asked
    pub followups: Vec<String>,
}

/// What happened to the view when an entry was deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Index was out of range
    Missing,
    Removed,
    /// The entry on screen was removed, so a new chat was started
    RemovedViewed,
}

/// All client-side state of the chat, owned by the front-end and handed
/// to each event handler.
pub struct ClientState<S> {
    history: HistoryStore<S>,
    session_id: Option<String>,
    pdf_link: Option<String>,
    viewing: Option<usize>,
    followups: FollowupState,
}

impl<S: KeyValueStore> ClientState<S> {
    pub fn new(history: HistoryStore<S>) -> Self {
        Self {
            history,
            session_id: None,
            pdf_link: None,
            viewing: None,
            followups: FollowupState::Idle,
        }
    }

    /// Load history from `store` under the configured key
    pub fn load(store: S, config: &ClientConfig) -> Result<Self, StorageError> {
        Ok(Self::new(HistoryStore::load(store, config.storage_key.clone())?))
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn pdf_link(&self) -> Option<&str> {
        self.pdf_link.as_deref()
    }

    pub fn viewing(&self) -> Option<usize> {
        self.viewing
    }

    pub fn followups(&self) -> &FollowupState {
        &self.followups
    }

    /// Store a successful `/ask` reply and start the follow-up flow when
    /// the service asked questions.
    ///
    /// Pending questions always belong to the latest entry, so questions
    /// left over from an earlier exchange are dropped.
    pub fn record_ask(&mut self, query: &str, reply: AskResponse, now: DateTime<Utc>) -> Result<AskOutcome, StorageError> {
        self.history.push(HistoryEntry::text(query, reply.response.clone(), now))?;
        self.viewing = Some(self.history.len() - 1);

        self.followups = if reply.followups.is_empty() {
            FollowupState::Idle
        } else {
            FollowupState::AwaitingAnswers(PendingFollowups {
                query: query.to_string(),
                questions: reply.followups.clone(),
            })
        };

        Ok(AskOutcome {
            response: reply.response,
            followups: reply.followups,
        })
    }

    /// Store a successful `/upload` reply as an image entry
    pub fn record_upload(
        &mut self,
        prompt: Option<&str>,
        image_ref: Option<String>,
        reply: UploadResponse,
        now: DateTime<Utc>,
    ) -> Result<&HistoryEntry, StorageError> {
        let query = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_IMAGE_QUERY);

        let entry = HistoryEntry::image(query, reply.result, reply.session_id.clone(), image_ref, now);
        self.history.push(entry)?;

        self.session_id = Some(reply.session_id);
        self.pdf_link = reply.pdf_download;
        self.viewing = Some(self.history.len() - 1);
        self.followups = FollowupState::Idle;

        let index = self.history.len() - 1;
        Ok(&self.history.entries()[index])
    }

    /// Validate answers against the pending questions without changing state
    pub fn prepare_answers(&self, answers: &[String]) -> Result<AnswerRequest, FollowupError> {
        self.followups
            .pending()
            .ok_or(FollowupError::NotAwaiting)?
            .validate(answers)
    }

    /// Whether `request` still answers the questions awaiting answers, i.e.
    /// no later exchange replaced them while it was in flight
    pub fn is_pending(&self, request: &AnswerRequest) -> bool {
        self.followups
            .pending()
            .map(|p| p.query == request.query && p.questions == request.followups)
            .unwrap_or(false)
    }

    /// Attach a successful `/answer` reply to the latest entry and end the
    /// follow-up flow
    pub fn record_answer(&mut self, reply: AnswerResponse) -> Result<(), StorageError> {
        self.history
            .update_last(reply.final_solution, reply.session_id.clone())?;

        self.session_id = Some(reply.session_id);
        self.pdf_link = reply.pdf_download;
        self.followups = FollowupState::Idle;
        Ok(())
    }

    pub fn cancel_followups(&mut self) {
        self.followups = FollowupState::Idle;
    }

    /// Forget the active session and show a fresh chat
    pub fn new_chat(&mut self) {
        self.session_id = None;
        self.pdf_link = None;
        self.viewing = None;
        self.followups = FollowupState::Idle;
    }

    /// Switch the view to a stored exchange and adopt its session
    pub fn view(&mut self, index: usize) -> Option<&HistoryEntry> {
        let session_id = self.history.get(index)?.session_id.clone();
        self.session_id = session_id;
        self.pdf_link = None;
        self.viewing = Some(index);
        self.history.get(index)
    }

    pub fn delete(&mut self, index: usize) -> Result<DeleteOutcome, StorageError> {
        let was_last = index + 1 == self.history.len();
        if self.history.remove(index)?.is_none() {
            return Ok(DeleteOutcome::Missing);
        }

        // Pending questions belong to the latest entry
        if was_last {
            self.followups = FollowupState::Idle;
        }

        match self.viewing {
            Some(viewed) if viewed == index => {
                self.new_chat();
                Ok(DeleteOutcome::RemovedViewed)
            }
            Some(viewed) if viewed > index => {
                self.viewing = Some(viewed - 1);
                Ok(DeleteOutcome::Removed)
            }
            _ => Ok(DeleteOutcome::Removed),
        }
    }

    /// Whether the download action applies to what is on screen
    pub fn can_download(&self) -> bool {
        if self.session_id.is_some() || self.pdf_link.is_some() {
            return true;
        }
        self.viewing
            .and_then(|i| self.history.get(i))
            .map(|e| e.has_report())
            .unwrap_or(false)
    }

    pub fn download_target(&self, config: &ClientConfig, now: DateTime<Utc>) -> DownloadTarget {
        resolve_download(
            config,
            self.pdf_link.as_deref(),
            self.session_id.as_deref(),
            self.history.entries(),
            now,
        )
    }
}
