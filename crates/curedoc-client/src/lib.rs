//! Client-side state and remote operations for the CureBot chat
//!
//! This crate holds everything the front-ends share: the persisted history,
//! the active session and follow-up flow, the request dispatcher and the
//! text report used when no PDF is available. It has no knowledge of the
//! DOM or the terminal.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod followup;
pub mod history;
pub mod report;
pub mod session;
pub mod storage;

pub use config::ClientConfig;
pub use dispatcher::{Dispatcher, HttpReply, Operation, Transport};
pub use error::{ClientError, FollowupError, StorageError};
pub use followup::{FollowupState, PendingFollowups, FOLLOWUP_INTRO};
pub use history::{HistoryStore, SidebarItem};
pub use report::{resolve_download, text_report, DownloadTarget, TextReport};
pub use session::{AskOutcome, ClientState, DeleteOutcome};
pub use storage::{KeyValueStore, MemoryStore};

// Re-export the shared types so front-ends need only this crate
pub use curedoc_types as types;
