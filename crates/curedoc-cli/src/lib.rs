//! Terminal front-end for the CureBot medical assistant

pub mod cli;
pub mod command;
pub mod file_store;
pub mod render;
pub mod repl;
pub mod transport;

pub use cli::Cli;
pub use file_store::FileStore;
pub use repl::{Exchange, Flow, Input, LineSource, Repl, Terminal};
pub use transport::{ImageFile, ReqwestTransport};
