#![allow(dead_code)]

use std::collections::VecDeque;

use anyhow::Result;
use curedoc_cli::{FileStore, Input, LineSource, Repl, ReqwestTransport};
use curedoc_client::{ClientConfig, ClientState, Dispatcher};
use tempfile::TempDir;
use wiremock::MockServer;

/// Line source that plays back typed lines, then reports end of input
#[derive(Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
    pub prompts: Vec<String>,
}

impl ScriptedLines {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            prompts: Vec::new(),
        }
    }
}

impl LineSource for ScriptedLines {
    fn read(&mut self, prompt: &str) -> Result<Input> {
        self.prompts.push(prompt.to_string());
        Ok(match self.lines.pop_front() {
            Some(line) => Input::Line(line),
            None => Input::Eof,
        })
    }
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri())
}

/// REPL talking to `server`, with history kept in `dir`
pub fn repl_at(server: &MockServer, dir: &TempDir) -> Repl<FileStore> {
    let config = config_for(server);
    let store = FileStore::new(dir.path()).unwrap();
    let state = ClientState::load(store, &config).unwrap();
    Repl::new(Dispatcher::new(ReqwestTransport::new(), config), state)
}
