use std::path::PathBuf;

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Image { path: PathBuf, prompt: Option<String> },
    History,
    /// Zero-based history index
    View(usize),
    /// Zero-based history index
    Delete(usize),
    New,
    Download(Option<PathBuf>),
    /// Resume answering pending follow-up questions
    Answer,
    Help,
    Quit,
}

pub const HELP: &str = "Commands:
  <text>                  Ask CureBot a question
  /image <path> [prompt]  Analyze a medical image
  /history                List past consultations, newest first
  /view <n>               Show consultation n
  /delete <n>             Delete consultation n
  /new                    Start a new chat
  /download [file]        Save the report (PDF when available)
  /answer                 Answer pending follow-up questions
  /help                   Show this help
  /quit                   Exit";

/// Parse a REPL line. `Ok(None)` means the line was blank.
///
/// History positions are typed 1-based, as listed by `/history`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(Command::Ask(line.to_string())));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        "/image" => {
            if rest.is_empty() {
                return Err("Usage: /image <path> [prompt]".to_string());
            }
            let (path, prompt) = match rest.split_once(char::is_whitespace) {
                Some((path, prompt)) => (path, Some(prompt.trim().to_string())),
                None => (rest, None),
            };
            Command::Image {
                path: PathBuf::from(path),
                prompt: prompt.filter(|p| !p.is_empty()),
            }
        }
        "/history" => Command::History,
        "/view" => Command::View(position(rest, "/view")?),
        "/delete" => Command::Delete(position(rest, "/delete")?),
        "/new" => Command::New,
        "/download" => Command::Download((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "/answer" => Command::Answer,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => return Err(format!("Unknown command '{}'. Type /help for a list.", other)),
    };
    Ok(Some(command))
}

fn position(arg: &str, name: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Usage: {} <n> (see /history)", name)),
    }
}
