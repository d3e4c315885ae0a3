use clap::Parser;
use curedoc_client::types::DEFAULT_BASE_URL;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "curedoc")]
#[command(about = "CureBot medical assistant in the terminal")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Base URL of the CureBot service
    #[arg(long, value_name = "URL", env = "CUREDOC_SERVER_URL", default_value = DEFAULT_BASE_URL)]
    pub server_url: String,

    /// Directory the chat history is kept in
    #[arg(long, value_name = "DIR", env = "CUREDOC_DATA_DIR", default_value = "~/.curedoc")]
    pub data_dir: PathBuf,

    /// Ask a single question, print the answer and exit
    #[arg(long, value_name = "TEXT")]
    pub ask: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["curedoc"]).unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("~/.curedoc"));
        assert!(cli.ask.is_none());
    }

    #[test]
    fn test_explicit_server_url() {
        let cli = Cli::try_parse_from(["curedoc", "--server-url", "http://clinic:8000", "--ask", "fever"]).unwrap();
        assert_eq!(cli.server_url, "http://clinic:8000");
        assert_eq!(cli.ask.as_deref(), Some("fever"));
    }
}
