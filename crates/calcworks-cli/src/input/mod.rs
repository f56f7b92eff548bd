pub mod file;

use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Resolve a command's input: `--input` file first, then piped stdin.
///
/// Returns `None` when neither is present so the caller can fall back to flags.
pub fn read_request<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_input(path)?));
    }
    // an interactive terminal means flags only
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut piped = String::new();
    io::stdin().read_to_string(&mut piped)?;
    parse_piped(&piped)
}

/// A blank pipe (`calc loan ... < /dev/null`) counts as no request.
fn parse_piped<T: DeserializeOwned>(piped: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let body = piped.trim();
    if body.is_empty() {
        return Ok(None);
    }
    log::debug!("parsing {} bytes of piped request", body.len());
    let request = serde_json::from_str(body).map_err(|e| format!("Invalid JSON on stdin: {e}"))?;
    Ok(Some(request))
}
