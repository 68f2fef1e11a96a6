pub mod assets;
pub mod practice;
pub mod quiz;
pub mod reset;
pub mod status;
pub mod sync;

use std::io::{self, Write};

use anyhow::Result;

/// Print `message` and read one trimmed, lowercased line. `None` on EOF.
pub fn prompt(message: &str) -> Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_lowercase()))
}

/// Ask a yes/no question, defaulting to no
pub fn confirm(message: &str) -> Result<bool> {
    Ok(matches!(
        prompt(&format!("{} [y/N] ", message))?.as_deref(),
        Some("y") | Some("yes")
    ))
}
