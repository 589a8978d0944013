//! Terminal input.

use std::io::{self, BufRead, Write};

use arcadio_auth::Prompter;
use arcadio_common::Result;

/// Prompts on the controlling terminal; secrets are read without echo.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt_secret(&self, prompt: &str) -> Result<String> {
        Ok(rpassword::prompt_password(prompt)?)
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        let answer = read_line(&format!("{} [y/N]: ", question))?;
        Ok(is_yes(&answer))
    }
}

/// Print `prompt` and read one line from stdin, without the line ending.
pub fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yes" | "Yes")
}
