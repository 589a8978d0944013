//! Interactive input used when no stored password is available.

use arcadio_common::Result;

/// Blocking user interaction supplied by the front end.
pub trait Prompter {
    /// Read a secret without echoing it.
    fn prompt_secret(&self, prompt: &str) -> Result<String>;

    /// Ask a yes/no question.
    fn confirm(&self, question: &str) -> Result<bool>;
}
