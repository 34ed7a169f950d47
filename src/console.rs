//! Operator console: what the pipeline shows and asks interactively.
//!
//! Two places need the operator: the login pause when the feed is missing,
//! and article selection. Both go through [`Console`] so tests can script
//! the answers.

use std::error::Error;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin, stdin};

/// Line-oriented interaction with the operator.
pub trait Console {
    /// Print text for the operator.
    fn show(&mut self, text: &str);

    /// Print `prompt` and read one line. `None` at end of input.
    ///
    /// # Returns
    ///
    /// The line without its trailing newline. An empty line is `Some("")`.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout cannot be flushed or stdin cannot be read.
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>, Box<dyn Error>>;
}

/// The process's own stdin/stdout.
///
/// Holds one buffered reader for the whole run so input typed ahead is not
/// lost between prompts.
pub struct TerminalConsole {
    lines: Lines<BufReader<Stdin>>,
}

impl TerminalConsole {
    /// Attach to the process's stdin.
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn show(&mut self, text: &str) {
        println!("{text}");
    }

    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>, Box<dyn Error>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }
}
