//! Terminal color support detection and formatting.
//!
//! Colors are only used for stderr, which carries every decorated message.
//! `NO_COLOR` disables them regardless of the terminal.

use std::env;
use std::io::{self, IsTerminal};

const RESET: &str = "\x1b[0m";

/// Color support detection and formatting
#[derive(Debug, Clone, Copy)]
pub struct ColorSupport {
    enabled: bool,
}

impl ColorSupport {
    /// Detect color support for stderr
    pub fn detect() -> Self {
        let enabled = env::var_os("NO_COLOR").is_none() && io::stderr().is_terminal();
        Self { enabled }
    }

    /// Plain output, used when stderr is redirected
    #[cfg(test)]
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.paint("\x1b[32m", text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint("\x1b[33m", text)
    }

    pub fn red(&self, text: &str) -> String {
        self.paint("\x1b[31m", text)
    }

    /// Dim/gray
    pub fn dim(&self, text: &str) -> String {
        self.paint("\x1b[2m", text)
    }
}
