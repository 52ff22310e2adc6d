//! Output/input sink used by actions and by help and error reporting

use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

/// The console a command tree writes to and reads from
pub trait Console {
    /// Write text without a trailing line break
    fn write(&mut self, text: &str);

    fn write_line(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    /// Read one line of input, without its line break.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if input cannot be read.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Read one line of input without echoing it.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if input cannot be read.
    fn read_sensitive(&mut self, prompt: &str) -> io::Result<String>;

    /// Whether ANSI styling may be written
    fn supports_color(&self) -> bool {
        false
    }
}

/// Console backed by the process stdin/stdout
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.write(prompt);
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_sensitive(&mut self, prompt: &str) -> io::Result<String> {
        inquire::Password::new(prompt)
            .without_confirmation()
            .prompt()
            .map_err(io::Error::other)
    }

    fn supports_color(&self) -> bool {
        io::stdout().is_terminal()
    }
}

/// In-memory console with captured output and queued input
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    output: String,
    input: VecDeque<String>,
}

impl BufferConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A console that answers reads with these lines, in order
    #[must_use]
    pub fn with_input<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output: String::new(),
            input: input.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }

    fn next_input(&mut self) -> io::Result<String> {
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"))
    }
}

impl Console for BufferConsole {
    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.write(prompt);
        self.next_input()
    }

    fn read_sensitive(&mut self, prompt: &str) -> io::Result<String> {
        self.write(prompt);
        self.write("\n");
        self.next_input()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_console_captures_output() {
        let mut console = BufferConsole::new();
        console.write("a");
        console.write_line("b");
        console.write_line("c");
        assert_eq!(console.output(), "ab\nc\n");
        assert_eq!(console.lines().collect::<Vec<_>>(), ["ab", "c"]);
    }

    #[test]
    fn test_buffer_console_reads_queued_input() {
        let mut console = BufferConsole::with_input(["alice", "hunter2"]);
        assert_eq!(console.read_line("Name: ").unwrap(), "alice");
        assert_eq!(console.read_sensitive("Password: ").unwrap(), "hunter2");
        assert_eq!(
            console.read_line("More: ").unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
        assert!(!console.output().contains("hunter2"));
    }
}
