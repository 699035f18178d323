//! Raw-mode line editor for the interactive session: character and word
//! movement, backspace, and input history on Up/Down. Reading a line
//! enables raw mode and always disables it again before returning, so the
//! caller can print results and diagnostics normally.

use std::io::{self, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::event::{read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType};

#[derive(Default)]
pub struct Repl {
    buffer: Vec<char>,
    buffer_cursor: usize,
    history: Vec<String>,
    history_cursor: usize,
    stash: Vec<char>,
}

impl Repl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one line of input. Returns None when the user asked to leave
    /// with Ctrl-C, or with Ctrl-D on an empty line.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.buffer.clear();
        self.buffer_cursor = 0;
        self.history_cursor = self.history.len();
        self.stash.clear();

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        let result = self.edit(prompt, &mut stdout);
        terminal::disable_raw_mode()?;
        writeln!(stdout)?;
        result
    }

    fn edit(&mut self, prompt: &str, stdout: &mut impl Write) -> io::Result<Option<String>> {
        self.render(prompt, stdout)?;
        loop {
            if let Event::Key(KeyEvent { code, modifiers, .. }) = read()? {
                match code {
                    KeyCode::Enter => {
                        let line: String = self.buffer.iter().collect();
                        if !line.trim().is_empty() {
                            self.history.push(line.clone());
                        }
                        return Ok(Some(line));
                    }
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(None)
                    }
                    KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
                        if self.buffer.is_empty() {
                            return Ok(None);
                        }
                    }
                    KeyCode::Char('a') if modifiers.contains(KeyModifiers::CONTROL) => self.home(),
                    KeyCode::Char('e') if modifiers.contains(KeyModifiers::CONTROL) => self.end(),
                    KeyCode::Char('b') if modifiers.contains(KeyModifiers::CONTROL) => self.left_char(),
                    KeyCode::Char('f') if modifiers.contains(KeyModifiers::CONTROL) => self.right_char(),
                    KeyCode::Char('p') if modifiers.contains(KeyModifiers::CONTROL) => self.previous_history(),
                    KeyCode::Char('n') if modifiers.contains(KeyModifiers::CONTROL) => self.next_history(),
                    KeyCode::Char('b') if modifiers.contains(KeyModifiers::ALT) => self.left_word(),
                    KeyCode::Char('f') if modifiers.contains(KeyModifiers::ALT) => self.right_word(),
                    KeyCode::Char(x) if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT => {
                        self.insert_char(x)
                    }
                    KeyCode::Backspace => self.backspace(),
                    KeyCode::Left => self.left_char(),
                    KeyCode::Right => self.right_char(),
                    KeyCode::Home => self.home(),
                    KeyCode::End => self.end(),
                    KeyCode::Up => self.previous_history(),
                    KeyCode::Down => self.next_history(),
                    _ => {}
                }
            }
            self.render(prompt, stdout)?;
        }
    }

    fn render(&self, prompt: &str, sink: &mut impl Write) -> io::Result<()> {
        let buffer: String = self.buffer.iter().collect();
        write!(sink, "\r{}{}{}", Clear(ClearType::UntilNewLine), prompt, &buffer)?;
        write!(sink, "{}", MoveToColumn((prompt.len() + self.buffer_cursor) as u16))?;
        sink.flush()
    }

    fn insert_char(&mut self, x: char) {
        self.buffer.insert(self.buffer_cursor, x);
        self.buffer_cursor += 1;
    }

    fn backspace(&mut self) {
        if self.buffer_cursor > 0 {
            self.buffer.remove(self.buffer_cursor - 1);
            self.buffer_cursor -= 1;
        }
    }

    fn home(&mut self) {
        self.buffer_cursor = 0;
    }

    fn end(&mut self) {
        self.buffer_cursor = self.buffer.len();
    }

    fn left_word(&mut self) {
        while self.buffer_cursor > 0 && !self.buffer[self.buffer_cursor - 1].is_alphanumeric() {
            self.buffer_cursor -= 1;
        }
        while self.buffer_cursor > 0 && self.buffer[self.buffer_cursor - 1].is_alphanumeric() {
            self.buffer_cursor -= 1;
        }
    }

    fn right_word(&mut self) {
        while self.buffer_cursor < self.buffer.len() && !self.buffer[self.buffer_cursor].is_alphanumeric() {
            self.buffer_cursor += 1;
        }
        while self.buffer_cursor < self.buffer.len() && self.buffer[self.buffer_cursor].is_alphanumeric() {
            self.buffer_cursor += 1;
        }
    }

    fn left_char(&mut self) {
        if self.buffer_cursor > 0 {
            self.buffer_cursor -= 1;
        }
    }

    fn right_char(&mut self) {
        if self.buffer_cursor < self.buffer.len() {
            self.buffer_cursor += 1;
        }
    }

    fn previous_history(&mut self) {
        if self.history_cursor > 0 {
            if self.history_cursor == self.history.len() {
                self.stash = self.buffer.clone();
            }
            self.history_cursor -= 1;
            self.buffer = self.history[self.history_cursor].chars().collect();
            self.buffer_cursor = self.buffer.len();
        }
    }

    fn next_history(&mut self) {
        if self.history_cursor < self.history.len() {
            self.history_cursor += 1;
            self.buffer = if self.history_cursor == self.history.len() {
                self.stash.clone()
            } else {
                self.history[self.history_cursor].chars().collect()
            };
            self.buffer_cursor = self.buffer.len();
        }
    }
}
