//! Minimal raw-mode line editor
//!
//! | key           | action                               |
//! |---------------|--------------------------------------|
//! | Enter         | submit the line                      |
//! | Backspace     | delete the last character            |
//! | Up / Down     | walk the history                     |
//! | Tab           | complete (common prefix, or list)    |
//! | Ctrl-C        | clear the line                       |
//! | Ctrl-D        | quit, on an empty line               |

use std::io::{self, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};

/// Restores cooked mode when dropped
struct RawMode;

impl RawMode
{
    fn enable() -> io::Result<Self>
    {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode
{
    fn drop(&mut self)
    {
        let _ = terminal::disable_raw_mode();
    }
}

/// What a key press does to the line being edited
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action
{
    Insert(char),
    Backspace,
    Submit,
    Clear,
    Eof,
    HistoryPrev,
    HistoryNext,
    Complete,
    Ignore,
}

fn action(key: KeyEvent) -> Action
{
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Action::Clear,
        KeyCode::Char('d') if ctrl => Action::Eof,
        KeyCode::Char(_) if ctrl => Action::Ignore,
        KeyCode::Char(c) => Action::Insert(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Enter => Action::Submit,
        KeyCode::Up => Action::HistoryPrev,
        KeyCode::Down => Action::HistoryNext,
        KeyCode::Tab => Action::Complete,
        _ => Action::Ignore,
    }
}

/// Longest prefix shared by every candidate
fn common_prefix(candidates: &[String]) -> &str
{
    let Some(first) = candidates.first() else {
        return "";
    };
    let mut len = first.len();
    for candidate in &candidates[1..] {
        len = first
            .char_indices()
            .zip(candidate.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(len);
    }
    &first[..len]
}

/// Line editor with in-memory history
#[derive(Debug, Default)]
pub struct LineEditor
{
    history: Vec<String>,
}

impl LineEditor
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Read one line; `None` on Ctrl-D
    ///
    /// `complete` maps the current line to replacement lines.
    pub fn read_line<F>(&mut self, prompt: &str, mut complete: F) -> io::Result<Option<String>>
    where
        F: FnMut(&str) -> Vec<String>,
    {
        let mut stdout = io::stdout();
        let raw = RawMode::enable()?;
        let mut line = String::new();
        let mut cursor = self.history.len();
        redraw(&mut stdout, prompt, &line)?;

        let result = loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match action(key) {
                Action::Insert(c) => line.push(c),
                Action::Backspace => {
                    line.pop();
                }
                Action::Submit => break Some(line),
                Action::Clear => {
                    execute!(stdout, Print("^C\r\n"))?;
                    line.clear();
                    cursor = self.history.len();
                }
                Action::Eof if line.is_empty() => break None,
                Action::Eof | Action::Ignore => {}
                Action::HistoryPrev => {
                    if cursor > 0 {
                        cursor -= 1;
                        line.clone_from(&self.history[cursor]);
                    }
                }
                Action::HistoryNext => {
                    if cursor < self.history.len() {
                        cursor += 1;
                        line = self.history.get(cursor).cloned().unwrap_or_default();
                    }
                }
                Action::Complete => {
                    let candidates = complete(&line);
                    match candidates.len() {
                        0 => {}
                        1 => line.clone_from(&candidates[0]),
                        _ => {
                            let prefix = common_prefix(&candidates);
                            if prefix.len() > line.len() {
                                line = prefix.to_string();
                            } else {
                                queue!(stdout, Print("\r\n"))?;
                                for candidate in &candidates {
                                    queue!(stdout, Print(candidate), Print("\r\n"))?;
                                }
                            }
                        }
                    }
                }
            }
            redraw(&mut stdout, prompt, &line)?;
        };

        execute!(stdout, Print("\r\n"))?;
        drop(raw);

        if let Some(line) = &result {
            if !line.trim().is_empty() && self.history.last() != Some(line) {
                self.history.push(line.clone());
            }
        }
        Ok(result)
    }
}

fn redraw(stdout: &mut io::Stdout, prompt: &str, line: &str) -> io::Result<()>
{
    queue!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(prompt), Print(line))?;
    stdout.flush()
}
