//! Interactive shell on top of a gdb session
//!
//! `mdv <expr>` dumps a matrix, everything else goes to the gdb console.

use std::fmt::Write as _;
use std::io::{self, BufRead, IsTerminal};

use mdv_core::{DebuggerHost, DumpReport, MatrixViewerCommand, Result};
use mdv_utils::{debug, warn};

use crate::editor::LineEditor;

const PROMPT: &str = "(mdv) ";

/// Names accepted for the dump command
const DUMP_COMMANDS: [&str; 2] = ["mdv", "matrix-view"];

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand
{
    /// Dump a matrix; carries the raw argument string
    Dump(String),
    Help,
    Quit,
    /// Blank line or comment
    Empty,
    /// Passed to the debugger console as is
    Console(String),
}

/// Parse one line of shell input
pub fn parse(line: &str) -> ShellCommand
{
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return ShellCommand::Empty;
    }

    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match word {
        w if DUMP_COMMANDS.contains(&w) => ShellCommand::Dump(rest.trim().to_string()),
        "help" | "h" | "?" => ShellCommand::Help,
        "quit" | "q" | "exit" => ShellCommand::Quit,
        _ => ShellCommand::Console(line.to_string()),
    }
}

/// Tab completions for `line`, each one a full replacement line
pub fn complete_line(host: &mut dyn DebuggerHost, line: &str) -> Vec<String>
{
    match line.split_once(char::is_whitespace) {
        Some((word, prefix)) if DUMP_COMMANDS.contains(&word) => {
            let prefix = prefix.trim_start();
            match host.complete(prefix) {
                Ok(symbols) => symbols.into_iter().map(|s| format!("{word} {s}")).collect(),
                Err(e) => {
                    debug!(error = %e, "Completion failed");
                    Vec::new()
                }
            }
        }
        Some(_) => Vec::new(),
        None => ["mdv", "matrix-view", "help", "quit"]
            .iter()
            .filter(|name| name.starts_with(line))
            .map(|name| format!("{name} "))
            .collect(),
    }
}

pub fn format_report(report: &DumpReport) -> String
{
    let mut text = format!(
        "Dumped {} ({}x{} {}, {} bytes) to {}",
        report.expression,
        report.rows,
        report.cols,
        report.mat_type,
        report.bytes_copied,
        report.path.display()
    );
    if let Some(pid) = report.viewer_pid {
        let _ = write!(text, "\nViewer started (pid {pid})");
    }
    text
}

fn print_help()
{
    println!("Commands:");
    println!("  mdv <expression>   dump a cv::Mat and open it in the viewer (alias: matrix-view)");
    println!("  help               show this help");
    println!("  quit               leave the shell (also Ctrl-D)");
    println!("Anything else is run as a gdb command, e.g. `frame 2`, `info locals`.");
}

/// A shell session: one debugger, one dump command
pub struct Session<'a>
{
    host: &'a mut dyn DebuggerHost,
    command: &'a MatrixViewerCommand,
}

impl<'a> Session<'a>
{
    pub fn new(host: &'a mut dyn DebuggerHost, command: &'a MatrixViewerCommand) -> Self
    {
        Self { host, command }
    }

    /// Execute one command; returns `true` when the shell should exit
    ///
    /// ## Errors
    ///
    /// Whatever the dump or the console command returns.
    pub fn execute(&mut self, command: ShellCommand) -> Result<bool>
    {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Help => print_help(),
            ShellCommand::Quit => return Ok(true),
            ShellCommand::Dump(argument) => {
                let report = self.command.invoke(self.host, &argument)?;
                println!("{}", format_report(&report));
            }
            ShellCommand::Console(line) => {
                let output = self.host.console(&line)?;
                print!("{output}");
                if !output.is_empty() && !output.ends_with('\n') {
                    println!();
                }
            }
        }
        Ok(false)
    }

    /// Read and execute lines until `quit` or end of input
    ///
    /// On a terminal, lines come from a line editor with history and
    /// completion; otherwise stdin is read line by line.
    ///
    /// ## Errors
    ///
    /// `Io` when the terminal or stdin fails. Command errors are printed and
    /// the loop goes on.
    pub fn run(&mut self) -> Result<()>
    {
        if io::stdin().is_terminal() {
            println!("mdv shell. Type 'help' for commands, 'quit' to exit.");
            let mut editor = LineEditor::new();
            loop {
                let host = &mut *self.host;
                let Some(line) = editor.read_line(PROMPT, |line| complete_line(host, line))? else {
                    break;
                };
                if self.run_line(&line) {
                    break;
                }
            }
        } else {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                if self.run_line(&line?) {
                    break;
                }
            }
        }
        Ok(())
    }

    fn run_line(&mut self, line: &str) -> bool
    {
        match self.execute(parse(line)) {
            Ok(quit) => quit,
            Err(e) => {
                warn!(error = %e, "Command failed");
                eprintln!("Error: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::path::PathBuf;

    use mdv_core::{Address, Format, MatType, MdvError, ProcessId};

    use super::*;

    /// Completes from a fixed symbol list
    struct Symbols(Vec<&'static str>);

    impl DebuggerHost for Symbols
    {
        fn evaluate(&mut self, expression: &str) -> Result<String>
        {
            Err(MdvError::Evaluation {
                expression: expression.to_string(),
                message: "not scripted".to_string(),
            })
        }

        fn console(&mut self, _command: &str) -> Result<String>
        {
            Ok(String::new())
        }

        fn read_memory(&mut self, _address: Address, _len: usize) -> Result<Vec<u8>>
        {
            Ok(Vec::new())
        }

        fn complete(&mut self, prefix: &str) -> Result<Vec<String>>
        {
            Ok(self.0.iter().filter(|s| s.starts_with(prefix)).map(ToString::to_string).collect())
        }

        fn select_frame(&mut self, _level: u32) -> Result<()>
        {
            Ok(())
        }

        fn select_thread(&mut self, _thread: u32) -> Result<()>
        {
            Ok(())
        }

        fn inferior_pid(&self) -> Option<ProcessId>
        {
            None
        }
    }

    #[test]
    fn test_complete_expression_after_mdv()
    {
        let mut host = Symbols(vec!["image", "imageGray", "kernel"]);
        assert_eq!(complete_line(&mut host, "mdv ima"), vec!["mdv image", "mdv imageGray"]);
        assert_eq!(complete_line(&mut host, "matrix-view k"), vec!["matrix-view kernel"]);
        assert!(complete_line(&mut host, "frame 1").is_empty());
    }

    #[test]
    fn test_complete_command_names()
    {
        let mut host = Symbols(Vec::new());
        assert_eq!(complete_line(&mut host, "ma"), vec!["matrix-view "]);
        assert_eq!(complete_line(&mut host, "q"), vec!["quit "]);
        assert_eq!(complete_line(&mut host, "md"), vec!["mdv "]);
    }

    #[test]
    fn test_parse_dump_commands()
    {
        assert_eq!(parse("mdv img"), ShellCommand::Dump("img".to_string()));
        assert_eq!(parse("  matrix-view  frames[1] "), ShellCommand::Dump("frames[1]".to_string()));
        assert_eq!(parse("mdv"), ShellCommand::Dump(String::new()));
    }

    #[test]
    fn test_parse_builtins()
    {
        assert_eq!(parse("help"), ShellCommand::Help);
        assert_eq!(parse("q"), ShellCommand::Quit);
        assert_eq!(parse("quit"), ShellCommand::Quit);
        assert_eq!(parse(""), ShellCommand::Empty);
        assert_eq!(parse("   # comment"), ShellCommand::Empty);
    }

    #[test]
    fn test_parse_forwards_everything_else()
    {
        assert_eq!(parse("frame 2"), ShellCommand::Console("frame 2".to_string()));
        assert_eq!(parse("mdvx img"), ShellCommand::Console("mdvx img".to_string()));
        assert_eq!(parse("info locals"), ShellCommand::Console("info locals".to_string()));
    }

    #[test]
    fn test_format_report_mentions_viewer_pid()
    {
        let mut report = DumpReport {
            expression: "img".to_string(),
            path: PathBuf::from("/tmp/mdv-a.xml"),
            format: Format::Xml,
            rows: 2,
            cols: 3,
            mat_type: MatType::from_code(16).unwrap(),
            bytes_copied: 18,
            viewer_pid: None,
        };
        assert_eq!(format_report(&report), "Dumped img (2x3 CV_8UC3, 18 bytes) to /tmp/mdv-a.xml");

        report.viewer_pid = Some(77);
        assert!(format_report(&report).ends_with("to /tmp/mdv-a.xml\nViewer started (pid 77)"));
    }
}
