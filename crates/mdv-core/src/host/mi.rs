//! # GDB/MI output records
//!
//! Parser for the line-oriented output of gdb's machine interface.
//!
//! ```text
//! 12^done,value="480"
//! 13^error,msg="No symbol \"img\" in current context."
//! ~"$1 = 16\n"
//! *stopped,reason="breakpoint-hit",frame={addr="0x401136",func="main"}
//! (gdb)
//! ```
//!
//! Each line is one [`Record`]. Values are constants (always strings on the
//! wire), tuples `{a="1",b="2"}` and lists `["1","2"]` / `[a="1",b="2"]`.
//!
//! See: [GDB/MI Output Syntax](https://sourceware.org/gdb/current/onlinedocs/gdb.html/GDB_002fMI-Output-Syntax.html)

use crate::error::{MdvError, Result};

/// A named value inside a record or tuple
pub type MiResult = (String, Value);

/// An MI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value
{
    /// A c-string constant, unescaped
    Const(String),
    /// `{name=value,...}`
    Tuple(Vec<MiResult>),
    /// `[value,...]`; `name=value` items become single-entry tuples
    List(Vec<Value>),
}

impl Value
{
    /// The constant's text, if this is a constant
    pub fn as_str(&self) -> Option<&str>
    {
        match self {
            Value::Const(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a field of a tuple
    pub fn get(&self, name: &str) -> Option<&Value>
    {
        match self {
            Value::Tuple(fields) => find(fields, name),
            _ => None,
        }
    }

    /// List items, if this is a list
    pub fn as_list(&self) -> Option<&[Value]>
    {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Find a named entry in a result list
pub fn find<'a>(results: &'a [MiResult], name: &str) -> Option<&'a Value>
{
    results.iter().find(|(key, _)| key == name).map(|(_, value)| value)
}

/// Class of a `^` result record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultClass
{
    Done,
    Running,
    Connected,
    Error,
    Exit,
}

/// Which async channel a record came from (`*`, `+`, `=`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncKind
{
    Exec,
    Status,
    Notify,
}

/// Which stream a record belongs to (`~`, `@`, `&`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind
{
    /// CLI console output, the text a user would see
    Console,
    /// Output of the inferior, on remote targets
    Target,
    /// gdb's internal log, including echoes of console commands
    Log,
}

/// One line of MI output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record
{
    Result
    {
        token: Option<u64>,
        class: ResultClass,
        results: Vec<MiResult>,
    },
    Async
    {
        token: Option<u64>,
        kind: AsyncKind,
        class: String,
        results: Vec<MiResult>,
    },
    Stream
    {
        kind: StreamKind, text: String
    },
    /// The `(gdb)` terminator
    Prompt,
}

/// Parse one line of MI output
///
/// ## Errors
///
/// `HostProtocol` when the line is not a well-formed MI record. Callers that
/// share gdb's stdout with an inferior should treat such lines as program
/// output rather than fail.
pub fn parse_record(line: &str) -> Result<Record>
{
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim_end() == "(gdb)" {
        return Ok(Record::Prompt);
    }
    let mut parser = Parser::new(line);
    let record = parser.record()?;
    if !parser.at_end() {
        return Err(parser.error("trailing characters"));
    }
    Ok(record)
}

/// Quote a string as an MI c-string argument
///
/// ```rust
/// use mdv_core::host::mi::quote;
///
/// assert_eq!(quote(r#"print "a\b""#), r#""print \"a\\b\"""#);
/// ```
pub fn quote(text: &str) -> String
{
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

struct Parser<'a>
{
    input: &'a [u8],
    line: &'a str,
    pos: usize,
}

impl<'a> Parser<'a>
{
    fn new(line: &'a str) -> Self
    {
        Self {
            input: line.as_bytes(),
            line,
            pos: 0,
        }
    }

    fn error(&self, what: &str) -> MdvError
    {
        MdvError::HostProtocol(format!("{what} at column {} in MI line {:?}", self.pos, self.line))
    }

    fn at_end(&self) -> bool
    {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8>
    {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8>
    {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn expect(&mut self, byte: u8) -> Result<()>
    {
        if self.bump() == Some(byte) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", byte as char)))
        }
    }

    fn token(&mut self) -> Option<u64>
    {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        self.line[start..self.pos].parse().ok()
    }

    fn record(&mut self) -> Result<Record>
    {
        let token = self.token();
        let marker = self.bump().ok_or_else(|| self.error("empty record"))?;
        match marker {
            b'^' => {
                let class = match self.word() {
                    "done" => ResultClass::Done,
                    "running" => ResultClass::Running,
                    "connected" => ResultClass::Connected,
                    "error" => ResultClass::Error,
                    "exit" => ResultClass::Exit,
                    _ => return Err(self.error("unknown result class")),
                };
                let results = self.trailing_results()?;
                Ok(Record::Result { token, class, results })
            }
            b'*' | b'+' | b'=' => {
                let kind = match marker {
                    b'*' => AsyncKind::Exec,
                    b'+' => AsyncKind::Status,
                    _ => AsyncKind::Notify,
                };
                let class = self.word().to_string();
                if class.is_empty() {
                    return Err(self.error("missing async class"));
                }
                let results = self.trailing_results()?;
                Ok(Record::Async {
                    token,
                    kind,
                    class,
                    results,
                })
            }
            b'~' | b'@' | b'&' if token.is_none() => {
                let kind = match marker {
                    b'~' => StreamKind::Console,
                    b'@' => StreamKind::Target,
                    _ => StreamKind::Log,
                };
                let text = self.c_string()?;
                Ok(Record::Stream { kind, text })
            }
            _ => Err(self.error("unknown record marker")),
        }
    }

    fn word(&mut self) -> &'a str
    {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            self.pos += 1;
        }
        &self.line[start..self.pos]
    }

    fn trailing_results(&mut self) -> Result<Vec<MiResult>>
    {
        let mut results = Vec::new();
        while self.peek() == Some(b',') {
            self.pos += 1;
            results.push(self.result()?);
        }
        Ok(results)
    }

    fn result(&mut self) -> Result<MiResult>
    {
        let name = self.word().to_string();
        if name.is_empty() {
            return Err(self.error("expected variable name"));
        }
        self.expect(b'=')?;
        Ok((name, self.value()?))
    }

    fn value(&mut self) -> Result<Value>
    {
        match self.peek() {
            Some(b'"') => Ok(Value::Const(self.c_string()?)),
            Some(b'{') => {
                self.pos += 1;
                let mut fields = Vec::new();
                if self.peek() == Some(b'}') {
                    self.pos += 1;
                    return Ok(Value::Tuple(fields));
                }
                loop {
                    fields.push(self.result()?);
                    match self.bump() {
                        Some(b',') => {}
                        Some(b'}') => return Ok(Value::Tuple(fields)),
                        _ => return Err(self.error("unterminated tuple")),
                    }
                }
            }
            Some(b'[') => {
                self.pos += 1;
                let mut items = Vec::new();
                if self.peek() == Some(b']') {
                    self.pos += 1;
                    return Ok(Value::List(items));
                }
                loop {
                    let item = if matches!(self.peek(), Some(b'"' | b'{' | b'[')) {
                        self.value()?
                    } else {
                        Value::Tuple(vec![self.result()?])
                    };
                    items.push(item);
                    match self.bump() {
                        Some(b',') => {}
                        Some(b']') => return Ok(Value::List(items)),
                        _ => return Err(self.error("unterminated list")),
                    }
                }
            }
            _ => Err(self.error("expected value")),
        }
    }

    fn c_string(&mut self) -> Result<String>
    {
        self.expect(b'"')?;
        let mut bytes = Vec::new();
        loop {
            let b = self.bump().ok_or_else(|| self.error("unterminated string"))?;
            match b {
                b'"' => break,
                b'\\' => {
                    let escaped = self.bump().ok_or_else(|| self.error("dangling escape"))?;
                    match escaped {
                        b'n' => bytes.push(b'\n'),
                        b't' => bytes.push(b'\t'),
                        b'r' => bytes.push(b'\r'),
                        b'a' => bytes.push(0x07),
                        b'b' => bytes.push(0x08),
                        b'f' => bytes.push(0x0c),
                        b'v' => bytes.push(0x0b),
                        b'e' => bytes.push(0x1b),
                        b'0'..=b'7' => {
                            let mut value = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(d - b'0');
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            bytes.push(u8::try_from(value).map_err(|_| self.error("octal escape out of range"))?);
                        }
                        other => bytes.push(other),
                    }
                }
                other => bytes.push(other),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
