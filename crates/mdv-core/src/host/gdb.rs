//! # gdb host over GDB/MI
//!
//! [`GdbHost`] starts `gdb --interpreter=mi2` against a live process or a
//! core file and turns each [`DebuggerHost`] call into one tagged MI command.
//!
//! ## Conversation model
//!
//! Every command is sent as `<token><command>` and the call blocks until the
//! result record carrying the same token arrives. Everything that shows up in
//! between is routed by kind:
//!
//! - console stream (`~"..."`): collected as the command's output
//! - log/target streams and async records: logged
//! - lines that are not MI at all: inferior output sharing gdb's stdout, logged
//!
//! Waits run on a private current-thread tokio runtime and are bounded by
//! [`GdbConfig::timeout`]. Replies carrying a stale token (from a command
//! that timed out) are skipped.

use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::runtime::Runtime;
use tracing::{debug, info, trace, warn};

use super::mi::{self, find, AsyncKind, MiResult, Record, ResultClass, StreamKind, Value};
use super::{DebugTarget, DebuggerHost, GdbConfig};
use crate::error::{MdvError, Result};
use crate::types::{Address, ProcessId};

/// Largest block requested from gdb in one `-data-read-memory-bytes`
const MEMORY_CHUNK: usize = 16 * 1024 * 1024;

/// Completion requests are phrased as a `print` command line
const COMPLETION_PREFIX: &str = "print ";

/// Final record of one MI command
#[derive(Debug)]
struct Reply
{
    class: ResultClass,
    results: Vec<MiResult>,
    console: String,
}

impl Reply
{
    fn error_message(&self) -> String
    {
        find(&self.results, "msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string()
    }
}

/// A gdb child process driven over GDB/MI
pub struct GdbHost
{
    runtime: Runtime,
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    next_token: u64,
    timeout: Duration,
    target: DebugTarget,
    closed: bool,
}

/// Command line for gdb: MI mode, quiet, then the target
pub fn gdb_args(config: &GdbConfig, target: &DebugTarget) -> Vec<OsString>
{
    let mut args: Vec<OsString> = vec!["--interpreter=mi2".into(), "--quiet".into()];
    if config.no_init {
        args.push("--nx".into());
    }
    match target {
        DebugTarget::Attach { pid, executable } => {
            if let Some(executable) = executable {
                args.push(executable.clone().into_os_string());
            }
            args.push("-p".into());
            args.push(pid.to_string().into());
        }
        DebugTarget::Core { executable, core } => {
            args.push(executable.clone().into_os_string());
            args.push("--core".into());
            args.push(core.clone().into_os_string());
        }
    }
    args
}

impl GdbHost
{
    /// Start gdb on `target` and wait until it is ready for commands
    ///
    /// ## Errors
    ///
    /// - `Io`: gdb could not be spawned
    /// - `Timeout`/`HostExited`: gdb never reached its first prompt
    /// - `Evaluation`: a startup command failed
    pub fn spawn(config: &GdbConfig, target: DebugTarget) -> Result<Self>
    {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        let args = gdb_args(config, &target);
        info!(program = %config.program.display(), ?args, "Starting gdb");

        let mut child = {
            let _guard = runtime.enter();
            Command::new(&config.program)
                .args(&args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()?
        };

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MdvError::HostProtocol("gdb stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MdvError::HostProtocol("gdb stdout not captured".to_string()))?;

        let mut host = Self {
            runtime,
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            next_token: 1,
            timeout: config.timeout,
            target,
            closed: false,
        };

        host.wait_for_prompt()?;
        host.execute("-gdb-set confirm off")?;
        host.execute("-gdb-set print pretty off")?;
        for command in &config.startup_commands {
            let output = host.console(command)?;
            if !output.is_empty() {
                info!(command = %command, "{}", output.trim_end());
            }
        }
        Ok(host)
    }

    /// Target this host was started on
    pub fn target(&self) -> &DebugTarget
    {
        &self.target
    }

    fn wait_for_prompt(&mut self) -> Result<()>
    {
        let timeout = self.timeout;
        let lines = &mut self.lines;
        self.runtime.block_on(async {
            let startup = async {
                loop {
                    let line = lines.next_line().await?.ok_or(MdvError::HostExited)?;
                    match mi::parse_record(&line) {
                        Ok(Record::Prompt) => return Ok::<(), MdvError>(()),
                        Ok(record) => log_record(&record),
                        Err(_) => log_inferior_output(&line),
                    }
                }
            };
            tokio::time::timeout(timeout, startup)
                .await
                .unwrap_or_else(|_| Err(timeout_error("gdb startup", timeout)))
        })
    }

    /// Send one MI command and wait for its result record
    fn execute(&mut self, command: &str) -> Result<Reply>
    {
        let token = self.next_token;
        self.next_token += 1;
        let line = format!("{token}{command}\n");
        debug!(token, command, "mi >");

        let timeout = self.timeout;
        let stdin = &mut self.stdin;
        let lines = &mut self.lines;
        let reply: Result<Reply> = self.runtime.block_on(async {
            stdin.write_all(line.as_bytes()).await.map_err(pipe_error)?;
            stdin.flush().await.map_err(pipe_error)?;
            tokio::time::timeout(timeout, read_reply(lines, token))
                .await
                .unwrap_or_else(|_| Err(timeout_error(command, timeout)))
        });

        let reply = reply?;
        debug!(token, class = ?reply.class, "mi <");
        if reply.class == ResultClass::Exit {
            self.closed = true;
        }
        Ok(reply)
    }

    /// Detach (for live targets) and ask gdb to exit
    ///
    /// Called automatically on drop; calling it twice is harmless.
    ///
    /// ## Errors
    ///
    /// `Io` when gdb cannot be reaped.
    pub fn close(&mut self) -> Result<()>
    {
        if self.closed {
            return Ok(());
        }
        if matches!(self.target, DebugTarget::Attach { .. }) {
            if let Err(e) = self.execute("-target-detach") {
                warn!(error = %e, "Detach failed");
            }
        }
        if let Err(e) = self.execute("-gdb-exit") {
            debug!(error = %e, "gdb did not acknowledge exit");
        }
        self.closed = true;

        let timeout = self.timeout;
        let child = &mut self.child;
        let status = self.runtime.block_on(async {
            match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => status.map(Some),
                Err(_) => {
                    child.kill().await?;
                    Ok(None)
                }
            }
        })?;
        debug!(?status, "gdb exited");
        Ok(())
    }

    fn expect_done(&mut self, command: &str, subject: &str) -> Result<Reply>
    {
        let reply = self.execute(command)?;
        match reply.class {
            ResultClass::Done | ResultClass::Running | ResultClass::Connected => Ok(reply),
            ResultClass::Error => Err(MdvError::Evaluation {
                expression: subject.to_string(),
                message: reply.error_message(),
            }),
            ResultClass::Exit => Err(MdvError::HostExited),
        }
    }

    fn read_chunk(&mut self, address: Address, len: usize) -> Result<Vec<u8>>
    {
        let command = format!("-data-read-memory-bytes {:#x} {len}", address.value());
        let reply = self.execute(&command)?;
        let failed = |reason: String| MdvError::MemoryRead { address, len, reason };

        if reply.class != ResultClass::Done {
            return Err(failed(reply.error_message()));
        }
        let blocks = find(&reply.results, "memory")
            .and_then(Value::as_list)
            .ok_or_else(|| failed("reply has no memory list".to_string()))?;
        assemble_blocks(address, len, blocks).map_err(failed)
    }
}

fn pipe_error(e: std::io::Error) -> MdvError
{
    match e.kind() {
        std::io::ErrorKind::BrokenPipe => MdvError::HostExited,
        _ => MdvError::Io(e),
    }
}

fn timeout_error(command: &str, timeout: Duration) -> MdvError
{
    MdvError::Timeout {
        command: command.to_string(),
        seconds: timeout.as_secs(),
    }
}

/// Stitch `memory=[{begin,offset,end,contents}]` blocks into one buffer
///
/// `begin` is absolute (`offset` is relative to the requested address). gdb
/// returns only the readable parts of a range; anything short of full
/// coverage is reported as an error message.
fn assemble_blocks(address: Address, len: usize, blocks: &[Value]) -> std::result::Result<Vec<u8>, String>
{
    let mut parsed = Vec::with_capacity(blocks.len());
    for block in blocks {
        let field = |name: &str| {
            block
                .get(name)
                .and_then(Value::as_str)
                .ok_or_else(|| format!("memory block without `{name}`"))
        };
        let begin = Address::parse(field("begin")?).ok_or("bad block begin")?;
        let bytes = hex::decode(field("contents")?).map_err(|e| format!("bad block contents: {e}"))?;
        parsed.push((begin.value(), bytes));
    }
    parsed.sort_by_key(|(start, _)| *start);

    let mut out = Vec::with_capacity(len);
    let mut cursor = address.value();
    for (start, bytes) in parsed {
        if start != cursor {
            return Err(format!("unreadable bytes at {}", Address::new(cursor)));
        }
        cursor += bytes.len() as u64;
        out.extend_from_slice(&bytes);
    }
    if out.len() != len {
        return Err(format!("only {} of {len} bytes readable", out.len()));
    }
    Ok(out)
}

async fn read_reply(lines: &mut Lines<BufReader<ChildStdout>>, token: u64) -> Result<Reply>
{
    let mut console = String::new();
    loop {
        let line = lines.next_line().await?.ok_or(MdvError::HostExited)?;
        trace!(line = %line, "mi raw");
        match mi::parse_record(&line) {
            Ok(Record::Result {
                token: Some(t),
                class,
                results,
            }) if t == token => return Ok(Reply { class, results, console }),
            Ok(Record::Result { token: other, .. }) => {
                debug!(?other, expected = token, "Skipping stale result record");
            }
            Ok(Record::Stream {
                kind: StreamKind::Console,
                text,
            }) => console.push_str(&text),
            Ok(record) => log_record(&record),
            Err(_) => log_inferior_output(&line),
        }
    }
}

fn log_record(record: &Record)
{
    match record {
        Record::Async {
            kind: AsyncKind::Exec,
            class,
            results,
            ..
        } => {
            let reason = find(results, "reason").and_then(Value::as_str).unwrap_or("");
            info!(class = %class, reason, "Inferior state changed");
        }
        Record::Async { class, .. } => debug!(class = %class, "gdb notification"),
        Record::Stream { kind, text } => debug!(?kind, "{}", text.trim_end()),
        Record::Result { .. } | Record::Prompt => {}
    }
}

fn log_inferior_output(line: &str)
{
    info!(target: "mdv_core::inferior", "{line}");
}

impl DebuggerHost for GdbHost
{
    fn evaluate(&mut self, expression: &str) -> Result<String>
    {
        let reply = self.expect_done(&format!("-data-evaluate-expression {}", mi::quote(expression)), expression)?;
        find(&reply.results, "value")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| MdvError::HostProtocol(format!("no value in reply for `{expression}`")))
    }

    fn console(&mut self, command: &str) -> Result<String>
    {
        let reply = self.expect_done(&format!("-interpreter-exec console {}", mi::quote(command)), command)?;
        Ok(reply.console)
    }

    fn read_memory(&mut self, address: Address, len: usize) -> Result<Vec<u8>>
    {
        let mut out = Vec::with_capacity(len);
        let mut offset = 0usize;
        while offset < len {
            let chunk = MEMORY_CHUNK.min(len - offset);
            let start = address.checked_add(offset as u64).ok_or_else(|| MdvError::MemoryRead {
                address,
                len,
                reason: "range wraps the address space".to_string(),
            })?;
            out.extend(self.read_chunk(start, chunk)?);
            offset += chunk;
        }
        debug!(%address, len, "Read inferior memory through gdb");
        Ok(out)
    }

    fn complete(&mut self, prefix: &str) -> Result<Vec<String>>
    {
        let line = format!("{COMPLETION_PREFIX}{prefix}");
        let reply = self.expect_done(&format!("-complete {}", mi::quote(&line)), &line)?;
        let matches = find(&reply.results, "matches")
            .and_then(Value::as_list)
            .unwrap_or_default();
        Ok(matches
            .iter()
            .filter_map(Value::as_str)
            .map(|m| m.strip_prefix(COMPLETION_PREFIX).unwrap_or(m).to_string())
            .collect())
    }

    fn select_frame(&mut self, level: u32) -> Result<()>
    {
        self.expect_done(&format!("-stack-select-frame {level}"), &format!("frame {level}"))?;
        Ok(())
    }

    fn select_thread(&mut self, thread: u32) -> Result<()>
    {
        self.expect_done(&format!("-thread-select {thread}"), &format!("thread {thread}"))?;
        Ok(())
    }

    fn inferior_pid(&self) -> Option<ProcessId>
    {
        match &self.target {
            DebugTarget::Attach { pid, .. } => Some(*pid),
            DebugTarget::Core { .. } => None,
        }
    }
}

impl Drop for GdbHost
{
    fn drop(&mut self)
    {
        if let Err(e) = self.close() {
            warn!(error = %e, "Failed to shut down gdb cleanly");
        }
    }
}
