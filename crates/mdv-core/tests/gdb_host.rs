//! Tests for the GDB/MI host, run against a scripted stand-in for gdb

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mdv_core::capture::CaptureOptions;
use mdv_core::{
    Address, DebuggerHost, ExternalViewer, GdbConfig, GdbHost, LaunchMode, MatrixViewerCommand, MdvError,
    OutputTarget, ProcessId, DebugTarget, ViewerConfig,
};

/// Answers MI commands with canned records for a 2×2 CV_8UC1 matrix `img`
const FAKE_GDB: &str = r#"#!/bin/sh
printf '%s\n' '=thread-group-added,id="i1"'
printf '%s\n' '(gdb) '
while IFS= read -r line; do
  token=${line%%-*}
  case "$line" in
    *-gdb-exit*)
      printf '%s\n' "${token}^exit"
      exit 0 ;;
    *'-data-evaluate-expression "img"')
      printf '%s\n' "${token}^done,value=\"{flags = 1124024320, dims = 2, rows = 2, cols = 2}\"" ;;
    *'"(img).type()"')
      printf '%s\n' "${token}^done,value=\"0\"" ;;
    *'"(unsigned long long)(img).data"')
      printf '%s\n' "${token}^done,value=\"4096\"" ;;
    *'"(img).rows"' | *'"(img).cols"' | *'"(img).step.buf[0]"')
      printf '%s\n' "${token}^done,value=\"2\"" ;;
    *-data-evaluate-expression*)
      printf '%s\n' "${token}^error,msg=\"No symbol in current context.\"" ;;
    *-interpreter-exec*)
      printf '%s\n' '~"$1 = 16\n"'
      printf '%s\n' "${token}^done" ;;
    *'-data-read-memory-bytes 0x1000 4')
      printf '%s\n' '*stopped,reason="signal-received"'
      printf '%s\n' "${token}^done,memory=[{begin=\"0x1000\",offset=\"0x0\",end=\"0x1004\",contents=\"0a141e28\"}]" ;;
    *-data-read-memory-bytes*)
      printf '%s\n' "${token}^error,msg=\"Unable to read memory.\"" ;;
    *-complete*)
      printf '%s\n' "${token}^done,matches=[\"print img\",\"print imgGray\"],max_completions_reached=\"0\"" ;;
    *)
      printf '%s\n' "${token}^done" ;;
  esac
  printf '%s\n' '(gdb) '
done
"#;

fn install_fake_gdb(dir: &Path) -> PathBuf
{
    let path = dir.join("fake-gdb");
    std::fs::write(&path, FAKE_GDB).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn spawn(dir: &Path) -> GdbHost
{
    let config = GdbConfig {
        program: install_fake_gdb(dir),
        timeout: Duration::from_secs(10),
        ..GdbConfig::default()
    };
    let target = DebugTarget::Attach {
        pid: ProcessId::from(4321),
        executable: None,
    };
    GdbHost::spawn(&config, target).unwrap()
}

#[test]
fn test_evaluate_and_errors()
{
    let dir = tempfile::tempdir().unwrap();
    let mut host = spawn(dir.path());

    assert_eq!(host.evaluate("(img).rows").unwrap(), "2");
    let err = host.evaluate("nope").unwrap_err();
    assert!(matches!(err, MdvError::Evaluation { ref message, .. } if message.contains("No symbol")));
    assert_eq!(host.inferior_pid(), Some(ProcessId::from(4321)));

    host.close().unwrap();
}

#[test]
fn test_console_collects_stream_output()
{
    let dir = tempfile::tempdir().unwrap();
    let mut host = spawn(dir.path());
    assert_eq!(host.console("print img.type()").unwrap(), "$1 = 16\n");
}

#[test]
fn test_read_memory_decodes_hex()
{
    let dir = tempfile::tempdir().unwrap();
    let mut host = spawn(dir.path());

    assert_eq!(host.read_memory(Address::new(0x1000), 4).unwrap(), vec![10, 20, 30, 40]);
    assert!(matches!(
        host.read_memory(Address::new(0x2000), 4),
        Err(MdvError::MemoryRead { .. })
    ));
}

#[test]
fn test_complete_strips_command_prefix()
{
    let dir = tempfile::tempdir().unwrap();
    let mut host = spawn(dir.path());
    assert_eq!(host.complete("im").unwrap(), vec!["img", "imgGray"]);
}

#[test]
fn test_dump_through_mi()
{
    let dir = tempfile::tempdir().unwrap();
    let mut host = spawn(dir.path());
    let config = ViewerConfig {
        output: OutputTarget::Unique {
            dir: dir.path().to_path_buf(),
        },
        launch_mode: LaunchMode::None,
        capture: CaptureOptions::default(),
        ..ViewerConfig::default()
    };
    let viewer = ExternalViewer::new("matrix-viewer", LaunchMode::None);
    let command = MatrixViewerCommand::with_viewer(config, Box::new(viewer));

    let report = command.invoke(&mut host, "img").unwrap();

    assert_eq!((report.rows, report.cols), (2, 2));
    assert_eq!(report.viewer_pid, None);
    let text = std::fs::read_to_string(&report.path).unwrap();
    assert!(text.contains("10 20 30 40</data>"));
}
