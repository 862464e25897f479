mod editor;
mod shell;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use mdv_core::capture::CaptureOptions;
use mdv_core::{
    DebugTarget, DebuggerHost, Format, GdbConfig, GdbHost, LaunchMode, MatrixViewerCommand, MdvError, OutputTarget,
    ProcessId, Result, TypeCodeStrategy, ViewerConfig,
};
use mdv_utils::logging::format_from_env;
use mdv_utils::{info, init_logging_for_shell, init_logging_with_level, LogLevel};

/// Dump OpenCV matrices from a process under gdb and open them in matrix-viewer.
#[derive(Parser, Debug)]
#[command(name = "mdv")]
#[command(version)]
#[command(about = "Dump OpenCV matrices from a process under gdb and open them in matrix-viewer", long_about = None)]
struct Cli
{
    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Dump one matrix and exit
    Dump
    {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        output: OutputArgs,
        /// Frame to evaluate in (0 = innermost)
        #[arg(long)]
        frame: Option<u32>,
        /// gdb thread number to evaluate in
        #[arg(long)]
        thread: Option<u32>,
        /// Expression naming a cv::Mat, e.g. `img` or `this->frames[2]`
        expression: String,
    },
    /// Start an interactive shell with the `mdv` command
    Shell
    {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

/// How to reach the inferior
#[derive(Args, Debug)]
struct TargetArgs
{
    /// Attach to a running process
    #[arg(long)]
    pid: Option<u32>,
    /// Executable with debug info (required with --core)
    #[arg(long)]
    exe: Option<PathBuf>,
    /// Core file to inspect
    #[arg(long, requires = "exe", conflicts_with = "pid")]
    core: Option<PathBuf>,
    /// gdb binary
    #[arg(long, env = "MDV_GDB", default_value = "gdb")]
    gdb: PathBuf,
    /// Do not read gdb init files
    #[arg(long, default_value_t = false)]
    nx: bool,
    /// gdb console command to run after loading the target (repeatable)
    #[arg(long = "ex", value_name = "CMD")]
    startup_commands: Vec<String>,
    /// Seconds to wait for any gdb reply
    #[arg(long, env = "MDV_TIMEOUT", default_value_t = 30)]
    timeout: u64,
}

impl TargetArgs
{
    fn debug_target(&self) -> Result<DebugTarget>
    {
        match (self.pid, &self.core, &self.exe) {
            (Some(pid), None, exe) => Ok(DebugTarget::Attach {
                pid: ProcessId::from(pid),
                executable: exe.clone(),
            }),
            (None, Some(core), Some(exe)) => Ok(DebugTarget::Core {
                executable: exe.clone(),
                core: core.clone(),
            }),
            _ => Err(MdvError::InvalidArgument(
                "a target is required: --pid PID [--exe PATH] or --exe PATH --core PATH".to_string(),
            )),
        }
    }

    fn gdb_config(&self) -> GdbConfig
    {
        GdbConfig {
            program: self.gdb.clone(),
            no_init: self.nx,
            timeout: Duration::from_secs(self.timeout),
            startup_commands: self.startup_commands.clone(),
        }
    }
}

/// Where the dump goes and what opens it
#[derive(Args, Debug)]
struct OutputArgs
{
    /// Viewer program started on the dump
    #[arg(long, env = "MDV_VIEWER", default_value = "matrix-viewer")]
    viewer: PathBuf,
    /// Fixed dump path, overwritten every time
    #[arg(long)]
    output: Option<PathBuf>,
    /// Directory for unique dump files (default: system temp dir)
    #[arg(long, env = "MDV_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
    /// Dump format: xml, yaml, json, mfe, edf or txt (default: from --output, else xml)
    #[arg(long, env = "MDV_FORMAT")]
    format: Option<Format>,
    /// Record name inside FileStorage dumps
    #[arg(long, default_value = "matrix")]
    record_name: String,
    /// detach, wait or none
    #[arg(long, default_value = "detach")]
    launch: LaunchMode,
    /// How to read the element type: auto, method, console or flags
    #[arg(long, default_value = "auto")]
    type_code: TypeCodeStrategy,
    /// Copy pixels with process_vm_readv instead of through gdb (live pid only)
    #[arg(long, default_value_t = false)]
    direct_memory: bool,
}

impl OutputArgs
{
    fn viewer_config(&self) -> ViewerConfig
    {
        let output = match (&self.output, &self.output_dir) {
            (Some(path), _) => OutputTarget::Fixed(path.clone()),
            (None, Some(dir)) => OutputTarget::Unique { dir: dir.clone() },
            (None, None) => OutputTarget::default(),
        };
        ViewerConfig {
            viewer_program: self.viewer.clone(),
            output,
            format: self.format,
            record_name: self.record_name.clone(),
            launch_mode: self.launch,
            capture: CaptureOptions {
                type_code: self.type_code,
                direct_memory: self.direct_memory,
            },
        }
    }
}

fn main()
{
    let cli = Cli::parse();

    // stdout carries reports in one-shot mode, so logs go to stderr there and
    // to a file in the shell
    let logging = match cli.command {
        Commands::Dump { .. } => init_logging_with_level(cli.log_level, format_from_env()).map(|()| None),
        Commands::Shell { .. } => init_logging_for_shell(cli.log_level).map(Some),
    };
    match logging {
        Ok(Some(path)) => eprintln!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    }

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> Result<()>
{
    match cli.command {
        Commands::Dump {
            target,
            output,
            frame,
            thread,
            expression,
        } => {
            let command = MatrixViewerCommand::new(output.viewer_config());
            let mut host = GdbHost::spawn(&target.gdb_config(), target.debug_target()?)?;
            info!("Connected to {:?}", host.target());

            if let Some(thread) = thread {
                host.select_thread(thread)?;
            }
            if let Some(frame) = frame {
                host.select_frame(frame)?;
            }

            let report = command.dump(&mut host, &expression)?;
            println!("{}", shell::format_report(&report));
            host.close()
        }
        Commands::Shell { target, output } => {
            let command = MatrixViewerCommand::new(output.viewer_config());
            let mut host = GdbHost::spawn(&target.gdb_config(), target.debug_target()?)?;
            info!("Connected to {:?}", host.target());

            shell::Session::new(&mut host, &command).run()?;
            host.close()
        }
    }
}
