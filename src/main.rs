//! subcall binary entry point.

use std::io::Write;
use std::process::ExitCode;

use subcall::cli::{self, Args};
use subcall::config::Config;
use subcall::{logging, CallOptions, Caller, Command, SubcallError};
use tracing::debug;

/// Exit status when the command timed out (matches coreutils `timeout`).
const EXIT_TIMEOUT: u8 = 124;
/// Exit status when the command could not be started.
const EXIT_LAUNCH: u8 = 127;
/// Exit status for usage errors.
const EXIT_USAGE: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("subcall: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("subcall: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };
    let _ = logging::try_init_with(config.log_filter());

    let options = match config.to_call_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("subcall: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(&args, options).await {
        Ok(code) => code,
        Err(e) => report(e),
    }
}

async fn run(args: &Args, options: CallOptions) -> Result<ExitCode, SubcallError> {
    let mut options = options.shell(args.shell);

    if let Some(ref input) = args.input {
        options = options.input(input.as_bytes());
    }
    if let Some(ref path) = args.input_file {
        options = options.input(std::fs::read(path)?);
    }
    if let Some(ref dir) = args.cwd {
        options = options.working_dir(dir);
    }

    let command = match args.command.as_slice() {
        [line] if args.shell => Command::from_line(line.clone()),
        argv => Command::new(argv.iter().cloned()),
    };
    debug!(command = %command, "subcall v{}", env!("CARGO_PKG_VERSION"));

    let result = Caller::default().call(command, &options).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(result.stdout())?;
    stdout.flush()?;
    let mut stderr = std::io::stderr().lock();
    stderr.write_all(result.stderr())?;
    stderr.flush()?;

    Ok(exit_status(result.exit_code()))
}

fn report(err: SubcallError) -> ExitCode {
    eprintln!("subcall: {}", err);

    match err {
        SubcallError::Validation(_) => ExitCode::from(EXIT_USAGE),
        SubcallError::Launch { .. } => ExitCode::from(EXIT_LAUNCH),
        SubcallError::Timeout(e) => {
            // Still hand over what the child managed to print.
            let _ = std::io::stdout().write_all(&e.stdout);
            let _ = std::io::stderr().write_all(&e.stderr);
            ExitCode::from(EXIT_TIMEOUT)
        }
        SubcallError::Execution(e) => exit_status(e.exit_code),
        SubcallError::Io(_) => ExitCode::FAILURE,
    }
}

fn exit_status(code: i32) -> ExitCode {
    ExitCode::from(exit_byte(code))
}

/// Map a child exit code onto our own; signals become `128 + N`.
fn exit_byte(code: i32) -> u8 {
    let code = if code < 0 { 128 - code } else { code };
    u8::try_from(code).unwrap_or(1)
}
