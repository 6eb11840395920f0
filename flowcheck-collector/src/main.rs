//! flowcheck CLI binary.
//!
//! Entry point for the `flowcheck` command-line tool.

use std::process::ExitCode;

use clap::Parser;
use flowcheck_collector::exit::{codes, exit_code};
use flowcheck_collector::{
    execute_capture, execute_compare, execute_duration, execute_listen, execute_run, ArgStyle,
    CaptureArgs, Cli, Command, CommandError, CompareArgs, DurationArgs, ListenArgs,
    ProcessExporter, RealSleeper, RunArgs, ShutdownFlag, StderrLogger, Verbosity,
};
use flowcheck_fs::RealFilesystem;
use flowcheck_oracle::OracleReport;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Ctrl+C stops listening and skips remaining pcaps; output is still written.
    let shutdown = ShutdownFlag::new();

    let result = match cli.command {
        Command::Capture(args) => run_capture(args, &shutdown),
        Command::Compare(args) => run_compare(args),
        Command::Duration(args) => run_duration(args),
        Command::Listen(args) => run_listen(args, &shutdown),
        Command::Run(args) => run_run(args, &shutdown),
    };

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}

fn logger(verbose: u8) -> StderrLogger {
    StderrLogger::new(Verbosity::from_count(verbose))
}

fn exporters(args: &CaptureArgs) -> (ProcessExporter, Option<ProcessExporter>) {
    let build = |program: &std::path::Path, style: ArgStyle| {
        ProcessExporter::new(program.to_path_buf(), style)
            .with_timeouts(args.active_timeout, args.inactive_timeout)
    };
    let mine = build(&args.exporter, args.exporter_style);
    let reference = args
        .reference
        .as_deref()
        .map(|program| build(program, args.reference_style));
    (mine, reference)
}

fn verdict_code(passed: bool) -> i32 {
    if passed {
        codes::SUCCESS
    } else {
        codes::CHECKS_FAILED
    }
}

/// Run the capture command.
fn run_capture(args: CaptureArgs, shutdown: &ShutdownFlag) -> Result<i32, CommandError> {
    let (mine, reference) = exporters(&args);

    let result = execute_capture(
        &args,
        &RealFilesystem,
        &mine,
        reference.as_ref(),
        &RealSleeper,
        shutdown,
        &logger(args.verbose),
    )?;

    println!(
        "Captured {} pcaps, wrote {} capture files, {} flows",
        result.pcaps,
        result.written.len(),
        result.flows
    );
    if result.interrupted {
        println!("Interrupted before all pcaps were captured");
    }

    Ok(codes::SUCCESS)
}

/// Run the compare command.
fn run_compare(args: CompareArgs) -> Result<i32, CommandError> {
    let report = execute_compare(&args, &RealFilesystem, &logger(args.verbose))?;
    print_tally("Comparison", &report);
    Ok(verdict_code(report.all_passed()))
}

/// Run the duration command.
fn run_duration(args: DurationArgs) -> Result<i32, CommandError> {
    let report = execute_duration(&args, &RealFilesystem, &logger(args.verbose))?;
    print_tally("Duration", &report);
    Ok(verdict_code(report.all_passed()))
}

/// Run the listen command.
fn run_listen(args: ListenArgs, shutdown: &ShutdownFlag) -> Result<i32, CommandError> {
    let result = execute_listen(&args, &RealFilesystem, shutdown, &logger(args.verbose))?;

    println!("Capture written to {}", result.path.display());
    println!(
        "  Datagrams: {} ({} dropped)",
        result.stats.datagrams, result.stats.dropped
    );
    println!("  Flows: {}", result.stats.flows);

    Ok(codes::SUCCESS)
}

/// Run the run command (capture + compare + duration).
fn run_run(args: RunArgs, shutdown: &ShutdownFlag) -> Result<i32, CommandError> {
    let (mine, reference) = exporters(&args.capture);

    let result = execute_run(
        &args,
        &RealFilesystem,
        &mine,
        reference.as_ref(),
        &RealSleeper,
        shutdown,
        &logger(args.capture.verbose),
    )?;

    println!("Capture phase:");
    println!(
        "  Captured {} pcaps, wrote {} capture files",
        result.capture.pcaps,
        result.capture.written.len()
    );
    if let Some(report) = &result.comparison {
        print_tally("Comparison", report);
    }
    if let Some(report) = &result.duration {
        print_tally("Duration", report);
    }
    if result.capture.interrupted {
        println!("Interrupted, checks skipped");
    }

    Ok(verdict_code(result.all_passed()))
}

fn print_tally(phase: &str, report: &OracleReport) {
    let tally = report.tally();
    println!("{}: {}/{} checks passed", phase, tally.passed, tally.total);
}
