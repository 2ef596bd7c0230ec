//! qsp - prompt and file runner for the Qsp language
//!
//! Usage:
//!   qsp                  # interactive prompt
//!   qsp file.qsp ...     # load each file in order, then exit
//!
//! Evaluation errors are values: they print and the session continues.
//! Only an exhausted value heap ends the process with a failure code.

use std::path::{Path, PathBuf};

use clap::Parser as ClapParser;
use qsp_core::{Kind, OutOfMemory};
use qsp_runtime::Interp;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

#[derive(ClapParser)]
#[command(name = "qsp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for the Qsp language", long_about = None)]
struct Args {
    /// Source files to load in order; the interpreter exits after loading
    file: Vec<PathBuf>,
}

fn main() {
    // Log to stderr so diagnostics never mix with evaluated output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let mut interp = Interp::new().map_err(|e| e.to_string())?;
    info!("interpreter ready");

    if !args.file.is_empty() {
        for path in &args.file {
            load_file(&mut interp, path).map_err(|e| e.to_string())?;
        }
        return Ok(());
    }

    repl(&mut interp)
}

/// Drives the `load` builtin for one file from the command line, printing
/// any error value the way the prompt would.
fn load_file(interp: &mut Interp, path: &Path) -> Result<(), OutOfMemory> {
    let args = interp.heap.sexpr()?;
    let name = interp.heap.string(path.display().to_string())?;
    interp.heap.list_add(args, name);

    let global = interp.global;
    let res = qsp_runtime::io::load(interp, global, args)?;
    if interp.heap.kind(res) == Kind::Err {
        println!("{}", interp.heap.display(res));
    }
    interp.heap.release(res);
    Ok(())
}

fn repl(interp: &mut Interp) -> Result<(), String> {
    println!("Qsp Version {}", env!("CARGO_PKG_VERSION"));
    println!("Press Ctrl+c to Exit\n");

    let mut rl = DefaultEditor::new().map_err(|e| format!("readline init failed: {e}"))?;
    let history = dirs::home_dir().map(|home| home.join(".qsp_history"));
    if let Some(path) = &history {
        // absent or unreadable history is not an error
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline("qsp> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);
                eval_line(interp, &line).map_err(|e| e.to_string())?;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(format!("readline failed: {e}")),
        }
    }

    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
    Ok(())
}

/// One parse-eval-print iteration. Parse failures print the diagnostic
/// and discard the input.
fn eval_line(interp: &mut Interp, line: &str) -> Result<(), OutOfMemory> {
    match qsp_parser::parse(line) {
        Err(msg) => println!("{msg}"),
        Ok(tree) => {
            let v = qsp_runtime::read(&mut interp.heap, &tree)?;
            let res = interp.eval(interp.global, v)?;
            println!("{}", interp.heap.display(res));
            interp.heap.release(res);
        }
    }
    Ok(())
}
