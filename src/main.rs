//! minibasic - An Interactive Line-Numbered BASIC Interpreter
//!
//! This is the entry point for minibasic, a small interactive interpreter
//! for a line-numbered BASIC dialect. The application features:
//!
//! - A REPL that accepts numbered program lines, immediate statements, and
//!   meta-commands (list, run, continue, clear, new, delete, load, save, bye)
//! - Loading one or more source files from the command line before entering
//!   the REPL (or exiting immediately if the loaded program runs to
//!   completion without hitting `stop`)
//! - A fused scanner/parser/executor core with no intermediate syntax tree
//!
//! ## Architecture Overview
//!
//! - **lexer**: `Cursor` and the try-match tokenizer primitives shared by
//!   the expression evaluator and statement executor
//! - **builtin**: the built-in function table (timer, rnd, pi, int, abs, ...)
//! - **frame**: the tagged control-stack frames used by gosub/return and
//!   for/next
//! - **interpreter**: the `Interpreter` struct — program store, variable
//!   environment, control stack, expression evaluator, and statement
//!   dispatch
//! - **error**: the shared `BasicError` type

use minibasic::error::{BasicError, Result};
use minibasic::interpreter::Interpreter;
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process;

const BANNER: &str = "minibasic READY\nType BYE to quit.";
const PROMPT: &str = "> ";

/// Entry point: load any files named on the command line, run the
/// resulting program, then either exit (program ran to completion) or drop
/// into the REPL (program hit `stop`, or no files were given at all).
fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut interp = Interpreter::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut loaded_any = false;
    for path in &args {
        match load_file(&mut interp, path, &mut out) {
            Ok(()) => loaded_any = true,
            Err(e) => {
                eprintln!("Error loading {}: {}", path, e);
                process::exit(1);
            }
        }
    }

    if loaded_any {
        if let Err(e) = interp.run(&mut out) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        // If the program ran to completion (rather than `stop`), exit
        // without entering the REPL.
        if !interp.is_stopped() {
            return;
        }
    }

    run_repl(&mut interp, &mut out);
}

/// Reads each line of `path` and feeds it to the line-input entry point,
/// exactly as the REPL would for a numbered line.
fn load_file(interp: &mut Interpreter, path: &str, out: &mut dyn Write) -> Result<()> {
    let contents = fs::read_to_string(path)?;
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        interp.parse_line(line, out)?;
    }
    Ok(())
}

fn run_repl(interp: &mut Interpreter, out: &mut dyn Write) {
    println!("{}", BANNER);
    let stdin = io::stdin();
    loop {
        print!("{}", PROMPT);
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        if dispatch_meta_command(interp, line, out) {
            continue;
        }
        if let Err(e) = interp.parse_line(line, out) {
            eprintln!("{}", e);
        }
    }
}

/// Returns `true` if `line` was a recognized meta-command (handled here,
/// regardless of whether it succeeded); `false` means the caller should try
/// it as a numbered line or immediate statement instead.
fn dispatch_meta_command(interp: &mut Interpreter, line: &str, out: &mut dyn Write) -> bool {
    let trimmed = line.trim_start();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or("").to_lowercase();
    let rest = parts.next().unwrap_or("").trim();

    match command.as_str() {
        "bye" => {
            process::exit(0);
        }
        "list" => {
            for (number, text) in interp.program_lines() {
                println!("{}\t{}", number, text);
            }
            true
        }
        "run" => {
            if let Err(e) = interp.run(out) {
                eprintln!("{}", e);
            }
            true
        }
        "continue" => {
            if let Err(e) = interp.continue_run(out) {
                eprintln!("{}", e);
            }
            true
        }
        "clear" => {
            interp.clear_vars();
            true
        }
        "new" => {
            interp.new_program();
            true
        }
        "delete" => {
            match rest.parse::<i64>() {
                Ok(number) => interp.delete_line(number),
                Err(_) => eprintln!("Usage: delete <line number>"),
            }
            true
        }
        "load" => {
            match parse_quoted_path(rest) {
                Some(path) => match load_file(interp, &path, out) {
                    Ok(()) => println!("File loaded."),
                    Err(e) => eprintln!("{}", e),
                },
                None => eprintln!("Usage: load \"path\""),
            }
            true
        }
        "save" => {
            match parse_quoted_path(rest) {
                Some(path) => match save_file(interp, &path) {
                    Ok(()) => println!("File saved."),
                    Err(e) => eprintln!("{}", e),
                },
                None => eprintln!("Usage: save \"path\""),
            }
            true
        }
        _ => false,
    }
}

fn parse_quoted_path(text: &str) -> Option<String> {
    let text = text.trim();
    let stripped = text.strip_prefix('"')?.strip_suffix('"')?;
    Some(stripped.to_string())
}

/// Writes the program, one line per entry, `N\tTEXT\n`, matching the
/// saved-file format `load` expects back.
fn save_file(interp: &Interpreter, path: &str) -> Result<()> {
    let mut contents = String::new();
    for (number, text) in interp.program_lines() {
        contents.push_str(&format!("{}\t{}\n", number, text));
    }
    fs::write(path, contents).map_err(BasicError::from)
}
