//! shellfront: interactive shell front end.
//!
//! Reads lines with a line editor, runs each through lexing, splitting and
//! expansion, and prints what would be executed. Continuation lines are
//! requested with the continuation prompt.
//!
//! Usage:
//!   shellfront                 interactive loop
//!   shellfront -c LINE         process one line; continuations come from stdin
//!   shellfront --json          print resolved trees as JSON
//!   shellfront --dump-config   print the effective configuration

use std::io::{self, BufRead};
use std::process::ExitCode;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use shellfront::config::Config;
use shellfront::exec::{DryRun, Executor};
use shellfront::input::InputSource;
use shellfront::{Session, logging};

const USAGE: &str = "usage: shellfront [-c LINE] [--json] [--dump-config]";

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    command: Option<String>,
    json: bool,
    dump_config: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" => {
                let line = args.next().ok_or("-c: option requires an argument")?;
                options.command = Some(line);
            }
            "--json" => options.json = true,
            "--dump-config" => options.dump_config = true,
            other => return Err(format!("{other}: invalid option")),
        }
    }
    Ok(options)
}

/// Process one line and hand every entry to the executor.
fn run_line(
    session: &mut Session,
    line: &str,
    input: &mut dyn InputSource,
    executor: &mut dyn Executor,
    echo: bool,
) -> ExitCode {
    let processed = match session.process(line, input) {
        Ok(processed) => processed,
        Err(e) => {
            eprintln!("shellfront: {e}");
            return ExitCode::FAILURE;
        }
    };
    if echo && processed.history_expanded {
        println!("{}", processed.text);
    }
    for tree in &processed.commands {
        if let Err(e) = executor.execute(tree) {
            eprintln!("shellfront: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn interactive(session: &mut Session, executor: &mut dyn Executor, echo: bool) -> ExitCode {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("shellfront: cannot open terminal: {e}");
            return ExitCode::FAILURE;
        }
    };
    let primary = session.config().prompt.primary.clone();
    let continuation = session.config().prompt.continuation.clone();

    loop {
        let line = match editor.readline(&primary) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("shellfront: {e}");
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let mut input = || editor.readline(&continuation).ok();
        run_line(session, &line, &mut input, executor, echo);

        if let Some(entry) = session.recorded()
            && let Err(e) = editor.add_history_entry(entry)
        {
            log::warn!("line editor history: {e}");
        }
    }
}

fn main() -> ExitCode {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("shellfront: {e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = Config::load();
    if options.dump_config {
        return match config.to_toml() {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("shellfront: cannot render config: {e}");
                ExitCode::FAILURE
            }
        };
    }

    logging::init(&config.logging);
    log::info!("shellfront starting (json={})", options.json);

    let mut session = Session::new(config);
    let mut executor = DryRun::new(io::stdout()).json(options.json);
    let echo = !options.json;

    match options.command {
        Some(line) => {
            let stdin = io::stdin();
            let mut lines = stdin.lock().lines();
            let mut input = || lines.next().and_then(Result::ok);
            run_line(&mut session, &line, &mut input, &mut executor, echo)
        }
        None => interactive(&mut session, &mut executor, echo),
    }
}
