// cfront: C/C++ token and syntax tree explorer

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_subscriber::EnvFilter;

use cfront::batch::{self, Unit};
use cfront::config::{LanguageProfile, ParseOptions, TriviaMode};
use cfront::dump;
use cfront::ui::App;

/// Explore how C and C++ source is lexed and parsed
#[derive(Parser, Debug)]
#[command(name = "cfront", version, about, long_about = None)]
struct Args {
    /// Source files; more than one implies --dump diagnostics
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Language profile (default: from the file extension)
    #[arg(short, long, value_name = "LANG")]
    lang: Option<LanguageProfile>,

    /// Print instead of opening the explorer
    #[arg(short, long, value_enum, value_name = "WHAT")]
    dump: Option<DumpKind>,

    /// Include comments, whitespace and directives in token output
    #[arg(short, long)]
    trivia: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DumpKind {
    Tokens,
    Ast,
    Diagnostics,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by `CFRONT_LOG`, only when it is set.
fn init_tracing() {
    if let Ok(filter) = std::env::var("CFRONT_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_writer(io::stderr)
            .init();
    }
}

fn run(args: Args) -> Result<ExitCode, CliError> {
    let base = if args.trivia {
        ParseOptions::default().with_trivia(TriviaMode::Attach)
    } else {
        ParseOptions::default()
    };

    let units = args
        .files
        .iter()
        .map(|path| {
            Unit::read(path, args.lang, base).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    match (args.dump, units.len()) {
        (Some(kind), _) => Ok(dump_units(&units, kind, args.trivia)),
        (None, 1) => explore(&units[0], args.trivia),
        (None, _) => Ok(dump_units(&units, DumpKind::Diagnostics, args.trivia)),
    }
}

/// Parse every unit and print the requested view. Fails if any unit has an
/// error diagnostic.
fn dump_units(units: &[Unit], kind: DumpKind, trivia: bool) -> ExitCode {
    let reports = batch::parse_units(units);
    let many = units.len() > 1;
    let mut failed = false;

    for (unit, report) in units.iter().zip(&reports) {
        let path = unit.path.display().to_string();
        failed |= report.has_errors();
        if many && kind != DumpKind::Diagnostics {
            println!("==> {} <==", path);
        }
        match kind {
            DumpKind::Tokens => {
                print!("{}", dump::dump_tokens(&unit.source, &unit.options, trivia))
            }
            DumpKind::Ast => print!("{}", dump::dump_ast(&report.output.program)),
            DumpKind::Diagnostics => {}
        }
        let diagnostics = dump::dump_diagnostics(&path, &report.output.diagnostics);
        if kind == DumpKind::Diagnostics {
            print!("{}", diagnostics);
        } else {
            eprint!("{}", diagnostics);
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn explore(unit: &Unit, trivia: bool) -> Result<ExitCode, CliError> {
    let mut app = App::new(
        unit.path.display().to_string(),
        unit.source.clone(),
        &unit.options,
        trivia,
    );

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(ExitCode::SUCCESS)
}

