//! sdif entrypoint.
use std::io::{self, BufWriter, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result, bail};
use clap::Parser;
use core_color::Palette;
use core_config::{CliOverrides, ColorChoice, ConfigContext, MarkPosition, load_from};
use core_diff::LineSource;
use core_render::{Originals, RenderError, render};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

mod backend;

use backend::{DiffProcess, open_file};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "sdif", version, about = "Side-by-side diff viewer")]
struct Args {
    /// Two files to compare, or one diff file (`-` or nothing reads stdin).
    #[arg(num_args = 0..=2)]
    files: Vec<PathBuf>,
    /// Total output width in columns.
    #[arg(short = 'W', long)]
    width: Option<usize>,
    /// Show line numbers.
    #[arg(short = 'n', long)]
    number: bool,
    /// Width of the line number field.
    #[arg(long)]
    digit: Option<usize>,
    /// Cut long lines instead of wrapping them.
    #[arg(long)]
    truncate: bool,
    /// Wrap at word boundaries.
    #[arg(long)]
    onword: bool,
    /// Position of the change mark on both sides.
    #[arg(long, value_name = "left|right|none")]
    mark: Option<MarkPosition>,
    #[arg(long, value_name = "left|right|none")]
    old_mark: Option<MarkPosition>,
    #[arg(long, value_name = "left|right|none")]
    new_mark: Option<MarkPosition>,
    /// Show each hunk as one old/new pair without change marks.
    #[arg(short = 'v', long)]
    view: bool,
    #[arg(long, value_name = "always|never|auto")]
    color: Option<ColorChoice>,
    /// Use the 256-color palette.
    #[arg(long = "256", conflicts_with = "ansi8")]
    ansi256: bool,
    /// Use the 8-color palette.
    #[arg(long = "8")]
    ansi8: bool,
    /// Color override, `PATTERN=SPEC`; may be repeated.
    #[arg(long = "cm", value_name = "PATTERN=SPEC")]
    colormap: Vec<String>,
    #[arg(long)]
    tabstop: Option<usize>,
    /// Diff command run when two files are given.
    #[arg(long, default_value = "diff")]
    diff: String,
    /// Extra option passed to the diff command; may be repeated.
    #[arg(long = "diff-option", allow_hyphen_values = true)]
    diff_options: Vec<String>,
    /// Do not read the original files alongside the diff.
    #[arg(long)]
    diff_only: bool,
    /// Configuration file path (overrides discovery of `sdif.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Write logs to this file instead of stderr.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        let palette = if self.ansi8 {
            Some(Palette::Ansi8)
        } else if self.ansi256 {
            Some(Palette::Ansi256)
        } else {
            None
        };
        CliOverrides {
            width: self.width,
            number: self.number.then_some(true),
            digit: self.digit,
            truncate: self.truncate.then_some(true),
            onword: self.onword.then_some(true),
            view: self.view.then_some(true),
            tabstop: self.tabstop,
            old_mark: self.old_mark.or(self.mark),
            new_mark: self.new_mark.or(self.mark),
            color: self.color,
            palette,
            colormap: self.colormap.clone(),
        }
    }
}

/// Where the diff text comes from.
struct Input {
    source: Box<dyn LineSource>,
    originals: Option<Originals>,
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn open_input(args: &Args) -> Result<Input> {
    match args.files.as_slice() {
        [] => Ok(stdin_input()),
        [path] if is_stdin(path) => Ok(stdin_input()),
        [path] => Ok(Input {
            source: Box::new(open_file(path)?),
            originals: None,
        }),
        [old, new] => {
            if is_stdin(old) || is_stdin(new) {
                bail!("`-` cannot be compared; give two files or one diff");
            }
            let originals = if args.diff_only {
                None
            } else {
                Some(Originals::new(
                    Box::new(open_file(old)?),
                    Box::new(open_file(new)?),
                ))
            };
            let process = DiffProcess::spawn(&args.diff, &args.diff_options, old, new)?;
            Ok(Input {
                source: Box::new(process),
                originals,
            })
        }
        _ => bail!("at most two files may be given"),
    }
}

fn stdin_input() -> Input {
    Input {
        source: Box::new(core_diff::ReaderSource::new(io::stdin().lock())),
        originals: None,
    }
}

fn configure_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let Some(path) = log_file else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
        return Ok(None);
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?;
    let file_appender = tracing_appender::rolling::never(dir, name);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // Global subscriber already installed; drop guard so the writer shuts down.
        Err(_) => Ok(None),
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn terminal_context() -> ConfigContext {
    let tty = io::stdout().is_terminal();
    let columns = if tty {
        crossterm::terminal::size().ok().map(|(w, _)| w)
    } else {
        None
    };
    ConfigContext::new(columns, tty)
}

fn run(args: &Args) -> Result<i32> {
    let config = load_from(args.config.clone())?;
    let render_config = config.resolve(&args.overrides(), terminal_context());
    let input = open_input(args)?;
    info!(
        target: "runtime",
        files = args.files.len(),
        originals = input.originals.is_some(),
        config = ?config.path,
        "startup"
    );
    let out = BufWriter::new(io::stdout().lock());
    match render(input.source, input.originals, render_config, out) {
        Ok(status) => Ok(status),
        Err(RenderError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
            info!(target: "runtime", "output_closed");
            Ok(0)
        }
        Err(e) => Err(e).context("rendering failed"),
    }
}

fn main() {
    let args = Args::parse();
    let log_guard = match configure_logging(args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("sdif: {e:#}");
            std::process::exit(2);
        }
    };
    install_panic_hook();

    let code = match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!(target: "runtime", error = %format!("{e:#}"), "fatal");
            eprintln!("sdif: {e:#}");
            2
        }
    };
    drop(log_guard);
    std::process::exit(code);
}
