use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::warn;

use tapstat::{
    app::{Action, App, TextSource},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    logging, replay,
    runtime::{CrosstermEventSource, MonotonicClock, Runner},
    store::{SessionStore, SqliteSessionStore},
    texts,
    ui::AppView,
    util::mean,
};

/// typing practice with live speed, accuracy and consistency metrics
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// custom prompt to use
    #[clap(short = 'p', long, conflicts_with = "file")]
    prompt: Option<String>,

    /// read the prompt from a text file
    #[clap(short = 'f', long)]
    file: Option<PathBuf>,

    /// replay a JSON log of input events against the prompt and print the result
    #[clap(long, value_name = "LOG")]
    replay: Option<PathBuf>,

    /// list the most recent stored sessions
    #[clap(long, value_name = "N", num_args = 0..=1, default_missing_value = "10")]
    history: Option<usize>,

    /// export all stored sessions as CSV
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// do not store finished sessions
    #[clap(long)]
    no_save: bool,

    /// number of trailing keystrokes used for burst speed
    #[clap(long)]
    burst_window: Option<usize>,

    /// path of the stats database
    #[clap(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if self.no_save {
            config.save_stats = false;
        }
        if let Some(window) = self.burst_window {
            config.engine.burst_window = window.max(1);
        }
    }

    fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .or_else(AppDirs::db_path)
            .unwrap_or_else(|| PathBuf::from("tapstat_stats.db"))
    }

    fn text_source(&self) -> io::Result<TextSource> {
        Ok(match (&self.prompt, &self.file) {
            (Some(prompt), _) => TextSource::Fixed(prompt.clone()),
            (None, Some(path)) => TextSource::Fixed(texts::load_passage(path)?),
            (None, None) => TextSource::Random,
        })
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = FileConfigStore::new().load();
    cli.apply(&mut config);

    if let Some(path) = &cli.export {
        logging::init_stderr(&config.log_level);
        let count = SqliteSessionStore::open(&cli.db_path())?.export_csv(path)?;
        println!("exported {count} sessions to {}", path.display());
        return Ok(());
    }

    if let Some(limit) = cli.history {
        logging::init_stderr(&config.log_level);
        return print_history(&cli.db_path(), limit);
    }

    let source = cli.text_source()?;

    if let Some(log) = &cli.replay {
        logging::init_stderr(&config.log_level);
        let TextSource::Fixed(text) = source else {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::MissingRequiredArgument,
                "--replay needs the reference text via --prompt or --file",
            )
            .exit();
        };
        let events = replay::load_events(log)?;
        let report = replay::replay(&text, &events, config.engine.clone())?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = AppDirs::log_path() {
        logging::init_file(&log_path, &config.log_level);
    }

    let store: Option<Box<dyn SessionStore>> = if config.save_stats {
        match SqliteSessionStore::open(&cli.db_path()) {
            Ok(store) => Some(Box::new(store)),
            Err(e) => {
                warn!(error = %e, "stats store unavailable, sessions will not be saved");
                None
            }
        }
    } else {
        None
    };

    let mut app = App::new(source, config.engine.clone(), store)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(
        &mut terminal,
        &mut app,
        Duration::from_millis(config.tick_rate_ms.max(10)),
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick: Duration,
) -> Result<(), Box<dyn Error>> {
    let clock = MonotonicClock::new();
    let runner = Runner::new(CrosstermEventSource::new(clock), tick, clock);

    loop {
        let now_ms = runner.now_ms();
        terminal.draw(|f| {
            f.render_widget(
                AppView {
                    app: &*app,
                    now_ms,
                },
                f.area(),
            )
        })?;

        if app.handle_event(runner.step()) == Action::Quit {
            break;
        }
    }

    Ok(())
}

fn print_history(db_path: &Path, limit: usize) -> Result<(), Box<dyn Error>> {
    let store = SqliteSessionStore::open(db_path)?;
    let sessions = store.recent(limit)?;
    if sessions.is_empty() {
        println!("no sessions recorded yet");
        return Ok(());
    }

    for session in &sessions {
        let s = &session.summary;
        println!(
            "{}  {:>3} wpm  {:>3}% acc  {:>4}s  {:<6}  {}",
            s.completed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            s.wpm,
            s.accuracy,
            s.duration_seconds,
            s.difficulty,
            s.text_preview,
        );
    }

    let wpms: Vec<f64> = sessions.iter().map(|s| s.summary.wpm as f64).collect();
    if let Some(avg) = mean(&wpms) {
        println!("{} sessions, average {:.0} wpm", sessions.len(), avg);
    }
    Ok(())
}
