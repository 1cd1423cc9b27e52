use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use rondo::{
    app::{App, RaceState},
    config::{Config, ConfigStore, FileConfigStore},
    results::ResultsDb,
    runtime::{RondoEvent, Runner, TerminalEvents, WallTick, TICK_RATE_MS},
    workout::{Direction, TimerMode, WorkoutPlan},
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::PathBuf,
    time::Duration,
};

/// terminal interval timer for gym workouts with race heats
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal interval timer for gym workouts: interval/tabata/EMOM/AMRAP clocks with audible cues, plus staggered-start race heats with live placements and logged results."
)]
struct Cli {
    /// timer mode
    #[clap(short, long, value_enum)]
    mode: Option<CliMode>,

    /// work interval length in seconds
    #[clap(short, long)]
    work: Option<u32>,

    /// rest length in seconds between intervals
    #[clap(long)]
    rest: Option<u32>,

    /// number of rounds
    #[clap(short = 'n', long)]
    rounds: Option<u32>,

    /// prepare lead-in seconds before the first interval
    #[clap(long)]
    prepare: Option<u32>,

    /// count the work interval up instead of down
    #[clap(long)]
    count_up: bool,

    /// comma-separated exercises, cycled one per interval
    #[clap(short, long, value_delimiter = ',')]
    exercises: Vec<String>,

    /// race start groups as "Heat A:ann,bo;Heat B:cy" (forces stopwatch mode)
    #[clap(short, long)]
    groups: Option<String>,

    /// seconds between staggered group starts
    #[clap(long)]
    start_interval: Option<u32>,

    /// export stored workout results as CSV to PATH and exit
    #[clap(long, value_name = "PATH")]
    export_results: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliMode {
    Interval,
    Tabata,
    Emom,
    Amrap,
    TimeCap,
    Stopwatch,
    NoTimer,
}

impl From<CliMode> for TimerMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Interval => TimerMode::Interval,
            CliMode::Tabata => TimerMode::Tabata,
            CliMode::Emom => TimerMode::Emom,
            CliMode::Amrap => TimerMode::Amrap,
            CliMode::TimeCap => TimerMode::TimeCap,
            CliMode::Stopwatch => TimerMode::Stopwatch,
            CliMode::NoTimer => TimerMode::NoTimer,
        }
    }
}

/// Overlays explicit CLI flags on the stored config; flags always win.
fn apply_cli(config: &mut Config, cli: &Cli) {
    if let Some(mode) = cli.mode {
        config.settings.mode = mode.into();
    }
    if let Some(work) = cli.work {
        config.settings.work_secs = work;
    }
    if let Some(rest) = cli.rest {
        config.settings.rest_secs = rest;
    }
    if let Some(rounds) = cli.rounds {
        config.settings.rounds = rounds;
    }
    if let Some(prepare) = cli.prepare {
        config.settings.prepare_secs = prepare;
    }
    if cli.count_up {
        config.settings.direction = Direction::Up;
    }
    if !cli.exercises.is_empty() {
        config.exercises = cli.exercises.clone();
    }
    if let Some(interval) = cli.start_interval {
        config.start_interval_secs = interval;
    }
}

/// Parses "Heat A:ann,bo;Heat B:cy" into named groups in start order.
fn parse_groups(raw: &str) -> Result<Vec<(String, Vec<String>)>, String> {
    let mut groups = Vec::new();
    for part in raw.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, members) = part
            .split_once(':')
            .ok_or_else(|| format!("group '{}' is missing ':' before its participants", part))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("group '{}' has an empty name", part));
        }
        let participants: Vec<String> = members
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if participants.is_empty() {
            return Err(format!("group '{}' has no participants", name));
        }
        groups.push((name.to_string(), participants));
    }
    if groups.is_empty() {
        return Err("no groups given".to_string());
    }
    Ok(groups)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = &cli.export_results {
        let db = ResultsDb::new()?;
        let file = File::create(path)?;
        db.export_workouts_csv(file)?;
        println!("exported results to {}", path.display());
        return Ok(());
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    apply_cli(&mut config, &cli);

    let race = match &cli.groups {
        Some(raw) => {
            let groups = match parse_groups(raw) {
                Ok(groups) => groups,
                Err(msg) => {
                    let mut cmd = Cli::command();
                    cmd.error(ErrorKind::ValueValidation, msg).exit();
                }
            };
            // A race is timed on one shared stopwatch
            config.settings.mode = TimerMode::Stopwatch;
            config.settings.direction = Direction::Up;
            Some(RaceState::new(groups, config.start_interval_secs))
        }
        None => None,
    };

    // Best-effort: a read-only config dir shouldn't block the run
    let _ = store.save(&config);

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let plan = WorkoutPlan::new(config.settings, config.exercises.clone());
    let mut app = App::new(plan, race, ResultsDb::new().ok());
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        TerminalEvents,
        WallTick::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.next_event() {
            RondoEvent::Tick(delta) => {
                let size = terminal.size().unwrap_or_default();
                let cues = app.on_tick(delta, size.width, size.height);
                if !cues.is_empty() {
                    ring_bell();
                }
            }
            RondoEvent::Resize => {}
            RondoEvent::Key(key) => {
                app.clear_notice();
                match key.code {
                    KeyCode::Esc => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Char(' ') => app.toggle_start_pause(),
                    KeyCode::Char('s') => app.stop(),
                    KeyCode::Char('r') | KeyCode::Char('n') => app.reset(),
                    KeyCode::Char('f') => app.mark_selected_finished(),
                    KeyCode::Char('u') => app.undo_selected_finish(),
                    KeyCode::Up => app.select_prev_participant(),
                    KeyCode::Down => app.select_next_participant(),
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

// Terminal bell; the clock says when, this says how.
fn ring_bell() {
    let mut out = io::stdout();
    let _ = out.write_all(b"\x07");
    let _ = out.flush();
}
