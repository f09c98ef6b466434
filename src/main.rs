mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
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
    sync::Arc,
    time::{Duration, Instant},
};
use webbrowser::Browser;

use focusbeat::{
    config::{Config, ConfigStore, FileConfigStore, MAX_PHASE_MINUTES},
    logging,
    mpv::MpvWidgetFactory,
    player::WidgetFactory,
    runtime::{CrosstermEventSource, FixedTicker, FocusEvent, Runner},
    session::Session,
    surface::{Notifier, Screen, Severity, TerminalBell, ToastBoard},
    timer::TimerStatus,
    video::resolve_video_id,
    FocusError,
};

const TICK_RATE_MS: u64 = 100;

/// study focus timer with study/review/break cycles and background music
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A study focus timer for the terminal. Splits a session into study/break cycles (with an optional review phase) and keeps YouTube background music in sync: playing while you study, paused on breaks."
)]
pub struct Cli {
    /// total session length in minutes
    #[clap(short = 'm', long, value_parser = clap::value_parser!(u32).range(1..))]
    minutes: Option<u32>,

    /// YouTube link or 11-character video id to play while studying
    #[clap(long)]
    video: Option<String>,

    /// starting music volume (0-100)
    #[clap(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,

    /// minutes per planned cycle; the cycle count is total / unit
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..))]
    unit: Option<u32>,

    /// study phase length in minutes
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=MAX_PHASE_MINUTES as i64))]
    study: Option<u32>,

    /// review phase length in minutes, between study and break (0 disables it)
    #[clap(long, value_parser = clap::value_parser!(u32).range(0..=MAX_PHASE_MINUTES as i64))]
    review: Option<u32>,

    /// break length in minutes
    #[clap(long = "break", value_parser = clap::value_parser!(u32).range(0..=MAX_PHASE_MINUTES as i64))]
    break_minutes: Option<u32>,

    /// save the given options as the new defaults
    #[clap(long)]
    save: bool,

    /// mpv executable used for music playback
    #[clap(long, default_value = "mpv")]
    mpv: String,

    /// log verbosity (-v info, -vv debug, -vvv trace); logs go to the state dir
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Overlay command line options on the saved defaults
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(minutes) = self.minutes {
            cfg.total_minutes = minutes;
        }
        if let Some(video) = &self.video {
            cfg.video_reference = Some(video.clone());
        }
        if let Some(volume) = self.volume {
            cfg.volume = volume;
        }
        if let Some(unit) = self.unit {
            cfg.unit_minutes = unit;
        }
        if let Some(study) = self.study {
            cfg.study_minutes = study;
        }
        if let Some(review) = self.review {
            cfg.review_minutes = Some(review).filter(|m| *m > 0);
        }
        if let Some(break_minutes) = self.break_minutes {
            cfg.break_minutes = break_minutes;
        }
        cfg
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    EditingLink,
}

pub struct App {
    pub session: Session<Screen, ToastBoard, TerminalBell>,
    pub mode: InputMode,
    pub link_draft: String,
    pub config: Config,
}

impl App {
    pub fn new(config: Config, factory: Box<dyn WidgetFactory>) -> Self {
        let mut session = Session::new(
            config.phase_plan(),
            config.total_minutes,
            factory,
            Screen::default(),
            ToastBoard::new(),
            TerminalBell::default(),
        )
        .with_volume(config.volume);

        if let Some(reference) = &config.video_reference {
            if let Err(e) = session.set_video_reference(reference) {
                tracing::warn!("ignoring saved music link: {e}");
            }
        }

        Self {
            session,
            mode: InputMode::Normal,
            link_draft: String::new(),
            config,
        }
    }

    fn is_idle(&self) -> bool {
        self.session.status() == TimerStatus::Idle
    }

    fn notify(&mut self, message: &str, severity: Severity) {
        self.session.notifier_mut().notify(message, severity);
    }

    fn change_minutes(&mut self, up: bool) {
        if !self.is_idle() {
            self.notify("Stop the timer to change the session length.", Severity::Warning);
            return;
        }
        let unit = self.config.unit_minutes.max(1);
        let current = self.session.timer().total_minutes();
        let next = if up {
            current.saturating_add(unit)
        } else {
            current.saturating_sub(unit).max(unit)
        };
        if let Err(e) = self.session.configure(next) {
            self.notify(&e.to_string(), Severity::Warning);
        }
    }

    fn begin_link_edit(&mut self) {
        if !self.is_idle() {
            self.notify("Stop the timer to change the music link.", Severity::Warning);
            return;
        }
        self.link_draft = self.session.sync().reference().to_string();
        self.mode = InputMode::EditingLink;
    }

    fn commit_link(&mut self) {
        self.mode = InputMode::Normal;
        let draft = self.link_draft.trim().to_string();
        match self.session.set_video_reference(&draft) {
            Ok(()) if draft.is_empty() => self.notify("Music off.", Severity::Info),
            Ok(()) => self.notify("Music link set.", Severity::Success),
            Err(FocusError::InvalidReference(_)) => self.notify(
                "Invalid YouTube link. Paste a video URL or an 11-character id.",
                Severity::Error,
            ),
            Err(e) => self.notify(&e.to_string(), Severity::Warning),
        }
    }

    fn open_in_browser(&mut self) {
        let Some(video) = resolve_video_id(self.session.sync().reference()) else {
            self.notify("No music link to open.", Severity::Warning);
            return;
        };
        if !Browser::is_available() {
            self.notify("No browser available.", Severity::Warning);
            return;
        }
        if let Err(e) = webbrowser::open(&video.watch_url()) {
            self.notify(&format!("Couldn't open browser: {e}"), Severity::Error);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    logging::init_logging(cli.verbose);

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "saved defaults");
    }

    let events = CrosstermEventSource::new();
    let factory =
        MpvWidgetFactory::new(Arc::new(events.notice_sender())).with_binary(cli.mpv.clone());
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Box::new(factory));
    let result = start_tui(&mut terminal, &mut app, &runner);

    // drop the player before leaving so mpv does not outlive us
    app.session.stop();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            FocusEvent::Tick | FocusEvent::Resize => {}
            FocusEvent::Key(key) => {
                if handle_key(app, key, Instant::now()) == Flow::Quit {
                    break;
                }
            }
            FocusEvent::Widget(notice) => app.session.on_widget_notice(notice, Instant::now()),
        }

        let now = Instant::now();
        app.session.poll(now);
        app.session.notifier_mut().prune(now);
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent, now: Instant) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    match app.mode {
        InputMode::EditingLink => match key.code {
            KeyCode::Enter => app.commit_link(),
            KeyCode::Esc => app.mode = InputMode::Normal,
            KeyCode::Backspace => {
                app.link_draft.pop();
            }
            KeyCode::Char(c) => app.link_draft.push(c),
            _ => {}
        },
        InputMode::Normal => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Enter | KeyCode::Char('s') => {
                app.session.start(now);
            }
            KeyCode::Char('x') => app.session.stop(),
            KeyCode::Char('m') => app.session.toggle_music(now),
            KeyCode::Char('+') | KeyCode::Char('=') => app.session.volume_up(),
            KeyCode::Char('-') => app.session.volume_down(),
            KeyCode::Up | KeyCode::Right => app.change_minutes(true),
            KeyCode::Down | KeyCode::Left => app.change_minutes(false),
            KeyCode::Char('l') => app.begin_link_edit(),
            KeyCode::Char('o') => app.open_in_browser(),
            _ => {}
        },
    }
    Flow::Continue
}
