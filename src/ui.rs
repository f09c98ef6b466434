use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use webbrowser::Browser;

use focusbeat::{
    surface::Severity,
    sync::Readiness,
    timer::TimerStatus,
};

use crate::{App, InputMode};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Cyan,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

fn music_line(app: &App) -> String {
    let sync = app.session.sync();
    if !sync.has_music() {
        return "no music (l to add a YouTube link)".to_string();
    }
    let state = match sync.readiness() {
        Readiness::Absent => "music idle",
        Readiness::Loading { .. } => "loading music…",
        Readiness::Ready if sync.is_playing() => "♪ playing",
        Readiness::Ready if sync.is_manually_paused() => "music paused by you",
        Readiness::Ready => "music paused",
    };
    format!("{state}  ·  volume {}%", sync.volume())
}

fn legend(app: &App) -> &'static str {
    match (app.mode, app.session.status()) {
        (InputMode::EditingLink, _) => "type or paste a link · (enter) save · (esc) cancel",
        (_, TimerStatus::Idle) if Browser::is_available() => {
            "(s)tart · ↑/↓ length · (l)ink · (o)pen · (m)usic · +/- volume · (q)uit"
        }
        (_, TimerStatus::Idle) => "(s)tart · ↑/↓ length · (l)ink · (m)usic · +/- volume · (q)uit",
        _ => "(x) stop · (m)usic · +/- volume · (q)uit",
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let screen = self.session.display();
        let countdown_style = match self.session.status() {
            TimerStatus::Running => bold_style.fg(Color::Green),
            TimerStatus::Transitioning => bold_style.fg(Color::Yellow),
            TimerStatus::Finished => bold_style.fg(Color::Magenta),
            TimerStatus::Idle => bold_style,
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(0),    // padding
                Constraint::Length(3), // countdown
                Constraint::Length(1), // phase/cycle status
                Constraint::Length(1), // planned length
                Constraint::Length(1), // music
                Constraint::Length(3), // link
                Constraint::Min(0),    // toasts
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(screen.countdown.clone(), countdown_style))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("focusbeat"))
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(screen.status.clone(), bold_style))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        let timer = self.session.timer();
        Paragraph::new(Span::styled(
            format!(
                "{} min planned · {} cycle(s)",
                timer.total_minutes(),
                timer.total_cycles()
            ),
            dim_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

        Paragraph::new(Span::styled(music_line(self), italic_style))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        let (link_text, link_block) = match self.mode {
            InputMode::EditingLink => (
                format!("{}▏", self.link_draft),
                Block::default()
                    .borders(Borders::ALL)
                    .title("music link")
                    .border_style(Style::default().fg(Color::Yellow)),
            ),
            InputMode::Normal => (
                self.session.sync().reference().to_string(),
                Block::default().borders(Borders::ALL).title("music link"),
            ),
        };
        Paragraph::new(link_text)
            .block(link_block)
            .render(chunks[5], buf);

        let toasts: Vec<Line> = self
            .session
            .notifier()
            .visible()
            .map(|t| {
                Line::from(Span::styled(
                    t.message.clone(),
                    Style::default().fg(severity_color(t.severity)),
                ))
            })
            .collect();
        Paragraph::new(toasts)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);

        Paragraph::new(Span::styled(legend(self), italic_style)).render(chunks[7], buf);
    }
}
