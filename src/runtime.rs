use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::player::{NoticeSink, WidgetNotice};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum FocusEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Widget(WidgetNotice),
}

/// Source of terminal and player events
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<FocusEvent, RecvTimeoutError>;
}

/// Widget threads post their notices into the runner's queue
impl NoticeSink for Sender<FocusEvent> {
    fn deliver(&self, notice: WidgetNotice) {
        if self.send(FocusEvent::Widget(notice)).is_err() {
            tracing::debug!("event loop gone, dropping player notice");
        }
    }
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<FocusEvent>,
    rx: Receiver<FocusEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                // Windows terminals report releases too
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if key_tx.send(FocusEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if key_tx.send(FocusEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }

    /// A sender for player notices feeding this source
    pub fn notice_sender(&self) -> Sender<FocusEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FocusEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<FocusEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<FocusEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FocusEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> FocusEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                FocusEvent::Tick
            }
        }
    }

    pub fn event_source(&self) -> &E {
        &self.event_source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{HandleId, WidgetEvent};
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        let ev = runner.step();
        match ev {
            FocusEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(FocusEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            FocusEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn notices_arrive_through_the_sender_sink() {
        let (tx, rx) = mpsc::channel();
        let sink: &dyn NoticeSink = &tx;
        sink.deliver(WidgetNotice {
            handle: HandleId(3),
            event: WidgetEvent::Ready,
        });
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(10)),
        );

        match runner.step() {
            FocusEvent::Widget(notice) => {
                assert_eq!(notice.handle, HandleId(3));
                assert_eq!(notice.event, WidgetEvent::Ready);
            }
            other => panic!("expected widget notice, got {other:?}"),
        }
    }
}
