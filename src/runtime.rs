use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Milliseconds between clock ticks; 100ms gives tenth-of-a-second display.
pub const TICK_RATE_MS: u64 = 100;

/// Unified input consumed by the event loop. A tick carries the seconds the
/// clock should advance by, so drivers at different resolutions stay exact.
#[derive(Clone, Debug)]
pub enum RondoEvent {
    Key(KeyEvent),
    Resize,
    Tick(f64),
}

/// Source of terminal input. `poll` blocks for at most `timeout` and returns
/// None when nothing arrived in time.
pub trait EventSource {
    fn poll(&mut self, timeout: Duration) -> Option<RondoEvent>;
}

/// Production source polling crossterm in place; the loop is single-threaded,
/// so no reader thread is needed.
#[derive(Debug, Default)]
pub struct TerminalEvents;

impl EventSource for TerminalEvents {
    fn poll(&mut self, timeout: Duration) -> Option<RondoEvent> {
        if !event::poll(timeout).unwrap_or(false) {
            return None;
        }
        match event::read() {
            Ok(CtEvent::Key(key)) => Some(RondoEvent::Key(key)),
            Ok(CtEvent::Resize(_, _)) => Some(RondoEvent::Resize),
            _ => None,
        }
    }
}

/// Scripted source for headless tests: pops pre-queued events, then reports
/// nothing so the runner falls back to ticking.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    queue: VecDeque<RondoEvent>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = RondoEvent>) -> Self {
        Self {
            queue: events.into_iter().collect(),
        }
    }

    pub fn push(&mut self, event: RondoEvent) {
        self.queue.push_back(event);
    }
}

impl EventSource for ScriptedEvents {
    fn poll(&mut self, _timeout: Duration) -> Option<RondoEvent> {
        self.queue.pop_front()
    }
}

/// Pacing for the clock tick: how long input may block before a tick is due,
/// and what delta that tick carries.
pub trait TickClock {
    fn timeout(&self) -> Duration;

    /// Called when the timeout expires; returns the seconds to advance by.
    fn tick(&mut self) -> f64;
}

/// Wall-clock pacing at a fixed rate. The delta is the measured time since
/// the previous tick, so a slow frame never loses clock time.
#[derive(Debug)]
pub struct WallTick {
    rate: Duration,
    last: Instant,
}

impl WallTick {
    pub fn new(rate: Duration) -> Self {
        Self {
            rate,
            last: Instant::now(),
        }
    }
}

impl TickClock for WallTick {
    fn timeout(&self) -> Duration {
        self.rate.saturating_sub(self.last.elapsed())
    }

    fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        delta
    }
}

/// Fixed deltas with no waiting, for headless runs.
#[derive(Clone, Copy, Debug)]
pub struct FixedTick {
    delta: f64,
}

impl FixedTick {
    pub fn new(delta: f64) -> Self {
        Self { delta }
    }
}

impl TickClock for FixedTick {
    fn timeout(&self) -> Duration {
        Duration::ZERO
    }

    fn tick(&mut self) -> f64 {
        self.delta
    }
}

/// Merges terminal input with tick pacing into one stream of events.
pub struct Runner<S: EventSource, C: TickClock> {
    source: S,
    clock: C,
}

impl<S: EventSource, C: TickClock> Runner<S, C> {
    pub fn new(source: S, clock: C) -> Self {
        Self { source, clock }
    }

    /// Next event. When no input arrives before the tick is due, the tick
    /// wins and carries the seconds elapsed since the previous one.
    pub fn next_event(&mut self) -> RondoEvent {
        match self.source.poll(self.clock.timeout()) {
            Some(event) => event,
            None => RondoEvent::Tick(self.clock.tick()),
        }
    }
}
