//! Timed intro sequence.
//!
//! The sequencer walks an ordered phase table driven by a single timer slot.
//! Phases with text reveal one character per letter interval, then hold; the
//! hold of the last phase ends the run and fires the completion callback.
//! Time only moves when the host calls [`IntroSequencer::advance`], which
//! keeps the state machine deterministic and lets [`run_intro`] map it onto
//! real timers.

mod runner;

use std::{fmt, time::Duration};

use crate::{IntroConfig, PhaseSpec, PlaybackClock, Result, TechXError, TimerSlot};

pub use runner::run_intro;

/// Lifecycle of a sequencer. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl IntroStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Observable transition emitted by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntroEvent {
    PhaseEntered { index: usize, name: String },
    LetterRevealed { index: usize, reveal_count: usize },
    Completed,
}

type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

pub struct IntroSequencer {
    phases: Vec<PhaseSpec>,
    status: IntroStatus,
    phase_index: usize,
    reveal_count: usize,
    clock: PlaybackClock,
    timer: TimerSlot,
    on_complete: Option<CompletionCallback>,
}

impl IntroSequencer {
    /// Builds a sequencer over a validated phase table. `on_complete` runs at
    /// most once, after the terminal phase's hold delay.
    pub fn new<F>(config: &IntroConfig, on_complete: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        config.validate()?;

        Ok(Self {
            phases: config.phases.clone(),
            status: IntroStatus::Idle,
            phase_index: 0,
            reveal_count: 0,
            clock: PlaybackClock::default(),
            timer: TimerSlot::new(),
            on_complete: Some(Box::new(on_complete)),
        })
    }

    /// Enters the first phase and schedules its first timer.
    pub fn start(&mut self) -> Result<Vec<IntroEvent>> {
        let rejection = match self.status {
            IntroStatus::Idle => None,
            IntroStatus::Running => Some("intro already started"),
            IntroStatus::Completed => Some("intro already completed"),
            IntroStatus::Cancelled => Some("intro was cancelled"),
        };
        if let Some(reason) = rejection {
            return Err(TechXError::IllegalState(reason));
        }

        self.status = IntroStatus::Running;
        self.clock.reset();

        let mut events = Vec::new();
        self.enter_phase(0, Duration::ZERO, &mut events);
        Ok(events)
    }

    /// Moves virtual time forward and fires every timer that became due.
    pub fn advance(&mut self, delta: Duration) -> Vec<IntroEvent> {
        let mut events = Vec::new();
        if self.status != IntroStatus::Running {
            return events;
        }

        self.clock.advance(delta);
        while let Some(fired_at) = self.timer.take_due(self.clock.elapsed()) {
            self.fire(fired_at, &mut events);
        }

        events
    }

    /// Stops the sequence without running the completion callback. Returns
    /// false when the sequencer had already finished.
    pub fn cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.timer.invalidate();
        self.on_complete = None;
        self.status = IntroStatus::Cancelled;
        tracing::debug!(phase = self.phase(), "intro cancelled");
        true
    }

    pub fn status(&self) -> IntroStatus {
        self.status
    }

    /// Name of the phase currently shown. `None` before `start`.
    pub fn phase(&self) -> Option<&str> {
        match self.status {
            IntroStatus::Idle => None,
            _ => self.current().map(|phase| phase.name.as_str()),
        }
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn reveal_count(&self) -> usize {
        self.reveal_count
    }

    /// The part of the current phase's text that is visible.
    pub fn revealed_text(&self) -> &str {
        let Some(phase) = self.current() else {
            return "";
        };
        match phase.text.char_indices().nth(self.reveal_count) {
            Some((end, _)) => &phase.text[..end],
            None => &phase.text,
        }
    }

    /// Time left until the next transition, or `None` when nothing is
    /// scheduled.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timer.remaining(self.clock.elapsed())
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    fn current(&self) -> Option<&PhaseSpec> {
        self.phases.get(self.phase_index)
    }

    fn enter_phase(&mut self, index: usize, at: Duration, events: &mut Vec<IntroEvent>) {
        self.phase_index = index;
        self.reveal_count = 0;

        let phase = &self.phases[index];
        tracing::info!(phase = %phase.name, index, "intro phase entered");
        events.push(IntroEvent::PhaseEntered {
            index,
            name: phase.name.clone(),
        });

        self.schedule_next(at);
    }

    fn fire(&mut self, at: Duration, events: &mut Vec<IntroEvent>) {
        let text_len = self.phases[self.phase_index].text_len();

        if self.reveal_count < text_len {
            self.reveal_count = (self.reveal_count + 1).min(text_len);
            tracing::trace!(
                index = self.phase_index,
                reveal_count = self.reveal_count,
                "letter revealed"
            );
            events.push(IntroEvent::LetterRevealed {
                index: self.phase_index,
                reveal_count: self.reveal_count,
            });
            self.schedule_next(at);
            return;
        }

        let next = self.phase_index + 1;
        if next < self.phases.len() {
            self.enter_phase(next, at, events);
        } else {
            self.complete(events);
        }
    }

    fn schedule_next(&mut self, from: Duration) {
        let phase = &self.phases[self.phase_index];
        let delay = if self.reveal_count < phase.text_len() {
            phase.letter_interval()
        } else {
            phase.hold()
        };
        self.timer.schedule(from, delay);
    }

    fn complete(&mut self, events: &mut Vec<IntroEvent>) {
        self.status = IntroStatus::Completed;
        self.timer.invalidate();
        tracing::info!(elapsed = ?self.clock.elapsed(), "intro complete");
        events.push(IntroEvent::Completed);

        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }
}

impl fmt::Debug for IntroSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntroSequencer")
            .field("status", &self.status)
            .field("phase", &self.phase())
            .field("reveal_count", &self.reveal_count)
            .field("elapsed", &self.clock.elapsed())
            .field("pending", &self.timer.is_pending())
            .finish()
    }
}
