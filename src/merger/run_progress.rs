//! Utilities to track the progression of a run

use std::fmt::{Display, Error, Formatter};

use crate::reconcile::Outcome;

/// An event that happens during a run
#[derive(Clone, Debug)]
pub enum RunEvent {
    /// The run has not started
    NotStarted,
    /// The run has just started but no calendar is handled yet
    Started,
    /// The run is in progress.
    InProgress {
        calendar: String,
        items_done_already: usize,
        details: String,
    },
    /// The run is finished
    Finished { success: bool },
}

impl Display for RunEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            RunEvent::NotStarted => write!(f, "Not started"),
            RunEvent::Started => write!(f, "Run has started..."),
            RunEvent::InProgress { calendar, items_done_already, details } =>
                write!(f, "[{}] {} ({} done)...", calendar, details, items_done_already),
            RunEvent::Finished { success } => match success {
                true => write!(f, "Run successfully finished"),
                false => write!(f, "Run finished with errors"),
            },
        }
    }
}

impl Default for RunEvent {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<RunEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<RunEvent>;

/// Create a feedback channel, that can be used to retrieve the current progress of a run
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(RunEvent::default())
}

/// What a run did to the destination calendar, and how well it went
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Source events mirrored for the first time
    pub inserted: u32,
    /// Mirrored copies refreshed because their source changed
    pub patched: u32,
    /// Mirrored copies that had vanished and were created anew
    pub reinserted: u32,
    /// Source events left alone because nothing changed
    pub skipped: u32,
    /// Mirrored copies dropped because their source was cancelled
    pub deleted: u32,
    /// Events or calendars that could not be processed this time
    pub errors: u32,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

/// A structure that tracks the progression and the errors that happen during a run
pub struct RunProgress {
    summary: RunSummary,
    counter: usize,
    feedback_channel: Option<FeedbackSender>,
}

impl RunProgress {
    pub fn new() -> Self {
        Self { summary: RunSummary::default(), counter: 0, feedback_channel: None }
    }
    pub fn new_with_feedback_channel(channel: FeedbackSender) -> Self {
        Self { summary: RunSummary::default(), counter: 0, feedback_channel: Some(channel) }
    }

    pub fn is_success(&self) -> bool {
        self.summary.is_success()
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Tally the outcome of one reconciled event
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Inserted => self.summary.inserted += 1,
            Outcome::Patched => self.summary.patched += 1,
            Outcome::Reinserted => self.summary.reinserted += 1,
            Outcome::Skipped => self.summary.skipped += 1,
            Outcome::Deleted => self.summary.deleted += 1,
            Outcome::Ignored => (),
        }
    }

    pub fn reset_counter(&mut self) {
        self.counter = 0;
    }
    pub fn increment_counter(&mut self, count: usize) {
        self.counter += count;
    }
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Log an error
    pub fn error(&mut self, text: &str) {
        log::error!("{}", text);
        self.summary.errors += 1;
    }
    /// Log a warning
    pub fn warn(&mut self, text: &str) {
        log::warn!("{}", text);
        self.summary.errors += 1;
    }
    /// Log an info
    pub fn info(&mut self, text: &str) {
        log::info!("{}", text);
    }
    /// Log a debug message
    pub fn debug(&mut self, text: &str) {
        log::debug!("{}", text);
    }
    /// Log a trace message
    pub fn trace(&mut self, text: &str) {
        log::trace!("{}", text);
    }
    /// Send an event as a feedback to the listener (if any).
    pub fn feedback(&mut self, event: RunEvent) {
        self.feedback_channel
            .as_ref()
            .map(|sender| {
                sender.send(event)
            });
    }
}
