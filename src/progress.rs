//! Progress reporting for the pipelines.
//!
//! A pipeline owns a [`Progress`] counter and pushes [`ProgressEvent`]s to an
//! optional channel. The CLI drains the channel on a printer thread; library
//! callers pass `None` and get no events.

use std::sync::mpsc::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Total number of steps, sent before any step completes.
    Started { total: usize },
    /// `completed` never decreases and never exceeds `total`.
    Advanced { completed: usize, total: usize },
}

/// Monotonic progress counter.
#[derive(Debug)]
pub struct Progress {
    sender: Option<Sender<ProgressEvent>>,
    completed: usize,
    total: usize,
}

impl Progress {
    pub fn new(sender: Option<Sender<ProgressEvent>>) -> Self {
        Self {
            sender,
            completed: 0,
            total: 0,
        }
    }

    /// Announce the total. Call once, before the first [`advance`](Self::advance).
    pub fn start(&mut self, total: usize) {
        self.total = total;
        self.emit(ProgressEvent::Started { total });
    }

    /// Record `steps` finished steps.
    pub fn advance(&mut self, steps: usize) {
        if steps == 0 {
            return;
        }
        self.completed = (self.completed + steps).min(self.total);
        self.emit(ProgressEvent::Advanced {
            completed: self.completed,
            total: self.total,
        });
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            // A gone receiver only means nobody is watching.
            let _ = sender.send(event);
        }
    }
}
