//! Observable startup progress.
//!
//! The ingestion task owns a [`ProgressReporter`]; any number of observers
//! hold a `watch::Receiver<Progress>` and see the latest snapshot. Snapshots
//! never move backwards.

use serde::Serialize;
use tokio::sync::watch;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum Progress {
    #[serde(rename_all = "camelCase")]
    LoadingModel { fraction: f32 },
    #[serde(rename_all = "camelCase")]
    Ingesting {
        attempted: usize,
        total: usize,
        skipped: usize,
    },
    #[serde(rename_all = "camelCase")]
    Ready { entries: usize, skipped: usize },
}

impl Progress {
    /// Completion of the current phase in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        match self {
            Progress::LoadingModel { fraction } => *fraction,
            Progress::Ingesting { total: 0, .. } => 1.0,
            Progress::Ingesting {
                attempted, total, ..
            } => *attempted as f32 / *total as f32,
            Progress::Ready { .. } => 1.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Progress::Ready { .. })
    }

    fn rank(&self) -> (u8, f32) {
        match self {
            Progress::LoadingModel { .. } => (0, self.fraction()),
            Progress::Ingesting { .. } => (1, self.fraction()),
            Progress::Ready { .. } => (2, 1.0),
        }
    }
}

pub struct ProgressReporter {
    tx: watch::Sender<Progress>,
}

impl ProgressReporter {
    pub fn channel() -> (Self, watch::Receiver<Progress>) {
        let (tx, rx) = watch::channel(Progress::LoadingModel { fraction: 0.0 });
        (Self { tx }, rx)
    }

    /// Publish `next` unless it would move progress backwards.
    pub fn report(&self, next: Progress) {
        self.tx.send_if_modified(|current| {
            let (phase, fraction) = current.rank();
            let (next_phase, next_fraction) = next.rank();
            let forward =
                next_phase > phase || (next_phase == phase && next_fraction >= fraction);
            if forward && *current != next {
                *current = next;
                true
            } else {
                false
            }
        });
    }

    pub fn loading(&self, fraction: f32) {
        self.report(Progress::LoadingModel {
            fraction: fraction.clamp(0.0, 1.0),
        });
    }
}
