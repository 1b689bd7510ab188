use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::summary::{ImportResult, ImportSource};

/// "New import available" event sent to whoever listens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportNotice {
    pub source: ImportSource,
    pub generated_at: DateTime<Utc>,
    pub total_shifts: usize,
    pub total_bookings: usize,
}

impl From<&ImportResult> for ImportNotice {
    fn from(result: &ImportResult) -> Self {
        ImportNotice {
            source: result.source,
            generated_at: result.generated_at,
            total_shifts: result.total_shifts,
            total_bookings: result.total_bookings,
        }
    }
}

/// The scheduling surface's side of the hand-off. It decides how to merge,
/// persist or discard what it receives.
pub trait ScheduleSink {
    fn receive(&self, result: ImportResult);
}

/// Keeps only the most recent import, replacing it wholesale on every delivery
#[derive(Debug, Default)]
pub struct LatestImport {
    slot: Mutex<Option<ImportResult>>,
}

impl LatestImport {
    pub fn get(&self) -> Option<ImportResult> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ScheduleSink for LatestImport {
    fn receive(&self, result: ImportResult) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
    }
}

/// Broadcasts an `ImportNotice` to every subscriber
#[derive(Debug, Clone)]
pub struct ImportNotifier {
    sender: broadcast::Sender<ImportNotice>,
}

impl ImportNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        ImportNotifier { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ImportNotice> {
        self.sender.subscribe()
    }

    /// Sends the notice; returns how many listeners got it
    pub fn notify(&self, notice: ImportNotice) -> usize {
        match self.sender.send(notice) {
            Ok(listeners) => listeners,
            Err(_) => {
                debug!("Import notice sent with no listeners");
                0
            }
        }
    }
}

impl Default for ImportNotifier {
    fn default() -> Self {
        ImportNotifier::new(16)
    }
}

/// Delivers a finished import to the sink in one piece, then notifies listeners
pub fn hand_off<S: ScheduleSink + ?Sized>(result: ImportResult, sink: &S, notifier: &ImportNotifier) -> ImportNotice {
    let notice = ImportNotice::from(&result);
    sink.receive(result);
    let listeners = notifier.notify(notice.clone());
    info!(
        "Handed off {} shift candidate(s) from {} booking(s) to {} listener(s)",
        notice.total_shifts, notice.total_bookings, listeners
    );
    notice
}
