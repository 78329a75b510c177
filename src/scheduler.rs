//! Background delivery of pre-recorded messages
//!
//! Entries are processed in file order, not due-time order: the loop
//! sleeps until each entry in turn becomes due, so an early entry that is
//! far in the future delays later ones. Reordering the file reorders
//! delivery. Each attempt's outcome is written back before the next entry
//! is considered.

use crate::store::{DeliveryStatus, ScheduleStore};
use crate::transport::MessageTransport;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Scheduler {
    store: ScheduleStore,
    transport: Arc<dyn MessageTransport>,
}

impl Scheduler {
    pub fn new(store: ScheduleStore, transport: Arc<dyn MessageTransport>) -> Self {
        Self { store, transport }
    }

    /// Walk the schedule once, sleeping until each entry is due. Returns
    /// when every entry has been visited; entries already terminal when
    /// the walk reaches them are skipped.
    pub async fn run(mut self) {
        let total = self.store.len();
        info!(total, pending = self.store.pending(), "scheduler started");

        for index in 0..total {
            let (number, message, scheduled_at, status) = match self.store.entries().get(index) {
                Some(entry) => (
                    entry.number.clone(),
                    entry.message.clone(),
                    entry.scheduled_at,
                    entry.status,
                ),
                None => break,
            };

            if status.is_terminal() {
                info!(number = %number, ?status, "skipping settled entry");
                continue;
            }

            // An already-due entry sends immediately
            let wait = scheduled_at - Utc::now();
            if let Ok(wait) = wait.to_std() {
                info!(number = %number, delay = ?wait, "waiting until due time");
                tokio::time::sleep(wait).await;
            }

            // The stored number is used as the address verbatim
            let outcome = match self.transport.send(&number, &message).await {
                Ok(()) => {
                    info!(number = %number, "scheduled message delivered");
                    DeliveryStatus::Delivered
                }
                Err(e) => {
                    warn!(number = %number, error = %e, "scheduled delivery failed");
                    DeliveryStatus::Failed
                }
            };

            if let Err(e) = self.store.mark(index, outcome) {
                warn!(number = %number, error = %e, "could not record delivery outcome");
            }
        }

        info!("scheduler finished: schedule exhausted");
    }
}
