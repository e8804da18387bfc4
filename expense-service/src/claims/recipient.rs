//! Debounced recipient-code lookup.
//!
//! Every keystroke starts a lookup that waits for the debounce delay first.
//! If the same requester types again meanwhile, the older lookup gives up
//! without touching the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::instrument;
use uuid::Uuid;

use super::error::SubmissionError;
use crate::models::Recipient;
use crate::services::ExpenseDirectory;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Codes shorter than this are never looked up.
pub const MIN_CODE_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum RecipientLookup {
    Found(Recipient),
    NotFound,
    TooShort,
    /// A newer lookup from the same requester replaced this one.
    Superseded,
}

/// Clears the requester's pending ticket when the lookup ends or is dropped,
/// unless a newer lookup has replaced it.
struct PendingLookup<'a> {
    latest: &'a DashMap<Uuid, u64>,
    requester_id: Uuid,
    ticket: u64,
}

impl Drop for PendingLookup<'_> {
    fn drop(&mut self) {
        let ticket = self.ticket;
        self.latest
            .remove_if(&self.requester_id, |_, latest| *latest == ticket);
    }
}

pub struct DebouncedRecipientResolver<D: ?Sized> {
    directory: Arc<D>,
    delay: Duration,
    next_ticket: AtomicU64,
    latest: DashMap<Uuid, u64>,
}

impl<D> DebouncedRecipientResolver<D>
where
    D: ExpenseDirectory + ?Sized,
{
    pub fn new(directory: Arc<D>, delay: Duration) -> Self {
        Self {
            directory,
            delay,
            next_ticket: AtomicU64::new(1),
            latest: DashMap::new(),
        }
    }

    #[instrument(skip(self), fields(requester_id = %requester_id))]
    pub async fn lookup(
        &self,
        requester_id: Uuid,
        code: &str,
    ) -> Result<RecipientLookup, SubmissionError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.latest.insert(requester_id, ticket);
        let _pending = PendingLookup {
            latest: &self.latest,
            requester_id,
            ticket,
        };

        let code = code.trim();
        if code.chars().count() < MIN_CODE_LENGTH {
            return Ok(RecipientLookup::TooShort);
        }

        tokio::time::sleep(self.delay).await;
        if !self.is_current(requester_id, ticket) {
            return Ok(RecipientLookup::Superseded);
        }

        let found = self.directory.resolve_recipient_by_code(code).await;
        if !self.is_current(requester_id, ticket) {
            return Ok(RecipientLookup::Superseded);
        }

        Ok(match found? {
            Some(recipient) => RecipientLookup::Found(recipient),
            None => RecipientLookup::NotFound,
        })
    }

    /// Number of requesters with a lookup still waiting or running.
    pub fn pending_lookups(&self) -> usize {
        self.latest.len()
    }

    fn is_current(&self, requester_id: Uuid, ticket: u64) -> bool {
        self.latest
            .get(&requester_id)
            .is_some_and(|latest| *latest == ticket)
    }
}
