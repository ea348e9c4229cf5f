//! Shipper candidate selection.
//!
//! Filters a roster to dispatchable shippers with capacity, ranks them,
//! and claims a counter slot with a bounded race-retry: when the atomic
//! increment loses to a concurrent dispatch, the next candidate is tried,
//! up to [`MAX_CANDIDATE_ATTEMPTS`].

use std::cmp::Ordering;

use crate::application::ports::ShipperRepository;
use crate::domain::dispatch::{CounterKind, Shipper};
use crate::domain::shared::PostOfficeId;
use crate::error::{AppError, ErrorKind};

/// How many ranked candidates one leg may try before giving up.
pub const MAX_CANDIDATE_ATTEMPTS: usize = 3;

/// Rank candidates: fewer assignments on the relevant counter first, then
/// higher rating, then most recent heartbeat. Ties break deterministically
/// by shipper id.
pub fn rank_candidates(candidates: &mut [Shipper], kind: CounterKind) {
    candidates.sort_by(|a, b| {
        a.counter(kind)
            .cmp(&b.counter(kind))
            .then_with(|| {
                b.rating
                    .partial_cmp(&a.rating)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.last_heartbeat_at.cmp(&a.last_heartbeat_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Pick a shipper from an office roster and claim one counter slot.
///
/// # Errors
///
/// `NoShipperAvailable` when no candidate passes the filter, and
/// `ConflictError` when every tried candidate lost its increment race.
pub async fn select_and_claim(
    shippers: &dyn ShipperRepository,
    office_id: &PostOfficeId,
    kind: CounterKind,
) -> Result<Shipper, AppError> {
    let roster = shippers.list_by_office(office_id).await?;

    let mut candidates: Vec<Shipper> = roster
        .into_iter()
        .filter(|s| s.is_dispatchable() && s.has_capacity())
        .collect();
    if candidates.is_empty() {
        return Err(AppError::new(
            ErrorKind::NoShipperAvailable,
            format!("no eligible shipper at office {office_id}"),
        ));
    }
    rank_candidates(&mut candidates, kind);

    for candidate in candidates.into_iter().take(MAX_CANDIDATE_ATTEMPTS) {
        if shippers.try_acquire_slot(&candidate.id, kind).await? {
            return Ok(candidate);
        }
        tracing::debug!(
            shipper_id = %candidate.id,
            "counter increment lost a race, trying next candidate"
        );
    }

    Err(AppError::new(
        ErrorKind::ConflictError,
        format!("all candidates at office {office_id} raced out"),
    ))
}
