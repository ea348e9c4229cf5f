//! Dispatch Roster Ports (Driven Ports)
//!
//! Post offices and shippers. The shipper port carries the conditional
//! counter increment that is the correctness boundary of dispatch: the
//! implementation must apply `counter + 1 <= cap` atomically
//! (`UPDATE … WHERE` against SQL, a guarded mutation in memory).

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::dispatch::{CounterKind, PostOffice, Shipper};
use crate::domain::shared::{GeoPoint, PostOfficeId, Region, ShipperId};
use crate::error::AppError;

/// Port for the post office network.
#[async_trait]
pub trait PostOfficeRepository: Send + Sync {
    /// Find an office by id.
    async fn find(&self, id: &PostOfficeId) -> Result<Option<PostOffice>, AppError>;

    /// All local offices (the ones with shipper rosters).
    async fn list_local(&self) -> Result<Vec<PostOffice>, AppError>;

    /// The regional hub of a region.
    async fn find_hub(&self, region: Region) -> Result<Option<PostOffice>, AppError>;
}

/// Port for the shipper fleet.
#[async_trait]
pub trait ShipperRepository: Send + Sync {
    /// Find a shipper by id.
    async fn find(&self, id: &ShipperId) -> Result<Option<Shipper>, AppError>;

    /// Find a shipper by the backing user account.
    async fn find_by_user(
        &self,
        user_id: &crate::domain::shared::UserId,
    ) -> Result<Option<Shipper>, AppError>;

    /// Roster of an office.
    async fn list_by_office(&self, office_id: &PostOfficeId) -> Result<Vec<Shipper>, AppError>;

    /// Atomically take one slot of the given counter.
    ///
    /// Returns `true` when the increment was applied, `false` when the cap
    /// was already reached (including by a concurrent dispatch). This check
    /// is the actual double-assignment guard; in-process locks above it are
    /// an optimization.
    async fn try_acquire_slot(
        &self,
        shipper_id: &ShipperId,
        kind: CounterKind,
    ) -> Result<bool, AppError>;

    /// Persist availability / online flags and heartbeat.
    async fn save(&self, shipper: &Shipper) -> Result<(), AppError>;

    /// Update the shipper's last known position.
    async fn update_location(
        &self,
        shipper_id: &ShipperId,
        location: GeoPoint,
    ) -> Result<(), AppError>;

    /// Open the reset journal entry for a region and date.
    ///
    /// Returns `false` when the entry already exists (reset already ran or
    /// is running), making the daily reset idempotent.
    async fn begin_counter_reset(&self, region: Region, date: NaiveDate)
    -> Result<bool, AppError>;

    /// Zero both counters for every shipper in the region.
    async fn reset_counters(&self, region: Region) -> Result<u64, AppError>;

    /// Mark the journal entry complete.
    async fn complete_counter_reset(
        &self,
        region: Region,
        date: NaiveDate,
    ) -> Result<(), AppError>;
}
