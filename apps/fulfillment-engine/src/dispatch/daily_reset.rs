//! Daily counter reset.
//!
//! Zeroes every shipper's pickup and delivery counters at a configured
//! cut-over, per region and in that region's timezone. The journal entry
//! is opened before any counter is touched, so a crashed run can be
//! retried and a completed run is never repeated.

use chrono::{FixedOffset, NaiveDate, Offset, Timelike, Utc};

use crate::application::ports::ShipperRepository;
use crate::domain::shared::Region;
use crate::error::AppError;

/// Cut-over configuration for one region.
#[derive(Debug, Clone, Copy)]
pub struct RegionCutover {
    /// The region.
    pub region: Region,
    /// UTC offset of the region's timezone.
    pub utc_offset_hours: i32,
    /// Local hour (0-23) at which counters reset.
    pub cutover_hour: u32,
}

impl RegionCutover {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    /// The local calendar date a reset at `now` belongs to.
    #[must_use]
    pub fn local_date(&self, now: chrono::DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset()).date_naive()
    }

    /// Whether the cut-over has passed for the local date of `now`.
    #[must_use]
    pub fn is_due(&self, now: chrono::DateTime<Utc>) -> bool {
        now.with_timezone(&self.offset()).time().hour() >= self.cutover_hour
    }
}

/// Journaled, idempotent counter reset across regions.
pub struct DailyResetJob<'a> {
    shippers: &'a dyn ShipperRepository,
    cutovers: Vec<RegionCutover>,
}

impl<'a> DailyResetJob<'a> {
    /// Build the job.
    #[must_use]
    pub fn new(shippers: &'a dyn ShipperRepository, cutovers: Vec<RegionCutover>) -> Self {
        Self { shippers, cutovers }
    }

    /// Run one pass. Regions whose cut-over has not arrived, or whose
    /// journal entry for the local date already exists, are skipped.
    /// A region failing mid-reset leaves its journal entry open; the next
    /// pass picks it up again.
    ///
    /// Returns the regions actually reset this pass.
    pub async fn run_once(&self, now: chrono::DateTime<Utc>) -> Result<Vec<Region>, AppError> {
        let mut reset_regions = Vec::new();

        for cutover in &self.cutovers {
            if !cutover.is_due(now) {
                continue;
            }
            let date = cutover.local_date(now);

            if !self.shippers.begin_counter_reset(cutover.region, date).await? {
                continue;
            }

            match self.shippers.reset_counters(cutover.region).await {
                Ok(count) => {
                    self.shippers
                        .complete_counter_reset(cutover.region, date)
                        .await?;
                    tracing::info!(
                        region = %cutover.region,
                        %date,
                        shippers = count,
                        "daily counters reset"
                    );
                    reset_regions.push(cutover.region);
                }
                Err(err) => {
                    // Journal stays open; the next pass retries this region.
                    tracing::error!(
                        region = %cutover.region,
                        %date,
                        error = %err,
                        "daily counter reset failed mid-way"
                    );
                }
            }
        }

        Ok(reset_regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::dispatch::{Shipper, ShipperStatus, VehicleType};
    use crate::domain::shared::{PostOfficeId, ShipperId, UserId};
    use crate::infrastructure::persistence::InMemoryShipperRepository;

    fn vietnam_cutover(region: Region) -> RegionCutover {
        RegionCutover {
            region,
            utc_offset_hours: 7,
            cutover_hour: 0,
        }
    }

    fn loaded_shipper(id: &str) -> Shipper {
        Shipper {
            id: ShipperId::new(id),
            user_id: UserId::new(format!("u-{id}")),
            post_office_id: PostOfficeId::new("po-1"),
            vehicle: VehicleType::Motorbike,
            status: ShipperStatus::Active,
            is_online: true,
            is_available: true,
            location: None,
            current_pickup_count: 7,
            current_delivery_count: 2,
            max_daily_orders: 10,
            rating: 4.5,
            total_delivered: 10,
            last_heartbeat_at: None,
        }
    }

    #[test]
    fn local_date_uses_region_offset() {
        let cutover = vietnam_cutover(Region::South);
        // 18:30 UTC is already the next day in UTC+7.
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap();
        assert_eq!(
            cutover.local_date(now),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
    }

    #[tokio::test]
    async fn reset_zeroes_counters_once_per_date() {
        let repo = InMemoryShipperRepository::new();
        repo.seed(loaded_shipper("r1"));

        let job = DailyResetJob::new(&repo, vec![vietnam_cutover(Region::South)]);
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap();

        let first = job.run_once(now).await.unwrap();
        assert_eq!(first, vec![Region::South]);

        let stored = repo.find(&ShipperId::new("r1")).await.unwrap().unwrap();
        assert_eq!(stored.current_pickup_count, 0);
        assert_eq!(stored.current_delivery_count, 0);

        // Same local date: journal makes the second pass a no-op.
        let second = job.run_once(now).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn next_day_resets_again() {
        let repo = InMemoryShipperRepository::new();
        repo.seed(loaded_shipper("r1"));
        let job = DailyResetJob::new(&repo, vec![vietnam_cutover(Region::South)]);

        let day1 = Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap();
        assert_eq!(job.run_once(day1).await.unwrap().len(), 1);

        let day2 = Utc.with_ymd_and_hms(2026, 3, 2, 18, 30, 0).unwrap();
        assert_eq!(job.run_once(day2).await.unwrap().len(), 1);
    }
}
