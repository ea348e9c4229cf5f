//! In-memory dispatch roster repositories for testing and development.
//!
//! The shipper repository's conditional increment is the dispatch
//! correctness boundary; here it holds the write lock across the
//! check-and-increment so it is as atomic as the SQL `UPDATE … WHERE`
//! it stands in for.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::application::ports::{PostOfficeRepository, ShipperRepository};
use crate::domain::dispatch::{CounterKind, OfficeType, PostOffice, Shipper};
use crate::domain::shared::{GeoPoint, PostOfficeId, Region, ShipperId};
use crate::error::AppError;

/// In-memory implementation of [`PostOfficeRepository`].
#[derive(Default)]
pub struct InMemoryPostOfficeRepository {
    offices: RwLock<HashMap<PostOfficeId, PostOffice>>,
}

impl InMemoryPostOfficeRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with offices.
    #[must_use]
    pub fn with_offices(offices: Vec<PostOffice>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.offices.write();
            for office in offices {
                map.insert(office.id.clone(), office);
            }
        }
        repo
    }

    /// Add one office.
    pub fn seed(&self, office: PostOffice) {
        self.offices.write().insert(office.id.clone(), office);
    }
}

#[async_trait]
impl PostOfficeRepository for InMemoryPostOfficeRepository {
    async fn find(&self, id: &PostOfficeId) -> Result<Option<PostOffice>, AppError> {
        Ok(self.offices.read().get(id).cloned())
    }

    async fn list_local(&self) -> Result<Vec<PostOffice>, AppError> {
        let mut local: Vec<PostOffice> = self
            .offices
            .read()
            .values()
            .filter(|o| matches!(o.office_type, OfficeType::Local))
            .cloned()
            .collect();
        local.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(local)
    }

    async fn find_hub(&self, region: Region) -> Result<Option<PostOffice>, AppError> {
        Ok(self
            .offices
            .read()
            .values()
            .find(|o| o.is_hub() && o.region == region)
            .cloned())
    }
}

/// In-memory implementation of [`ShipperRepository`].
#[derive(Default)]
pub struct InMemoryShipperRepository {
    shippers: RwLock<HashMap<ShipperId, Shipper>>,
    reset_journal: RwLock<HashSet<(Region, NaiveDate)>>,
    office_regions: RwLock<HashMap<PostOfficeId, Region>>,
}

impl InMemoryShipperRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one shipper. The office is assumed to be in the south unless
    /// [`Self::seed_in_region`] is used.
    pub fn seed(&self, shipper: Shipper) {
        self.office_regions
            .write()
            .entry(shipper.post_office_id.clone())
            .or_insert(Region::South);
        self.shippers.write().insert(shipper.id.clone(), shipper);
    }

    /// Add one shipper whose office belongs to `region`.
    pub fn seed_in_region(&self, shipper: Shipper, region: Region) {
        self.office_regions
            .write()
            .insert(shipper.post_office_id.clone(), region);
        self.shippers.write().insert(shipper.id.clone(), shipper);
    }
}

#[async_trait]
impl ShipperRepository for InMemoryShipperRepository {
    async fn find(&self, id: &ShipperId) -> Result<Option<Shipper>, AppError> {
        Ok(self.shippers.read().get(id).cloned())
    }

    async fn find_by_user(
        &self,
        user_id: &crate::domain::shared::UserId,
    ) -> Result<Option<Shipper>, AppError> {
        Ok(self
            .shippers
            .read()
            .values()
            .find(|s| &s.user_id == user_id)
            .cloned())
    }

    async fn list_by_office(&self, office_id: &PostOfficeId) -> Result<Vec<Shipper>, AppError> {
        let mut roster: Vec<Shipper> = self
            .shippers
            .read()
            .values()
            .filter(|s| &s.post_office_id == office_id)
            .cloned()
            .collect();
        roster.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roster)
    }

    async fn try_acquire_slot(
        &self,
        shipper_id: &ShipperId,
        kind: CounterKind,
    ) -> Result<bool, AppError> {
        let mut shippers = self.shippers.write();
        let Some(shipper) = shippers.get_mut(shipper_id) else {
            return Err(AppError::not_found("shipper", shipper_id));
        };

        if !shipper.has_capacity() {
            return Ok(false);
        }
        match kind {
            CounterKind::Pickup => shipper.current_pickup_count += 1,
            CounterKind::Delivery => shipper.current_delivery_count += 1,
        }
        Ok(true)
    }

    async fn save(&self, shipper: &Shipper) -> Result<(), AppError> {
        self.shippers
            .write()
            .insert(shipper.id.clone(), shipper.clone());
        Ok(())
    }

    async fn update_location(
        &self,
        shipper_id: &ShipperId,
        location: GeoPoint,
    ) -> Result<(), AppError> {
        let mut shippers = self.shippers.write();
        let Some(shipper) = shippers.get_mut(shipper_id) else {
            return Err(AppError::not_found("shipper", shipper_id));
        };
        shipper.location = Some(location);
        shipper.last_heartbeat_at = Some(chrono::Utc::now());
        Ok(())
    }

    async fn begin_counter_reset(
        &self,
        region: Region,
        date: NaiveDate,
    ) -> Result<bool, AppError> {
        Ok(self.reset_journal.write().insert((region, date)))
    }

    async fn reset_counters(&self, region: Region) -> Result<u64, AppError> {
        let regions = self.office_regions.read();
        let mut shippers = self.shippers.write();
        let mut count = 0;
        for shipper in shippers.values_mut() {
            if regions.get(&shipper.post_office_id).copied() == Some(region) {
                shipper.current_pickup_count = 0;
                shipper.current_delivery_count = 0;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn complete_counter_reset(
        &self,
        _region: Region,
        _date: NaiveDate,
    ) -> Result<(), AppError> {
        // The journal entry created by begin already marks the run; a SQL
        // implementation flips its state column here.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::dispatch::{ShipperStatus, VehicleType};
    use crate::domain::shared::UserId;

    fn shipper(id: &str, max: u32) -> Shipper {
        Shipper {
            id: ShipperId::new(id),
            user_id: UserId::new(format!("u-{id}")),
            post_office_id: PostOfficeId::new("po-1"),
            vehicle: VehicleType::Motorbike,
            status: ShipperStatus::Active,
            is_online: true,
            is_available: true,
            location: None,
            current_pickup_count: 0,
            current_delivery_count: 0,
            max_daily_orders: max,
            rating: 4.5,
            total_delivered: 0,
            last_heartbeat_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn acquire_slot_honors_combined_cap() {
        let repo = InMemoryShipperRepository::new();
        repo.seed(shipper("r1", 2));
        let id = ShipperId::new("r1");

        assert!(repo.try_acquire_slot(&id, CounterKind::Pickup).await.unwrap());
        assert!(
            repo.try_acquire_slot(&id, CounterKind::Delivery)
                .await
                .unwrap()
        );
        // 1 + 1 == cap: a third slot must be refused.
        assert!(!repo.try_acquire_slot(&id, CounterKind::Pickup).await.unwrap());
    }

    #[tokio::test]
    async fn acquire_slot_for_unknown_shipper_errors() {
        let repo = InMemoryShipperRepository::new();
        assert!(
            repo.try_acquire_slot(&ShipperId::new("ghost"), CounterKind::Pickup)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn reset_journal_is_idempotent() {
        let repo = InMemoryShipperRepository::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        assert!(repo.begin_counter_reset(Region::South, date).await.unwrap());
        assert!(!repo.begin_counter_reset(Region::South, date).await.unwrap());
        // A different region or date is a fresh entry.
        assert!(repo.begin_counter_reset(Region::North, date).await.unwrap());
    }

    #[tokio::test]
    async fn reset_counters_only_touches_the_region() {
        let repo = InMemoryShipperRepository::new();
        let mut south = shipper("r-south", 10);
        south.current_pickup_count = 5;
        repo.seed_in_region(south, Region::South);

        let mut north = shipper("r-north", 10);
        north.post_office_id = PostOfficeId::new("po-north");
        north.current_pickup_count = 4;
        repo.seed_in_region(north, Region::North);

        let count = repo.reset_counters(Region::South).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            repo.find(&ShipperId::new("r-south"))
                .await
                .unwrap()
                .unwrap()
                .current_pickup_count,
            0
        );
        assert_eq!(
            repo.find(&ShipperId::new("r-north"))
                .await
                .unwrap()
                .unwrap()
                .current_pickup_count,
            4
        );
    }

    #[tokio::test]
    async fn update_location_stamps_heartbeat() {
        let repo = InMemoryShipperRepository::new();
        let mut s = shipper("r1", 10);
        s.last_heartbeat_at = None;
        repo.seed(s);

        repo.update_location(&ShipperId::new("r1"), GeoPoint::new(10.8, 106.6))
            .await
            .unwrap();
        let stored = repo.find(&ShipperId::new("r1")).await.unwrap().unwrap();
        assert!(stored.location.is_some());
        assert!(stored.last_heartbeat_at.is_some());
    }
}
