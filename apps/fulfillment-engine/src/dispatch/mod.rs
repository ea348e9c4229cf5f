//! Shipper dispatch.
//!
//! Plans a shipment's route, then claims an in-house shipper for every
//! pickup and delivery leg. Dispatch is serialized per shipment by a keyed
//! lock; the double-assignment guard is the conditional counter increment
//! in the shipper store.

pub mod daily_reset;
pub mod routing;
pub mod selection;

use std::sync::Arc;

use chrono::Utc;

use crate::application::ports::{
    EventBusPort, PostOfficeRepository, ShipmentRepository, ShipperRepository, publish_or_log,
};
use crate::domain::dispatch::CounterKind;
use crate::domain::order::DomainEvent;
use crate::domain::shared::ShipperId;
use crate::domain::shipment::{
    DispatchState, HistoryEntry, LegKind, Shipment, UnifiedShippingStatus,
};
use crate::error::{AppError, ErrorKind};
use crate::sync::KeyedLocks;

pub use daily_reset::{DailyResetJob, RegionCutover};
pub use routing::{RoutePlan, plan_route, resolve_office};
pub use selection::{MAX_CANDIDATE_ATTEMPTS, rank_candidates, select_and_claim};

/// Outcome of a successful dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Shipper on the pickup leg.
    pub pickup_shipper: ShipperId,
    /// Shipper on the delivery leg.
    pub delivery_shipper: ShipperId,
    /// Number of legs planned.
    pub leg_count: usize,
}

/// Assigns in-house shippers to shipment legs.
pub struct ShipperDispatcher {
    offices: Arc<dyn PostOfficeRepository>,
    shippers: Arc<dyn ShipperRepository>,
    shipments: Arc<dyn ShipmentRepository>,
    bus: Arc<dyn EventBusPort>,
    locks: KeyedLocks,
}

impl ShipperDispatcher {
    /// Wire the dispatcher.
    #[must_use]
    pub fn new(
        offices: Arc<dyn PostOfficeRepository>,
        shippers: Arc<dyn ShipperRepository>,
        shipments: Arc<dyn ShipmentRepository>,
        bus: Arc<dyn EventBusPort>,
    ) -> Self {
        Self {
            offices,
            shippers,
            shipments,
            bus,
            locks: KeyedLocks::new(),
        }
    }

    /// Dispatch one shipment: plan the route, claim a shipper per shipper
    /// leg, persist, and publish. On failure the shipment is marked
    /// `no_shipper_available` and `ShipmentUnassigned` is published; an
    /// admin retry goes through this same entry point.
    ///
    /// # Errors
    ///
    /// `AlreadyAssigned` when the shipment is already dispatched,
    /// `NoShipperAvailable` / `ConflictError` from selection.
    pub async fn dispatch(&self, shipment: &mut Shipment) -> Result<DispatchOutcome, AppError> {
        let lock = self.locks.lock_for(shipment.id.as_str());
        let _guard = lock.lock().await;

        if matches!(shipment.dispatch_state, DispatchState::Assigned) {
            return Err(AppError::new(
                ErrorKind::AlreadyAssigned,
                format!("shipment {} is already assigned", shipment.id),
            ));
        }

        let plan = plan_route(
            &*self.offices,
            &shipment.pickup_address,
            &shipment.delivery_address,
        )
        .await?;
        shipment.legs = plan.legs;

        match self.claim_legs(shipment, &plan.pickup_office.id, &plan.delivery_office.id).await {
            Ok(outcome) => {
                shipment.dispatch_state = DispatchState::Assigned;
                let now = Utc::now();
                shipment.record_status(
                    HistoryEntry::new(UnifiedShippingStatus::Assigned, "assigned", now)
                        .with_message(format!("shipper {}", outcome.pickup_shipper)),
                );
                self.shipments.save(shipment).await?;

                publish_or_log(
                    &*self.bus,
                    &DomainEvent::ShipmentAssigned {
                        shipment_id: shipment.id.clone(),
                        tracking_number: shipment.tracking_number.clone(),
                        shipper_id: outcome.pickup_shipper.clone(),
                        at: now,
                    },
                )
                .await;
                Ok(outcome)
            }
            Err(err) => {
                shipment.dispatch_state = DispatchState::NoShipperAvailable;
                shipment.retry_count += 1;
                self.shipments.save(shipment).await?;

                publish_or_log(
                    &*self.bus,
                    &DomainEvent::ShipmentUnassigned {
                        shipment_id: shipment.id.clone(),
                        reason: err.to_string(),
                        at: Utc::now(),
                    },
                )
                .await;
                Err(err)
            }
        }
    }

    /// Claim shippers for the pickup and delivery legs. Linehaul legs ride
    /// scheduled trucks and take no shipper.
    async fn claim_legs(
        &self,
        shipment: &mut Shipment,
        pickup_office: &crate::domain::shared::PostOfficeId,
        delivery_office: &crate::domain::shared::PostOfficeId,
    ) -> Result<DispatchOutcome, AppError> {
        let pickup_shipper =
            select_and_claim(&*self.shippers, pickup_office, CounterKind::Pickup).await?;
        let delivery_shipper = if delivery_office == pickup_office {
            // Same office: one shipper works both ends when it has room.
            if self
                .shippers
                .try_acquire_slot(&pickup_shipper.id, CounterKind::Delivery)
                .await?
            {
                pickup_shipper.clone()
            } else {
                select_and_claim(&*self.shippers, delivery_office, CounterKind::Delivery).await?
            }
        } else {
            select_and_claim(&*self.shippers, delivery_office, CounterKind::Delivery).await?
        };

        for leg in &mut shipment.legs {
            match leg.kind {
                LegKind::Pickup => leg.shipper_id = Some(pickup_shipper.id.clone()),
                LegKind::Delivery => leg.shipper_id = Some(delivery_shipper.id.clone()),
                LegKind::Linehaul => {}
            }
        }

        Ok(DispatchOutcome {
            pickup_shipper: pickup_shipper.id,
            delivery_shipper: delivery_shipper.id,
            leg_count: shipment.legs.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::dispatch::{
        OfficeType, PostOffice, Shipper, ShipperStatus, VehicleType,
    };
    use crate::domain::shared::{
        Address, Contact, GeoPoint, Money, PostOfficeId, Region, ShopId, SubOrderId,
        TrackingNumber, UserId,
    };
    use crate::domain::shipment::PackageInfo;
    use crate::infrastructure::bus::InMemoryEventBus;
    use crate::infrastructure::persistence::{
        InMemoryPostOfficeRepository, InMemoryShipmentRepository, InMemoryShipperRepository,
    };
    use crate::providers::ProviderCode;

    fn office(id: &str, region: Region, city: &str) -> PostOffice {
        PostOffice {
            id: PostOfficeId::new(id),
            code: id.to_uppercase(),
            office_type: OfficeType::Local,
            city: city.to_string(),
            district: "Trung tâm".to_string(),
            region,
            location: GeoPoint::new(10.8, 106.6),
            parent_id: None,
        }
    }

    fn shipper(id: &str, office: &str) -> Shipper {
        Shipper {
            id: crate::domain::shared::ShipperId::new(id),
            user_id: UserId::new(format!("u-{id}")),
            post_office_id: PostOfficeId::new(office),
            vehicle: VehicleType::Motorbike,
            status: ShipperStatus::Active,
            is_online: true,
            is_available: true,
            location: None,
            current_pickup_count: 0,
            current_delivery_count: 0,
            max_daily_orders: 10,
            rating: 4.5,
            total_delivered: 0,
            last_heartbeat_at: Some(Utc::now()),
        }
    }

    fn address(city: &str, region: Region) -> Address {
        Address {
            line: "1 Đường Số 1".to_string(),
            ward: None,
            district: "Trung tâm".to_string(),
            city: city.to_string(),
            region: Some(region),
            location: None,
        }
    }

    fn shipment() -> Shipment {
        Shipment::new(
            SubOrderId::new("sub-1"),
            ShopId::new("shop-x"),
            TrackingNumber::new("CHM-TEST-1"),
            ProviderCode::InHouse,
            address("Hồ Chí Minh", Region::South),
            Contact {
                name: "Shop".to_string(),
                phone: "0900000000".to_string(),
            },
            address("Hồ Chí Minh", Region::South),
            Contact {
                name: "Khách".to_string(),
                phone: "0911111111".to_string(),
            },
            PackageInfo {
                weight_grams: 500,
                declared_value: Money::from_vnd(350_000),
                description: None,
            },
            Money::from_vnd(350_000),
            Utc::now(),
        )
    }

    struct Fixture {
        dispatcher: ShipperDispatcher,
        shippers: Arc<InMemoryShipperRepository>,
        bus: Arc<InMemoryEventBus>,
    }

    fn fixture(shippers_seed: Vec<Shipper>) -> Fixture {
        let offices = Arc::new(InMemoryPostOfficeRepository::with_offices(vec![office(
            "po-1",
            Region::South,
            "Hồ Chí Minh",
        )]));
        let shippers = Arc::new(InMemoryShipperRepository::new());
        for s in shippers_seed {
            shippers.seed(s);
        }
        let shipments = Arc::new(InMemoryShipmentRepository::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let dispatcher = ShipperDispatcher::new(
            offices,
            Arc::clone(&shippers) as Arc<dyn ShipperRepository>,
            shipments,
            Arc::clone(&bus) as Arc<dyn EventBusPort>,
        );
        Fixture {
            dispatcher,
            shippers,
            bus,
        }
    }

    #[tokio::test]
    async fn same_region_shipment_uses_one_shipper_for_both_legs() {
        let f = fixture(vec![shipper("r1", "po-1")]);
        let mut s = shipment();

        let outcome = f.dispatcher.dispatch(&mut s).await.unwrap();
        assert_eq!(outcome.pickup_shipper, outcome.delivery_shipper);
        assert_eq!(s.dispatch_state, DispatchState::Assigned);
        assert_eq!(s.status, UnifiedShippingStatus::Assigned);

        let stored = f
            .shippers
            .find(&crate::domain::shared::ShipperId::new("r1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_pickup_count, 1);
        assert_eq!(stored.current_delivery_count, 1);

        let events = f.bus.published();
        assert!(events.iter().any(|e| e.name == "shipment.assigned"));
    }

    #[tokio::test]
    async fn no_shipper_marks_shipment_and_publishes_unassigned() {
        let f = fixture(vec![]);
        let mut s = shipment();

        let err = f.dispatcher.dispatch(&mut s).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoShipperAvailable);
        assert_eq!(s.dispatch_state, DispatchState::NoShipperAvailable);
        assert_eq!(s.retry_count, 1);

        let events = f.bus.published();
        assert!(events.iter().any(|e| e.name == "shipment.unassigned"));
    }

    #[tokio::test]
    async fn double_dispatch_is_rejected() {
        let f = fixture(vec![shipper("r1", "po-1")]);
        let mut s = shipment();

        f.dispatcher.dispatch(&mut s).await.unwrap();
        let err = f.dispatcher.dispatch(&mut s).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyAssigned);
    }

    #[tokio::test]
    async fn admin_retry_after_failure_succeeds_once_fleet_returns() {
        let f = fixture(vec![]);
        let mut s = shipment();
        assert!(f.dispatcher.dispatch(&mut s).await.is_err());

        f.shippers.seed(shipper("r1", "po-1"));
        let outcome = f.dispatcher.dispatch(&mut s).await.unwrap();
        assert_eq!(outcome.leg_count, 2);
        assert_eq!(s.dispatch_state, DispatchState::Assigned);
    }
}
