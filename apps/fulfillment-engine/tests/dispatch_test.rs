//! Dispatcher behavior over the full engine: capacity preference,
//! concurrent single-assignment, unassigned fallback.

mod common;

use std::sync::Arc;

use chrono::Utc;

use common::{TestWorld, hcm_address};
use fulfillment_engine::application::ports::ShipperRepository;
use fulfillment_engine::domain::dispatch::{Shipper, ShipperStatus, VehicleType};
use fulfillment_engine::domain::shared::{
    Contact, Money, PostOfficeId, ShipperId, ShopId, SubOrderId, TrackingNumber, UserId,
};
use fulfillment_engine::domain::shipment::{DispatchState, PackageInfo, Shipment};
use fulfillment_engine::providers::ProviderCode;

fn shipper(id: &str, office: &str, pickup_count: u32, rating: f64) -> Shipper {
    Shipper {
        id: ShipperId::new(id),
        user_id: UserId::new(format!("u-{id}")),
        post_office_id: PostOfficeId::new(office),
        vehicle: VehicleType::Motorbike,
        status: ShipperStatus::Active,
        is_online: true,
        is_available: true,
        location: None,
        current_pickup_count: pickup_count,
        current_delivery_count: 0,
        max_daily_orders: 20,
        rating,
        total_delivered: 0,
        last_heartbeat_at: Some(Utc::now()),
    }
}

fn in_house_shipment(suffix: &str) -> Shipment {
    let contact = Contact {
        name: "A".to_string(),
        phone: "0900000000".to_string(),
    };
    Shipment::new(
        SubOrderId::new(format!("sub-{suffix}")),
        ShopId::new("shop-x"),
        TrackingNumber::new(format!("CHM-{suffix}")),
        ProviderCode::InHouse,
        hcm_address(),
        contact.clone(),
        hcm_address(),
        contact,
        PackageInfo {
            weight_grams: 400,
            declared_value: Money::from_vnd(100_000),
            description: None,
        },
        Money::ZERO,
        Utc::now(),
    )
}

#[tokio::test]
async fn dispatcher_prefers_lower_counter_over_rating() {
    let world = TestWorld::new(None);
    world.seed_hcm_office("po-1");
    // R1: 9 pickups today, rating 4.8. R2: 3 pickups, rating 4.5.
    world.shippers.seed(shipper("r1", "po-1", 9, 4.8));
    world.shippers.seed(shipper("r2", "po-1", 3, 4.5));

    let mut shipment = in_house_shipment("a");
    world.dispatcher.dispatch(&mut shipment).await.unwrap();

    let pickup_leg = shipment
        .legs
        .iter()
        .find(|leg| matches!(leg.kind, fulfillment_engine::domain::shipment::LegKind::Pickup))
        .unwrap();
    assert_eq!(pickup_leg.shipper_id.as_ref().unwrap().as_str(), "r2");

    let r2 = world
        .shippers
        .find(&ShipperId::new("r2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(r2.current_pickup_count, 4);
}

#[tokio::test]
async fn concurrent_dispatches_each_take_one_slot() {
    let world = Arc::new(TestWorld::new(None));
    world.seed_hcm_office("po-1");
    world.shippers.seed(shipper("r1", "po-1", 9, 4.8));
    world.shippers.seed(shipper("r2", "po-1", 3, 4.5));

    let mut a = in_house_shipment("a");
    let mut b = in_house_shipment("b");
    let (ra, rb) = tokio::join!(
        world.dispatcher.dispatch(&mut a),
        world.dispatcher.dispatch(&mut b),
    );
    ra.unwrap();
    rb.unwrap();

    // Both preferred R2; the atomic increment made the slots distinct.
    let r2 = world
        .shippers
        .find(&ShipperId::new("r2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(r2.current_pickup_count, 5);

    // Never the same slot twice for one shipment's pickup leg.
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn saturated_fleet_yields_no_shipper_available() {
    let world = TestWorld::new(None);
    world.seed_hcm_office("po-1");
    let mut full = shipper("r1", "po-1", 0, 4.8);
    full.current_pickup_count = 10;
    full.current_delivery_count = 10;
    world.shippers.seed(full);

    let mut shipment = in_house_shipment("a");
    let err = world.dispatcher.dispatch(&mut shipment).await.unwrap_err();
    assert_eq!(
        err.kind(),
        fulfillment_engine::error::ErrorKind::NoShipperAvailable
    );
    assert_eq!(shipment.dispatch_state, DispatchState::NoShipperAvailable);

    let events = world.bus.published();
    assert!(events.iter().any(|e| e.name == "shipment.unassigned"));
}

#[tokio::test]
async fn offline_shippers_are_never_candidates() {
    let world = TestWorld::new(None);
    world.seed_hcm_office("po-1");
    let mut offline = shipper("r1", "po-1", 0, 5.0);
    offline.is_online = false;
    world.shippers.seed(offline);
    let mut unavailable = shipper("r2", "po-1", 0, 5.0);
    unavailable.is_available = false;
    world.shippers.seed(unavailable);
    world.shippers.seed(shipper("r3", "po-1", 5, 4.0));

    let mut shipment = in_house_shipment("a");
    world.dispatcher.dispatch(&mut shipment).await.unwrap();

    for leg in shipment.legs.iter().filter(|l| l.requires_shipper()) {
        assert_eq!(leg.shipper_id.as_ref().unwrap().as_str(), "r3");
    }
}
