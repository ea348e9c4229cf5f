//! Route planning: office resolution and leg construction.

use crate::application::ports::PostOfficeRepository;
use crate::domain::dispatch::PostOffice;
use crate::domain::shared::Address;
use crate::domain::shipment::ShipmentLeg;
use crate::error::{AppError, ErrorKind};

/// A planned route for one shipment.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    /// Office serving the pickup leg.
    pub pickup_office: PostOffice,
    /// Office serving the delivery leg.
    pub delivery_office: PostOffice,
    /// The legs, in travel order.
    pub legs: Vec<ShipmentLeg>,
}

/// Resolve the local office serving an address: offices in the same
/// region first, nearest by great-circle distance; without a coordinate,
/// same city beats same region beats anything.
pub fn resolve_office(offices: &[PostOffice], address: &Address) -> Option<PostOffice> {
    let candidates: Vec<&PostOffice> = match address.region {
        Some(region) => {
            let same_region: Vec<&PostOffice> =
                offices.iter().filter(|o| o.region == region).collect();
            if same_region.is_empty() {
                offices.iter().collect()
            } else {
                same_region
            }
        }
        None => offices.iter().collect(),
    };

    if let Some(point) = address.location {
        return candidates
            .into_iter()
            .min_by(|a, b| {
                let da = a.location.distance_km(&point);
                let db = b.location.distance_km(&point);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned();
    }

    candidates
        .iter()
        .find(|o| o.city == address.city && o.district == address.district)
        .or_else(|| candidates.iter().find(|o| o.city == address.city))
        .or_else(|| candidates.first())
        .map(|o| (*o).clone())
}

/// Plan the legs of a shipment.
///
/// Same-region: pickup leg, an office transfer when the two offices
/// differ, delivery leg. Cross-region: the parcel rides through each
/// region's hub — pickup, office → pickup hub, hub → hub, hub → delivery
/// office, delivery.
///
/// # Errors
///
/// `NotFound` when no local office can serve an end, `Internal` when a
/// region is missing its hub.
pub async fn plan_route(
    offices: &dyn PostOfficeRepository,
    pickup: &Address,
    delivery: &Address,
) -> Result<RoutePlan, AppError> {
    let local = offices.list_local().await?;

    let pickup_office = resolve_office(&local, pickup)
        .ok_or_else(|| AppError::new(ErrorKind::NotFound, "no post office serves the pickup"))?;
    let delivery_office = resolve_office(&local, delivery)
        .ok_or_else(|| AppError::new(ErrorKind::NotFound, "no post office serves the delivery"))?;

    let mut legs = vec![ShipmentLeg::pickup(pickup_office.id.clone())];

    if pickup_office.region == delivery_office.region {
        if pickup_office.id != delivery_office.id {
            legs.push(ShipmentLeg::linehaul(
                pickup_office.id.clone(),
                delivery_office.id.clone(),
            ));
        }
    } else {
        let pickup_hub = offices
            .find_hub(pickup_office.region)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!("region {} has no hub", pickup_office.region))
            })?;
        let delivery_hub = offices
            .find_hub(delivery_office.region)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!("region {} has no hub", delivery_office.region))
            })?;

        legs.push(ShipmentLeg::linehaul(
            pickup_office.id.clone(),
            pickup_hub.id.clone(),
        ));
        legs.push(ShipmentLeg::linehaul(pickup_hub.id, delivery_hub.id.clone()));
        legs.push(ShipmentLeg::linehaul(
            delivery_hub.id,
            delivery_office.id.clone(),
        ));
    }

    legs.push(ShipmentLeg::delivery(delivery_office.id.clone()));

    Ok(RoutePlan {
        pickup_office,
        delivery_office,
        legs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dispatch::OfficeType;
    use crate::domain::shared::{GeoPoint, PostOfficeId, Region};
    use crate::domain::shipment::LegKind;
    use crate::infrastructure::persistence::InMemoryPostOfficeRepository;

    fn office(id: &str, region: Region, city: &str, lat: f64, lng: f64) -> PostOffice {
        PostOffice {
            id: PostOfficeId::new(id),
            code: id.to_uppercase(),
            office_type: OfficeType::Local,
            city: city.to_string(),
            district: "Trung tâm".to_string(),
            region,
            location: GeoPoint::new(lat, lng),
            parent_id: None,
        }
    }

    fn hub(id: &str, region: Region, city: &str) -> PostOffice {
        PostOffice {
            id: PostOfficeId::new(id),
            code: id.to_uppercase(),
            office_type: OfficeType::Regional,
            city: city.to_string(),
            district: "Trung tâm".to_string(),
            region,
            location: GeoPoint::new(0.0, 0.0),
            parent_id: None,
        }
    }

    fn address(city: &str, region: Region, point: Option<GeoPoint>) -> Address {
        Address {
            line: "1 Đường Số 1".to_string(),
            ward: None,
            district: "Trung tâm".to_string(),
            city: city.to_string(),
            region: Some(region),
            location: point,
        }
    }

    #[test]
    fn nearest_office_in_same_region_wins() {
        let offices = vec![
            office("po-hcm-1", Region::South, "Hồ Chí Minh", 10.82, 106.63),
            office("po-hcm-2", Region::South, "Hồ Chí Minh", 10.76, 106.70),
            office("po-hn-1", Region::North, "Hà Nội", 21.03, 105.83),
        ];
        let addr = address(
            "Hồ Chí Minh",
            Region::South,
            Some(GeoPoint::new(10.77, 106.69)),
        );
        let resolved = resolve_office(&offices, &addr).unwrap();
        assert_eq!(resolved.id.as_str(), "po-hcm-2");
    }

    #[test]
    fn city_match_without_coordinates() {
        let offices = vec![
            office("po-hcm-1", Region::South, "Hồ Chí Minh", 10.82, 106.63),
            office("po-ct-1", Region::South, "Cần Thơ", 10.03, 105.77),
        ];
        let addr = address("Cần Thơ", Region::South, None);
        let resolved = resolve_office(&offices, &addr).unwrap();
        assert_eq!(resolved.id.as_str(), "po-ct-1");
    }

    #[tokio::test]
    async fn same_region_route_has_two_shipper_legs() {
        let repo = InMemoryPostOfficeRepository::with_offices(vec![
            office("po-1", Region::South, "Hồ Chí Minh", 10.82, 106.63),
            office("po-2", Region::South, "Cần Thơ", 10.03, 105.77),
        ]);
        let plan = plan_route(
            &repo,
            &address("Hồ Chí Minh", Region::South, None),
            &address("Cần Thơ", Region::South, None),
        )
        .await
        .unwrap();

        let kinds: Vec<LegKind> = plan.legs.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LegKind::Pickup, LegKind::Linehaul, LegKind::Delivery]);
        assert_eq!(
            plan.legs.iter().filter(|l| l.requires_shipper()).count(),
            2
        );
    }

    #[tokio::test]
    async fn same_office_route_skips_transfer() {
        let repo = InMemoryPostOfficeRepository::with_offices(vec![office(
            "po-1",
            Region::South,
            "Hồ Chí Minh",
            10.82,
            106.63,
        )]);
        let plan = plan_route(
            &repo,
            &address("Hồ Chí Minh", Region::South, None),
            &address("Hồ Chí Minh", Region::South, None),
        )
        .await
        .unwrap();
        assert_eq!(plan.legs.len(), 2);
    }

    #[tokio::test]
    async fn cross_region_routes_via_both_hubs() {
        let repo = InMemoryPostOfficeRepository::with_offices(vec![
            office("po-hcm", Region::South, "Hồ Chí Minh", 10.82, 106.63),
            office("po-hn", Region::North, "Hà Nội", 21.03, 105.83),
            hub("hub-s", Region::South, "Hồ Chí Minh"),
            hub("hub-n", Region::North, "Hà Nội"),
        ]);
        let plan = plan_route(
            &repo,
            &address("Hồ Chí Minh", Region::South, None),
            &address("Hà Nội", Region::North, None),
        )
        .await
        .unwrap();

        // pickup -> office->hub -> hub->hub -> hub->office -> delivery
        assert_eq!(plan.legs.len(), 5);
        assert_eq!(
            plan.legs.iter().filter(|l| l.requires_shipper()).count(),
            2
        );
        assert_eq!(
            plan.legs
                .iter()
                .filter(|l| matches!(l.kind, LegKind::Linehaul))
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn missing_hub_is_an_internal_error() {
        let repo = InMemoryPostOfficeRepository::with_offices(vec![
            office("po-hcm", Region::South, "Hồ Chí Minh", 10.82, 106.63),
            office("po-hn", Region::North, "Hà Nội", 21.03, 105.83),
        ]);
        let err = plan_route(
            &repo,
            &address("Hồ Chí Minh", Region::South, None),
            &address("Hà Nội", Region::North, None),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
