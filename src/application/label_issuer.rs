use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::domain::courier::CourierRegistry;
use crate::domain::errors::DomainError;
use crate::domain::label::{tracking_number, LabelStatus, ShippingAddress, ShippingLabel};
use crate::domain::ports::{Clock, InsertLabelError, RandomSource, ShippingRepository};
use crate::domain::rates::{
    check_cod_ceiling, quote_envelope, requested_cod, validate_package, ShippingRate,
};

const SUFFIX_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct IssueLabelRequest {
    pub order_id: Uuid,
    pub rate: ShippingRate,
    pub from_address: ShippingAddress,
    pub to_address: ShippingAddress,
    pub weight_kg: f64,
    pub cod_amount: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IssuerSettings {
    /// Labels are published at `{label_base_url}/{tracking_number}.pdf`.
    pub label_base_url: String,
    /// Tracking-number collisions tolerated before giving up.
    pub max_attempts: u32,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            label_base_url: "https://labels.local/shipping-labels".to_string(),
            max_attempts: 3,
        }
    }
}

pub struct LabelIssuer {
    registry: Arc<CourierRegistry>,
    repo: Arc<dyn ShippingRepository>,
    rng: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    settings: IssuerSettings,
}

impl LabelIssuer {
    pub fn new(
        registry: Arc<CourierRegistry>,
        repo: Arc<dyn ShippingRepository>,
        rng: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
        settings: IssuerSettings,
    ) -> Self {
        Self {
            registry,
            repo,
            rng,
            clock,
            settings,
        }
    }

    /// Mint a tracking number and persist the label for `req.order_id`.
    ///
    /// The rate arrives from the client, so the courier, service, weight and
    /// COD limits are checked again against the registry, and the quoted cost
    /// and delivery estimate must fall inside what that partner could have
    /// quoted for the parcel at any distance.
    pub fn issue(&self, req: IssueLabelRequest) -> Result<ShippingLabel, DomainError> {
        let partner = self.registry.get_partner(&req.rate.courier_id)?;
        let service = req.rate.service_type;
        if !partner.offers(service) {
            return Err(DomainError::not_found(format!(
                "Service '{}' for courier '{}'",
                service, partner.id
            )));
        }
        validate_package(req.weight_kg, req.cod_amount)?;
        if req.weight_kg > partner.weight_limit_kg {
            return Err(DomainError::InvalidPackage(format!(
                "{} accepts parcels up to {} kg",
                partner.name, partner.weight_limit_kg
            )));
        }
        let cod_amount = requested_cod(req.cod_amount);
        check_cod_ceiling(&self.registry, cod_amount)?;
        if let Some(amount) = cod_amount {
            if !partner.accepts_cod(service, amount) {
                return Err(DomainError::InvalidPackage(format!(
                    "{} {} collects at most {} on delivery",
                    partner.name, service, partner.cod_limit
                )));
            }
        }

        let (cheapest, dearest) = quote_envelope(partner, service, req.weight_kg, cod_amount);
        if !(cheapest.cost..=dearest.cost).contains(&req.rate.cost) {
            return Err(DomainError::InvalidPackage(format!(
                "quoted cost {} is outside {}..={} for {} {}",
                req.rate.cost, cheapest.cost, dearest.cost, partner.name, service
            )));
        }
        if !(cheapest.estimated_delivery_days..=dearest.estimated_delivery_days)
            .contains(&req.rate.estimated_delivery_days)
        {
            return Err(DomainError::InvalidPackage(format!(
                "quoted delivery estimate of {} days is not offered by {} {}",
                req.rate.estimated_delivery_days, partner.name, service
            )));
        }
        req.from_address.validate()?;
        req.to_address.validate()?;

        let base_url = self.settings.label_base_url.trim_end_matches('/');
        for attempt in 1..=self.settings.max_attempts.max(1) {
            let now = self.clock.now();
            let tracking = tracking_number(
                &partner.tracking_prefix,
                now,
                &self.rng.alphanumeric(SUFFIX_LEN),
            );
            let label = ShippingLabel {
                id: Uuid::new_v4(),
                order_id: req.order_id,
                label_url: format!("{base_url}/{tracking}.pdf"),
                tracking_number: tracking,
                courier_id: partner.id.clone(),
                courier_name: partner.name.clone(),
                service_type: service,
                from_address: req.from_address.clone(),
                to_address: req.to_address.clone(),
                package_weight_kg: req.weight_kg,
                shipping_cost: req.rate.cost,
                cod_amount,
                status: LabelStatus::Created,
                estimated_delivery_days: req.rate.estimated_delivery_days,
                created_at: now,
                status_updated_at: now,
            };

            match self.repo.insert_label(&label) {
                Ok(saved) => {
                    info!(
                        "Issued label {} for order {} via {} {}",
                        saved.tracking_number, saved.order_id, saved.courier_id, saved.service_type
                    );
                    return Ok(saved);
                }
                Err(InsertLabelError::TrackingNumberTaken) => {
                    warn!(
                        "Tracking number {} collided for order {} (attempt {})",
                        label.tracking_number, req.order_id, attempt
                    );
                }
                Err(InsertLabelError::OrderAlreadyLabelled) => {
                    return Err(DomainError::DuplicateLabel(req.order_id));
                }
                Err(InsertLabelError::Domain(e)) => return Err(e),
            }
        }

        Err(DomainError::Issuance(format!(
            "tracking number collided {} times for order {}",
            self.settings.max_attempts.max(1),
            req.order_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::domain::courier::ServiceType;
    use crate::domain::label::OrderShippingStatus;
    use crate::infrastructure::memory_repo::InMemoryShippingRepository;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Hands out the queued suffixes in order, then repeats the last one.
    struct ScriptedSuffixes(Mutex<Vec<&'static str>>);

    impl RandomSource for ScriptedSuffixes {
        fn unit(&self) -> f64 {
            0.5
        }

        fn alphanumeric(&self, _len: usize) -> String {
            let mut queue = self.0.lock().expect("lock");
            if queue.len() > 1 {
                queue.remove(0).to_string()
            } else {
                queue.first().copied().unwrap_or("ZZZZ").to_string()
            }
        }
    }

    fn address(pincode: &str) -> ShippingAddress {
        ShippingAddress {
            name: "Ravi".to_string(),
            phone: "9123456780".to_string(),
            address_line1: "4 Park Street".to_string(),
            address_line2: Some("Flat 2".to_string()),
            city: "Kolkata".to_string(),
            state: "WB".to_string(),
            pincode: pincode.to_string(),
        }
    }

    /// The cheapest option the partner could have quoted for a 2 kg parcel.
    fn rate_with_cod(courier: &str, service: ServiceType, cod: Option<f64>) -> ShippingRate {
        let registry = CourierRegistry::builtin();
        let mut rate = match registry.get_partner(courier) {
            Ok(partner) => quote_envelope(partner, service, 2.0, cod).0,
            Err(_) => ShippingRate {
                courier_id: courier.to_string(),
                courier_name: String::new(),
                service_type: service,
                estimated_delivery_days: 4,
                cost: 72,
                cod_available: false,
                tracking_available: true,
            },
        };
        rate.courier_name = "whatever the client said".to_string();
        rate
    }

    fn rate(courier: &str, service: ServiceType) -> ShippingRate {
        rate_with_cod(courier, service, None)
    }

    fn request(order_id: Uuid, rate: ShippingRate) -> IssueLabelRequest {
        IssueLabelRequest {
            order_id,
            rate,
            from_address: address("700016"),
            to_address: address("110001"),
            weight_kg: 2.0,
            cod_amount: None,
        }
    }

    fn issuer(
        repo: Arc<InMemoryShippingRepository>,
        suffixes: Vec<&'static str>,
    ) -> LabelIssuer {
        LabelIssuer::new(
            Arc::new(CourierRegistry::builtin()),
            repo,
            Arc::new(ScriptedSuffixes(Mutex::new(suffixes))),
            Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).single().expect("valid"),
            )),
            IssuerSettings::default(),
        )
    }

    #[test]
    fn issues_label_and_stamps_order() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());

        let label = issuer(repo.clone(), vec!["ab12"])
            .issue(request(order_id, rate("bluedart", ServiceType::Standard)))
            .expect("issued");

        assert_eq!(label.status, LabelStatus::Created);
        assert_eq!(label.courier_name, "Blue Dart");
        assert!(label.tracking_number.starts_with("BLU"));
        assert!(label.tracking_number.ends_with("AB12"));
        assert_eq!(
            label.label_url,
            format!("https://labels.local/shipping-labels/{}.pdf", label.tracking_number)
        );

        let shipment = repo
            .find_order_shipment(order_id)
            .expect("query ok")
            .expect("order exists");
        assert_eq!(shipment.tracking_number.as_deref(), Some(label.tracking_number.as_str()));
        assert_eq!(shipment.shipping_status, Some(OrderShippingStatus::LabelCreated));
        assert_eq!(shipment.shipping_cost, Some(72));
    }

    #[test]
    fn unknown_courier_is_not_found() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let err = issuer(repo, vec!["AAAA"])
            .issue(request(order_id, rate("pigeon", ServiceType::Express)))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn service_not_offered_by_courier_is_not_found() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let err = issuer(repo, vec!["AAAA"])
            .issue(request(order_id, rate("bluedart", ServiceType::Cod)))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn overweight_parcel_is_rejected() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let mut req = request(order_id, rate("shadowfax", ServiceType::Express));
        req.weight_kg = 6.0;
        let err = issuer(repo, vec!["AAAA"]).issue(req).unwrap_err();
        assert!(matches!(err, DomainError::InvalidPackage(_)));
    }

    #[test]
    fn cod_beyond_partner_limit_is_rejected_on_regular_service() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let issuer = issuer(repo.clone(), vec!["AAAA"]);

        let quoted = rate_with_cod("dtdc", ServiceType::Standard, Some(25_000.0));
        let mut req = request(order_id, quoted);
        req.cod_amount = Some(25_000.0);
        assert!(matches!(issuer.issue(req), Err(DomainError::InvalidPackage(_))));

        let mut req = request(order_id, rate("bluedart", ServiceType::Express));
        req.cod_amount = Some(1_000_000.0);
        assert!(matches!(issuer.issue(req), Err(DomainError::InvalidPackage(_))));

        assert_eq!(repo.label_count(), 0);
    }

    #[test]
    fn cod_service_collects_beyond_partner_limit() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let quoted = rate_with_cod("dtdc", ServiceType::Cod, Some(25_000.0));
        let mut req = request(order_id, quoted);
        req.cod_amount = Some(25_000.0);

        let label = issuer(repo, vec!["AAAA"]).issue(req).expect("issued");
        assert_eq!(label.cod_amount, Some(25_000.0));
        assert_eq!(label.service_type, ServiceType::Cod);
    }

    #[test]
    fn zero_cod_is_stored_as_no_cod() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let mut req = request(order_id, rate("bluedart", ServiceType::Standard));
        req.cod_amount = Some(0.0);

        let label = issuer(repo, vec!["AAAA"]).issue(req).expect("issued");
        assert_eq!(label.cod_amount, None);
    }

    #[test]
    fn rate_outside_partner_pricing_is_rejected() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let issuer = issuer(repo.clone(), vec!["AAAA"]);

        let mut cheap = rate("bluedart", ServiceType::Standard);
        cheap.cost = 1;
        assert!(matches!(
            issuer.issue(request(order_id, cheap)),
            Err(DomainError::InvalidPackage(_))
        ));

        let mut slow = rate("bluedart", ServiceType::Standard);
        slow.estimated_delivery_days = 30;
        assert!(matches!(
            issuer.issue(request(order_id, slow)),
            Err(DomainError::InvalidPackage(_))
        ));

        assert_eq!(repo.label_count(), 0);
    }

    #[test]
    fn malformed_address_pincode_is_rejected() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let mut req = request(order_id, rate("dtdc", ServiceType::Standard));
        req.to_address.pincode = "01234".to_string();
        let err = issuer(repo, vec!["AAAA"]).issue(req).unwrap_err();
        assert!(matches!(err, DomainError::InvalidAddress(_)));
    }

    #[test]
    fn unknown_order_is_not_found() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let err = issuer(repo, vec!["AAAA"])
            .issue(request(Uuid::new_v4(), rate("dtdc", ServiceType::Standard)))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn second_label_for_same_order_is_duplicate() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let issuer = issuer(repo.clone(), vec!["AAAA", "BBBB"]);

        issuer
            .issue(request(order_id, rate("dtdc", ServiceType::Standard)))
            .expect("first succeeds");
        let err = issuer
            .issue(request(order_id, rate("delhivery", ServiceType::Express)))
            .unwrap_err();

        assert!(matches!(err, DomainError::DuplicateLabel(id) if id == order_id));
        let label = repo
            .find_by_order_id(order_id)
            .expect("query ok")
            .expect("label kept");
        assert_eq!(label.courier_id, "dtdc");
    }

    #[test]
    fn collision_regenerates_tracking_number() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        repo.add_order(first, Uuid::new_v4());
        repo.add_order(second, Uuid::new_v4());
        // Same clock and suffix twice, then a fresh suffix.
        let issuer = issuer(repo, vec!["AAAA", "AAAA", "CCCC"]);

        let a = issuer
            .issue(request(first, rate("dtdc", ServiceType::Standard)))
            .expect("first");
        let b = issuer
            .issue(request(second, rate("dtdc", ServiceType::Standard)))
            .expect("second retried");

        assert_ne!(a.tracking_number, b.tracking_number);
        assert!(b.tracking_number.ends_with("CCCC"));
    }

    #[test]
    fn exhausted_collisions_are_issuance_errors() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        repo.add_order(first, Uuid::new_v4());
        repo.add_order(second, Uuid::new_v4());
        let issuer = issuer(repo, vec!["AAAA"]);

        issuer
            .issue(request(first, rate("dtdc", ServiceType::Standard)))
            .expect("first");
        let err = issuer
            .issue(request(second, rate("dtdc", ServiceType::Standard)))
            .unwrap_err();
        assert!(matches!(err, DomainError::Issuance(_)));
    }

    #[test]
    fn concurrent_issuance_yields_one_label() {
        let repo = Arc::new(InMemoryShippingRepository::new());
        let order_id = Uuid::new_v4();
        repo.add_order(order_id, Uuid::new_v4());
        let issuer = Arc::new(issuer(repo.clone(), vec!["AAAA", "BBBB", "CCCC", "DDDD"]));

        let handles: Vec<_> = ["dtdc", "delhivery"]
            .into_iter()
            .map(|courier| {
                let issuer = issuer.clone();
                let service = if courier == "dtdc" {
                    ServiceType::Standard
                } else {
                    ServiceType::Express
                };
                thread::spawn(move || issuer.issue(request(order_id, rate(courier, service))))
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread finished"))
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(DomainError::DuplicateLabel(_))))
                .count(),
            1
        );
        assert_eq!(repo.label_count(), 1);
    }
}
