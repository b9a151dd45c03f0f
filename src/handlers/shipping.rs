use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::label_issuer::IssueLabelRequest;
use crate::application::shipping_service::ShippingService;
use crate::domain::courier::{CourierPartner, ServiceType};
use crate::domain::label::{LabelStatus, OrderShipment, ShippingAddress, ShippingLabel};
use crate::domain::rates::ShippingRate;
use crate::domain::tracking::{TrackingEvent, TrackingInfo};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourierResponse {
    pub id: String,
    pub name: String,
    /// Service levels, e.g. "express", "surface", "cod"
    pub services: Vec<String>,
    pub cod_limit: f64,
    pub weight_limit_kg: f64,
}

impl From<&CourierPartner> for CourierResponse {
    fn from(p: &CourierPartner) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            services: p.services.iter().map(|s| s.as_str().to_string()).collect(),
            cod_limit: p.cod_limit,
            weight_limit_kg: p.weight_limit_kg,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateQuery {
    /// Origin pincode, six digits without a leading zero
    pub from_pincode: String,
    pub to_pincode: String,
    pub weight_kg: f64,
    #[serde(default)]
    pub cod_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateDto {
    pub courier_id: String,
    pub courier_name: String,
    pub service_type: String,
    pub estimated_delivery_days: u32,
    /// Whole rupees
    pub cost: i64,
    pub cod_available: bool,
    pub tracking_available: bool,
}

impl From<ShippingRate> for RateDto {
    fn from(r: ShippingRate) -> Self {
        Self {
            courier_id: r.courier_id,
            courier_name: r.courier_name,
            service_type: r.service_type.as_str().to_string(),
            estimated_delivery_days: r.estimated_delivery_days,
            cost: r.cost,
            cod_available: r.cod_available,
            tracking_available: r.tracking_available,
        }
    }
}

impl TryFrom<RateDto> for ShippingRate {
    type Error = AppError;

    fn try_from(r: RateDto) -> Result<Self, Self::Error> {
        let service_type: ServiceType = r.service_type.parse().map_err(|_| {
            AppError::BadRequest(format!("Unknown service type '{}'", r.service_type))
        })?;
        Ok(Self {
            courier_id: r.courier_id,
            courier_name: r.courier_name,
            service_type,
            estimated_delivery_days: r.estimated_delivery_days,
            cost: r.cost,
            cod_available: r.cod_available,
            tracking_available: r.tracking_available,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RateListResponse {
    pub rates: Vec<RateDto>,
    /// False when no courier can carry the parcel
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl From<AddressDto> for ShippingAddress {
    fn from(a: AddressDto) -> Self {
        Self {
            name: a.name,
            phone: a.phone,
            address_line1: a.address_line1,
            address_line2: a.address_line2,
            city: a.city,
            state: a.state,
            pincode: a.pincode,
        }
    }
}

impl From<ShippingAddress> for AddressDto {
    fn from(a: ShippingAddress) -> Self {
        Self {
            name: a.name,
            phone: a.phone,
            address_line1: a.address_line1,
            address_line2: a.address_line2,
            city: a.city,
            state: a.state,
            pincode: a.pincode,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelRequest {
    pub order_id: Uuid,
    /// One of the options previously returned by `POST /shipping/rates`
    pub rate: RateDto,
    pub from_address: AddressDto,
    pub to_address: AddressDto,
    pub weight_kg: f64,
    #[serde(default)]
    pub cod_amount: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub tracking_number: String,
    pub courier_id: String,
    pub courier_name: String,
    pub service_type: String,
    pub from_address: AddressDto,
    pub to_address: AddressDto,
    pub package_weight_kg: f64,
    pub shipping_cost: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cod_amount: Option<f64>,
    pub label_url: String,
    pub status: String,
    pub estimated_delivery: String,
    pub created_at: String,
}

impl From<ShippingLabel> for LabelResponse {
    fn from(l: ShippingLabel) -> Self {
        Self {
            estimated_delivery: l.estimated_delivery().to_rfc3339(),
            id: l.id,
            order_id: l.order_id,
            tracking_number: l.tracking_number,
            courier_id: l.courier_id,
            courier_name: l.courier_name,
            service_type: l.service_type.as_str().to_string(),
            from_address: l.from_address.into(),
            to_address: l.to_address.into(),
            package_weight_kg: l.package_weight_kg,
            shipping_cost: l.shipping_cost,
            cod_amount: l.cod_amount,
            label_url: l.label_url,
            status: l.status.as_str().to_string(),
            created_at: l.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingEventResponse {
    pub timestamp: String,
    /// label_created, picked_up, in_transit, out_for_delivery, delivered or returned
    pub status: String,
    pub location: String,
    pub description: String,
}

impl From<TrackingEvent> for TrackingEventResponse {
    fn from(e: TrackingEvent) -> Self {
        Self {
            timestamp: e.timestamp.to_rfc3339(),
            status: e.status.as_str().to_string(),
            location: e.location,
            description: e.description,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResponse {
    pub tracking_number: String,
    pub courier_name: String,
    pub current_status: String,
    pub estimated_delivery: String,
    pub events: Vec<TrackingEventResponse>,
}

impl From<TrackingInfo> for TrackingResponse {
    fn from(t: TrackingInfo) -> Self {
        Self {
            tracking_number: t.tracking_number,
            courier_name: t.courier_name,
            current_status: t.current_status.as_str().to_string(),
            estimated_delivery: t.estimated_delivery.to_rfc3339(),
            events: t.events.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// created, picked_up, in_transit, delivered or returned
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderShipmentResponse {
    pub order_id: Uuid,
    pub seller_id: Uuid,
    pub tracking_number: Option<String>,
    pub shipping_status: Option<String>,
    pub shipping_cost: Option<i64>,
}

impl From<OrderShipment> for OrderShipmentResponse {
    fn from(o: OrderShipment) -> Self {
        Self {
            order_id: o.order_id,
            seller_id: o.seller_id,
            tracking_number: o.tracking_number,
            shipping_status: o.shipping_status.map(|s| s.as_str().to_string()),
            shipping_cost: o.shipping_cost,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /couriers
#[utoipa::path(
    get,
    path = "/couriers",
    responses(
        (status = 200, description = "Courier catalog", body = [CourierResponse]),
    ),
    tag = "couriers"
)]
pub async fn list_couriers(svc: web::Data<ShippingService>) -> HttpResponse {
    let couriers: Vec<CourierResponse> = svc.list_partners().iter().map(Into::into).collect();
    HttpResponse::Ok().json(couriers)
}

/// GET /couriers/{id}
#[utoipa::path(
    get,
    path = "/couriers/{id}",
    params(("id" = String, Path, description = "Courier slug, e.g. bluedart")),
    responses(
        (status = 200, description = "Courier found", body = CourierResponse),
        (status = 404, description = "Unknown courier"),
    ),
    tag = "couriers"
)]
pub async fn get_courier(
    svc: web::Data<ShippingService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let partner = svc.get_partner(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(CourierResponse::from(partner)))
}

/// POST /shipping/rates
///
/// Quotes every courier/service able to carry the parcel, cheapest first.
/// An empty list is a valid answer and comes back with `available = false`.
#[utoipa::path(
    post,
    path = "/shipping/rates",
    request_body = RateQuery,
    responses(
        (status = 200, description = "Ranked shipping options", body = RateListResponse),
        (status = 400, description = "Malformed pincode or package"),
    ),
    tag = "shipping"
)]
pub async fn get_rates(
    svc: web::Data<ShippingService>,
    body: web::Json<RateQuery>,
) -> Result<HttpResponse, AppError> {
    let q = body.into_inner();
    let rates = svc.get_rates(&q.from_pincode, &q.to_pincode, q.weight_kg, q.cod_amount)?;
    let rates: Vec<RateDto> = rates.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(RateListResponse {
        available: !rates.is_empty(),
        rates,
    }))
}

/// POST /shipping/labels
///
/// Issues the label for an order and stamps the order's shipment fields in
/// the same transaction. A second request for the same order gets 409.
#[utoipa::path(
    post,
    path = "/shipping/labels",
    request_body = CreateLabelRequest,
    responses(
        (status = 201, description = "Label issued", body = LabelResponse),
        (status = 400, description = "Invalid address, package or rate"),
        (status = 404, description = "Unknown order or courier"),
        (status = 409, description = "Order already has a label"),
        (status = 503, description = "Tracking number could not be issued"),
    ),
    tag = "shipping"
)]
pub async fn create_label(
    svc: web::Data<ShippingService>,
    body: web::Json<CreateLabelRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let req = IssueLabelRequest {
        order_id: body.order_id,
        rate: body.rate.try_into()?,
        from_address: body.from_address.into(),
        to_address: body.to_address.into(),
        weight_kg: body.weight_kg,
        cod_amount: body.cod_amount,
    };

    let label = web::block(move || svc.create_label(req))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(LabelResponse::from(label)))
}

/// GET /shipping/labels/{tracking_number}/tracking
#[utoipa::path(
    get,
    path = "/shipping/labels/{tracking_number}/tracking",
    params(("tracking_number" = String, Path, description = "Tracking number")),
    responses(
        (status = 200, description = "Tracking timeline", body = TrackingResponse),
        (status = 404, description = "Unknown tracking number"),
    ),
    tag = "shipping"
)]
pub async fn track(
    svc: web::Data<ShippingService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let tracking_number = path.into_inner();

    let info = web::block(move || svc.track(&tracking_number))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(TrackingResponse::from(info)))
}

/// PUT /shipping/labels/{tracking_number}/status
#[utoipa::path(
    put,
    path = "/shipping/labels/{tracking_number}/status",
    params(("tracking_number" = String, Path, description = "Tracking number")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 204, description = "Status updated"),
        (status = 400, description = "Unknown status value"),
        (status = 404, description = "Unknown tracking number"),
        (status = 422, description = "Transition not allowed"),
    ),
    tag = "shipping"
)]
pub async fn update_status(
    svc: web::Data<ShippingService>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let tracking_number = path.into_inner();
    let raw = body.into_inner().status;
    let status: LabelStatus = raw
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown shipping status '{raw}'")))?;

    web::block(move || svc.update_status(&tracking_number, status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /sellers/{seller_id}/labels
///
/// Labels for the seller's orders, newest first.
#[utoipa::path(
    get,
    path = "/sellers/{seller_id}/labels",
    params(("seller_id" = Uuid, Path, description = "Seller UUID")),
    responses(
        (status = 200, description = "Seller's labels", body = [LabelResponse]),
    ),
    tag = "shipping"
)]
pub async fn list_seller_labels(
    svc: web::Data<ShippingService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let seller_id = path.into_inner();

    let labels = web::block(move || svc.list_labels_for_seller(seller_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<LabelResponse> = labels.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders/{order_id}/label
#[utoipa::path(
    get,
    path = "/orders/{order_id}/label",
    params(("order_id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Label for the order", body = LabelResponse),
        (status = 404, description = "Order has no label"),
    ),
    tag = "orders"
)]
pub async fn get_order_label(
    svc: web::Data<ShippingService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let label = web::block(move || svc.label_for_order(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(LabelResponse::from(label)))
}

/// GET /orders/{order_id}/shipment
#[utoipa::path(
    get,
    path = "/orders/{order_id}/shipment",
    params(("order_id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Shipment fields of the order", body = OrderShipmentResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order_shipment(
    svc: web::Data<ShippingService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let shipment = web::block(move || svc.order_shipment(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderShipmentResponse::from(shipment)))
}
