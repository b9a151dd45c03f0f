use utoipa::OpenApi;

use crate::handlers::shipping;

#[derive(OpenApi)]
#[openapi(
    info(title = "Shipping service", description = "Courier rate quotes, label issuance and tracking"),
    paths(
        shipping::list_couriers,
        shipping::get_courier,
        shipping::get_rates,
        shipping::create_label,
        shipping::track,
        shipping::update_status,
        shipping::list_seller_labels,
        shipping::get_order_label,
        shipping::get_order_shipment,
    ),
    components(schemas(
        shipping::CourierResponse,
        shipping::RateQuery,
        shipping::RateDto,
        shipping::RateListResponse,
        shipping::AddressDto,
        shipping::CreateLabelRequest,
        shipping::LabelResponse,
        shipping::TrackingEventResponse,
        shipping::TrackingResponse,
        shipping::UpdateStatusRequest,
        shipping::OrderShipmentResponse,
    )),
    tags(
        (name = "couriers", description = "Courier partner catalog"),
        (name = "shipping", description = "Rates, labels and tracking"),
        (name = "orders", description = "Shipment fields of orders"),
    )
)]
pub struct ApiDoc;
