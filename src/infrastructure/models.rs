use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{orders, shipping_labels};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderShipmentRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub tracking_number: Option<String>,
    pub shipping_status: Option<String>,
    pub shipping_cost: Option<BigDecimal>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderShipmentChangeset {
    pub tracking_number: Option<String>,
    pub shipping_status: String,
    pub shipping_cost: Option<BigDecimal>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = shipping_labels)]
#[diesel(belongs_to(OrderShipmentRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShippingLabelRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub tracking_number: String,
    pub courier_id: String,
    pub courier_name: String,
    pub service_type: String,
    pub from_address: Value,
    pub to_address: Value,
    pub package_weight_kg: f64,
    pub shipping_cost: BigDecimal,
    pub cod_amount: Option<BigDecimal>,
    pub label_url: String,
    pub status: String,
    pub estimated_delivery_days: i32,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shipping_labels)]
pub struct NewShippingLabelRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub tracking_number: String,
    pub courier_id: String,
    pub courier_name: String,
    pub service_type: String,
    pub from_address: Value,
    pub to_address: Value,
    pub package_weight_kg: f64,
    pub shipping_cost: BigDecimal,
    pub cod_amount: Option<BigDecimal>,
    pub label_url: String,
    pub status: String,
    pub estimated_delivery_days: i32,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
}
