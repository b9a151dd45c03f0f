use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::debug;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::label::{LabelStatus, OrderShipment, OrderShippingStatus, ShippingLabel};
use crate::domain::ports::{InsertLabelError, ShippingRepository};
use crate::schema::{orders, shipping_labels};

use super::models::{NewShippingLabelRow, OrderShipmentChangeset, OrderShipmentRow, ShippingLabelRow};

const ORDER_UNIQUE: &str = "shipping_labels_order_id_key";
const TRACKING_UNIQUE: &str = "shipping_labels_tracking_number_key";

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<diesel::result::Error> for InsertLabelError {
    fn from(e: diesel::result::Error) -> Self {
        if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &e {
            debug!("unique violation on {:?}", info.constraint_name());
            match info.constraint_name() {
                Some(ORDER_UNIQUE) => return InsertLabelError::OrderAlreadyLabelled,
                Some(TRACKING_UNIQUE) => return InsertLabelError::TrackingNumberTaken,
                _ => {}
            }
        }
        InsertLabelError::Domain(e.into())
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn internal(msg: impl std::fmt::Display) -> DomainError {
    DomainError::Internal(msg.to_string())
}

fn to_new_row(label: &ShippingLabel) -> Result<NewShippingLabelRow, DomainError> {
    let cod_amount = label
        .cod_amount
        .map(|amount| {
            BigDecimal::from_f64(amount)
                .map(|d| d.round(2))
                .ok_or_else(|| internal(format!("COD amount {amount} is not representable")))
        })
        .transpose()?;

    Ok(NewShippingLabelRow {
        id: label.id,
        order_id: label.order_id,
        tracking_number: label.tracking_number.clone(),
        courier_id: label.courier_id.clone(),
        courier_name: label.courier_name.clone(),
        service_type: label.service_type.as_str().to_string(),
        from_address: serde_json::to_value(&label.from_address).map_err(internal)?,
        to_address: serde_json::to_value(&label.to_address).map_err(internal)?,
        package_weight_kg: label.package_weight_kg,
        shipping_cost: BigDecimal::from(label.shipping_cost),
        cod_amount,
        label_url: label.label_url.clone(),
        status: label.status.as_str().to_string(),
        estimated_delivery_days: i32::try_from(label.estimated_delivery_days).map_err(internal)?,
        created_at: label.created_at,
        status_updated_at: label.status_updated_at,
    })
}

fn whole_units(amount: &BigDecimal) -> Result<i64, DomainError> {
    amount
        .round(0)
        .to_i64()
        .ok_or_else(|| internal(format!("amount {amount} out of range")))
}

fn to_domain(row: ShippingLabelRow) -> Result<ShippingLabel, DomainError> {
    Ok(ShippingLabel {
        id: row.id,
        order_id: row.order_id,
        tracking_number: row.tracking_number,
        courier_id: row.courier_id,
        courier_name: row.courier_name,
        service_type: row.service_type.parse()?,
        from_address: serde_json::from_value(row.from_address).map_err(internal)?,
        to_address: serde_json::from_value(row.to_address).map_err(internal)?,
        package_weight_kg: row.package_weight_kg,
        shipping_cost: whole_units(&row.shipping_cost)?,
        cod_amount: row.cod_amount.as_ref().and_then(|d| d.to_f64()),
        label_url: row.label_url,
        status: row.status.parse()?,
        estimated_delivery_days: u32::try_from(row.estimated_delivery_days).map_err(internal)?,
        created_at: row.created_at,
        status_updated_at: row.status_updated_at,
    })
}

fn to_order_shipment(row: OrderShipmentRow) -> Result<OrderShipment, DomainError> {
    Ok(OrderShipment {
        order_id: row.id,
        seller_id: row.seller_id,
        tracking_number: row.tracking_number,
        shipping_status: row
            .shipping_status
            .as_deref()
            .map(str::parse::<OrderShippingStatus>)
            .transpose()?,
        shipping_cost: row.shipping_cost.as_ref().map(whole_units).transpose()?,
    })
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselShippingRepository {
    pool: DbPool,
}

impl DieselShippingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ShippingRepository for DieselShippingRepository {
    fn insert_label(&self, label: &ShippingLabel) -> Result<ShippingLabel, InsertLabelError> {
        let row = to_new_row(label)?;
        let mut conn = self.pool.get().map_err(DomainError::from)?;

        conn.transaction::<_, InsertLabelError, _>(|conn| {
            // 1. Lock the order so concurrent issuers for it serialise here.
            let locked: Vec<Uuid> = orders::table
                .filter(orders::id.eq(label.order_id))
                .select(orders::id)
                .for_update()
                .load(conn)?;
            if locked.is_empty() {
                return Err(DomainError::not_found(format!("Order {}", label.order_id)).into());
            }

            // 2. Insert the label; unique keys on order and tracking number.
            let saved = diesel::insert_into(shipping_labels::table)
                .values(&row)
                .returning(ShippingLabelRow::as_returning())
                .get_result(conn)?;

            // 3. Stamp the order's shipment projection in the same transaction.
            diesel::update(orders::table.find(label.order_id))
                .set(&OrderShipmentChangeset {
                    tracking_number: Some(saved.tracking_number.clone()),
                    shipping_status: OrderShippingStatus::from(label.status).as_str().to_string(),
                    shipping_cost: Some(saved.shipping_cost.clone()),
                    updated_at: label.created_at,
                })
                .execute(conn)?;

            Ok(to_domain(saved)?)
        })
    }

    fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShippingLabel>, DomainError> {
        let mut conn = self.pool.get()?;

        shipping_labels::table
            .filter(shipping_labels::tracking_number.eq(tracking_number))
            .select(ShippingLabelRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(to_domain)
            .transpose()
    }

    fn find_by_order_id(&self, order_id: Uuid) -> Result<Option<ShippingLabel>, DomainError> {
        let mut conn = self.pool.get()?;

        shipping_labels::table
            .filter(shipping_labels::order_id.eq(order_id))
            .select(ShippingLabelRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(to_domain)
            .transpose()
    }

    fn update_status(
        &self,
        tracking_number: &str,
        expected: LabelStatus,
        new_status: LabelStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated: Option<Uuid> = diesel::update(
                shipping_labels::table
                    .filter(shipping_labels::tracking_number.eq(tracking_number))
                    .filter(shipping_labels::status.eq(expected.as_str())),
            )
            .set((
                shipping_labels::status.eq(new_status.as_str()),
                shipping_labels::status_updated_at.eq(at),
            ))
            .returning(shipping_labels::order_id)
            .get_result(conn)
            .optional()?;

            let Some(order_id) = updated else {
                return Ok(false);
            };

            diesel::update(orders::table.find(order_id))
                .set(&OrderShipmentChangeset {
                    tracking_number: None,
                    shipping_status: OrderShippingStatus::from(new_status).as_str().to_string(),
                    shipping_cost: None,
                    updated_at: at,
                })
                .execute(conn)?;

            Ok(true)
        })
    }

    fn list_for_seller(&self, seller_id: Uuid) -> Result<Vec<ShippingLabel>, DomainError> {
        let mut conn = self.pool.get()?;

        shipping_labels::table
            .inner_join(orders::table)
            .filter(orders::seller_id.eq(seller_id))
            .order(shipping_labels::created_at.desc())
            .select(ShippingLabelRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    fn find_order_shipment(&self, order_id: Uuid) -> Result<Option<OrderShipment>, DomainError> {
        let mut conn = self.pool.get()?;

        orders::table
            .find(order_id)
            .select(OrderShipmentRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(to_order_shipment)
            .transpose()
    }
}
