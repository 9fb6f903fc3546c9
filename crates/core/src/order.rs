//! Order data-transfer types.
//!
//! Backend payloads are parsed into [`OrderRecord`] at the proxy boundary and
//! shaped into [`OrderView`] (status label + step index attached) before they
//! reach any rendering layer. Views are rebuilt on every fetch and never
//! persisted beyond the in-memory cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::status::OrderStatus;

/// A photo attached to a repair request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderImage {
    pub url: String,
    /// Annotated/sketched variant of the photo, when the user drew on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sketch_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Raw order shape as the backend emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    /// Raw status code; mapped via [`OrderStatus::parse`], never trusted to
    /// be in the canonical table.
    pub status: String,
    #[serde(default)]
    pub images: Vec<OrderImage>,
    #[serde(default)]
    pub description: Option<String>,
    /// Prices in the smallest currency unit (won).
    #[serde(default)]
    pub estimated_price: Option<i64>,
    #[serde(default)]
    pub final_price: Option<i64>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub pickup_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
}

/// Client-facing order view: the record plus its mapped display status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub status: String,
    pub status_label: String,
    pub step_index: u8,
    pub images: Vec<OrderImage>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_price: Option<i64>,
    #[serde(default)]
    pub final_price: Option<i64>,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub pickup_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
}

impl OrderView {
    pub fn from_record(record: OrderRecord) -> Self {
        let mapped = OrderStatus::parse(&record.status);
        Self {
            status_label: mapped.label().to_string(),
            step_index: mapped.step_index(),
            id: record.id,
            created_at: record.created_at,
            title: record.title,
            status: record.status,
            images: record.images,
            description: record.description,
            estimated_price: record.estimated_price,
            final_price: record.final_price,
            paid: record.paid,
            pickup_date: record.pickup_date,
            tracking_number: record.tracking_number,
            carrier: record.carrier,
        }
    }

    /// Re-derive the mapped status from the raw code.
    pub fn status(&self) -> OrderStatus {
        OrderStatus::parse(&self.status)
    }
}

/// Parse a backend order-list payload, rejecting malformed JSON at the
/// boundary instead of letting untyped data flow onward.
pub fn parse_orders(payload: serde_json::Value) -> DomainResult<Vec<OrderView>> {
    let records: Vec<OrderRecord> = serde_json::from_value(payload)
        .map_err(|e| DomainError::malformed(format!("order list: {e}")))?;
    Ok(records.into_iter().map(OrderView::from_record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_json(status: &str) -> serde_json::Value {
        json!({
            "id": "ord-1",
            "created_at": "2026-03-02T09:30:00Z",
            "title": "코트 소매 수선",
            "status": status,
            "images": [
                { "url": "https://cdn.example/a.jpg", "sketch_url": "https://cdn.example/a-sketch.jpg" }
            ],
            "estimated_price": 18000,
            "paid": true
        })
    }

    #[test]
    fn view_attaches_mapped_label_and_step() {
        let view = parse_orders(json!([record_json("PROCESSING")]))
            .unwrap()
            .remove(0);
        assert_eq!(view.status, "PROCESSING");
        assert_eq!(view.status_label, "수선중");
        assert_eq!(view.step_index, 10);
        assert_eq!(view.images.len(), 1);
        assert!(view.paid);
    }

    #[test]
    fn unknown_status_keeps_raw_code_at_step_zero() {
        let view = parse_orders(json!([record_json("ON_HOLD")])).unwrap().remove(0);
        assert_eq!(view.status_label, "ON_HOLD");
        assert_eq!(view.step_index, 0);
    }

    #[test]
    fn optional_fields_default_when_backend_omits_them() {
        let view = parse_orders(json!([{
            "id": "ord-2",
            "created_at": "2026-03-02T10:00:00Z",
            "title": "청바지 기장",
            "status": "REQUESTED"
        }]))
        .unwrap()
        .remove(0);
        assert!(view.images.is_empty());
        assert!(!view.paid);
        assert!(view.tracking_number.is_none());
    }

    #[test]
    fn malformed_payload_is_rejected_at_the_boundary() {
        let err = parse_orders(json!({ "not": "a list" })).unwrap_err();
        assert!(matches!(err, DomainError::Malformed(_)));
    }
}
