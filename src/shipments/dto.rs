use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::Shipment;

/// Request body for POST /shipments.
#[derive(Debug, Deserialize)]
pub struct CreateShipmentRequest {
    pub item_name: String,
    pub quantity: i64,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Shipment as returned to clients; the ObjectId is rendered as its hex
/// string.
#[derive(Debug, Serialize)]
pub struct ShipmentResponse {
    pub id: String,
    pub item_name: String,
    pub quantity: i64,
    pub description: Option<String>,
    pub status: String,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Shipment> for ShipmentResponse {
    fn from(s: Shipment) -> Self {
        Self {
            id: s.id.map(|id| id.to_hex()).unwrap_or_default(),
            item_name: s.item_name,
            quantity: s.quantity,
            description: s.description,
            status: s.status,
            user_id: s.user_id,
            created_at: s.created_at.to_time_0_3(),
        }
    }
}
