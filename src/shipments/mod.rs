use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;

pub use dto::ShipmentResponse;

pub fn router() -> Router<AppState> {
    handlers::shipment_routes()
}
