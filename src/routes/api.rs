use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;

use crate::ai::{Gateway, GatewayStatus};

// ── Status Check ──────────────────────────────────────

#[get("/status")]
pub fn status(gateway: &State<Arc<Gateway>>) -> Json<GatewayStatus> {
    Json(gateway.status())
}

// ── CORS preflight ────────────────────────────────────

#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::NoContent
}
