use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::response::content::RawHtml;
use rocket::{Orbit, Rocket, State};
use rocket_dyn_templates::Template;
use serde_json::json;
use std::sync::Arc;

use crate::ai::Gateway;

use super::tools::TOOLS;

// ── Running instance request guard ──

/// The running Rocket instance, for rendering templates by hand.
pub struct Running<'r>(pub &'r Rocket<Orbit>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Running<'r> {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Running(request.rocket()))
    }
}

// ── Homepage ───────────────────────────────────────────

#[get("/")]
pub fn index(
    running: Running<'_>,
    gateway: &State<Arc<Gateway>>,
) -> Result<RawHtml<String>, (Status, &'static str)> {
    let context = json!({
        "status": gateway.status(),
        "tools": TOOLS,
    });

    match Template::show(running.0, "index", &context) {
        Some(html) => Ok(RawHtml(html)),
        None => {
            log::error!("[api] Error rendering template: index");
            Err((
                Status::InternalServerError,
                "Error loading the application interface.",
            ))
        }
    }
}
