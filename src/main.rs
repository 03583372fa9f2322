#[macro_use]
extern crate rocket;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::serde::json::Json;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

mod ai;
mod boot;
mod config;
mod routes;
mod seo;
mod tasks;

#[cfg(test)]
mod tests;

use ai::Gateway;
use config::Config;

/// Permissive CORS headers on every response.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info { name: "CORS Headers", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, _req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        res.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        res.set_header(Header::new("Access-Control-Allow-Methods", "GET, POST, OPTIONS"));
        res.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
    }
}

#[catch(404)]
fn not_found() -> Json<Value> {
    Json(json!({"error": "Not found."}))
}

#[catch(500)]
fn server_error() -> Json<Value> {
    Json(json!({"error": "Internal server error."}))
}

/// Assemble the server around an already probed gateway.
pub fn build(config: &Config, gateway: Arc<Gateway>) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port))
        .merge(("template_dir", config.server.template_dir.clone()));

    let mut rocket = rocket::custom(figment)
        .manage(gateway)
        .attach(Template::fairing())
        .attach(Cors)
        .mount("/", routes::public_routes())
        .mount("/api", routes::api_routes())
        .register("/", catchers![not_found, server_error]);

    if config.primary.reprobe_interval_secs > 0 {
        rocket = rocket.attach(tasks::BackgroundTasks {
            reprobe_interval: Duration::from_secs(config.primary.reprobe_interval_secs),
        });
    }
    rocket
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load();

    // Boot check: templates present, model files where expected
    boot::run(&config);

    // Probe once, before the runtime starts; the Ollama client is blocking
    let gateway = Arc::new(Gateway::from_config(&config));
    gateway.bring_up();

    log::info!(
        "[boot] Starting server on {}:{}. Text generation active method: {}",
        config.server.address,
        config.server.port,
        gateway.method()
    );

    if let Err(e) = rocket::execute(build(&config, gateway).launch()) {
        log::error!("[boot] Server failed: {}", e);
        std::process::exit(1);
    }
}
