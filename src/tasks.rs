use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::sync::Arc;
use std::time::Duration;

use crate::ai::Gateway;

/// Periodically re-probes the primary service. Attached only when a
/// re-probe interval is configured.
pub struct BackgroundTasks {
    pub reprobe_interval: Duration,
}

#[rocket::async_trait]
impl Fairing for BackgroundTasks {
    fn info(&self) -> Info {
        Info {
            name: "Background Tasks",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let Some(gateway) = rocket.state::<Arc<Gateway>>().cloned() else {
            log::error!("[task] Gateway not found in managed state; re-probe disabled");
            return;
        };

        let interval = self.reprobe_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let gw = Arc::clone(&gateway);
                if let Err(e) = tokio::task::spawn_blocking(move || reprobe(&gw)).await {
                    log::error!("[task] Re-probe failed: {}", e);
                }
            }
        });

        log::info!(
            "[task] Re-probing primary every {}s",
            self.reprobe_interval.as_secs()
        );
    }
}

/// One re-probe round: probe the primary again (loading the fallback if it
/// is down) and log any availability change. Returns the new availability.
pub fn reprobe(gateway: &Gateway) -> bool {
    let before = gateway.primary_available();
    gateway.bring_up();
    let after = gateway.primary_available();
    if after != before {
        log::info!(
            "[task] Primary availability changed: {} -> {} (method: {})",
            before,
            after,
            gateway.method()
        );
    }
    after
}
