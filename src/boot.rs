use log::{error, info, warn};
use std::path::Path;
use std::process;

use crate::config::{Config, CONFIG_FILE};

/// Template the index page renders.
const INDEX_TEMPLATE: &str = "index.html.tera";

/// Problems found by [`check`], split by severity.
#[derive(Debug, Default)]
pub struct BootReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Inspect the filesystem the server depends on.
pub fn check(config: &Config) -> BootReport {
    let mut report = BootReport::default();

    // ── 1. Templates ───────────────────────────────────
    let template_dir = Path::new(&config.server.template_dir);
    if !template_dir.is_dir() {
        report
            .errors
            .push(format!("Missing template directory: {}", template_dir.display()));
    } else if !template_dir.join(INDEX_TEMPLATE).exists() {
        report.errors.push(format!(
            "Missing critical template: {}",
            template_dir.join(INDEX_TEMPLATE).display()
        ));
    }

    // ── 2. Config file ─────────────────────────────────
    if !Path::new(CONFIG_FILE).exists() {
        report
            .warnings
            .push(format!("{} not found, using default config", CONFIG_FILE));
    }

    // ── 3. Local model files ───────────────────────────
    if cfg!(feature = "local-model") {
        let model = Path::new(&config.secondary.model_path);
        if !model.exists() {
            report.warnings.push(format!(
                "Local model not found: {} (fallback will be unavailable)",
                model.display()
            ));
        }
        let tokenizer = config.secondary.resolved_tokenizer_path();
        if !tokenizer.exists() {
            report.warnings.push(format!(
                "Tokenizer not found: {} (fallback will be unavailable)",
                tokenizer.display()
            ));
        }
    }

    report
}

/// Run all boot checks. Call this before Rocket launches.
/// Aborts if the index template is missing.
pub fn run(config: &Config) {
    info!("[boot] Wolfgank boot check starting...");
    let report = check(config);

    for e in &report.errors {
        error!("[boot]   {}", e);
    }
    for w in &report.warnings {
        warn!("[boot]   {}", w);
    }

    if !report.errors.is_empty() {
        error!(
            "[boot] Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            report.errors.len(),
            report.warnings.len()
        );
        process::exit(1);
    }

    if report.warnings.is_empty() {
        info!("[boot] Boot check passed. All systems go.");
    } else {
        warn!(
            "[boot] Boot check passed with {} warning(s). Some features may not work correctly.",
            report.warnings.len()
        );
    }
}
