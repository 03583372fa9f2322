#![cfg(test)]

use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::ai::fallback::testing::CountingLoader;
use crate::ai::fallback::SecondarySlot;
use crate::ai::testing::{params, StubPrimary};
use crate::ai::{AiError, Gateway, TextBackend};
use crate::config::Config;

/// Thread-local capture of `log` records, so a test only sees its own lines.
pub(crate) mod log_capture {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
    }

    struct Capture;

    impl Log for Capture {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Info
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                RECORDS.with(|r| {
                    r.borrow_mut()
                        .push((record.level(), record.args().to_string()))
                });
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: Capture = Capture;
    static INIT: Once = Once::new();

    /// Install the capturing logger. Must run before any Rocket instance is
    /// built, otherwise Rocket claims the global logger first.
    pub fn install() {
        INIT.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(LevelFilter::Info);
        });
    }

    pub fn clear() {
        RECORDS.with(|r| r.borrow_mut().clear());
    }

    pub fn errors() -> Vec<String> {
        RECORDS.with(|r| {
            r.borrow()
                .iter()
                .filter(|(level, _)| *level == Level::Error)
                .map(|(_, msg)| msg.clone())
                .collect()
        })
    }

    pub fn infos_containing(needle: &str) -> Vec<String> {
        RECORDS.with(|r| {
            r.borrow()
                .iter()
                .filter(|(level, msg)| *level == Level::Info && msg.contains(needle))
                .map(|(_, msg)| msg.clone())
                .collect()
        })
    }
}

/// Primary that answers with the prompt it was given.
struct PromptEcho;

impl TextBackend for PromptEcho {
    fn label(&self) -> String {
        "Ollama (echo)".to_string()
    }

    fn probe(&self) -> Result<(), AiError> {
        Ok(())
    }

    fn complete(&self, prompt: &str) -> Result<String, AiError> {
        Ok(prompt.to_string())
    }
}

fn client_with(gateway: Gateway) -> Client {
    log_capture::install();
    gateway.bring_up();
    let rocket = crate::build(&Config::default(), Arc::new(gateway));
    Client::tracked(rocket).expect("valid rocket instance")
}

fn primary_client(primary: impl TextBackend + 'static) -> Client {
    client_with(Gateway::new(Box::new(primary), None, params()))
}

fn post_json(client: &Client, path: &str, body: &str) -> (Status, Value) {
    let resp = client
        .post(path)
        .header(ContentType::JSON)
        .body(body)
        .dispatch();
    let status = resp.status();
    let json = resp.into_json::<Value>().expect("JSON body");
    (status, json)
}

// ═══════════════════════════════════════════════════════════
// Tool endpoints
// ═══════════════════════════════════════════════════════════

#[test]
fn keyword_hunter_uses_primary() {
    let client = primary_client(StubPrimary::replying("1. kopi lokal arabika"));
    let (status, json) = post_json(&client, "/api/keyword-hunter", r#"{"topic": "kopi lokal"}"#);

    assert_eq!(status, Status::Ok);
    let result = json["result"].as_str().unwrap();
    assert!(result.contains("Keyword Hunter"));
    assert!(result.contains("Ollama (stub:1b)"));
    assert!(result.contains("1. kopi lokal arabika"));
    assert!(json.get("error").is_none());
}

#[test]
fn meta_master_missing_content_is_400() {
    let client = primary_client(StubPrimary::replying("unused"));
    let (status, json) = post_json(&client, "/api/meta-master", "{}");

    assert_eq!(status, Status::BadRequest);
    assert!(json["error"].as_str().unwrap().contains("content"));
}

#[test]
fn empty_required_field_is_400() {
    let client = primary_client(StubPrimary::replying("unused"));
    for body in [r#"{"search_query": ""}"#, r#"{"search_query": null}"#, r#"{"search_query": 0}"#] {
        let (status, json) = post_json(&client, "/api/news-radar", body);
        assert_eq!(status, Status::BadRequest, "{}", body);
        assert!(json["error"].as_str().unwrap().contains("search_query"));
    }
}

#[test]
fn whitespace_and_non_string_fields_are_used() {
    let client = primary_client(PromptEcho);

    let (status, json) = post_json(&client, "/api/keyword-hunter", r#"{"topic": "   "}"#);
    assert_eq!(status, Status::Ok);
    assert!(json["result"].is_string());

    let (status, json) = post_json(&client, "/api/article-forge", r#"{"topic": 2024, "keywords": 7}"#);
    assert_eq!(status, Status::Ok);
    let result = json["result"].as_str().unwrap();
    assert!(result.contains("topik '2024'"));
    assert!(result.contains("alami jika memungkinkan: '7'"));
}

#[test]
fn every_tool_validates_its_field() {
    let client = primary_client(StubPrimary::replying("unused"));
    for (path, field) in [
        ("/api/keyword-hunter", "topic"),
        ("/api/meta-master", "content"),
        ("/api/article-forge", "topic"),
        ("/api/seo-analyzer", "url"),
        ("/api/news-radar", "search_query"),
    ] {
        let (status, json) = post_json(&client, path, r#"{"unrelated": "x"}"#);
        assert_eq!(status, Status::BadRequest, "{}", path);
        assert!(json["error"].as_str().unwrap().contains(field), "{}", path);
    }
}

#[test]
fn malformed_json_is_generic_500() {
    let client = primary_client(StubPrimary::replying("unused"));
    let (status, json) = post_json(&client, "/api/article-forge", "{not json");

    assert_eq!(status, Status::InternalServerError);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Terjadi kesalahan server:"));
}

#[test]
fn generation_failure_is_500_with_banner() {
    let client = client_with(Gateway::new(Box::new(StubPrimary::down()), None, params()));
    let (status, json) = post_json(&client, "/api/seo-analyzer", r#"{"url": "https://contoh.id"}"#);

    assert_eq!(status, Status::InternalServerError);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("--- Wolfgank AI Error ("));
    assert!(error.contains("no secondary capability"));
    assert!(json.get("result").is_none());
}

#[test]
fn secondary_serves_when_primary_down() {
    let loads = Arc::new(AtomicUsize::new(0));
    let slot = SecondarySlot::new(Box::new(CountingLoader::ok(loads.clone())));
    let client = client_with(Gateway::new(Box::new(StubPrimary::down()), Some(slot), params()));

    let (status, json) = post_json(&client, "/api/news-radar", r#"{"search_query": "kopi"}"#);
    assert_eq!(status, Status::Ok);
    let result = json["result"].as_str().unwrap();
    assert!(result.contains("[News Radar] Result (Local (tiny-test) @ "));
    assert!(result.contains("\n\ncontinuation text\n\n--- End of Report ---"));

    post_json(&client, "/api/news-radar", r#"{"search_query": "teh"}"#);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn meta_master_prompt_embeds_truncated_content() {
    let client = primary_client(PromptEcho);
    let content = format!("{}{}", "x".repeat(1000), "TAIL");
    let body = serde_json::json!({"content": content, "keywords": "kopi"}).to_string();
    let (status, json) = post_json(&client, "/api/meta-master", &body);

    assert_eq!(status, Status::Ok);
    let result = json["result"].as_str().unwrap();
    assert!(result.contains("'kopi'"));
    assert!(result.contains(&"x".repeat(1000)));
    assert!(!result.contains("TAIL"));
}

#[test]
fn analyzer_and_news_prompts_carry_placeholder_context() {
    let client = primary_client(PromptEcho);

    let (_, json) = post_json(&client, "/api/seo-analyzer", r#"{"url": "http://contoh.id"}"#);
    let result = json["result"].as_str().unwrap();
    assert!(result.contains("Analisis SEO Awal untuk http://contoh.id"));
    assert!(result.contains("Penggunaan HTTPS: Tidak"));

    let (_, json) = post_json(&client, "/api/news-radar", r#"{"search_query": "kopi"}"#);
    let result = json["result"].as_str().unwrap();
    assert!(result.contains("Google Trends"));
    assert!(result.contains("Kompasiana"));
}

// ═══════════════════════════════════════════════════════════
// Page, status, CORS
// ═══════════════════════════════════════════════════════════

#[test]
fn index_renders_active_method() {
    let client = primary_client(StubPrimary::replying("x"));
    let resp = client.get("/").dispatch();

    assert_eq!(resp.status(), Status::Ok);
    assert!(resp.content_type().map_or(false, |ct| ct.is_html()));
    let html = resp.into_string().unwrap();
    assert!(html.contains("Ollama (stub:1b)"));
    assert!(html.contains("<h2>Keyword Hunter</h2>"));
    // Tera escapes '/' inside HTML templates
    assert!(html.contains(r#"data-endpoint="&#x2F;api&#x2F;keyword-hunter""#));
}

#[test]
fn status_endpoint_reports_gateway_state() {
    let client = client_with(Gateway::new(Box::new(StubPrimary::down()), None, params()));
    let resp = client.get("/api/status").dispatch();

    assert_eq!(resp.status(), Status::Ok);
    let json = resp.into_json::<Value>().unwrap();
    assert_eq!(json["primary_available"], false);
    assert_eq!(json["secondary_capability"], false);
    assert_eq!(json["method"], "Error: Local Model Support Missing");
}

#[test]
fn responses_carry_cors_headers() {
    let client = primary_client(StubPrimary::replying("x"));

    let resp = client.options("/api/keyword-hunter").dispatch();
    assert_eq!(resp.status(), Status::NoContent);
    assert_eq!(
        resp.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );

    let resp = client.get("/api/status").dispatch();
    assert_eq!(
        resp.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );
}

#[test]
fn unknown_route_is_json_404() {
    let client = primary_client(StubPrimary::replying("x"));
    let resp = client.get("/api/nope").dispatch();
    assert_eq!(resp.status(), Status::NotFound);
    assert!(resp.into_json::<Value>().unwrap()["error"].is_string());
}
