use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::State;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::ai::report::Outcome;
use crate::ai::{prompts, Gateway};
use crate::seo;

pub type ApiResponse = (Status, Json<Value>);

/// Raw body; parse failures are reported as server errors by the handler.
type Payload<'r> = Result<Json<Value>, json::Error<'r>>;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Tool {
    pub name: &'static str,
    pub endpoint: &'static str,
}

pub const KEYWORD_HUNTER: Tool = Tool {
    name: "Keyword Hunter",
    endpoint: "/api/keyword-hunter",
};
pub const META_MASTER: Tool = Tool {
    name: "Meta Master",
    endpoint: "/api/meta-master",
};
pub const ARTICLE_FORGE: Tool = Tool {
    name: "Article Forge",
    endpoint: "/api/article-forge",
};
pub const SEO_ANALYZER: Tool = Tool {
    name: "SEO Analyzer",
    endpoint: "/api/seo-analyzer",
};
pub const NEWS_RADAR: Tool = Tool {
    name: "News Radar",
    endpoint: "/api/news-radar",
};

pub const TOOLS: &[Tool] = &[
    KEYWORD_HUNTER,
    META_MASTER,
    ARTICLE_FORGE,
    SEO_ANALYZER,
    NEWS_RADAR,
];

// ── Request Types ─────────────────────────────────────

// Fields stay loosely typed: any JSON value is accepted and turned into text.

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: Option<Value>,
    pub keywords: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct MetaRequest {
    pub content: Option<Value>,
    pub keywords: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzerRequest {
    pub url: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct NewsRequest {
    pub search_query: Option<Value>,
}

// ── Helpers ───────────────────────────────────────────

fn parse<T: DeserializeOwned>(tool: Tool, payload: Payload<'_>) -> Result<T, ApiResponse> {
    let Json(value) = payload.map_err(|e| server_error(tool, e))?;
    serde_json::from_value(value).map_err(|e| server_error(tool, e))
}

/// Text of a field, or `None` when it is missing or empty: null, `""`,
/// `0`, `false`, `[]` and `{}` all count as empty. Whitespace is kept.
fn field_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// A present, non-empty field value or a 400 naming the field.
fn required(value: Option<Value>, field: &str) -> Result<String, ApiResponse> {
    field_text(value).ok_or_else(|| {
        (
            Status::BadRequest,
            Json(json!({"error": format!("Field '{}' diperlukan.", field)})),
        )
    })
}

fn optional(value: Option<Value>) -> String {
    field_text(value).unwrap_or_default()
}

fn server_error(tool: Tool, e: impl std::fmt::Display) -> ApiResponse {
    log::error!("[api] Error in {} endpoint: {}", tool.endpoint, e);
    (
        Status::InternalServerError,
        Json(json!({"error": format!("Terjadi kesalahan server: {}", e)})),
    )
}

/// Run one generation on a blocking worker and map the outcome to a response.
async fn run_tool(gateway: &State<Arc<Gateway>>, tool: Tool, prompt: String) -> ApiResponse {
    let gateway = Arc::clone(gateway.inner());
    let task = rocket::tokio::task::spawn_blocking(move || gateway.generate(&prompt, tool.name));
    match task.await {
        Ok(outcome @ Outcome::Generated { .. }) => {
            (Status::Ok, Json(json!({"result": outcome.banner()})))
        }
        Ok(outcome @ Outcome::Failed { .. }) => (
            Status::InternalServerError,
            Json(json!({"error": outcome.banner()})),
        ),
        Err(e) => server_error(tool, e),
    }
}

// ── Tools ─────────────────────────────────────────────

#[post("/keyword-hunter", data = "<payload>")]
pub async fn keyword_hunter(gateway: &State<Arc<Gateway>>, payload: Payload<'_>) -> ApiResponse {
    let body: TopicRequest = match parse(KEYWORD_HUNTER, payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let topic = match required(body.topic, "topic") {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    run_tool(gateway, KEYWORD_HUNTER, prompts::keyword_hunter(&topic)).await
}

#[post("/meta-master", data = "<payload>")]
pub async fn meta_master(gateway: &State<Arc<Gateway>>, payload: Payload<'_>) -> ApiResponse {
    let body: MetaRequest = match parse(META_MASTER, payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let content = match required(body.content, "content") {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let keywords = optional(body.keywords);
    run_tool(gateway, META_MASTER, prompts::meta_master(&content, &keywords)).await
}

#[post("/article-forge", data = "<payload>")]
pub async fn article_forge(gateway: &State<Arc<Gateway>>, payload: Payload<'_>) -> ApiResponse {
    let body: TopicRequest = match parse(ARTICLE_FORGE, payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let topic = match required(body.topic, "topic") {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let keywords = optional(body.keywords);
    run_tool(gateway, ARTICLE_FORGE, prompts::article_forge(&topic, &keywords)).await
}

#[post("/seo-analyzer", data = "<payload>")]
pub async fn seo_analyzer(gateway: &State<Arc<Gateway>>, payload: Payload<'_>) -> ApiResponse {
    let body: AnalyzerRequest = match parse(SEO_ANALYZER, payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let url = match required(body.url, "url") {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let analysis = seo::simulated_analysis(&url);
    run_tool(gateway, SEO_ANALYZER, prompts::seo_analyzer(&url, &analysis)).await
}

#[post("/news-radar", data = "<payload>")]
pub async fn news_radar(gateway: &State<Arc<Gateway>>, payload: Payload<'_>) -> ApiResponse {
    let body: NewsRequest = match parse(NEWS_RADAR, payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let query = match required(body.search_query, "search_query") {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let news = seo::simulated_news(&query).join("\n");
    run_tool(gateway, NEWS_RADAR, prompts::news_radar(&query, &news)).await
}
