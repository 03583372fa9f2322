pub mod api;
pub mod public;
pub mod tools;

// ── Route Registration ────────────────────────────────

pub fn public_routes() -> Vec<rocket::Route> {
    routes![public::index, api::preflight]
}

pub fn api_routes() -> Vec<rocket::Route> {
    routes![
        tools::keyword_hunter,
        tools::meta_master,
        tools::article_forge,
        tools::seo_analyzer,
        tools::news_radar,
        api::status,
    ]
}
