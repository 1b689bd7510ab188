use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use log::{info, warn};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::ImportError;
use crate::handoff::{hand_off, ImportNotifier, LatestImport};
use crate::import::{import_csv, import_ics_feed, ImportOptions};
use crate::summary::ImportResult;
use crate::taxonomy::Taxonomy;

/// Shared state of the import surface. `latest` stands in for the
/// scheduling surface that picks up each delivered import.
pub struct AppState {
    pub taxonomy: Taxonomy,
    pub options: ImportOptions,
    pub admin_password: String,
    pub feed_url: Option<String>,
    pub client: reqwest::Client,
    pub latest: LatestImport,
    pub notifier: ImportNotifier,
}

impl AppState {
    pub fn new(config: &AppConfig, taxonomy: Taxonomy) -> Self {
        AppState {
            taxonomy,
            options: config.import_options(),
            admin_password: config.admin_password.clone(),
            feed_url: config.feed_url.clone(),
            client: reqwest::Client::new(),
            latest: LatestImport::default(),
            notifier: ImportNotifier::default(),
        }
    }

    fn authorized(&self, req: &HttpRequest) -> bool {
        let password = req
            .headers()
            .get("X-Admin-Password")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        password == self.admin_password
    }

    fn deliver(&self, result: ImportResult) -> HttpResponse {
        hand_off(result.clone(), &self.latest, &self.notifier);
        HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!("Generated {} shift candidate(s)", result.total_shifts),
            "result": result
        }))
    }
}

#[derive(Deserialize, Default)]
pub struct IcsImportRequest {
    url: Option<String>,
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Unauthorized"}))
}

fn error_response(err: &ImportError) -> HttpResponse {
    let body = serde_json::json!({"success": false, "error": err.to_string()});
    match err {
        ImportError::Fetch { .. } => HttpResponse::BadGateway().json(body),
        ImportError::MissingColumns { .. } | ImportError::Csv(_) => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

// CSV upload endpoint
async fn upload_csv(req: HttpRequest, body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    if !state.authorized(&req) {
        return Ok(unauthorized());
    }

    let text = String::from_utf8_lossy(&body);
    match import_csv(&text, &state.taxonomy, &state.options) {
        Ok(result) => Ok(state.deliver(result)),
        Err(e) => {
            warn!("CSV import rejected: {}", e);
            Ok(error_response(&e))
        }
    }
}

// Calendar feed import endpoint
async fn import_feed(
    req: HttpRequest,
    body: Option<web::Json<IcsImportRequest>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !state.authorized(&req) {
        return Ok(unauthorized());
    }

    let request = body.map(web::Json::into_inner).unwrap_or_default();
    let Some(url) = request.url.or_else(|| state.feed_url.clone()) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "No feed URL given and ICS_FEED_URL is not configured"
        })));
    };

    match import_ics_feed(&state.client, &url, &state.taxonomy, &state.options).await {
        Ok(result) => Ok(state.deliver(result)),
        Err(e) => Ok(error_response(&e)),
    }
}

// Latest import endpoint
async fn latest_import(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.latest.get() {
        Some(result) => Ok(HttpResponse::Ok().json(result)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No import available"}))),
    }
}

async fn taxonomy(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(&state.taxonomy))
}

/// Registers the import routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/import/csv", web::post().to(upload_csv))
        .route("/api/import/ics", web::post().to(import_feed))
        .route("/api/import/latest", web::get().to(latest_import))
        .route("/api/taxonomy", web::get().to(taxonomy));
}

pub async fn start_server(config: AppConfig, taxonomy: Taxonomy) -> std::io::Result<()> {
    let port = config.port;
    let app_state = web::Data::new(AppState::new(&config, taxonomy));

    info!("Import surface listening on http://localhost:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::NaiveDate;

    fn state() -> web::Data<AppState> {
        let config = AppConfig::from_lookup(|key| match key {
            "ADMIN_PASSWORD" => Some("letmein".to_string()),
            "SCHEDULE_TIMEZONE" => Some("UTC".to_string()),
            _ => None,
        })
        .unwrap();
        let mut state = AppState::new(&config, Taxonomy::builtin().unwrap());
        state.options = state
            .options
            .clone()
            .with_default_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        web::Data::new(state)
    }

    const CSV: &str = "Start Time,Product Name,# Guests,Name\n\
9:15am,Tree Tops Zipline Tour,2,Ada\n\
10:00am,Tree Tops Zipline Tour,3,Grace\n\
11:00am,Sunset Kayak Tour,4,Linus\n";

    #[actix_web::test]
    async fn test_upload_requires_password() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/import/csv")
            .set_payload(CSV)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_upload_generates_and_stores_import() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/import/csv")
            .insert_header(("X-Admin-Password", "letmein"))
            .set_payload(CSV)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["totalShifts"], 2);
        assert_eq!(body["result"]["totalBookings"], 3);
        assert_eq!(body["result"]["totalGuests"], 9);

        let req = test::TestRequest::get().uri("/api/import/latest").to_request();
        let latest: ImportResult = test::call_and_read_body_json(&app, req).await;
        assert_eq!(latest.total_shifts, 2);
        assert_eq!(latest.unmatched[0].product, "Sunset Kayak Tour");
    }

    #[actix_web::test]
    async fn test_upload_with_bad_header_is_bad_request() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/import/csv")
            .insert_header(("X-Admin-Password", "letmein"))
            .set_payload("Date,Tour\n2024-06-01,Zip\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/import/latest").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_feed_import_without_url_is_bad_request() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/import/ics")
            .insert_header(("X-Admin-Password", "letmein"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
