use actix_multipart::{Multipart, MultipartError};
use actix_web::{HttpRequest, HttpResponse, error, web};
use futures::TryStreamExt;
use log::{error, info, warn};
use shared::{ChatRequest, ColorRequest, ErrorResponse, HealthResponse};
use uuid::Uuid;

use crate::analysis::StylistService;
use crate::config::ServerConfig;

const UPLOAD_FIELD: &str = "file";
const HEALTH_MESSAGE: &str = "ChromaVision Ultimate Backend Running";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(web::resource("/").route(web::get().to(health)))
        .service(web::resource("/analyze").route(web::post().to(analyze_image)))
        .service(web::resource("/chat").route(web::post().to(chat_with_stylist)))
        .service(web::resource("/recommend-colors").route(web::post().to(recommend_colors)));
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = format!("Invalid request body: {}", err);
    warn!("{}", message);
    error::InternalError::from_response(err, HttpResponse::BadRequest().json(ErrorResponse::new(message)))
        .into()
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(message))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        message: HEALTH_MESSAGE.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Image exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },
}

impl UploadError {
    /// True when the request never was a readable multipart body, as opposed
    /// to a stream that broke while being read.
    fn is_malformed_request(&self) -> bool {
        matches!(
            self,
            UploadError::Multipart(
                MultipartError::ContentTypeMissing
                    | MultipartError::ContentTypeParse
                    | MultipartError::ContentTypeIncompatible
                    | MultipartError::BoundaryMissing
            )
        )
    }
}

/// Reads the `file` field of the multipart body. Other fields are drained
/// and ignored.
async fn read_upload(payload: &mut Multipart, limit: usize) -> Result<Option<Vec<u8>>, UploadError> {
    let mut image_data: Option<Vec<u8>> = None;

    while let Some(mut field) = payload.try_next().await? {
        let wanted = image_data.is_none() && field.name() == Some(UPLOAD_FIELD);
        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if !wanted {
                continue;
            }
            if data.len() + chunk.len() > limit {
                return Err(UploadError::TooLarge { limit });
            }
            data.extend_from_slice(&chunk);
        }
        if wanted {
            image_data = Some(data);
        }
    }

    Ok(image_data)
}

async fn analyze_image(
    service: web::Data<StylistService>,
    server_config: web::Data<ServerConfig>,
    mut payload: Multipart,
) -> HttpResponse {
    let request_id = Uuid::new_v4();

    let image_data = match read_upload(&mut payload, server_config.max_upload_bytes).await {
        Ok(Some(data)) if !data.is_empty() => data,
        Ok(Some(_)) => return bad_request("Uploaded file is empty"),
        Ok(None) => return bad_request("Missing multipart field 'file'"),
        Err(e @ UploadError::TooLarge { .. }) => {
            warn!("[{}] {}", request_id, e);
            return HttpResponse::PayloadTooLarge().json(ErrorResponse::new(e.to_string()));
        }
        Err(e) if e.is_malformed_request() => {
            warn!("[{}] Rejected upload: {}", request_id, e);
            return bad_request(&e.to_string());
        }
        Err(e) => {
            error!("[{}] Server error: {}", request_id, e);
            return HttpResponse::Ok().json(ErrorResponse::new(e.to_string()));
        }
    };

    info!("[{}] Analyzing upload of {} bytes", request_id, image_data.len());
    let response = service.analyze(image_data).await;
    info!("[{}] Analysis finished with tone {}", request_id, response.tone);

    HttpResponse::Ok().json(response)
}

async fn chat_with_stylist(
    service: web::Data<StylistService>,
    request: web::Json<ChatRequest>,
) -> HttpResponse {
    let ChatRequest { message, season } = request.into_inner();
    if message.trim().is_empty() {
        return bad_request("Field 'message' must not be empty");
    }
    if season.trim().is_empty() {
        return bad_request("Field 'season' must not be empty");
    }

    info!("Chat request for season {}", season.trim());
    HttpResponse::Ok().json(service.chat(&message, season.trim()).await)
}

async fn recommend_colors(
    service: web::Data<StylistService>,
    request: web::Json<ColorRequest>,
) -> HttpResponse {
    let season = request.season.trim();
    if season.is_empty() {
        return bad_request("Field 'season' must not be empty");
    }

    info!("Palette request for season {}", season);
    HttpResponse::Ok().json(service.recommend_colors(season).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::testing::ScriptedModel;
    use crate::vision::mask::tests::portrait_png;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;

    const BOUNDARY: &str = "chromavision-test-boundary";

    fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"face.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(field: &str, data: &[u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/analyze")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(field, data))
    }

    macro_rules! app {
        ($model:expr) => {
            app!($model, ServerConfig::default())
        };
        ($model:expr, $server:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(StylistService::new(
                        Arc::new($model),
                        Duration::from_secs(5),
                    )))
                    .app_data(web::Data::new($server))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_running() {
        let app = app!(ScriptedModel::failing());
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request())
                .await;
        assert_eq!(body, json!({ "message": HEALTH_MESSAGE }));
    }

    #[actix_web::test]
    async fn analyze_with_model_failure_still_succeeds() {
        let app = app!(ScriptedModel::failing());
        let resp = test::call_service(&app, upload("file", &portrait_png()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["tone"], "Unknown");
        assert_eq!(body["confidence"], 0);
        assert!(body["features"]["masked_image"].is_string());
        assert_eq!(body["features"]["rgb"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["message"], "Hybrid Analysis Complete");
    }

    #[actix_web::test]
    async fn analyze_merges_classification() {
        let app = app!(ScriptedModel::replying(
            "```json\n{\"tone\": \"Warm Autumn\", \"confidence\": 95, \"reason\": \"Undertone emas.\"}\n```"
        ));
        let body: Value =
            test::call_and_read_body_json(&app, upload("file", &portrait_png()).to_request()).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["tone"], "Warm Autumn");
        assert_eq!(body["confidence"], 95);
        assert_eq!(body["reason"], "Undertone emas.");
    }

    #[actix_web::test]
    async fn analyze_with_corrupt_image_returns_null_mask() {
        let app = app!(ScriptedModel::replying("{\"tone\": \"Summer\", \"confidence\": 60}"));
        let body: Value =
            test::call_and_read_body_json(&app, upload("file", b"garbage bytes").to_request())
                .await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["tone"], "Summer");
        assert!(body["features"]["masked_image"].is_null());
        assert_eq!(body["features"]["rgb"], json!([0, 0, 0]));
    }

    #[actix_web::test]
    async fn analyze_without_file_field_is_rejected() {
        let app = app!(ScriptedModel::failing());
        let resp = test::call_service(&app, upload("photo", &portrait_png()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
    }

    #[actix_web::test]
    async fn analyze_rejects_non_multipart_body() {
        let app = app!(ScriptedModel::failing());
        let req = test::TestRequest::post()
            .uri("/analyze")
            .insert_header(("content-type", "image/png"))
            .set_payload(portrait_png())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
    }

    #[actix_web::test]
    async fn analyze_rejects_multipart_without_boundary() {
        let app = app!(ScriptedModel::failing());
        let req = test::TestRequest::post()
            .uri("/analyze")
            .insert_header(("content-type", "multipart/form-data"))
            .set_payload(multipart_body("file", &portrait_png()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn analyze_rejects_oversized_upload() {
        let server = ServerConfig {
            max_upload_bytes: 64,
            ..ServerConfig::default()
        };
        let app = app!(ScriptedModel::failing(), server);
        let resp = test::call_service(&app, upload("file", &portrait_png()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn chat_failure_returns_apology_with_success_status() {
        let app = app!(ScriptedModel::failing());
        let req = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({ "message": "halo", "season": "Winter" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!({ "status": "success", "reply": "Maaf, otak AI saya sedang gangguan." })
        );
    }

    #[actix_web::test]
    async fn chat_returns_model_reply() {
        let app = app!(ScriptedModel::replying("Pakai warna emerald ya! 💚"));
        let req = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({ "message": "baju apa?", "season": "Winter" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["reply"], "Pakai warna emerald ya! 💚");
    }

    #[actix_web::test]
    async fn chat_requires_message_and_season() {
        let app = app!(ScriptedModel::failing());
        for payload in [
            json!({ "message": "halo" }),
            json!({ "season": "Winter" }),
            json!({ "message": "   ", "season": "Winter" }),
            json!({ "message": "halo", "season": "" }),
            json!({ "message": 42, "season": "Winter" }),
        ] {
            let req = test::TestRequest::post()
                .uri("/chat")
                .set_json(&payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["status"], "error");
        }
    }

    #[actix_web::test]
    async fn recommend_colors_failure_returns_fallback() {
        let app = app!(ScriptedModel::failing());
        let req = test::TestRequest::post()
            .uri("/recommend-colors")
            .set_json(json!({ "season": "Spring" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!({
                "status": "error",
                "data": {
                    "description": "Gagal memuat AI. Ini rekomendasi standar.",
                    "colors": ["#333333", "#777777", "#999999", "#000000", "#FFFFFF", "#555555"]
                }
            })
        );
    }

    #[actix_web::test]
    async fn recommend_colors_returns_model_palette() {
        let app = app!(ScriptedModel::replying(
            "{\"description\": \"Cerah dan segar.\", \"colors\": [\"#FF7F50\", \"#FFD700\", \"#98FB98\", \"#40E0D0\", \"#FFB6C1\", \"#F0E68C\"]}"
        ));
        let req = test::TestRequest::post()
            .uri("/recommend-colors")
            .set_json(json!({ "season": "Spring" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["colors"].as_array().map(Vec::len), Some(6));
    }

    #[actix_web::test]
    async fn recommend_colors_requires_season() {
        let app = app!(ScriptedModel::failing());
        let req = test::TestRequest::post()
            .uri("/recommend-colors")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
