//! API router assembly.
//!
//! Mirrors the original route layout: feature routers nested under
//! `/api/`, permissive CORS for the web frontend, request tracing on
//! every route.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints::{appointments, guidance, health, medications, users};
use crate::api::types::ApiContext;

/// Build the full application router.
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::check))
        .nest("/api/users", user_routes())
        .nest("/api/appointments", appointment_routes())
        .nest("/api/guidance", guidance_routes())
        .nest("/api/medications", medication_routes())
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn user_routes() -> Router<ApiContext> {
    Router::new()
        .route("/", post(users::create))
        .route(
            "/:id",
            get(users::get_one).put(users::update).delete(users::remove),
        )
        .route("/phone/:phone", get(users::by_phone))
        .route("/:id/health-profile", get(users::health_profile))
}

fn appointment_routes() -> Router<ApiContext> {
    Router::new()
        .route("/analyze-symptoms", post(appointments::analyze_symptoms))
        .route("/hospitals", get(appointments::search_hospitals))
        .route("/hospitals/:id/slots", get(appointments::available_slots))
        .route("/", post(appointments::create))
        .route("/:id", get(appointments::get_one))
        .route("/user/:user_id/appointments", get(appointments::list_for_user))
        .route("/:id/cancel", put(appointments::cancel))
        .route("/:id/status", get(appointments::live_status))
}

fn guidance_routes() -> Router<ApiContext> {
    Router::new()
        .route("/appointment/:id/full", get(guidance::full_for_appointment))
        .route("/step", post(guidance::step))
        .route("/location", post(guidance::location))
        .route("/voice/:step", get(guidance::voice))
        .route("/steps", get(guidance::all_steps))
        .route("/log/:id/complete", put(guidance::complete_log))
        .route("/user/:user_id/history", get(guidance::history))
}

fn medication_routes() -> Router<ApiContext> {
    Router::new()
        .route("/parse-prescription", post(medications::parse_prescription))
        .route("/instructions", post(medications::instructions))
        .route("/schedule", post(medications::create_schedule))
        .route("/reminders", post(medications::generate_reminders))
        .route(
            "/pharmacy-guidance/:hospital_name",
            get(medications::pharmacy_guidance),
        )
        .route("/check-interactions", post(medications::check_interactions))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analyzer::SymptomAnalyzer;
    use crate::db::sqlite::open_memory_database;
    use crate::llm::ChatClient;
    use crate::medication::MedicationGuide;

    fn test_router() -> Router {
        let conn = open_memory_database().unwrap();
        // Points at a dead port; routes that need the model are not
        // exercised here.
        let analyzer = SymptomAnalyzer::new(ChatClient::new(
            "http://127.0.0.1:9",
            "test-key",
            "gpt-4",
            1,
        ));
        let guide = MedicationGuide::new(ChatClient::new(
            "http://127.0.0.1:9",
            "test-key",
            "gpt-4",
            1,
        ));
        api_router(ApiContext::new(conn, analyzer, guide))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_reports_service_identity() {
        let response = test_router().oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "running");
        assert_eq!(body["app"], "医疗陪诊助手");
    }

    #[tokio::test]
    async fn health_check_is_healthy() {
        let response = test_router().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn user_lifecycle_create_fetch_update() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/users",
                json!({"name": "王秀英", "phone": "13800001234", "age": 72, "gender": "女"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response).await;
        assert_eq!(created["name"], "王秀英");
        let id = created["id"].as_i64().unwrap();

        // Duplicate phone is rejected.
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/users",
                json!({"name": "李四", "phone": "13800001234"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/users/{id}"),
                json!({"chronic_diseases": "高血压"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(get_request(&format!("/api/users/{id}/health-profile")))
            .await
            .unwrap();
        let profile = body_json(response).await;
        assert_eq!(profile["chronic_diseases"], "高血压");
        assert_eq!(profile["recent_appointments"], 0);
    }

    #[tokio::test]
    async fn missing_user_is_structured_404() {
        let response = test_router()
            .oneshot(get_request("/api/users/999"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "用户不存在");
    }

    #[tokio::test]
    async fn hospital_search_filters_by_department() {
        // department=心血管内科 (percent-encoded)
        let uri = "/api/appointments/hospitals?location=%E5%9F%8E%E5%8C%BA&department=%E5%BF%83%E8%A1%80%E7%AE%A1%E5%86%85%E7%A7%91";
        let response = test_router().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["hospitals"][0]["id"], "h001");
    }

    #[tokio::test]
    async fn booking_flow_create_cancel_list() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/users",
                json!({"name": "王秀英", "phone": "13800001234"}),
            ))
            .await
            .unwrap();
        let user_id = body_json(response).await["id"].as_i64().unwrap();

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/appointments",
                json!({
                    "user_id": user_id,
                    "hospital_id": "h001",
                    "hospital_name": "市人民医院",
                    "department": "心血管内科",
                    "appointment_date": "2030-03-05 08:00",
                    "symptoms": "胸闷气短"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let appointment = body_json(response).await;
        assert_eq!(appointment["status"], "confirmed");
        assert!(appointment["appointment_number"]
            .as_str()
            .unwrap()
            .starts_with("GH"));
        let appointment_id = appointment["id"].as_i64().unwrap();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/appointments/{appointment_id}/cancel"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(get_request(&format!(
                "/api/appointments/user/{user_id}/appointments?status=cancelled"
            )))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["appointments"][0]["status"], "cancelled");
    }

    #[tokio::test]
    async fn bad_appointment_date_is_rejected() {
        let router = test_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/appointments",
                json!({
                    "user_id": 1,
                    "hospital_id": "h001",
                    "hospital_name": "市人民医院",
                    "department": "内科",
                    "appointment_date": "下周二上午"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schedule_endpoint_buckets_doses() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/medications/schedule",
                json!({"medications": [{
                    "name": "阿莫西林",
                    "dosage": "1片",
                    "frequency": "每日3次",
                    "timing": "饭后",
                    "duration": "7天"
                }]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["schedule"]["morning"].as_array().unwrap().len(), 1);
        assert_eq!(body["schedule"]["noon"].as_array().unwrap().len(), 1);
        assert!(body["summary"].as_str().unwrap().contains("早上：1种药"));
    }

    #[tokio::test]
    async fn reminders_endpoint_expands_duration_window() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/medications/reminders",
                json!({
                    "user_id": 1,
                    "start_date": "2024-03-01",
                    "medications": [{
                        "name": "氨氯地平",
                        "dosage": "5mg",
                        "frequency": "每日1次",
                        "timing": "饭前",
                        "duration": "3天"
                    }]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 3);
        assert_eq!(body["reminders"][0]["date"], "2024-03-01");
        assert_eq!(body["reminders"][0]["time"], "08:00");
    }

    #[tokio::test]
    async fn guidance_steps_lists_the_whole_flow() {
        let response = test_router()
            .oneshot(get_request("/api/guidance/steps"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["steps"].as_array().unwrap().len(), 7);
        assert_eq!(body["steps"][0]["stage"], "registration");
        assert_eq!(body["steps"][0]["name"], "挂号取号");
    }

    #[tokio::test]
    async fn voice_endpoint_falls_back_for_unknown_steps() {
        let response = test_router()
            .oneshot(get_request("/api/guidance/voice/teleportation"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["text"], "请按照医院指示进行操作");
        assert_eq!(body["language"], "zh-CN");
    }

    #[tokio::test]
    async fn interaction_check_flags_known_pair() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/medications/check-interactions",
                json!(["华法林", "阿司匹林"]),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["has_interactions"], true);
        assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    }
}
