//! Visit-flow guidance endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::guidance::{
    self, AppointmentSummary, FullGuidance, GuidanceContext, LocationGuide, StageGuidance,
    StageOverview, VisitStage, STAGE_ORDER,
};

/// `GET /api/guidance/appointment/:id/full` — the whole visit at a glance.
pub async fn full_for_appointment(
    State(ctx): State<ApiContext>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<FullGuidance>, ApiError> {
    let conn = ctx.db()?;
    let appointment = repository::get_appointment(&conn, appointment_id)?
        .ok_or_else(|| ApiError::NotFound("预约不存在".to_string()))?;

    let summary = AppointmentSummary {
        hospital_name: appointment.hospital_name,
        department: appointment.department,
        doctor_name: appointment.doctor_name,
        appointment_time: appointment.appointment_date.to_string(),
        appointment_number: appointment.appointment_number,
    };

    Ok(Json(guidance::full_guidance(summary)))
}

#[derive(Deserialize)]
pub struct StepRequest {
    pub user_id: i64,
    pub appointment_id: i64,
    pub current_step: String,
}

#[derive(Serialize)]
pub struct StepResponse {
    pub success: bool,
    #[serde(flatten)]
    pub guidance: StageGuidance,
}

/// `POST /api/guidance/step` — walkthrough for the patient's current stage,
/// logged to their guidance history.
pub async fn step(
    State(ctx): State<ApiContext>,
    Json(request): Json<StepRequest>,
) -> Result<Json<StepResponse>, ApiError> {
    let stage: VisitStage = request
        .current_step
        .parse()
        .map_err(|_| ApiError::BadRequest("未知步骤".to_string()))?;

    let conn = ctx.db()?;
    let appointment = repository::get_appointment(&conn, request.appointment_id)?
        .ok_or_else(|| ApiError::NotFound("预约不存在".to_string()))?;

    let context = GuidanceContext {
        age: None,
        department: Some(appointment.department),
    };
    let stage_guidance = guidance::stage_guidance(stage, Some(&context));

    let content = serde_json::to_string(&stage_guidance)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let now = chrono::Local::now().naive_local();
    repository::insert_guidance_log(
        &conn,
        request.user_id,
        Some(request.appointment_id),
        stage.as_str(),
        &content,
        now,
    )?;

    tracing::info!(
        user_id = request.user_id,
        stage = stage.as_str(),
        "stage guidance delivered"
    );
    Ok(Json(StepResponse {
        success: true,
        guidance: stage_guidance,
    }))
}

#[derive(Deserialize)]
pub struct LocationRequest {
    pub hospital_id: String,
    pub target_location: String,
}

#[derive(Serialize)]
pub struct LocationResponse {
    pub success: bool,
    pub target: String,
    #[serde(flatten)]
    pub guide: LocationGuide,
}

/// `POST /api/guidance/location` — in-hospital wayfinding.
pub async fn location(Json(request): Json<LocationRequest>) -> Json<LocationResponse> {
    let guide = guidance::location_guidance(&request.target_location);

    Json(LocationResponse {
        success: true,
        target: request.target_location,
        guide,
    })
}

#[derive(Deserialize)]
pub struct VoiceQuery {
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "zh-CN".to_string()
}

#[derive(Serialize)]
pub struct VoiceResponse {
    pub success: bool,
    pub step: String,
    pub language: String,
    pub text: String,
}

/// `GET /api/guidance/voice/:step` — voice playback text for a stage.
pub async fn voice(
    Path(step): Path<String>,
    Query(query): Query<VoiceQuery>,
) -> Json<VoiceResponse> {
    let text = match step.parse::<VisitStage>() {
        Ok(stage) => guidance::voice_guidance(stage),
        Err(_) => "请按照医院指示进行操作".to_string(),
    };

    Json(VoiceResponse {
        success: true,
        step,
        language: query.language,
        text,
    })
}

#[derive(Serialize)]
pub struct StepsResponse {
    pub success: bool,
    pub steps: Vec<StageOverview>,
}

/// `GET /api/guidance/steps` — every stage of the visit flow.
pub async fn all_steps() -> Json<StepsResponse> {
    let steps = STAGE_ORDER
        .iter()
        .map(|stage| StageOverview {
            stage: *stage,
            name: stage.display_name(),
            steps: stage.steps(),
        })
        .collect();

    Json(StepsResponse {
        success: true,
        steps,
    })
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `PUT /api/guidance/log/:id/complete` — mark a guidance step done.
pub async fn complete_log(
    State(ctx): State<ApiContext>,
    Path(log_id): Path<i64>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let conn = ctx.db()?;
    if !repository::mark_guidance_completed(&conn, log_id)? {
        return Err(ApiError::NotFound("指导记录不存在".to_string()));
    }

    Ok(Json(CompleteResponse {
        success: true,
        message: "已标记完成",
    }))
}

#[derive(Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub guidance_type: String,
    pub is_completed: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub count: usize,
    pub history: Vec<HistoryEntry>,
}

/// `GET /api/guidance/user/:user_id/history` — recent guidance entries.
pub async fn history(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let conn = ctx.db()?;
    let logs = repository::list_guidance_history(&conn, user_id)?;

    let history: Vec<HistoryEntry> = logs
        .into_iter()
        .map(|log| HistoryEntry {
            id: log.id,
            guidance_type: log.guidance_type,
            is_completed: log.is_completed,
            created_at: log.created_at.to_string(),
        })
        .collect();

    Ok(Json(HistoryResponse {
        success: true,
        count: history.len(),
        history,
    }))
}
