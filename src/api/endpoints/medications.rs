//! Medication guidance endpoints: prescription parsing, instructions,
//! daily schedules, reminders, pharmacy pickup, and interaction checks.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::medication::{
    self, InteractionReport, MedicationInstructions, PatientContext, PharmacyGuidance,
    PrescriptionParse,
};
use crate::schedule::{self, DailySchedule, DoseEntry, ReminderEvent};

#[derive(Deserialize)]
pub struct PrescriptionParseRequest {
    pub prescription_text: String,
}

/// `POST /api/medications/parse-prescription` — extract medications from
/// free prescription text.
pub async fn parse_prescription(
    State(ctx): State<ApiContext>,
    Json(request): Json<PrescriptionParseRequest>,
) -> Json<PrescriptionParse> {
    let parse = ctx
        .medication_guide
        .parse_prescription(&request.prescription_text)
        .await;
    Json(parse)
}

#[derive(Deserialize)]
pub struct InstructionRequest {
    pub user_id: i64,
    pub medication_name: String,
}

/// `POST /api/medications/instructions` — elderly-friendly usage
/// explanation, aware of the patient's allergies and history.
pub async fn instructions(
    State(ctx): State<ApiContext>,
    Json(request): Json<InstructionRequest>,
) -> Result<Json<MedicationInstructions>, ApiError> {
    let patient = {
        let conn = ctx.db()?;
        let user = repository::get_user(&conn, request.user_id)?
            .ok_or_else(|| ApiError::NotFound("用户不存在".to_string()))?;
        PatientContext {
            allergies: user.allergies,
            chronic_diseases: user.chronic_diseases,
        }
    };

    let result = ctx
        .medication_guide
        .medication_instructions(&request.medication_name, &patient)
        .await;
    Ok(Json(result))
}

#[derive(Deserialize)]
pub struct ScheduleRequest {
    pub medications: Vec<DoseEntry>,
}

#[derive(Serialize)]
struct ScheduleResponse<'a> {
    success: bool,
    schedule: DailySchedule<'a>,
    summary: String,
}

/// `POST /api/medications/schedule` — bucket doses into a daily schedule.
pub async fn create_schedule(
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let daily = schedule::build_schedule(&request.medications);
    let summary = schedule::schedule_summary(&daily);

    tracing::info!(medications = request.medications.len(), "daily schedule built");

    // The schedule borrows the request body, so serialize before returning.
    let body = serde_json::to_value(ScheduleResponse {
        success: true,
        schedule: daily,
        summary,
    })
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(body))
}

#[derive(Deserialize)]
pub struct ReminderRequest {
    pub user_id: i64,
    pub medications: Vec<DoseEntry>,
    #[serde(default)]
    pub start_date: Option<String>,
}

#[derive(Serialize)]
pub struct ReminderResponse {
    pub success: bool,
    pub count: usize,
    pub reminders: Vec<ReminderEvent>,
}

/// `POST /api/medications/reminders` — dated reminders over each dose's
/// duration window, starting today unless a start date is given.
pub async fn generate_reminders(
    Json(request): Json<ReminderRequest>,
) -> Result<Json<ReminderResponse>, ApiError> {
    let start = match &request.start_date {
        Some(raw) => chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest("开始日期格式不正确".to_string()))?,
        None => chrono::Local::now().date_naive(),
    };

    let reminders = schedule::expand_reminders(&request.medications, start);

    tracing::info!(
        user_id = request.user_id,
        count = reminders.len(),
        "medication reminders generated"
    );
    Ok(Json(ReminderResponse {
        success: true,
        count: reminders.len(),
        reminders,
    }))
}

#[derive(Serialize)]
pub struct PharmacyResponse {
    pub success: bool,
    pub hospital_name: String,
    #[serde(flatten)]
    pub guidance: PharmacyGuidance,
}

/// `GET /api/medications/pharmacy-guidance/:hospital_name` — pickup steps.
pub async fn pharmacy_guidance(Path(hospital_name): Path<String>) -> Json<PharmacyResponse> {
    Json(PharmacyResponse {
        success: true,
        hospital_name,
        guidance: medication::pharmacy_guidance(),
    })
}

/// `POST /api/medications/check-interactions` — pairwise interaction check.
pub async fn check_interactions(
    Json(medications): Json<Vec<String>>,
) -> Json<InteractionReport> {
    Json(medication::check_interactions(&medications))
}
