//! Symptom analysis, hospital search, and appointment booking endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::analyzer::{PatientInfo, SymptomAnalysis};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::booking::{self, BookingOrder};
use crate::db::repository::{self, NewAppointment};
use crate::directory;
use crate::models::{Appointment, AppointmentStatus};

#[derive(Deserialize)]
pub struct SymptomAnalysisRequest {
    pub user_id: i64,
    pub symptoms: String,
}

/// `POST /api/appointments/analyze-symptoms` — analyze symptoms against
/// the patient's health profile and recommend a department.
pub async fn analyze_symptoms(
    State(ctx): State<ApiContext>,
    Json(request): Json<SymptomAnalysisRequest>,
) -> Result<Json<SymptomAnalysis>, ApiError> {
    // Load the health profile and release the lock before the model call.
    let patient = {
        let conn = ctx.db()?;
        let user = repository::get_user(&conn, request.user_id)?
            .ok_or_else(|| ApiError::NotFound("用户不存在".to_string()))?;
        PatientInfo {
            age: user.age,
            gender: user.gender,
            chronic_diseases: user.chronic_diseases,
            allergies: user.allergies,
        }
    };

    let analysis = ctx.analyzer.analyze(&request.symptoms, Some(&patient)).await;
    Ok(Json(analysis))
}

#[derive(Deserialize)]
pub struct HospitalQuery {
    pub location: String,
    pub department: Option<String>,
}

#[derive(Serialize)]
pub struct HospitalsResponse {
    pub success: bool,
    pub count: usize,
    pub hospitals: Vec<directory::Hospital>,
}

/// `GET /api/appointments/hospitals` — search the hospital directory.
pub async fn search_hospitals(
    Query(query): Query<HospitalQuery>,
) -> Json<HospitalsResponse> {
    let today = chrono::Local::now().date_naive();
    let hospitals =
        directory::search_hospitals(&query.location, query.department.as_deref(), today);

    Json(HospitalsResponse {
        success: true,
        count: hospitals.len(),
        hospitals,
    })
}

#[derive(Deserialize)]
pub struct SlotQuery {
    pub department: String,
    pub date: String,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub success: bool,
    pub hospital_id: String,
    pub department: String,
    pub date: String,
    pub slots: Vec<directory::BookingSlot>,
}

/// `GET /api/appointments/hospitals/:id/slots` — bookable time windows.
pub async fn available_slots(
    Path(hospital_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Json<SlotsResponse> {
    let slots = directory::available_slots(&hospital_id, &query.department, &query.date);

    Json(SlotsResponse {
        success: true,
        hospital_id,
        department: query.department,
        date: query.date,
        slots,
    })
}

#[derive(Deserialize)]
pub struct AppointmentCreate {
    pub user_id: i64,
    pub hospital_id: String,
    pub hospital_name: String,
    pub department: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    pub appointment_date: String,
    #[serde(default)]
    pub symptoms: Option<String>,
}

/// `POST /api/appointments` — book a visit and persist it.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(request): Json<AppointmentCreate>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment_date = parse_datetime(&request.appointment_date)
        .ok_or_else(|| ApiError::BadRequest("预约时间格式不正确".to_string()))?;

    let conn = ctx.db()?;
    let user = repository::get_user(&conn, request.user_id)?
        .ok_or_else(|| ApiError::NotFound("用户不存在".to_string()))?;

    let order = BookingOrder {
        patient_name: user.name,
        patient_phone: user.phone,
        hospital_id: request.hospital_id,
        hospital_name: request.hospital_name,
        department: request.department,
        doctor: request
            .doctor_name
            .clone()
            .unwrap_or_else(|| "门诊医生".to_string()),
        appointment_time: request.appointment_date.clone(),
    };

    let now = chrono::Local::now().naive_local();
    let confirmation = booking::confirm_booking(&order, now);

    let new_appointment = NewAppointment {
        user_id: request.user_id,
        hospital_name: order.hospital_name,
        department: order.department,
        doctor_name: request.doctor_name,
        appointment_date,
        appointment_number: Some(confirmation.appointment_number),
        symptoms: request.symptoms,
        ai_analysis: None,
        status: AppointmentStatus::Confirmed,
    };
    let id = repository::insert_appointment(&conn, &new_appointment, now)?;
    let appointment = repository::get_appointment(&conn, id)?
        .ok_or_else(|| ApiError::Internal("appointment vanished after insert".to_string()))?;

    Ok(Json(appointment))
}

/// `GET /api/appointments/:id` — appointment detail.
pub async fn get_one(
    State(ctx): State<ApiContext>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Appointment>, ApiError> {
    let conn = ctx.db()?;
    let appointment = repository::get_appointment(&conn, appointment_id)?
        .ok_or_else(|| ApiError::NotFound("预约不存在".to_string()))?;
    Ok(Json(appointment))
}

#[derive(Deserialize)]
pub struct UserAppointmentsQuery {
    pub status: Option<AppointmentStatus>,
}

#[derive(Serialize)]
pub struct UserAppointmentsResponse {
    pub success: bool,
    pub count: usize,
    pub appointments: Vec<Appointment>,
}

/// `GET /api/appointments/user/:user_id/appointments` — a patient's visits.
pub async fn list_for_user(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
    Query(query): Query<UserAppointmentsQuery>,
) -> Result<Json<UserAppointmentsResponse>, ApiError> {
    let conn = ctx.db()?;
    let appointments = repository::list_user_appointments(&conn, user_id, query.status)?;

    Ok(Json(UserAppointmentsResponse {
        success: true,
        count: appointments.len(),
        appointments,
    }))
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `PUT /api/appointments/:id/cancel` — cancel a visit.
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<CancelResponse>, ApiError> {
    let conn = ctx.db()?;
    let appointment = repository::get_appointment(&conn, appointment_id)?
        .ok_or_else(|| ApiError::NotFound("预约不存在".to_string()))?;

    let now = chrono::Local::now().naive_local();
    repository::set_appointment_status(&conn, appointment_id, AppointmentStatus::Cancelled, now)?;

    tracing::info!(
        appointment_id,
        appointment_number = appointment.appointment_number.as_deref().unwrap_or("-"),
        "appointment cancelled"
    );
    Ok(Json(CancelResponse {
        success: true,
        message: "预约已取消",
    }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub appointment_id: i64,
    pub appointment_number: Option<String>,
    pub status: &'static str,
    pub queue_number: u32,
    pub estimated_wait_time: &'static str,
}

/// `GET /api/appointments/:id/status` — live queue status (mock).
pub async fn live_status(
    State(ctx): State<ApiContext>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    let conn = ctx.db()?;
    let appointment = repository::get_appointment(&conn, appointment_id)?
        .ok_or_else(|| ApiError::NotFound("预约不存在".to_string()))?;

    let live = booking::live_status(appointment.appointment_number.as_deref().unwrap_or(""));

    Ok(Json(StatusResponse {
        appointment_id,
        appointment_number: appointment.appointment_number,
        status: live.status,
        queue_number: live.queue_number,
        estimated_wait_time: live.estimated_wait_time,
    }))
}

/// Parse the loose datetime formats the frontend sends: full date-times
/// with `T` or space separators, minute precision, or a bare date.
fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_parsing_accepts_common_formats() {
        assert!(parse_datetime("2024-03-05T08:30:00").is_some());
        assert!(parse_datetime("2024-03-05 08:30").is_some());
        let midnight = parse_datetime("2024-03-05").unwrap();
        assert_eq!(midnight.time(), chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert!(parse_datetime("明天上午").is_none());
    }
}
