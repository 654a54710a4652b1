//! Patient profile endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::{NewUser, User, UserUpdate};

/// Short profile returned on creation and lookup.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            phone: user.phone,
            age: user.age,
            gender: user.gender,
        }
    }
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /api/users` — register a patient.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(new_user): Json<NewUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let conn = ctx.db()?;

    if repository::get_user_by_phone(&conn, &new_user.phone)?.is_some() {
        return Err(ApiError::BadRequest("该手机号已注册".to_string()));
    }

    let now = chrono::Local::now().naive_local();
    let id = repository::insert_user(&conn, &new_user, now)?;
    let user = repository::get_user(&conn, id)?
        .ok_or_else(|| ApiError::Internal("user vanished after insert".to_string()))?;

    tracing::info!(user = %user.name, phone = %user.phone, "user created");
    Ok(Json(user.into()))
}

/// `GET /api/users/:id` — short profile.
pub async fn get_one(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let conn = ctx.db()?;
    let user = repository::get_user(&conn, user_id)?
        .ok_or_else(|| ApiError::NotFound("用户不存在".to_string()))?;
    Ok(Json(user.into()))
}

#[derive(Serialize)]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct UserByPhoneResponse {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
    pub emergency_contact: EmergencyContact,
}

/// `GET /api/users/phone/:phone` — full profile looked up by phone number.
pub async fn by_phone(
    State(ctx): State<ApiContext>,
    Path(phone): Path<String>,
) -> Result<Json<UserByPhoneResponse>, ApiError> {
    let conn = ctx.db()?;
    let user = repository::get_user_by_phone(&conn, &phone)?
        .ok_or_else(|| ApiError::NotFound("用户不存在".to_string()))?;

    Ok(Json(UserByPhoneResponse {
        id: user.id,
        name: user.name,
        phone: user.phone,
        age: user.age,
        gender: user.gender,
        medical_history: user.medical_history,
        allergies: user.allergies,
        chronic_diseases: user.chronic_diseases,
        emergency_contact: EmergencyContact {
            name: user.emergency_contact_name,
            phone: user.emergency_contact_phone,
        },
    }))
}

/// `PUT /api/users/:id` — partial profile update.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
    Json(user_update): Json<UserUpdate>,
) -> Result<Json<ActionResponse>, ApiError> {
    let conn = ctx.db()?;
    let now = chrono::Local::now().naive_local();
    let updated = repository::update_user(&conn, user_id, &user_update, now)?
        .ok_or_else(|| ApiError::NotFound("用户不存在".to_string()))?;

    tracing::info!(user = %updated.name, user_id, "user updated");
    Ok(Json(ActionResponse {
        success: true,
        message: "用户信息已更新",
    }))
}

/// `DELETE /api/users/:id` — remove a patient.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    let conn = ctx.db()?;
    if !repository::delete_user(&conn, user_id)? {
        return Err(ApiError::NotFound("用户不存在".to_string()));
    }

    tracing::info!(user_id, "user deleted");
    Ok(Json(ActionResponse {
        success: true,
        message: "用户已删除",
    }))
}

#[derive(Serialize)]
pub struct HealthProfileResponse {
    pub user_id: i64,
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
    pub recent_appointments: i64,
}

/// `GET /api/users/:id/health-profile` — the fields the analyzer feeds
/// into its prompt, plus visit counts.
pub async fn health_profile(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<HealthProfileResponse>, ApiError> {
    let conn = ctx.db()?;
    let user = repository::get_user(&conn, user_id)?
        .ok_or_else(|| ApiError::NotFound("用户不存在".to_string()))?;
    let recent_appointments = repository::count_user_appointments(&conn, user_id)?;

    Ok(Json(HealthProfileResponse {
        user_id: user.id,
        name: user.name,
        age: user.age,
        gender: user.gender,
        medical_history: user.medical_history,
        allergies: user.allergies,
        chronic_diseases: user.chronic_diseases,
        recent_appointments,
    }))
}
