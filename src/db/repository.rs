use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use super::DatabaseError;
use crate::models::{
    Appointment, AppointmentStatus, GuidanceLog, NewUser, User, UserUpdate,
};

// ═══════════════════════════════════════════
// User repository
// ═══════════════════════════════════════════

pub fn insert_user(conn: &Connection, user: &NewUser, now: NaiveDateTime) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (name, phone, id_card, age, gender, address,
         emergency_contact_name, emergency_contact_phone,
         medical_history, allergies, chronic_diseases, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            user.name,
            user.phone,
            user.id_card,
            user.age,
            user.gender,
            user.address,
            user.emergency_contact_name,
            user.emergency_contact_phone,
            user.medical_history,
            user.allergies,
            user.chronic_diseases,
            now,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const USER_COLUMNS: &str = "id, name, phone, id_card, age, gender, address,
     emergency_contact_name, emergency_contact_phone,
     medical_history, allergies, chronic_diseases, created_at, updated_at";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        id_card: row.get(3)?,
        age: row.get(4)?,
        gender: row.get(5)?,
        address: row.get(6)?,
        emergency_contact_name: row.get(7)?,
        emergency_contact_phone: row.get(8)?,
        medical_history: row.get(9)?,
        allergies: row.get(10)?,
        chronic_diseases: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        user_from_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_phone(conn: &Connection, phone: &str) -> Result<Option<User>, DatabaseError> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE phone = ?1"),
        params![phone],
        user_from_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Apply a partial update. Returns the updated user, or `None` when the id
/// does not exist.
pub fn update_user(
    conn: &Connection,
    id: i64,
    update: &UserUpdate,
    now: NaiveDateTime,
) -> Result<Option<User>, DatabaseError> {
    let Some(mut user) = get_user(conn, id)? else {
        return Ok(None);
    };

    if let Some(name) = &update.name {
        user.name = name.clone();
    }
    user.address = update.address.clone().or(user.address);
    user.emergency_contact_name = update
        .emergency_contact_name
        .clone()
        .or(user.emergency_contact_name);
    user.emergency_contact_phone = update
        .emergency_contact_phone
        .clone()
        .or(user.emergency_contact_phone);
    user.medical_history = update.medical_history.clone().or(user.medical_history);
    user.allergies = update.allergies.clone().or(user.allergies);
    user.chronic_diseases = update.chronic_diseases.clone().or(user.chronic_diseases);
    user.updated_at = now;

    conn.execute(
        "UPDATE users SET name = ?2, address = ?3,
         emergency_contact_name = ?4, emergency_contact_phone = ?5,
         medical_history = ?6, allergies = ?7, chronic_diseases = ?8,
         updated_at = ?9
         WHERE id = ?1",
        params![
            id,
            user.name,
            user.address,
            user.emergency_contact_name,
            user.emergency_contact_phone,
            user.medical_history,
            user.allergies,
            user.chronic_diseases,
            user.updated_at,
        ],
    )?;

    Ok(Some(user))
}

/// Delete a user. Returns false when the id does not exist.
pub fn delete_user(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

pub fn count_user_appointments(conn: &Connection, user_id: i64) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ═══════════════════════════════════════════
// Appointment repository
// ═══════════════════════════════════════════

/// Fields for a freshly booked appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: i64,
    pub hospital_name: String,
    pub department: String,
    pub doctor_name: Option<String>,
    pub appointment_date: NaiveDateTime,
    pub appointment_number: Option<String>,
    pub symptoms: Option<String>,
    pub ai_analysis: Option<String>,
    pub status: AppointmentStatus,
}

pub fn insert_appointment(
    conn: &Connection,
    appointment: &NewAppointment,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (user_id, hospital_name, department, doctor_name,
         appointment_date, appointment_number, symptoms, ai_analysis, status,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            appointment.user_id,
            appointment.hospital_name,
            appointment.department,
            appointment.doctor_name,
            appointment.appointment_date,
            appointment.appointment_number,
            appointment.symptoms,
            appointment.ai_analysis,
            appointment.status.as_str(),
            now,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const APPOINTMENT_COLUMNS: &str = "id, user_id, hospital_name, department, doctor_name,
     appointment_date, appointment_number, symptoms, ai_analysis, status,
     created_at, updated_at";

struct AppointmentRow {
    id: i64,
    user_id: i64,
    hospital_name: String,
    department: String,
    doctor_name: Option<String>,
    appointment_date: NaiveDateTime,
    appointment_number: Option<String>,
    symptoms: Option<String>,
    ai_analysis: Option<String>,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

fn appointment_row(row: &rusqlite::Row) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        hospital_name: row.get(2)?,
        department: row.get(3)?,
        doctor_name: row.get(4)?,
        appointment_date: row.get(5)?,
        appointment_number: row.get(6)?,
        symptoms: row.get(7)?,
        ai_analysis: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: row.id,
        user_id: row.user_id,
        hospital_name: row.hospital_name,
        department: row.department,
        doctor_name: row.doctor_name,
        appointment_date: row.appointment_date,
        appointment_number: row.appointment_number,
        symptoms: row.symptoms,
        ai_analysis: row.ai_analysis,
        status: AppointmentStatus::from_str(&row.status)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let result = conn.query_row(
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
        params![id],
        appointment_row,
    );

    match result {
        Ok(row) => Ok(Some(appointment_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List a user's appointments, newest visit date first, optionally filtered
/// by status.
pub fn list_user_appointments(
    conn: &Connection,
    user_id: i64,
    status: Option<AppointmentStatus>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
         ORDER BY appointment_date DESC"
    ))?;

    let rows = stmt.query_map(
        params![user_id, status.map(|s| s.as_str())],
        appointment_row,
    )?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

/// Update an appointment's status. Returns false when the id does not exist.
pub fn set_appointment_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
    now: NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, status.as_str(), now],
    )?;
    Ok(affected > 0)
}

// ═══════════════════════════════════════════
// Guidance log repository
// ═══════════════════════════════════════════

pub fn insert_guidance_log(
    conn: &Connection,
    user_id: i64,
    appointment_id: Option<i64>,
    guidance_type: &str,
    guidance_content: &str,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO guidance_logs (user_id, appointment_id, guidance_type,
         guidance_content, is_completed, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![user_id, appointment_id, guidance_type, guidance_content, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Mark a guidance log entry done. Returns false when the id does not exist.
pub fn mark_guidance_completed(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "UPDATE guidance_logs SET is_completed = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(affected > 0)
}

/// Most recent guidance entries for a user, capped at 50.
pub fn list_guidance_history(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<GuidanceLog>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, appointment_id, guidance_type, guidance_content,
         is_completed, created_at
         FROM guidance_logs WHERE user_id = ?1
         ORDER BY created_at DESC LIMIT 50",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok(GuidanceLog {
            id: row.get(0)?,
            user_id: row.get(1)?,
            appointment_id: row.get(2)?,
            guidance_type: row.get(3)?,
            guidance_content: row.get(4)?,
            is_completed: row.get::<_, i32>(5)? != 0,
            created_at: row.get(6)?,
        })
    })?;

    let mut logs = Vec::new();
    for row in rows {
        logs.push(row?);
    }
    Ok(logs)
}
