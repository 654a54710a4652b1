//! Persisted entities: patients, appointments, guidance logs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// A patient profile, including the health-record fields the analyzer
/// feeds into its prompt.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_card: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields accepted when registering a patient.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub id_card: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub chronic_diseases: Option<String>,
}

/// Partial update for a patient profile. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
}

/// A booked hospital visit.
#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: i64,
    pub user_id: i64,
    pub hospital_name: String,
    pub department: String,
    pub doctor_name: Option<String>,
    pub appointment_date: NaiveDateTime,
    pub appointment_number: Option<String>,
    pub symptoms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// One delivered guidance step, for the visit history screen.
#[derive(Debug, Clone, Serialize)]
pub struct GuidanceLog {
    pub id: i64,
    pub user_id: i64,
    pub appointment_id: Option<i64>,
    pub guidance_type: String,
    pub guidance_content: String,
    pub is_completed: bool,
    pub created_at: NaiveDateTime,
}
