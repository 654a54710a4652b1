//! Appointment confirmation against the (mock) hospital registration
//! platform: appointment numbers, check-in QR payloads, and the visit
//! instructions handed to the patient.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Details needed to register an appointment.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingOrder {
    pub patient_name: String,
    pub patient_phone: String,
    pub hospital_id: String,
    pub hospital_name: String,
    pub department: String,
    pub doctor: String,
    pub appointment_time: String,
}

/// Confirmed registration returned by the platform.
#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub appointment_number: String,
    pub hospital_id: String,
    pub hospital_name: String,
    pub department: String,
    pub doctor: String,
    pub appointment_time: String,
    pub patient_name: String,
    pub patient_phone: String,
    /// Check-in QR payload scanned at the registration kiosk.
    pub qr_code: String,
    pub instructions: String,
}

/// Mock live status of a registered appointment.
#[derive(Debug, Clone, Serialize)]
pub struct LiveStatus {
    pub status: &'static str,
    pub queue_number: u32,
    pub estimated_wait_time: &'static str,
}

/// Register the appointment. The appointment number is derived from the
/// confirmation instant, matching the hospital platform's GH-prefix format.
pub fn confirm_booking(order: &BookingOrder, confirmed_at: NaiveDateTime) -> BookingConfirmation {
    let appointment_number = format!("GH{}", confirmed_at.format("%Y%m%d%H%M%S"));
    let instructions =
        visit_instructions(&order.hospital_name, &order.department, &order.appointment_time);

    tracing::info!(
        appointment_number,
        patient = %order.patient_name,
        hospital = %order.hospital_name,
        department = %order.department,
        "appointment confirmed"
    );

    BookingConfirmation {
        qr_code: format!("QR_{appointment_number}"),
        appointment_number,
        hospital_id: order.hospital_id.clone(),
        hospital_name: order.hospital_name.clone(),
        department: order.department.clone(),
        doctor: order.doctor.clone(),
        appointment_time: order.appointment_time.clone(),
        patient_name: order.patient_name.clone(),
        patient_phone: order.patient_phone.clone(),
        instructions,
    }
}

/// Live queue status for an appointment number. Mock data.
pub fn live_status(_appointment_number: &str) -> LiveStatus {
    LiveStatus {
        status: "confirmed",
        queue_number: 5,
        estimated_wait_time: "30分钟",
    }
}

/// Patient-facing visit instructions for a confirmed appointment.
fn visit_instructions(hospital_name: &str, department: &str, appointment_time: &str) -> String {
    format!(
        "【就诊须知】\n\n\
         您已成功预约{hospital_name} {department}\n\n\
         就诊时间：{appointment_time}\n\n\
         请注意：\n\
         1. 请提前30分钟到达医院\n\
         2. 携带身份证、医保卡\n\
         3. 如需空腹检查，请不要进食\n\
         4. 到达后请先在自助机或窗口取号\n\
         5. 到相应科室候诊区等待叫号\n\n\
         如需帮助，请联系医院服务台或拨打医院电话。"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn order() -> BookingOrder {
        BookingOrder {
            patient_name: "王秀英".to_string(),
            patient_phone: "13800001234".to_string(),
            hospital_id: "h001".to_string(),
            hospital_name: "市人民医院".to_string(),
            department: "心血管内科".to_string(),
            doctor: "张主任".to_string(),
            appointment_time: "2024-03-05 08:00".to_string(),
        }
    }

    fn confirmed_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 15)
            .unwrap()
    }

    #[test]
    fn appointment_number_encodes_confirmation_instant() {
        let confirmation = confirm_booking(&order(), confirmed_at());
        assert_eq!(confirmation.appointment_number, "GH20240301093015");
        assert_eq!(confirmation.qr_code, "QR_GH20240301093015");
    }

    #[test]
    fn instructions_name_hospital_and_department() {
        let confirmation = confirm_booking(&order(), confirmed_at());
        assert!(confirmation.instructions.contains("市人民医院 心血管内科"));
        assert!(confirmation.instructions.contains("就诊时间：2024-03-05 08:00"));
        assert!(confirmation.instructions.starts_with("【就诊须知】"));
    }

    #[test]
    fn live_status_is_a_fixed_mock() {
        let status = live_status("GH20240301093015");
        assert_eq!(status.status, "confirmed");
        assert_eq!(status.queue_number, 5);
    }
}
