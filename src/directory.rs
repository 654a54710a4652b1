//! Mock hospital directory and booking slots.
//!
//! All data here is hardcoded and fictional — a stand-in for a real
//! hospital registration platform. Entries are plain immutable values so
//! the rest of the service treats this module like an external lookup.

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// A hospital in the mock directory.
#[derive(Debug, Clone, Serialize)]
pub struct Hospital {
    pub id: &'static str,
    pub name: &'static str,
    pub address: &'static str,
    /// Accreditation level, e.g. 三甲.
    pub level: &'static str,
    pub distance: &'static str,
    pub departments: Vec<&'static str>,
    pub available_dates: Vec<NaiveDate>,
}

/// One bookable time window for a department on a given date.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSlot {
    pub time: &'static str,
    pub available: bool,
    pub doctor: &'static str,
    pub title: &'static str,
}

/// The fixed directory, with booking windows opening from `today`.
fn directory(today: NaiveDate) -> Vec<Hospital> {
    vec![
        Hospital {
            id: "h001",
            name: "市人民医院",
            address: "城区人民路123号",
            level: "三甲",
            distance: "2.5公里",
            departments: vec!["内科", "外科", "心血管内科", "消化内科", "骨科"],
            available_dates: upcoming_dates(today, 7),
        },
        Hospital {
            id: "h002",
            name: "市中医院",
            address: "城区中山路456号",
            level: "三甲",
            distance: "3.8公里",
            departments: vec!["中医内科", "针灸科", "康复科", "骨伤科"],
            available_dates: upcoming_dates(today, 7),
        },
        Hospital {
            id: "h003",
            name: "区中心医院",
            address: "新区建设路789号",
            level: "二甲",
            distance: "4.2公里",
            departments: vec!["内科", "外科", "儿科", "妇科"],
            available_dates: upcoming_dates(today, 5),
        },
    ]
}

/// Search hospitals near a location, optionally filtered by department.
///
/// The department filter matches substrings, so 内科 also finds hospitals
/// that only list 心血管内科. The location is logged but does not narrow
/// the mock data.
pub fn search_hospitals(
    location: &str,
    department: Option<&str>,
    today: NaiveDate,
) -> Vec<Hospital> {
    let mut hospitals = directory(today);

    if let Some(department) = department {
        hospitals.retain(|h| h.departments.iter().any(|d| d.contains(department)));
    }

    tracing::info!(
        location,
        department = department.unwrap_or("-"),
        found = hospitals.len(),
        "hospital search"
    );
    hospitals
}

/// Bookable time windows for a department on a date. Fixed mock roster.
pub fn available_slots(hospital_id: &str, department: &str, date: &str) -> Vec<BookingSlot> {
    let slots = vec![
        BookingSlot { time: "08:00-08:30", available: true, doctor: "张主任", title: "主任医师" },
        BookingSlot { time: "08:30-09:00", available: true, doctor: "李医生", title: "副主任医师" },
        BookingSlot { time: "09:00-09:30", available: false, doctor: "王医生", title: "主治医师" },
        BookingSlot { time: "09:30-10:00", available: true, doctor: "赵医生", title: "主治医师" },
        BookingSlot { time: "10:00-10:30", available: true, doctor: "张主任", title: "主任医师" },
        BookingSlot { time: "14:00-14:30", available: true, doctor: "孙医生", title: "副主任医师" },
        BookingSlot { time: "14:30-15:00", available: true, doctor: "周医生", title: "主治医师" },
        BookingSlot { time: "15:00-15:30", available: false, doctor: "吴医生", title: "主任医师" },
        BookingSlot { time: "15:30-16:00", available: true, doctor: "郑医生", title: "主治医师" },
    ];

    tracing::info!(hospital_id, department, date, "slot lookup");
    slots
}

fn upcoming_dates(today: NaiveDate, days: u64) -> Vec<NaiveDate> {
    (1..=days)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn unfiltered_search_returns_all_hospitals() {
        let hospitals = search_hospitals("城区", None, today());
        assert_eq!(hospitals.len(), 3);
    }

    #[test]
    fn department_filter_matches_substring() {
        // 内科 matches 内科, 心血管内科, and 中医内科.
        let hospitals = search_hospitals("城区", Some("内科"), today());
        assert_eq!(hospitals.len(), 3);

        let cardio = search_hospitals("城区", Some("心血管内科"), today());
        assert_eq!(cardio.len(), 1);
        assert_eq!(cardio[0].id, "h001");
    }

    #[test]
    fn unknown_department_filters_everything_out() {
        let hospitals = search_hospitals("城区", Some("航天医学科"), today());
        assert!(hospitals.is_empty());
    }

    #[test]
    fn available_dates_start_tomorrow() {
        let hospitals = search_hospitals("城区", None, today());
        let dates = &hospitals[0].available_dates;
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], today() + Days::new(1));
        // The district hospital opens a shorter window.
        assert_eq!(hospitals[2].available_dates.len(), 5);
    }

    #[test]
    fn slot_roster_covers_morning_and_afternoon() {
        let slots = available_slots("h001", "内科", "2024-03-05");
        assert_eq!(slots.len(), 9);
        assert_eq!(slots.iter().filter(|s| !s.available).count(), 2);
        assert!(slots[0].time.starts_with("08:00"));
        assert!(slots[8].time.starts_with("15:30"));
    }
}
