//! Medication schedule bucketing and reminder expansion.
//!
//! Two total functions over free-text dosing specs:
//! - `build_schedule` buckets each dose into time-of-day slots from its
//!   frequency text (每日3次/tid, 每日2次/bid, 每日1次/qd, 必要时/prn);
//! - `expand_reminders` turns specs into dated reminder events over the
//!   parsed duration window.
//!
//! Expansion routes once-daily doses to the morning slot regardless of the
//! timing hint, while bucketing can route them to bedtime. The bedtime clock
//! time is kept in the slot table even though expansion never emits it.

use std::sync::OnceLock;

use chrono::{Days, NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

/// Duration window applied when the free-text duration has no number in it
/// (e.g. "长期").
const DEFAULT_DURATION_DAYS: u64 = 7;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// One medication line from a parsed prescription. All fields free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseEntry {
    pub name: String,
    pub dosage: String,
    /// How often per day, e.g. "每日3次" or "tid".
    pub frequency: String,
    /// When relative to meals/sleep, e.g. "饭后" or "睡前".
    pub timing: String,
    /// Treatment length, e.g. "7天". Free form.
    pub duration: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Fixed time-of-day slots a dose can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Morning,
    Noon,
    Evening,
    Bedtime,
    AsNeeded,
}

impl Slot {
    /// Reminder clock time for the slot. As-needed doses are not tied
    /// to a clock time.
    pub fn reminder_time(self) -> Option<NaiveTime> {
        let hhmm = match self {
            Slot::Morning => (8, 0),
            Slot::Noon => (12, 0),
            Slot::Evening => (18, 0),
            Slot::Bedtime => (21, 0),
            Slot::AsNeeded => return None,
        };
        NaiveTime::from_hms_opt(hhmm.0, hhmm.1, 0)
    }
}

/// How often per day a frequency text says to take a dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrequencyClass {
    ThreeTimesDaily,
    TwiceDaily,
    OnceDaily,
    AsNeeded,
    Unrecognized,
}

/// Classify a frequency text by substring, first match wins.
fn classify_frequency(frequency: &str) -> FrequencyClass {
    let f = frequency.to_lowercase();
    if f.contains("每日3次") || f.contains("tid") {
        FrequencyClass::ThreeTimesDaily
    } else if f.contains("每日2次") || f.contains("bid") {
        FrequencyClass::TwiceDaily
    } else if f.contains("每日1次") || f.contains("qd") {
        FrequencyClass::OnceDaily
    } else if f.contains("必要时") || f.contains("prn") {
        FrequencyClass::AsNeeded
    } else {
        FrequencyClass::Unrecognized
    }
}

// ═══════════════════════════════════════════════════════════
// Daily schedule bucketing
// ═══════════════════════════════════════════════════════════

/// Doses grouped by time-of-day slot. Entries are borrowed from the input;
/// a dose appears in every slot its frequency maps to, and in none when the
/// frequency is unrecognized.
#[derive(Debug, Default, Serialize)]
pub struct DailySchedule<'a> {
    pub morning: Vec<&'a DoseEntry>,
    pub noon: Vec<&'a DoseEntry>,
    pub evening: Vec<&'a DoseEntry>,
    pub bedtime: Vec<&'a DoseEntry>,
    pub as_needed: Vec<&'a DoseEntry>,
}

/// Bucket doses into the daily schedule.
pub fn build_schedule(entries: &[DoseEntry]) -> DailySchedule<'_> {
    let mut schedule = DailySchedule::default();

    for entry in entries {
        match classify_frequency(&entry.frequency) {
            FrequencyClass::ThreeTimesDaily => {
                schedule.morning.push(entry);
                schedule.noon.push(entry);
                schedule.evening.push(entry);
            }
            FrequencyClass::TwiceDaily => {
                schedule.morning.push(entry);
                schedule.evening.push(entry);
            }
            FrequencyClass::OnceDaily => {
                let timing = entry.timing.to_lowercase();
                if timing.contains('晚') || timing.contains("睡前") {
                    schedule.bedtime.push(entry);
                } else {
                    schedule.morning.push(entry);
                }
            }
            FrequencyClass::AsNeeded => schedule.as_needed.push(entry),
            FrequencyClass::Unrecognized => {}
        }
    }

    schedule
}

/// Patient-readable one-paragraph summary of a daily schedule.
pub fn schedule_summary(schedule: &DailySchedule<'_>) -> String {
    let mut summary = String::from("您的用药时间安排：\n");
    for (label, doses) in [
        ("早上", &schedule.morning),
        ("中午", &schedule.noon),
        ("晚上", &schedule.evening),
        ("睡前", &schedule.bedtime),
        ("必要时", &schedule.as_needed),
    ] {
        if !doses.is_empty() {
            summary.push_str(&format!("{}：{}种药\n", label, doses.len()));
        }
    }
    summary.trim_end().to_string()
}

// ═══════════════════════════════════════════════════════════
// Reminder expansion
// ═══════════════════════════════════════════════════════════

/// One dated medication reminder.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderEvent {
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_hhmm")]
    pub time: NaiveTime,
    pub medication: String,
    pub dosage: String,
    pub timing: String,
    pub message: String,
}

fn serialize_hhmm<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format("%H:%M"))
}

/// Daily reminder slots by frequency. Once-daily maps to morning only;
/// as-needed and unrecognized frequencies produce no dated reminders.
fn reminder_slots(class: FrequencyClass) -> &'static [Slot] {
    match class {
        FrequencyClass::ThreeTimesDaily => &[Slot::Morning, Slot::Noon, Slot::Evening],
        FrequencyClass::TwiceDaily => &[Slot::Morning, Slot::Evening],
        FrequencyClass::OnceDaily => &[Slot::Morning],
        FrequencyClass::AsNeeded | FrequencyClass::Unrecognized => &[],
    }
}

/// Expand doses into dated reminders starting at `start`.
///
/// Output order is deterministic: input order, then ascending date, then
/// slot order (morning, noon, evening).
pub fn expand_reminders(entries: &[DoseEntry], start: NaiveDate) -> Vec<ReminderEvent> {
    let mut reminders = Vec::new();

    for entry in entries {
        let days = parse_duration_days(&entry.duration);
        let slots = reminder_slots(classify_frequency(&entry.frequency));

        for offset in 0..days {
            let Some(date) = start.checked_add_days(Days::new(offset)) else {
                break;
            };
            for slot in slots {
                if let Some(time) = slot.reminder_time() {
                    reminders.push(ReminderEvent {
                        date,
                        time,
                        medication: entry.name.clone(),
                        dosage: entry.dosage.clone(),
                        timing: entry.timing.clone(),
                        message: format!("该吃药了：{} {}", entry.name, entry.dosage),
                    });
                }
            }
        }
    }

    reminders
}

/// Day count from a free-text duration: the first embedded integer, or
/// 7 when there is none. "疗程10到15天" yields 10.
pub fn parse_duration_days(duration: &str) -> u64 {
    static FIRST_INT: OnceLock<Regex> = OnceLock::new();
    let re = FIRST_INT.get_or_init(|| Regex::new(r"\d+").expect("valid literal regex"));

    re.find(duration)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(DEFAULT_DURATION_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, frequency: &str, timing: &str, duration: &str) -> DoseEntry {
        DoseEntry {
            name: name.to_string(),
            dosage: "1片".to_string(),
            frequency: frequency.to_string(),
            timing: timing.to_string(),
            duration: duration.to_string(),
            notes: None,
        }
    }

    fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn three_times_daily_fills_three_slots() {
        let entries = vec![entry("阿莫西林", "每日3次", "饭后", "7天")];
        let schedule = build_schedule(&entries);
        assert_eq!(schedule.morning.len(), 1);
        assert_eq!(schedule.noon.len(), 1);
        assert_eq!(schedule.evening.len(), 1);
        assert!(schedule.bedtime.is_empty());
        assert!(schedule.as_needed.is_empty());
    }

    #[test]
    fn tid_mnemonic_matches() {
        let entries = vec![entry("头孢", "TID", "饭后", "5天")];
        let schedule = build_schedule(&entries);
        assert_eq!(schedule.morning.len(), 1);
        assert_eq!(schedule.noon.len(), 1);
        assert_eq!(schedule.evening.len(), 1);
    }

    #[test]
    fn twice_daily_skips_noon() {
        let entries = vec![entry("二甲双胍", "每日2次", "饭后", "30天")];
        let schedule = build_schedule(&entries);
        assert_eq!(schedule.morning.len(), 1);
        assert!(schedule.noon.is_empty());
        assert_eq!(schedule.evening.len(), 1);
    }

    #[test]
    fn once_daily_defaults_to_morning() {
        let entries = vec![entry("氨氯地平", "每日1次", "饭前", "30天")];
        let schedule = build_schedule(&entries);
        assert_eq!(schedule.morning.len(), 1);
        assert!(schedule.bedtime.is_empty());
    }

    #[test]
    fn once_daily_evening_hint_goes_to_bedtime() {
        let entries = vec![entry("阿托伐他汀", "每日1次", "睡前", "30天")];
        let schedule = build_schedule(&entries);
        assert!(schedule.morning.is_empty());
        assert_eq!(schedule.bedtime.len(), 1);
    }

    #[test]
    fn as_needed_goes_to_its_own_bucket() {
        let entries = vec![entry("硝酸甘油", "必要时", "胸痛时", "长期")];
        let schedule = build_schedule(&entries);
        assert_eq!(schedule.as_needed.len(), 1);
        assert!(schedule.morning.is_empty());
    }

    #[test]
    fn unrecognized_frequency_lands_nowhere() {
        let entries = vec![entry("维生素D", "每周1次", "", "90天")];
        let schedule = build_schedule(&entries);
        assert!(schedule.morning.is_empty());
        assert!(schedule.noon.is_empty());
        assert!(schedule.evening.is_empty());
        assert!(schedule.bedtime.is_empty());
        assert!(schedule.as_needed.is_empty());
    }

    #[test]
    fn summary_counts_per_slot() {
        let entries = vec![
            entry("阿莫西林", "每日3次", "饭后", "7天"),
            entry("阿托伐他汀", "每日1次", "睡前", "30天"),
        ];
        let schedule = build_schedule(&entries);
        let summary = schedule_summary(&schedule);
        assert!(summary.starts_with("您的用药时间安排："));
        assert!(summary.contains("早上：1种药"));
        assert!(summary.contains("睡前：1种药"));
        assert!(!summary.contains("必要时"));
    }

    #[test]
    fn once_daily_ten_days_expands_to_ten_morning_reminders() {
        let entries = vec![entry("氨氯地平", "每日1次", "饭前", "10天")];
        let reminders = expand_reminders(&entries, start_date());
        assert_eq!(reminders.len(), 10);
        let morning = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        for (offset, reminder) in reminders.iter().enumerate() {
            assert_eq!(
                reminder.date,
                start_date() + Days::new(offset as u64),
                "dates ascend one per day"
            );
            assert_eq!(reminder.time, morning);
        }
    }

    #[test]
    fn bedtime_hint_still_expands_to_morning() {
        // Bucketing would place this dose at bedtime; expansion keeps the
        // once-daily → morning mapping.
        let entries = vec![entry("阿托伐他汀", "每日1次", "睡前", "3天")];
        let reminders = expand_reminders(&entries, start_date());
        assert_eq!(reminders.len(), 3);
        assert!(reminders
            .iter()
            .all(|r| r.time == NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
    }

    #[test]
    fn three_times_daily_orders_slots_within_each_day() {
        let entries = vec![entry("阿莫西林", "每日3次", "饭后", "2天")];
        let reminders = expand_reminders(&entries, start_date());
        assert_eq!(reminders.len(), 6);
        let times: Vec<String> = reminders
            .iter()
            .take(3)
            .map(|r| r.time.format("%H:%M").to_string())
            .collect();
        assert_eq!(times, ["08:00", "12:00", "18:00"]);
        assert_eq!(reminders[2].date, start_date());
        assert_eq!(reminders[3].date, start_date() + Days::new(1));
    }

    #[test]
    fn as_needed_expands_to_nothing() {
        let entries = vec![entry("硝酸甘油", "必要时", "胸痛时", "30天")];
        assert!(expand_reminders(&entries, start_date()).is_empty());
    }

    #[test]
    fn entries_expand_in_input_order() {
        let entries = vec![
            entry("阿莫西林", "每日2次", "饭后", "2天"),
            entry("氨氯地平", "每日1次", "饭前", "2天"),
        ];
        let reminders = expand_reminders(&entries, start_date());
        assert_eq!(reminders.len(), 6);
        assert!(reminders[..4].iter().all(|r| r.medication == "阿莫西林"));
        assert!(reminders[4..].iter().all(|r| r.medication == "氨氯地平"));
    }

    #[test]
    fn reminder_message_names_medication_and_dosage() {
        let entries = vec![entry("阿莫西林", "每日1次", "饭后", "1天")];
        let reminders = expand_reminders(&entries, start_date());
        assert_eq!(reminders[0].message, "该吃药了：阿莫西林 1片");
        assert_eq!(reminders[0].timing, "饭后");
    }

    #[test]
    fn reminder_time_serializes_as_hhmm() {
        let entries = vec![entry("阿莫西林", "每日1次", "饭后", "1天")];
        let reminders = expand_reminders(&entries, start_date());
        let json = serde_json::to_string(&reminders[0]).unwrap();
        assert!(json.contains("\"time\":\"08:00\""));
        assert!(json.contains("\"date\":\"2024-03-01\""));
    }

    #[test]
    fn duration_takes_first_embedded_integer() {
        assert_eq!(parse_duration_days("7天"), 7);
        assert_eq!(parse_duration_days("疗程10到15天"), 10);
        assert_eq!(parse_duration_days("共 14 天"), 14);
    }

    #[test]
    fn duration_without_number_defaults_to_a_week() {
        assert_eq!(parse_duration_days("长期"), 7);
        assert_eq!(parse_duration_days(""), 7);
    }

    #[test]
    fn bedtime_slot_keeps_its_clock_time() {
        // Unreachable from expansion, but the slot table still defines it.
        assert_eq!(
            Slot::Bedtime.reminder_time(),
            NaiveTime::from_hms_opt(21, 0, 0)
        );
        assert_eq!(Slot::AsNeeded.reminder_time(), None);
    }
}
