//! Department recommendation parsing from model free text.
//!
//! The upstream model is asked to answer in a three-field template
//! (【推荐科室】/【紧急程度】/【就医建议】) but is not guaranteed to emit it
//! cleanly. `classify` is therefore a forgiving single pass: labels are
//! detected by substring, values are taken after the last delimiter so the
//! label text may itself contain punctuation, and every miss falls back to
//! a safe default. It never fails — any text in, a usable recommendation out.

use serde::{Deserialize, Serialize};

/// Department used when no recommendation can be extracted.
pub const DEFAULT_DEPARTMENT: &str = "内科";

/// Three-level triage classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Urgent,
    SemiUrgent,
    Normal,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Urgent => "urgent",
            Urgency::SemiUrgent => "semi-urgent",
            Urgency::Normal => "normal",
        }
    }
}

/// Structured recommendation extracted from a model reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Primary department to register at. Never empty.
    pub recommended_department: String,
    /// Further departments listed alongside the primary one.
    pub alternative_departments: Vec<String>,
    pub urgency: Urgency,
    /// Free-text advice, possibly spanning several paragraphs. May be empty.
    pub advice: String,
}

impl Default for Recommendation {
    fn default() -> Self {
        Self {
            recommended_department: DEFAULT_DEPARTMENT.to_string(),
            alternative_departments: Vec::new(),
            urgency: Urgency::Normal,
            advice: String::new(),
        }
    }
}

/// Parse a model reply into a structured recommendation.
///
/// Lines are scanned in order. A department or urgency line found later
/// overrides an earlier one; the advice field consumes everything from its
/// label to the end of the reply, so scanning stops there.
pub fn classify(response: &str) -> Recommendation {
    let mut result = Recommendation::default();

    for raw_line in response.lines() {
        let line = raw_line.trim();

        if line.contains("【推荐科室】") || line.contains("推荐科室：") {
            let value = field_value(line);
            // "内科或心血管内科" and "内科,心血管内科" both list two departments.
            let joined = value.replace('或', ",");
            let mut departments = joined
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty());
            if let Some(first) = departments.next() {
                result.recommended_department = first.to_string();
                result.alternative_departments =
                    departments.map(str::to_string).collect();
            }
        } else if line.contains("【紧急程度】") || line.contains("紧急程度：") {
            let value = field_value(line).to_lowercase();
            result.urgency = if value.contains("urgent") || value.contains("紧急") {
                if value.contains("semi") {
                    Urgency::SemiUrgent
                } else {
                    Urgency::Urgent
                }
            } else {
                Urgency::Normal
            };
        } else if line.contains("【就医建议】") || line.contains("就医建议：") {
            // Advice spans to the end of the full reply, not just this line.
            if let Some(start) = response.find(line) {
                result.advice = response[start + line.len()..].trim().to_string();
            }
            break;
        }
    }

    result
}

/// Extract a field value: everything after the last `】`, then after the
/// last `：`, trimmed. Tolerates labels that carry either delimiter or both.
fn field_value(line: &str) -> &str {
    let after_bracket = match line.rfind('】') {
        Some(idx) => &line[idx + '】'.len_utf8()..],
        None => line,
    };
    let after_colon = match after_bracket.rfind('：') {
        Some(idx) => &after_bracket[idx + '：'.len_utf8()..],
        None => after_bracket,
    };
    after_colon.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_field_reply() {
        let reply = "【推荐科室】心血管内科\n【紧急程度】urgent\n【就医建议】请尽快就医";
        let result = classify(reply);
        assert_eq!(result.recommended_department, "心血管内科");
        assert!(result.alternative_departments.is_empty());
        assert_eq!(result.urgency, Urgency::Urgent);
        assert_eq!(result.advice, "请尽快就医");
    }

    #[test]
    fn colon_style_labels() {
        let reply = "推荐科室：消化内科\n紧急程度：normal\n就医建议：注意饮食清淡。";
        let result = classify(reply);
        assert_eq!(result.recommended_department, "消化内科");
        assert_eq!(result.urgency, Urgency::Normal);
        assert_eq!(result.advice, "注意饮食清淡。");
    }

    #[test]
    fn unlabelled_text_falls_back_to_defaults() {
        let result = classify("抱歉，我无法判断您的症状。");
        assert_eq!(result.recommended_department, DEFAULT_DEPARTMENT);
        assert!(result.alternative_departments.is_empty());
        assert_eq!(result.urgency, Urgency::Normal);
        assert_eq!(result.advice, "");
    }

    #[test]
    fn conjunction_splits_into_alternatives() {
        let result = classify("【推荐科室】内科或心血管内科");
        assert_eq!(result.recommended_department, "内科");
        assert_eq!(result.alternative_departments, vec!["心血管内科"]);
    }

    #[test]
    fn comma_list_splits_into_alternatives() {
        let result = classify("【推荐科室】呼吸内科, 内科, 耳鼻喉科");
        assert_eq!(result.recommended_department, "呼吸内科");
        assert_eq!(result.alternative_departments, vec!["内科", "耳鼻喉科"]);
    }

    #[test]
    fn semi_urgent_never_classifies_as_urgent() {
        let result = classify("【紧急程度】semi-urgent（较急）");
        assert_eq!(result.urgency, Urgency::SemiUrgent);
    }

    #[test]
    fn chinese_urgency_marker() {
        let result = classify("【紧急程度】紧急");
        assert_eq!(result.urgency, Urgency::Urgent);
    }

    #[test]
    fn advice_spans_to_end_of_reply() {
        let reply = "【推荐科室】骨科\n【紧急程度】normal\n【就医建议】建议拍摄X光片。\n\n就诊前请勿剧烈活动，\n可先冰敷缓解疼痛。";
        let result = classify(reply);
        assert_eq!(
            result.advice,
            "建议拍摄X光片。\n\n就诊前请勿剧烈活动，\n可先冰敷缓解疼痛。"
        );
    }

    #[test]
    fn scanning_stops_after_advice() {
        // A department line inside the advice body belongs to the advice.
        let reply = "【推荐科室】内科\n【就医建议】如无好转，\n推荐科室：急诊科";
        let result = classify(reply);
        assert_eq!(result.recommended_department, "内科");
        assert!(result.advice.contains("急诊科"));
    }

    #[test]
    fn label_with_decorations_still_extracts() {
        // The model sometimes numbers or re-brackets its answers.
        let result = classify("1. 【推荐科室】：皮肤科");
        assert_eq!(result.recommended_department, "皮肤科");
    }

    #[test]
    fn empty_department_value_keeps_fallback() {
        let result = classify("【推荐科室】\n【紧急程度】normal");
        assert_eq!(result.recommended_department, DEFAULT_DEPARTMENT);
    }

    #[test]
    fn later_department_line_wins() {
        let reply = "【推荐科室】内科\n【推荐科室】神经内科";
        let result = classify(reply);
        assert_eq!(result.recommended_department, "神经内科");
    }

    #[test]
    fn urgency_serializes_kebab_case() {
        let json = serde_json::to_string(&Urgency::SemiUrgent).unwrap();
        assert_eq!(json, "\"semi-urgent\"");
    }
}
