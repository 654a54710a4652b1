//! Symptom analysis — asks the model for a department recommendation and
//! parses its free-text reply.
//!
//! `analyze` is deliberately total: when the upstream chat call fails, the
//! caller still gets a usable result (default department, normal urgency,
//! canned advice) with `success = false`, mirroring the error-flag contract
//! the frontend expects.

use serde::{Deserialize, Serialize};

use crate::llm::{ChatClient, ChatOptions, LlmError};
use crate::triage::{self, Recommendation};

/// Departments the model is asked to choose from.
pub const DEPARTMENTS: &[&str] = &[
    "内科", "外科", "妇科", "儿科", "骨科", "神经内科", "心血管内科",
    "消化内科", "呼吸内科", "内分泌科", "肾内科", "皮肤科", "眼科",
    "耳鼻喉科", "口腔科", "泌尿外科", "胸外科", "神经外科", "肿瘤科",
    "精神科", "中医科", "康复科", "急诊科",
];

const SYSTEM_PROMPT: &str = "你是一个专业的医疗导诊助手，帮助患者分析症状并推荐合适的就医科室。你的回答要简洁明了，适合老年人理解。";

const FALLBACK_ADVICE: &str = "建议先挂内科，由医生进一步诊断。";

/// Health-profile fields that sharpen the recommendation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientInfo {
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub chronic_diseases: Option<String>,
    pub allergies: Option<String>,
}

/// Full analysis result returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SymptomAnalysis {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub original_symptoms: String,
    #[serde(flatten)]
    pub recommendation: Recommendation,
    /// Raw model reply, kept for display and audit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
}

/// Reference card for a department shown alongside the recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentInfo {
    pub description: String,
    pub common_symptoms: Vec<&'static str>,
    pub preparation: String,
}

pub struct SymptomAnalyzer {
    client: ChatClient,
}

impl SymptomAnalyzer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Analyze symptoms and recommend a department. Never fails.
    pub async fn analyze(&self, symptoms: &str, patient: Option<&PatientInfo>) -> SymptomAnalysis {
        let trace_id = uuid::Uuid::new_v4();
        let prompt = build_prompt(symptoms, patient);

        match self.request_analysis(&prompt).await {
            Ok(reply) => {
                let recommendation = triage::classify(&reply);
                tracing::info!(
                    %trace_id,
                    department = %recommendation.recommended_department,
                    urgency = recommendation.urgency.as_str(),
                    "symptom analysis complete"
                );
                SymptomAnalysis {
                    success: true,
                    error: None,
                    original_symptoms: symptoms.to_string(),
                    recommendation,
                    ai_analysis: Some(reply),
                }
            }
            Err(e) => {
                tracing::error!(%trace_id, error = %e, "symptom analysis failed, using fallback");
                fallback_analysis(symptoms, e)
            }
        }
    }

    async fn request_analysis(&self, prompt: &str) -> Result<String, LlmError> {
        self.client
            .chat(
                SYSTEM_PROMPT,
                prompt,
                ChatOptions {
                    temperature: 0.3,
                    max_tokens: Some(1000),
                },
            )
            .await
    }
}

/// Canned recommendation used when the upstream model is unreachable.
fn fallback_analysis(symptoms: &str, error: LlmError) -> SymptomAnalysis {
    SymptomAnalysis {
        success: false,
        error: Some(error.to_string()),
        original_symptoms: symptoms.to_string(),
        recommendation: Recommendation {
            advice: FALLBACK_ADVICE.to_string(),
            ..Recommendation::default()
        },
        ai_analysis: None,
    }
}

/// Assemble the analysis prompt: symptoms, optional health profile, the
/// department list, and the three-field answer template.
fn build_prompt(symptoms: &str, patient: Option<&PatientInfo>) -> String {
    let mut prompt = format!("患者症状：{symptoms}\n\n");

    if let Some(info) = patient {
        prompt.push_str("患者信息：\n");
        if let Some(age) = info.age {
            prompt.push_str(&format!("- 年龄：{age}岁\n"));
        }
        if let Some(gender) = &info.gender {
            prompt.push_str(&format!("- 性别：{gender}\n"));
        }
        if let Some(diseases) = &info.chronic_diseases {
            prompt.push_str(&format!("- 既往病史：{diseases}\n"));
        }
        if let Some(allergies) = &info.allergies {
            prompt.push_str(&format!("- 过敏史：{allergies}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "请根据症状分析并回答以下问题：\n\n\
         1. 推荐科室：从以下科室中选择最合适的（可以列出1-2个）\n   {}\n\n\
         2. 紧急程度：紧急(urgent)/较急(semi-urgent)/普通(normal)\n\n\
         3. 就医建议：给老人简单明了的建议，包括：\n\
         - 为什么推荐这个科室\n\
         - 去医院前需要注意什么\n\
         - 大概的就诊流程\n\n\
         请用以下格式回答：\n\
         【推荐科室】科室名称\n\
         【紧急程度】urgent/semi-urgent/normal\n\
         【就医建议】具体建议内容",
        DEPARTMENTS.join(", ")
    ));

    prompt
}

/// Reference card for a department; generic text for departments without
/// a curated entry.
pub fn department_info(department: &str) -> DepartmentInfo {
    match department {
        "内科" => DepartmentInfo {
            description: "诊治内科常见疾病，如感冒、发烧、咳嗽、腹泻等".to_string(),
            common_symptoms: vec!["发热", "咳嗽", "乏力", "头痛", "腹痛"],
            preparation: "无需特殊准备，如需抽血检查建议空腹".to_string(),
        },
        "心血管内科" => DepartmentInfo {
            description: "诊治心脏和血管相关疾病".to_string(),
            common_symptoms: vec!["胸闷", "胸痛", "心慌", "气短", "高血压"],
            preparation: "携带近期心电图和血压记录".to_string(),
        },
        "消化内科" => DepartmentInfo {
            description: "诊治消化系统疾病".to_string(),
            common_symptoms: vec!["胃痛", "腹泻", "便秘", "恶心", "呕吐"],
            preparation: "如需胃镜检查，需提前预约并空腹".to_string(),
        },
        other => DepartmentInfo {
            description: format!("{other}相关疾病诊治"),
            common_symptoms: Vec::new(),
            preparation: "按医院要求准备".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_symptoms_and_template() {
        let prompt = build_prompt("最近胸口闷，走路气短", None);
        assert!(prompt.starts_with("患者症状：最近胸口闷，走路气短"));
        assert!(prompt.contains("【推荐科室】"));
        assert!(prompt.contains("心血管内科"));
        assert!(!prompt.contains("患者信息"));
    }

    #[test]
    fn prompt_includes_health_profile_when_given() {
        let patient = PatientInfo {
            age: Some(72),
            gender: Some("女".to_string()),
            chronic_diseases: Some("高血压".to_string()),
            allergies: None,
        };
        let prompt = build_prompt("头晕", Some(&patient));
        assert!(prompt.contains("- 年龄：72岁"));
        assert!(prompt.contains("- 性别：女"));
        assert!(prompt.contains("- 既往病史：高血压"));
        assert!(!prompt.contains("过敏史"));
    }

    #[test]
    fn fallback_keeps_default_department_and_canned_advice() {
        let result = fallback_analysis("头疼", LlmError::EmptyResponse);
        assert!(!result.success);
        assert_eq!(result.recommendation.recommended_department, "内科");
        assert_eq!(result.recommendation.advice, FALLBACK_ADVICE);
        assert!(result.ai_analysis.is_none());
        assert_eq!(result.original_symptoms, "头疼");
    }

    #[test]
    fn analysis_flattens_recommendation_fields() {
        let result = fallback_analysis("头疼", LlmError::EmptyResponse);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["recommended_department"], "内科");
        assert_eq!(json["urgency"], "normal");
        assert_eq!(json["success"], false);
    }

    #[test]
    fn curated_department_info() {
        let info = department_info("心血管内科");
        assert!(info.common_symptoms.contains(&"胸闷"));
    }

    #[test]
    fn unknown_department_gets_generic_info() {
        let info = department_info("针灸科");
        assert_eq!(info.description, "针灸科相关疾病诊治");
        assert!(info.common_symptoms.is_empty());
    }
}
