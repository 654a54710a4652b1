//! Medication guide — prescription parsing and plain-language instructions
//! via the chat model, pharmacy pickup steps, and a small drug-interaction
//! lookup.
//!
//! The LLM-backed calls follow the same error-flag contract as symptom
//! analysis: the public methods never fail, a failed upstream call comes
//! back as `success = false` with the error message attached.

use serde::Serialize;

use crate::llm::{ChatClient, ChatOptions, LlmError};

const PHARMACIST_PARSER_PROMPT: &str = "你是一个专业的药师助手，帮助解析和解释处方信息。";
const PHARMACIST_EXPLAINER_PROMPT: &str =
    "你是一个耐心的药师，用简单的话讲解用药知识，避免使用专业术语。";

/// Voice guidance reads at most this many characters of the instruction text.
const VOICE_GUIDE_CHARS: usize = 200;

// ═══════════════════════════════════════════════════════════
// LLM-backed guidance
// ═══════════════════════════════════════════════════════════

/// Result of parsing a prescription text through the model.
#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionParse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    pub parsed_at: String,
}

/// Plain-language instructions for one medication.
#[derive(Debug, Clone, Serialize)]
pub struct MedicationInstructions {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub medication_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_guide: Option<String>,
}

/// Patient context appended to the instruction prompt.
#[derive(Debug, Clone, Default)]
pub struct PatientContext {
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
}

pub struct MedicationGuide {
    client: ChatClient,
}

impl MedicationGuide {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Parse free-text prescription content through the model. Never fails.
    pub async fn parse_prescription(&self, prescription_text: &str) -> PrescriptionParse {
        let trace_id = uuid::Uuid::new_v4();
        let prompt = format!(
            "请解析以下处方信息，提取药品名称、用法用量：\n\n{prescription_text}\n\n\
             请以JSON格式返回，包含以下字段：\n\
             - medications: 药品列表，每个药品包含：\n\
             - name: 药品名称\n\
             - dosage: 剂量\n\
             - frequency: 服用频率（如：每日3次）\n\
             - timing: 服用时间（如：饭后）\n\
             - duration: 疗程（如：7天）\n\
             - notes: 注意事项"
        );

        let result = self
            .client
            .chat(
                PHARMACIST_PARSER_PROMPT,
                &prompt,
                ChatOptions {
                    temperature: 0.2,
                    max_tokens: None,
                },
            )
            .await;

        let parsed_at = chrono::Local::now().to_rfc3339();
        match result {
            Ok(reply) => {
                tracing::info!(%trace_id, "prescription parsed");
                PrescriptionParse {
                    success: true,
                    error: None,
                    raw_text: prescription_text.to_string(),
                    ai_response: Some(reply),
                    parsed_at,
                }
            }
            Err(e) => {
                tracing::error!(%trace_id, error = %e, "prescription parsing failed");
                PrescriptionParse {
                    success: false,
                    error: Some(e.to_string()),
                    raw_text: prescription_text.to_string(),
                    ai_response: None,
                    parsed_at,
                }
            }
        }
    }

    /// Explain a medication in elderly-friendly language. Never fails.
    pub async fn medication_instructions(
        &self,
        medication_name: &str,
        patient: &PatientContext,
    ) -> MedicationInstructions {
        let mut prompt = format!(
            "请用简单易懂的语言，为老年人讲解{medication_name}的用法用量和注意事项。"
        );
        if let Some(allergies) = &patient.allergies {
            prompt.push_str(&format!("\n患者过敏史：{allergies}"));
        }
        if let Some(diseases) = &patient.chronic_diseases {
            prompt.push_str(&format!("\n患者病史：{diseases}"));
        }

        let result = self
            .client
            .chat(
                PHARMACIST_EXPLAINER_PROMPT,
                &prompt,
                ChatOptions {
                    temperature: 0.3,
                    max_tokens: None,
                },
            )
            .await;

        match result {
            Ok(instructions) => {
                tracing::info!(medication = medication_name, "medication instructions generated");
                let voice_guide = voice_instructions(medication_name, &instructions);
                MedicationInstructions {
                    success: true,
                    error: None,
                    medication_name: medication_name.to_string(),
                    instructions: Some(instructions),
                    voice_guide: Some(voice_guide),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "medication instruction generation failed");
                MedicationInstructions {
                    success: false,
                    error: Some(e.to_string()),
                    medication_name: medication_name.to_string(),
                    instructions: None,
                    voice_guide: None,
                }
            }
        }
    }
}

/// Shortened instruction text suitable for voice playback.
fn voice_instructions(medication_name: &str, instructions: &str) -> String {
    let summary: String = instructions.chars().take(VOICE_GUIDE_CHARS).collect();
    format!("{medication_name}的服用方法：{summary}")
}

// ═══════════════════════════════════════════════════════════
// Pharmacy pickup steps
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct PharmacyStep {
    pub step: u8,
    pub action: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PharmacyGuidance {
    pub title: &'static str,
    pub steps: Vec<PharmacyStep>,
    pub tips: Vec<&'static str>,
}

/// Step-by-step pharmacy pickup walkthrough. Static copy, same for every
/// hospital.
pub fn pharmacy_guidance() -> PharmacyGuidance {
    PharmacyGuidance {
        title: "取药指导",
        steps: vec![
            PharmacyStep {
                step: 1,
                action: "找到药房位置",
                description: "通常在一楼大厅，有明显的「药房」标识",
            },
            PharmacyStep {
                step: 2,
                action: "准备缴费凭证",
                description: "把缴费单据拿在手上",
            },
            PharmacyStep {
                step: 3,
                action: "在窗口等待",
                description: "把凭证交给药房工作人员，然后坐下等待叫号",
            },
            PharmacyStep {
                step: 4,
                action: "取药并核对",
                description: "听到您的名字时到窗口取药，检查药品种类和数量",
            },
            PharmacyStep {
                step: 5,
                action: "咨询用法",
                description: "向药师询问每种药怎么吃，什么时间吃",
            },
        ],
        tips: vec![
            "药品较多时可以请药师帮忙用袋子分装",
            "记得询问药品的存储方法",
            "不明白的地方一定要问清楚",
            "把药师的叮嘱记在手机或纸上",
        ],
    }
}

// ═══════════════════════════════════════════════════════════
// Drug interaction lookup
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionSeverity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionWarning {
    pub pair: [String; 2],
    pub severity: InteractionSeverity,
    pub note: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionReport {
    pub success: bool,
    pub checked_medications: Vec<String>,
    pub has_interactions: bool,
    pub warnings: Vec<InteractionWarning>,
    pub advice: &'static str,
}

/// Known interacting pairs. A stand-in for a real interaction database;
/// pairs match order-independently on exact name.
const INTERACTION_PAIRS: &[(&str, &str, InteractionSeverity, &str)] = &[
    (
        "华法林",
        "阿司匹林",
        InteractionSeverity::High,
        "两药同用会明显增加出血风险，请务必告知医生",
    ),
    (
        "地高辛",
        "呋塞米",
        InteractionSeverity::Medium,
        "利尿剂引起的低钾会加重地高辛的毒性，需监测血钾",
    ),
    (
        "辛伐他汀",
        "克拉霉素",
        InteractionSeverity::High,
        "同服会升高他汀血药浓度，增加肌肉损伤风险",
    ),
    (
        "阿莫西林",
        "布洛芬",
        InteractionSeverity::Low,
        "短期同服一般安全，肾功能不好的老人需留意",
    ),
];

/// Check every pair of the given medications against the known table.
pub fn check_interactions(medications: &[String]) -> InteractionReport {
    let mut warnings = Vec::new();

    for (i, first) in medications.iter().enumerate() {
        for second in &medications[i + 1..] {
            for &(a, b, severity, note) in INTERACTION_PAIRS {
                let is_pair = (first == a && second == b) || (first == b && second == a);
                if is_pair {
                    warnings.push(InteractionWarning {
                        pair: [first.clone(), second.clone()],
                        severity,
                        note,
                    });
                }
            }
        }
    }

    InteractionReport {
        success: true,
        checked_medications: medications.to_vec(),
        has_interactions: !warnings.is_empty(),
        warnings,
        advice: "建议按医嘱服药，如有不适请及时就医",
    }
}
