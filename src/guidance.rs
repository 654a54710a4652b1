//! In-hospital visit guidance — static step-by-step walkthroughs of the
//! whole visit flow, written for elderly patients.
//!
//! Seven fixed stages from registration to follow-up. Each stage carries a
//! step list, optional tips, and voice-readable text. Nothing here calls
//! the model; the copy is curated, not generated.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Visit stages
// ═══════════════════════════════════════════════════════════

/// Stages of a hospital visit, in walking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStage {
    Registration,
    Waiting,
    Consultation,
    Examination,
    Payment,
    Pharmacy,
    FollowUp,
}

/// All stages in visit order.
pub const STAGE_ORDER: &[VisitStage] = &[
    VisitStage::Registration,
    VisitStage::Waiting,
    VisitStage::Consultation,
    VisitStage::Examination,
    VisitStage::Payment,
    VisitStage::Pharmacy,
    VisitStage::FollowUp,
];

impl VisitStage {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitStage::Registration => "registration",
            VisitStage::Waiting => "waiting",
            VisitStage::Consultation => "consultation",
            VisitStage::Examination => "examination",
            VisitStage::Payment => "payment",
            VisitStage::Pharmacy => "pharmacy",
            VisitStage::FollowUp => "follow_up",
        }
    }

    /// Patient-facing stage name.
    pub fn display_name(self) -> &'static str {
        match self {
            VisitStage::Registration => "挂号取号",
            VisitStage::Waiting => "候诊等待",
            VisitStage::Consultation => "医生诊疗",
            VisitStage::Examination => "检查检验",
            VisitStage::Payment => "缴费",
            VisitStage::Pharmacy => "取药",
            VisitStage::FollowUp => "复诊安排",
        }
    }

    /// What to do at this stage, one instruction per line.
    pub fn steps(self) -> &'static [&'static str] {
        match self {
            VisitStage::Registration => &[
                "到达医院后，找到挂号大厅",
                "在自助机上扫描预约二维码，或到人工窗口报预约号",
                "取得挂号单和候诊号码",
                "保管好挂号单，看病时需要",
            ],
            VisitStage::Waiting => &[
                "根据挂号单上的科室信息，找到对应的诊区",
                "在候诊区坐下等待",
                "留意大屏幕或广播叫号",
                "听到您的号码时，到相应的诊室",
            ],
            VisitStage::Consultation => &[
                "进入诊室后向医生问好",
                "清楚描述您的不舒服症状",
                "如实回答医生的问题",
                "如果听不清楚，请让医生说慢一点",
                "医生开处方或检查单后，请确认是否听明白",
            ],
            VisitStage::Examination => &[
                "拿着检查单到缴费窗口或自助机缴费",
                "缴费后到相应的检查科室",
                "向工作人员出示缴费凭证",
                "按照医护人员指示配合检查",
                "检查完成后询问多久能取结果",
            ],
            VisitStage::Payment => &[
                "拿着医生开的处方到收费窗口",
                "可以使用医保卡、现金或手机支付",
                "保存好缴费凭证",
            ],
            VisitStage::Pharmacy => &[
                "缴费后到药房窗口",
                "把缴费凭证给药房工作人员",
                "等待叫号取药",
                "取药时请核对药品名称和数量",
                "询问药师如何服用药物",
            ],
            VisitStage::FollowUp => &[
                "如果医生要求复诊，记住复诊时间",
                "可以在离开前预约下次挂号",
                "保存好所有的检查报告和病历",
            ],
        }
    }

    /// Reassuring tips for the stage. Not every stage has them.
    pub fn tips(self) -> &'static [&'static str] {
        match self {
            VisitStage::Registration => &[
                "如果不会用自助机，可以去人工窗口",
                "告诉工作人员您的预约号或姓名",
                "不要着急，慢慢来",
            ],
            VisitStage::Waiting => &[
                "坐在候诊椅上休息",
                "如果等待时间长，可以喝点水",
                "不要走远，以免错过叫号",
            ],
            VisitStage::Consultation => &[
                "不要紧张，医生很和蔼",
                "把症状说清楚",
                "有问题就问医生",
            ],
            VisitStage::Pharmacy => &[
                "仔细听药师讲解服药方法",
                "记住每天吃几次，每次吃几片",
                "有不明白的一定要问",
            ],
            _ => &[],
        }
    }

    /// The following stage in visit order.
    pub fn next(self) -> Option<VisitStage> {
        let position = STAGE_ORDER.iter().position(|stage| *stage == self)?;
        STAGE_ORDER.get(position + 1).copied()
    }
}

impl FromStr for VisitStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STAGE_ORDER
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or(UnknownStage)
    }
}

/// The given step name is not part of the visit flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("未知步骤")]
pub struct UnknownStage;

// ═══════════════════════════════════════════════════════════
// Per-stage guidance
// ═══════════════════════════════════════════════════════════

/// Context used to personalize a stage walkthrough.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuidanceContext {
    pub age: Option<u32>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonalizedInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_note: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dept_note: Option<&'static str>,
}

/// Detailed walkthrough of one stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageGuidance {
    pub step_name: &'static str,
    pub steps: &'static [&'static str],
    pub tips: &'static [&'static str],
    /// Display name of the following stage, if any.
    pub next_step: Option<&'static str>,
    pub voice_guidance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personalized_info: Option<PersonalizedInfo>,
}

/// Assemble the walkthrough for one stage.
pub fn stage_guidance(stage: VisitStage, context: Option<&GuidanceContext>) -> StageGuidance {
    StageGuidance {
        step_name: stage.display_name(),
        steps: stage.steps(),
        tips: stage.tips(),
        next_step: stage.next().map(VisitStage::display_name),
        voice_guidance: stage_voice_text(stage),
        personalized_info: context.map(|ctx| personalized_notes(stage, ctx)),
    }
}

/// Voice playback text for a stage: spoken intro plus numbered steps.
pub fn voice_guidance(stage: VisitStage) -> String {
    let mut text = format!("现在需要进行{}。请按照以下步骤操作：\n", stage.display_name());
    for (idx, step) in stage.steps().iter().enumerate() {
        text.push_str(&format!("第{}步，{}。\n", idx + 1, step));
    }
    text
}

fn stage_voice_text(stage: VisitStage) -> String {
    let mut text = format!("{}指导：\n", stage.display_name());
    for (idx, step) in stage.steps().iter().enumerate() {
        text.push_str(&format!("{}. {}\n", idx + 1, step));
    }
    text.trim_end().to_string()
}

fn personalized_notes(stage: VisitStage, context: &GuidanceContext) -> PersonalizedInfo {
    let mut info = PersonalizedInfo::default();

    if context.age.is_some_and(|age| age > 70) {
        info.age_note = Some("如需帮助，可以请志愿者陪同");
    }

    if stage == VisitStage::Examination {
        if let Some(department) = &context.department {
            if department.contains("心血管") {
                info.dept_note = Some("心电图检查时请保持平静，不要紧张");
            } else if department.contains("消化") {
                info.dept_note = Some("胃镜检查前需要空腹6小时");
            }
        }
    }

    info
}

// ═══════════════════════════════════════════════════════════
// Full-visit guidance
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub time: &'static str,
    pub action: &'static str,
    pub note: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmergencyContacts {
    pub hospital_hotline: &'static str,
    pub emergency: &'static str,
    pub family_contact: &'static str,
    pub service_desk: &'static str,
}

/// Appointment fields echoed back in the full guidance.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub hospital_name: String,
    pub department: String,
    pub doctor_name: Option<String>,
    pub appointment_time: String,
    pub appointment_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOverview {
    pub stage: VisitStage,
    pub name: &'static str,
    pub steps: &'static [&'static str],
}

/// The whole visit at a glance: timeline, every stage, reminders, contacts.
#[derive(Debug, Clone, Serialize)]
pub struct FullGuidance {
    pub title: &'static str,
    pub appointment_info: AppointmentSummary,
    pub timeline: Vec<TimelineEntry>,
    pub process: Vec<StageOverview>,
    pub important_reminders: &'static [&'static str],
    pub emergency_contacts: EmergencyContacts,
}

/// Assemble the complete visit guidance for an appointment.
pub fn full_guidance(appointment: AppointmentSummary) -> FullGuidance {
    tracing::info!(
        hospital = %appointment.hospital_name,
        department = %appointment.department,
        "full visit guidance generated"
    );

    FullGuidance {
        title: "就医流程完整指导",
        appointment_info: appointment,
        timeline: visit_timeline(),
        process: STAGE_ORDER
            .iter()
            .map(|stage| StageOverview {
                stage: *stage,
                name: stage.display_name(),
                steps: stage.steps(),
            })
            .collect(),
        important_reminders: &[
            "请提前30分钟到达医院",
            "携带身份证、医保卡",
            "带上以前的病历和检查报告",
            "如果不舒服可随时告诉医护人员",
            "遇到困难可以找医院的志愿者或导医台",
        ],
        emergency_contacts: EmergencyContacts {
            hospital_hotline: "12345678",
            emergency: "120",
            family_contact: "已设置的紧急联系人",
            service_desk: "医院一楼服务台",
        },
    }
}

fn visit_timeline() -> Vec<TimelineEntry> {
    vec![
        TimelineEntry { time: "就诊前30分钟", action: "从家出发", note: "预留足够的路上时间" },
        TimelineEntry { time: "到达医院", action: "挂号取号", note: "找到自助机或人工窗口" },
        TimelineEntry { time: "等待叫号", action: "在候诊区等待", note: "注意听叫号" },
        TimelineEntry { time: "轮到就诊", action: "进入诊室看病", note: "向医生说明病情" },
        TimelineEntry { time: "诊疗后", action: "缴费和取药", note: "按医嘱服药" },
    ]
}

// ═══════════════════════════════════════════════════════════
// In-hospital wayfinding
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct LocationGuide {
    pub description: String,
    pub route: Vec<String>,
    pub landmarks: Vec<&'static str>,
}

/// Walking route to a named in-hospital location. Fixed map data; unknown
/// targets fall back to asking the information desk.
pub fn location_guidance(target: &str) -> LocationGuide {
    match target {
        "药房" => LocationGuide {
            description: "药房在一楼大厅左侧".to_string(),
            route: vec![
                "从门诊大厅进入".to_string(),
                "向左转".to_string(),
                "看到绿色的「药房」标志".to_string(),
                "在窗口等待叫号".to_string(),
            ],
            landmarks: vec!["ATM机旁边", "便利店对面"],
        },
        "检验科" => LocationGuide {
            description: "检验科在二楼".to_string(),
            route: vec![
                "乘坐电梯到二楼".to_string(),
                "出电梯后向右走".to_string(),
                "看到「检验科」标识".to_string(),
                "在抽血窗口排队".to_string(),
            ],
            landmarks: vec!["儿科诊区旁边"],
        },
        "收费处" => LocationGuide {
            description: "收费处在一楼大厅".to_string(),
            route: vec![
                "在门诊大厅中央".to_string(),
                "有多个窗口".to_string(),
                "也可使用自助缴费机".to_string(),
            ],
            landmarks: vec!["挂号处对面"],
        },
        other => LocationGuide {
            description: format!("请向医院导医台询问{other}的位置"),
            route: vec!["找到导医台".to_string(), "向工作人员询问".to_string()],
            landmarks: Vec::new(),
        },
    }
}
