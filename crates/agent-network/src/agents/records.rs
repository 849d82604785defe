//! Answers about the user's own medical records

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument, warn};

use medinote_common::{ChatbotResult, ConversationState, LanguageModel, Prompt, RouteName};
use medinote_history::{Condition, HealthProfile, Medication, PersonalRecords, UserRecordService};

use super::{agent_meta, generate, DomainAgent};
use crate::prompts::records_system_prompt;

pub const LOGIN_REQUIRED_MESSAGE: &str =
    "현재 사용자 정보를 확인할 수 없어 의료 기록을 불러올 수 없습니다. 로그인이 되어 있는지 확인해주세요.";
pub const RECORDS_ERROR_MESSAGE: &str = "의료 기록 조회 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";
pub const NO_RECORDS_CONTEXT: &str = "사용자의 의료 기록이 없습니다.";

const MISSING: &str = "-";

pub struct RecordsAgent {
    llm: Arc<dyn LanguageModel>,
    records: Arc<dyn UserRecordService>,
}

impl RecordsAgent {
    pub fn new(llm: Arc<dyn LanguageModel>, records: Arc<dyn UserRecordService>) -> Self {
        Self { llm, records }
    }
}

#[async_trait]
impl DomainAgent for RecordsAgent {
    fn route(&self) -> RouteName {
        RouteName::Db
    }

    #[instrument(name = "records_agent", skip_all, fields(user_id = ?state.user_id))]
    async fn run(&self, mut state: ConversationState) -> ChatbotResult<ConversationState> {
        let mut meta = agent_meta(RouteName::Db);

        let Some(user_id) = state.user_id.clone() else {
            info!("No user id on the turn, skipping record lookup");
            state.push_reply(LOGIN_REQUIRED_MESSAGE, Vec::new(), meta);
            return Ok(state);
        };

        let records = match PersonalRecords::collect(self.records.as_ref(), &user_id).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Record lookup failed");
                meta.insert("error".into(), Value::Bool(true));
                state.push_reply(RECORDS_ERROR_MESSAGE, Vec::new(), meta);
                return Ok(state);
            }
        };

        meta.insert("profile".into(), Value::Bool(records.profile.is_some()));
        meta.insert("allergy_count".into(), records.allergies.len().into());
        meta.insert("drug_count".into(), records.medications.len().into());
        meta.insert("prescription_count".into(), records.prescriptions.len().into());

        let prompt = Prompt::new(records_system_prompt(), state.latest_user_text())
            .with_context(Some(records_context(&records)))
            .with_conversation(state.earlier_turns());
        let answer = generate(self.llm.as_ref(), prompt).await?;

        state.push_reply(answer, Vec::new(), meta);
        Ok(state)
    }
}

/// Section-labelled context built from the non-empty record categories
pub fn records_context(records: &PersonalRecords) -> String {
    let mut sections = Vec::new();

    if let Some(profile) = &records.profile {
        sections.push(format!("## 건강 프로필\n{}", profile_lines(profile)));
    }
    if !records.allergies.is_empty() {
        let lines: Vec<_> = records
            .allergies
            .iter()
            .map(|a| format!("- {}", field(&a.allergy_name)))
            .collect();
        sections.push(format!("## 알레르기 목록\n{}", lines.join("\n")));
    }
    if !records.chronic.is_empty() {
        sections.push(format!("## 만성 질환 목록\n{}", condition_lines(&records.chronic)));
    }
    if !records.acute.is_empty() {
        sections.push(format!("## 급성 질환 목록\n{}", condition_lines(&records.acute)));
    }
    if !records.medications.is_empty() {
        let lines: Vec<_> = records.medications.iter().map(medication_line).collect();
        sections.push(format!("## 복용 중인 약 목록\n{}", lines.join("\n")));
    }
    if !records.prescriptions.is_empty() {
        let lines: Vec<_> = records
            .prescriptions
            .iter()
            .map(|p| {
                format!(
                    "{} ({}~{})",
                    medication_line(&p.medication),
                    field(&p.start_date),
                    field(&p.end_date)
                )
            })
            .collect();
        sections.push(format!("## 처방 이력\n{}", lines.join("\n")));
    }
    if !records.visits.is_empty() {
        let lines: Vec<_> = records
            .visits
            .iter()
            .map(|v| {
                format!(
                    "- {} | {} | {} | {}",
                    field(&v.hospital),
                    field(&v.dept),
                    field(&v.diagnosis_name),
                    field(&v.date)
                )
            })
            .collect();
        sections.push(format!("## 진료 기록\n{}", lines.join("\n")));
    }

    if sections.is_empty() {
        NO_RECORDS_CONTEXT.to_string()
    } else {
        sections.join("\n\n")
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(MISSING)
}

fn profile_lines(profile: &HealthProfile) -> String {
    [
        format!("- 출생: {}", field(&profile.birth)),
        format!("- 성별: {}", field(&profile.gender)),
        format!("- 혈액형: {}", field(&profile.blood_type)),
        format!("- 키: {} cm", field(&profile.height)),
        format!("- 몸무게: {} kg", field(&profile.weight)),
        format!("- 음주: {}", field(&profile.drinking)),
        format!("- 흡연: {}", field(&profile.smoking)),
    ]
    .join("\n")
}

fn condition_lines(conditions: &[Condition]) -> String {
    conditions
        .iter()
        .map(|c| format!("- {} (메모: {})", field(&c.disease_name), field(&c.note)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn medication_line(medication: &Medication) -> String {
    format!(
        "- {} | {} | {}{} | 일정: {}",
        field(&medication.med_name),
        field(&medication.dosage_form),
        field(&medication.dose),
        medication.unit.as_deref().unwrap_or(""),
        field(&medication.schedule)
    )
}
