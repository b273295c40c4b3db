use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

use super::{validated, ApiClient};
use crate::error::ClientResult;
use crate::models::{HistoryEvent, Id, MedicalCondition, NewHistoryEvent, Student, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrisisSeverity {
    Low,
    Medium,
    High,
}

impl CrisisSeverity {
    fn label(self) -> &'static str {
        match self {
            CrisisSeverity::Low => "LOW",
            CrisisSeverity::Medium => "MEDIUM",
            CrisisSeverity::High => "HIGH",
        }
    }
}

/// History text recorded when a teacher triggers a condition's emergency
/// protocol.
pub fn emergency_description<Tz>(
    condition_name: &str,
    student_name: &str,
    actor_name: &str,
    at: &DateTime<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "EMERGÊNCIA - {}\nAluno: {}\nProfessor responsável: {}\nData/Hora: {}\n\
         Protocolo de emergência ativado conforme condição médica registrada.",
        condition_name,
        student_name,
        actor_name,
        at.format("%d/%m/%Y %H:%M:%S"),
    )
}

impl ApiClient {
    pub async fn list_history(&self) -> ClientResult<Vec<HistoryEvent>> {
        self.get_list("/history").await
    }

    pub async fn get_history_event(&self, id: Id) -> ClientResult<HistoryEvent> {
        self.get(&format!("/history/{}", id)).await
    }

    pub async fn get_history_by_user(&self, user_id: Id) -> ClientResult<Vec<HistoryEvent>> {
        self.get_list(&format!("/history/user/{}", user_id)).await
    }

    pub async fn create_history_event(&self, event: &NewHistoryEvent) -> ClientResult<HistoryEvent> {
        self.post("/history", validated(event)?).await
    }

    pub async fn update_history_event(
        &self,
        id: Id,
        event: &NewHistoryEvent,
    ) -> ClientResult<HistoryEvent> {
        self.put(&format!("/history/{}", id), validated(event)?).await
    }

    pub async fn delete_history_event(&self, id: Id) -> ClientResult<()> {
        self.delete(&format!("/history/{}", id)).await
    }

    /// Record that `actor` activated the emergency protocol of `condition`
    /// for `student`.
    pub async fn create_emergency_event(
        &self,
        student: &Student,
        condition: &MedicalCondition,
        actor: &User,
    ) -> ClientResult<HistoryEvent> {
        let description = emergency_description(
            &condition.name,
            &student.full_name,
            &actor.full_name,
            &Local::now(),
        );
        tracing::info!(
            "Recording emergency for student {} (condition {})",
            student.id,
            condition.id
        );

        self.create_history_event(&NewHistoryEvent {
            user_id: student.id,
            description,
            condition_id: Some(condition.id),
            event_type: Some("emergencia".to_string()),
        })
        .await
    }

    pub async fn report_crisis(
        &self,
        student_id: Id,
        description: &str,
        severity: CrisisSeverity,
    ) -> ClientResult<HistoryEvent> {
        self.create_history_event(&NewHistoryEvent {
            user_id: student_id,
            description: format!("CRISE - {}: {}", severity.label(), description),
            condition_id: None,
            event_type: Some("crise".to_string()),
        })
        .await
    }

    pub async fn report_medication_administration(
        &self,
        medication_id: Id,
        student_id: Id,
        notes: Option<&str>,
    ) -> ClientResult<HistoryEvent> {
        let mut description = format!("Medicamento administrado - Remédio ID: {}", medication_id);
        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            description.push_str(&format!(" - Obs: {}", notes));
        }

        self.create_history_event(&NewHistoryEvent {
            user_id: student_id,
            description,
            condition_id: None,
            event_type: Some("medicamento".to_string()),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn emergency_description_embeds_all_parts() {
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 13, 45, 9).unwrap();
        let text = emergency_description("Asma", "Bruno Lima", "Carla Dias", &at);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "EMERGÊNCIA - Asma");
        assert_eq!(lines[1], "Aluno: Bruno Lima");
        assert_eq!(lines[2], "Professor responsável: Carla Dias");
        assert_eq!(lines[3], "Data/Hora: 17/05/2024 13:45:09");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn emergency_description_uses_local_wall_clock() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let at = brt.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        assert!(emergency_description("x", "y", "z", &at).contains("02/01/2024 08:00:00"));
    }

    #[test]
    fn severity_labels_are_upper_case() {
        assert_eq!(CrisisSeverity::Low.label(), "LOW");
        assert_eq!(CrisisSeverity::High.label(), "HIGH");
    }
}
