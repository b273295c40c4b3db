//! Entities exchanged with the SafeClass backend.
//!
//! Responses are read tolerantly: every field also accepts the backend's
//! older Portuguese key. Requests are always written with the English names.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

pub type Id = i64;

/// Read a missing or `null` string as empty.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "professor")]
    Teacher,
    #[serde(alias = "aluno")]
    Student,
    #[serde(alias = "responsavel")]
    Guardian,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Guardian => "guardian",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Id,
    #[serde(alias = "nome")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    #[serde(alias = "nome_completo")]
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "telefone")]
    pub phone: Option<String>,
    #[serde(alias = "tipo")]
    pub role: Role,
    #[serde(default, alias = "sala_id")]
    pub room_id: Option<Id>,
    #[serde(default, alias = "foto_perfil")]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Id,
    #[serde(alias = "nome_completo")]
    pub full_name: String,
    #[serde(default, alias = "alergias", deserialize_with = "null_as_empty")]
    pub allergies: String,
    #[serde(default, alias = "sala_id")]
    pub room_id: Option<Id>,
    #[serde(default, alias = "sala", skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalCondition {
    pub id: Id,
    #[serde(alias = "nome")]
    pub name: String,
    /// Emergency protocol text.
    #[serde(default, alias = "descricao")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Id,
    #[serde(alias = "aluno_id")]
    pub student_id: Id,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, alias = "descricao")]
    pub description: Option<String>,
    #[serde(alias = "dosagem")]
    pub dosage: String,
    #[serde(default, alias = "horario")]
    pub schedule: Option<String>,
}

const CRISIS_KEYWORDS: &[&str] = &["crise", "surto"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub id: Id,
    #[serde(alias = "usuario_id")]
    pub user_id: Id,
    #[serde(alias = "descricao")]
    pub description: String,
    #[serde(alias = "criado_em")]
    pub created_at: String,
    #[serde(default, alias = "condicao_id")]
    pub condition_id: Option<Id>,
    #[serde(default, alias = "tipo_evento")]
    pub event_type: Option<String>,
}

impl HistoryEvent {
    /// Whether the description mentions a crisis ("crise" or "surto", any case).
    pub fn is_crisis(&self) -> bool {
        let description = self.description.to_lowercase();
        CRISIS_KEYWORDS.iter().any(|k| description.contains(k))
    }

    /// Parse `created_at`, accepting RFC 3339 and the backend's plain
    /// `YYYY-MM-DD HH:MM:SS` (UTC) form.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.created_at) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentConditionLink {
    #[serde(alias = "aluno_id")]
    pub student_id: Id,
    #[serde(alias = "condicao_id")]
    pub condition_id: Id,
    #[serde(default, alias = "aluno_nome", skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, alias = "condicao_nome", skip_serializing_if = "Option::is_none")]
    pub condition_name: Option<String>,
    #[serde(
        default,
        alias = "condicao_descricao",
        skip_serializing_if = "Option::is_none"
    )]
    pub condition_description: Option<String>,
}

impl StudentConditionLink {
    /// The linked condition as the backend denormalized it into this row.
    pub fn condition(&self) -> MedicalCondition {
        MedicalCondition {
            id: self.condition_id,
            name: self.condition_name.clone().unwrap_or_default(),
            description: self.condition_description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianStudentLink {
    #[serde(alias = "responsavel_id")]
    pub guardian_id: Id,
    #[serde(alias = "filho_id")]
    pub student_id: Id,
}

// Request bodies

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default, alias = "usuario")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewRoom {
    #[validate(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(email)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewStudent {
    #[validate(length(min = 1))]
    pub full_name: String,
    pub allergies: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Id>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewCondition {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewMedication {
    #[validate(range(min = 1))]
    pub student_id: Id,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub dosage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewHistoryEvent {
    #[validate(range(min = 1))]
    pub user_id: Id,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}
