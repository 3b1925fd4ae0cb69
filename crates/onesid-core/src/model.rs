//! Shared wire types exchanged with the OneSid backend.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A subsidy item discovered by the RPA for a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsidio {
    pub item: String,
    pub status: String,
}

/// Overall monitoring status of a process.
///
/// The backend has spelled these differently across releases, so parsing is
/// lenient and anything unrecognised is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusGeral {
    Monitorando,
    PendenteCiencia,
    Concluido,
    Other(String),
}

impl StatusGeral {
    pub fn parse(raw: &str) -> Self {
        let folded: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                'ê' | 'Ê' => 'e',
                'í' | 'Í' => 'i',
                '_' => ' ',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match folded.as_str() {
            "monitorando" => Self::Monitorando,
            "pendente ciencia" => Self::PendenteCiencia,
            "concluido" => Self::Concluido,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Monitorando => "Monitorando",
            Self::PendenteCiencia => "Pendente Ciencia",
            Self::Concluido => "Concluído",
            Self::Other(raw) => raw,
        }
    }

    /// Only processes waiting for acknowledgment can be archived.
    pub fn is_pending_acknowledgment(&self) -> bool {
        matches!(self, Self::PendenteCiencia)
    }
}

impl fmt::Display for StatusGeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusGeral {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatusGeral {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Self::parse(&s)).unwrap_or(Self::Other(String::new())))
    }
}

/// A process tracked on the panel (or archived in the history).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: i64,
    pub numero_processo: String,
    #[serde(default)]
    pub responsavel_principal: Option<String>,
    #[serde(default)]
    pub classificacao: Option<String>,
    #[serde(default = "unknown_status")]
    pub status_geral: StatusGeral,
    /// Timestamp string exactly as the backend sent it.
    #[serde(default)]
    pub data_ultima_atualizacao: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subsidios: Vec<Subsidio>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subsidios_pendentes: Vec<String>,
}

impl ProcessRecord {
    /// Parsed `data_ultima_atualizacao`, `None` when absent or unparseable.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.data_ultima_atualizacao
            .as_deref()
            .and_then(parse_backend_timestamp)
    }

    pub fn can_archive(&self) -> bool {
        self.status_geral.is_pending_acknowledgment()
    }
}

fn unknown_status() -> StatusGeral {
    StatusGeral::Other(String::new())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse the timestamp forms the backend has been seen to emit.
///
/// RFC 3339, RFC 2822 (Flask's default date encoding) and naive ISO-8601
/// with either `T` or a space as separator. Naive values are taken as UTC.
pub fn parse_backend_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Flask writes "GMT" where RFC 2822 parsers expect an offset.
    if let Some(stripped) = raw.strip_suffix(" GMT") {
        if let Ok(dt) = DateTime::parse_from_rfc2822(&format!("{stripped} +0000")) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// One row of a batch paste, ready to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub responsavel: String,
    pub numero: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classificacao: Option<String>,
}

/// Body of a batch submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionBatch<'a> {
    pub processos: &'a [SubmissionRecord],
}

/// A single process added by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProcess {
    pub numero_processo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executante: Option<String>,
}

/// Body for the acknowledge / archive endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AcknowledgeRequest<'a> {
    pub numero_processo: &'a str,
}

/// Entry of the admin-curated master list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantItem {
    pub item_nome: String,
}

/// Per-user overlay over the master list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
    pub id: i64,
    pub item_nome: String,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Self::parse(&s)).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful login. Cookie deployments omit `access_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Plain `{message}` acknowledgement returned by most mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(default)]
    pub message: String,
}

/// Submit and run-monitoring reply with either the refreshed panel or a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PanelUpdate {
    Panel(Vec<ProcessRecord>),
    Message(StatusMessage),
}
