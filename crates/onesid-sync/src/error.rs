use serde::Deserialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Underlying transport failure, kept so callers can walk the error chain.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Erro de conexão com o servidor: {0}")]
    Network(#[source] TransportError),
    #[error("Tempo esgotado aguardando o servidor")]
    Timeout,
    /// HTTP 401 outside the login call: the front-end must re-authenticate.
    #[error("Sessão expirada. Faça login novamente.")]
    SessionExpired,
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("Resposta inválida do servidor: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::SessionExpired => Some(401),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

/// Pull a human message out of an error body (`message`, `msg` or `error`),
/// falling back to the bare status.
pub fn error_message_from_body(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.msg).or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Erro HTTP: {status}"))
}
