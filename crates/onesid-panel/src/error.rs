use onesid_core::{ParseError, SettingsError};
use onesid_store::StoreError;
use onesid_sync::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    /// Rejected before any request was made.
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("falha ao gravar a sessão: {0}")]
    Session(#[from] StoreError),
    #[error("Já existe um envio em andamento.")]
    Busy,
    #[error("Operação não permitida para este usuário.")]
    NotPermitted,
    #[error("A lista ainda não foi carregada.")]
    NotLoaded,
    #[error("Salve as alterações da lista antes de importar.")]
    UnsavedChanges,
    #[error("Processo {0} não está no painel.")]
    UnknownProcess(String),
}

impl PanelError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_session_expired())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    /// The action went through but a follow-up step did not.
    Warning,
    Error,
}

/// The single status line a front-end shows after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

impl From<&PanelError> for Notice {
    fn from(err: &PanelError) -> Self {
        Self::error(err.to_string())
    }
}

/// Use the backend's message when it sent one, `fallback` otherwise.
pub(crate) fn success_text(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}
