//! Front-end controllers: dashboard (session, refresh, submission, archive) and settings.

mod error;
pub use error::{Notice, NoticeKind, PanelError};

pub mod dashboard;
pub use dashboard::{Dashboard, SubmitReport};

pub mod settings;
pub use settings::SettingsPanel;

#[cfg(test)]
mod testing;
