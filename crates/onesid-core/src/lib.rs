pub mod config;
pub mod detail;
pub mod list;
pub mod model;
pub mod parser;
pub mod settings;
pub mod view;

pub use config::{AuthMode, ClientConfig, ConfigError, Routes};
pub use detail::{DetailModal, DetailView};
pub use list::{ListError, ProcessList};
pub use model::{
    LoginResponse, NewProcess, NewUser, PanelUpdate, ProcessRecord, Profile, RelevantItem, Role,
    StatusGeral, StatusMessage, SubmissionRecord, Subsidio, User, UserPreference,
};
pub use parser::{BatchParser, ParseError, ParsedBatch, SubmissionSchema};
pub use settings::{
    Capabilities, LoadState, MasterList, PreferenceList, SettingsError, ToggleTransition,
};
pub use view::{
    FilterField, Filters, PageSize, PanelRow, PanelView, SortConfig, SortDirection, SortKey,
    ViewState, derive_view,
};
