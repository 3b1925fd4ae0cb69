use async_trait::async_trait;
use onesid_core::{
    LoginResponse, NewProcess, NewUser, PanelUpdate, ProcessRecord, Profile, RelevantItem,
    StatusMessage, SubmissionRecord, User, UserPreference,
};

use crate::ApiResult;

/// Operations the OneSid backend exposes.
///
/// [`ApiClient`](crate::ApiClient) is the HTTP implementation; controllers are
/// generic over this trait so they can be driven by an in-memory fake.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Install (or drop) the bearer credential used by later calls.
    fn set_token(&self, token: Option<String>);

    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse>;
    async fn logout(&self) -> ApiResult<StatusMessage>;
    async fn profile(&self) -> ApiResult<Profile>;

    async fn painel(&self) -> ApiResult<Vec<ProcessRecord>>;
    async fn historico(&self) -> ApiResult<Vec<ProcessRecord>>;
    async fn submit_batch(&self, records: &[SubmissionRecord]) -> ApiResult<PanelUpdate>;
    async fn add_process(&self, process: &NewProcess) -> ApiResult<StatusMessage>;
    async fn run_monitoring(&self) -> ApiResult<PanelUpdate>;
    async fn acknowledge(&self, numero_processo: &str) -> ApiResult<StatusMessage>;
    async fn import_legal_one(&self) -> ApiResult<StatusMessage>;

    async fn relevant_items(&self) -> ApiResult<Vec<RelevantItem>>;
    async fn save_relevant_items(&self, items: &[RelevantItem]) -> ApiResult<StatusMessage>;
    async fn import_items(&self, file_name: &str, contents: Vec<u8>) -> ApiResult<StatusMessage>;

    async fn preferences(&self) -> ApiResult<Vec<UserPreference>>;
    async fn update_preference(&self, pref: &UserPreference) -> ApiResult<StatusMessage>;

    async fn users(&self) -> ApiResult<Vec<User>>;
    async fn create_user(&self, user: &NewUser) -> ApiResult<StatusMessage>;

    async fn export_excel(&self) -> ApiResult<Vec<u8>>;
    async fn export_json(&self) -> ApiResult<serde_json::Value>;
}
