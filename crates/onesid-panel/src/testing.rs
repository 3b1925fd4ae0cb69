//! Scripted in-memory backend for controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use onesid_core::{
    LoginResponse, NewProcess, NewUser, PanelUpdate, ProcessRecord, Profile, RelevantItem, Role,
    StatusGeral, StatusMessage, SubmissionRecord, User, UserPreference,
};
use onesid_sync::{ApiError, ApiResult, Backend};
use tokio::sync::oneshot;

pub fn record(id: i64, numero: &str, status: StatusGeral) -> ProcessRecord {
    ProcessRecord {
        id,
        numero_processo: numero.into(),
        responsavel_principal: Some(format!("Responsável {id}")),
        classificacao: None,
        status_geral: status,
        data_ultima_atualizacao: None,
        subsidios: Vec::new(),
        subsidios_pendentes: Vec::new(),
    }
}

struct PanelReply {
    outcome: ApiResult<Vec<ProcessRecord>>,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct Script {
    calls: Vec<&'static str>,
    token: Option<String>,
    failures: HashMap<&'static str, ApiError>,
    painel: VecDeque<PanelReply>,
    submit_reply: Option<PanelUpdate>,
    submit_gate: Option<oneshot::Receiver<()>>,
    submitted: Vec<SubmissionRecord>,
    acknowledged: Vec<String>,
    relevant_items: Vec<RelevantItem>,
    saved_items: Vec<Vec<RelevantItem>>,
    preferences: Vec<UserPreference>,
    preference_updates: Vec<UserPreference>,
    users: Vec<User>,
}

/// Records every call; replies come from what the test scripted.
/// Receivers are taken out of the script before awaiting so no guard is held.
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<Script>,
}

impl FakeBackend {
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().expect("fake backend lock")
    }

    /// Record `op` and return the failure scripted for it, if any.
    fn enter(&self, op: &'static str) -> ApiResult<()> {
        let mut script = self.lock();
        script.calls.push(op);
        match script.failures.remove(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn fail_next(&self, op: &'static str, err: ApiError) {
        self.lock().failures.insert(op, err);
    }

    pub fn push_painel(&self, records: Vec<ProcessRecord>) {
        self.lock().painel.push_back(PanelReply {
            outcome: Ok(records),
            gate: None,
        });
    }

    /// Queue a panel reply that is held back until the returned sender fires.
    pub fn push_gated_painel(&self, records: Vec<ProcessRecord>) -> oneshot::Sender<()> {
        self.push_gated(Ok(records))
    }

    /// Like [`push_gated_painel`](Self::push_gated_painel), but the held reply is a failure.
    pub fn push_gated_painel_error(&self, err: ApiError) -> oneshot::Sender<()> {
        self.push_gated(Err(err))
    }

    fn push_gated(&self, outcome: ApiResult<Vec<ProcessRecord>>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().painel.push_back(PanelReply {
            outcome,
            gate: Some(rx),
        });
        tx
    }

    pub fn set_submit_reply(&self, reply: PanelUpdate) {
        self.lock().submit_reply = Some(reply);
    }

    /// Hold the next batch submission until the returned sender fires.
    pub fn gate_submit(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().submit_gate = Some(rx);
        tx
    }

    pub fn submitted(&self) -> Vec<SubmissionRecord> {
        self.lock().submitted.clone()
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.lock().acknowledged.clone()
    }

    pub fn set_relevant_items(&self, items: Vec<RelevantItem>) {
        self.lock().relevant_items = items;
    }

    pub fn saved_items(&self) -> Vec<Vec<RelevantItem>> {
        self.lock().saved_items.clone()
    }

    pub fn set_preferences(&self, prefs: Vec<UserPreference>) {
        self.lock().preferences = prefs;
    }

    pub fn preference_updates(&self) -> Vec<UserPreference> {
        self.lock().preference_updates.clone()
    }
}

async fn wait(gate: Option<oneshot::Receiver<()>>) {
    if let Some(rx) = gate {
        let _ = rx.await;
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn set_token(&self, token: Option<String>) {
        self.lock().token = token;
    }

    async fn login(&self, username: &str, _password: &str) -> ApiResult<LoginResponse> {
        self.enter("login")?;
        Ok(LoginResponse {
            access_token: Some(format!("tok-{username}")),
            role: Role::User,
            username: None,
            message: None,
        })
    }

    async fn logout(&self) -> ApiResult<StatusMessage> {
        self.enter("logout")?;
        Ok(StatusMessage::default())
    }

    async fn profile(&self) -> ApiResult<Profile> {
        self.enter("profile")?;
        Ok(Profile {
            logged_in: self.token().is_some(),
            user_id: Some(1),
            username: Some("ana".into()),
            role: Some(Role::User),
        })
    }

    async fn painel(&self) -> ApiResult<Vec<ProcessRecord>> {
        self.enter("painel")?;
        let reply = self.lock().painel.pop_front();
        match reply {
            Some(PanelReply { outcome, gate }) => {
                wait(gate).await;
                outcome
            }
            None => Ok(Vec::new()),
        }
    }

    async fn historico(&self) -> ApiResult<Vec<ProcessRecord>> {
        self.enter("historico")?;
        Ok(vec![record(90, "ARQ-1", StatusGeral::Concluido)])
    }

    async fn submit_batch(&self, records: &[SubmissionRecord]) -> ApiResult<PanelUpdate> {
        self.enter("submit_batch")?;
        let (gate, reply) = {
            let mut script = self.lock();
            script.submitted.extend_from_slice(records);
            (script.submit_gate.take(), script.submit_reply.clone())
        };
        wait(gate).await;
        Ok(reply.unwrap_or_else(|| PanelUpdate::Message(StatusMessage::default())))
    }

    async fn add_process(&self, _process: &NewProcess) -> ApiResult<StatusMessage> {
        self.enter("add_process")?;
        Ok(StatusMessage {
            message: "Processo adicionado".into(),
        })
    }

    async fn run_monitoring(&self) -> ApiResult<PanelUpdate> {
        self.enter("run_monitoring")?;
        Ok(PanelUpdate::Message(StatusMessage::default()))
    }

    async fn acknowledge(&self, numero_processo: &str) -> ApiResult<StatusMessage> {
        self.enter("acknowledge")?;
        self.lock().acknowledged.push(numero_processo.to_string());
        Ok(StatusMessage::default())
    }

    async fn import_legal_one(&self) -> ApiResult<StatusMessage> {
        self.enter("import_legal_one")?;
        Ok(StatusMessage::default())
    }

    async fn relevant_items(&self) -> ApiResult<Vec<RelevantItem>> {
        self.enter("relevant_items")?;
        Ok(self.lock().relevant_items.clone())
    }

    async fn save_relevant_items(&self, items: &[RelevantItem]) -> ApiResult<StatusMessage> {
        self.enter("save_relevant_items")?;
        self.lock().saved_items.push(items.to_vec());
        Ok(StatusMessage::default())
    }

    async fn import_items(&self, _file_name: &str, _contents: Vec<u8>) -> ApiResult<StatusMessage> {
        self.enter("import_items")?;
        Ok(StatusMessage::default())
    }

    async fn preferences(&self) -> ApiResult<Vec<UserPreference>> {
        self.enter("preferences")?;
        Ok(self.lock().preferences.clone())
    }

    async fn update_preference(&self, pref: &UserPreference) -> ApiResult<StatusMessage> {
        // The request is recorded even when it is scripted to fail.
        self.lock().preference_updates.push(pref.clone());
        self.enter("update_preference")?;
        Ok(StatusMessage::default())
    }

    async fn users(&self) -> ApiResult<Vec<User>> {
        self.enter("users")?;
        Ok(self.lock().users.clone())
    }

    async fn create_user(&self, user: &NewUser) -> ApiResult<StatusMessage> {
        self.enter("create_user")?;
        let mut script = self.lock();
        let id = script.users.len() as i64 + 1;
        script.users.push(User {
            id,
            username: user.username.clone(),
            role: user.role,
        });
        Ok(StatusMessage::default())
    }

    async fn export_excel(&self) -> ApiResult<Vec<u8>> {
        self.enter("export_excel")?;
        Ok(b"PK\x03\x04".to_vec())
    }

    async fn export_json(&self) -> ApiResult<serde_json::Value> {
        self.enter("export_json")?;
        Ok(serde_json::json!({ "processos": [] }))
    }
}
