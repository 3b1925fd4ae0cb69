//! Dashboard controller: session, panel refresh, submission and archive flow.
//!
//! All shared state sits behind one mutex that is only held for synchronous
//! updates, never across a backend call. Refreshes take a fetch ticket before
//! calling out, so overlapping refreshes resolve to the most recent one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use onesid_core::{
    BatchParser, Capabilities, DetailModal, DetailView, NewProcess, PanelUpdate, PanelView,
    ProcessRecord, Profile, ViewState,
};
use onesid_store::{ProcessStore, Session, SessionStore};
use onesid_sync::{ApiError, Backend};
use tracing::{info, warn};

use crate::error::{Notice, PanelError, success_text};

#[derive(Default)]
struct DashboardState {
    session: Session,
    panel: ProcessStore,
    history: ProcessStore,
    view: ViewState,
    history_view: ViewState,
    detail: DetailModal,
    notice: Option<Notice>,
    loading: bool,
    needs_login: bool,
}

/// Outcome of a successful batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    pub submitted: usize,
    /// Pasted rows dropped for missing columns.
    pub discarded: usize,
    pub message: String,
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Dashboard<B: Backend> {
    backend: Arc<B>,
    sessions: Arc<dyn SessionStore>,
    state: Mutex<DashboardState>,
    submitting: AtomicBool,
}

impl<B: Backend> Dashboard<B> {
    pub fn new(backend: Arc<B>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            backend,
            sessions,
            state: Mutex::new(DashboardState {
                needs_login: true,
                ..DashboardState::default()
            }),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        // State stays consistent between statements, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_notice(&self, notice: Notice) {
        self.lock().notice = Some(notice);
    }

    /// Turn an action failure into the user-visible notice. Session expiry
    /// also forces a logout.
    fn fail(&self, err: PanelError) -> PanelError {
        if err.is_session_expired() {
            self.expire_session();
        }
        self.set_notice(Notice::from(&err));
        err
    }

    // ── Session ──

    /// Restore a saved session. Returns whether one was found.
    pub fn restore(&self) -> Result<bool, PanelError> {
        let saved = self.sessions.load().map_err(|e| self.fail(e.into()))?;
        match saved {
            Some(session) if session.is_authenticated() => {
                self.backend.set_token(session.token.clone());
                info!(username = ?session.username, role = %session.role(), "session restored");
                let mut st = self.lock();
                st.session = session;
                st.needs_login = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, PanelError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(self.fail(PanelError::Invalid(
                "Informe usuário e senha.".to_string(),
            )));
        }
        let resp = self
            .backend
            .login(username.trim(), password)
            .await
            .map_err(|e| self.fail(e.into()))?;

        let session = Session {
            token: resp.access_token,
            role: Some(resp.role),
            username: resp.username.or_else(|| Some(username.trim().to_string())),
        };
        self.backend.set_token(session.token.clone());
        self.sessions
            .save(&session)
            .map_err(|e| self.fail(e.into()))?;

        info!(username = ?session.username, role = %session.role(), "logged in");
        let mut st = self.lock();
        st.session = session.clone();
        st.needs_login = false;
        st.notice = resp.message.map(Notice::success);
        Ok(session)
    }

    /// Log out locally even when the backend call fails.
    pub async fn logout(&self) -> Result<(), PanelError> {
        if let Err(e) = self.backend.logout().await {
            warn!(error = %e, "backend logout failed, clearing local session anyway");
        }
        self.backend.set_token(None);
        let cleared = self.sessions.clear();
        self.reset_local(None);
        cleared.map_err(|e| self.fail(e.into()))
    }

    /// Drop the session after the backend reported it expired.
    pub fn expire_session(&self) {
        warn!("session expired, forcing re-authentication");
        self.backend.set_token(None);
        if let Err(e) = self.sessions.clear() {
            warn!(error = %e, "could not clear saved session");
        }
        self.reset_local(Some(Notice::error(ApiError::SessionExpired.to_string())));
    }

    fn reset_local(&self, notice: Option<Notice>) {
        let mut st = self.lock();
        st.session = Session::default();
        st.panel.clear();
        st.history.clear();
        st.detail.close();
        st.view = ViewState::default();
        st.history_view = ViewState::default();
        st.loading = false;
        st.needs_login = true;
        st.notice = notice;
    }

    /// Ask the backend who the current credential belongs to.
    pub async fn whoami(&self) -> Result<Profile, PanelError> {
        self.backend.profile().await.map_err(|e| self.fail(e.into()))
    }

    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_role(self.lock().session.role())
    }

    pub fn needs_login(&self) -> bool {
        self.lock().needs_login
    }

    // ── Panel ──

    /// Fetch the panel. `Ok(false)` means a newer refresh superseded this one.
    pub async fn refresh(&self) -> Result<bool, PanelError> {
        let ticket = {
            let mut st = self.lock();
            st.loading = true;
            st.panel.begin_fetch()
        };
        let fetched = self.backend.painel().await;

        let mut st = self.lock();
        if !st.panel.is_latest(ticket) {
            drop(st);
            // Whatever superseded us owns the loading flag and the rows. A
            // session expiry still has to log out.
            return match fetched {
                Ok(_) => Ok(false),
                Err(e) => {
                    let err = PanelError::from(e);
                    if err.is_session_expired() {
                        Err(self.fail(err))
                    } else {
                        Err(err)
                    }
                }
            };
        }
        st.loading = false;
        match fetched {
            Ok(records) => Ok(st.panel.commit(ticket, records)),
            Err(e) => {
                drop(st);
                Err(self.fail(e.into()))
            }
        }
    }

    pub async fn refresh_history(&self) -> Result<bool, PanelError> {
        let ticket = self.lock().history.begin_fetch();
        let records = self
            .backend
            .historico()
            .await
            .map_err(|e| self.fail(e.into()))?;
        Ok(self.lock().history.commit(ticket, records))
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn records(&self) -> Vec<ProcessRecord> {
        self.lock().panel.records().to_vec()
    }

    pub fn history(&self) -> Vec<ProcessRecord> {
        self.lock().history.records().to_vec()
    }

    /// Mutate filter / sort / page state.
    pub fn update_view<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        f(&mut self.lock().view)
    }

    /// Derive the visible page and hand it to `f`.
    pub fn render<R>(&self, f: impl FnOnce(&PanelView<'_>) -> R) -> R {
        let st = self.lock();
        let view = st.view.derive(st.panel.records());
        f(&view)
    }

    /// Filter / sort / page state of the history listing, kept apart from the panel's.
    pub fn update_history_view<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        f(&mut self.lock().history_view)
    }

    pub fn render_history<R>(&self, f: impl FnOnce(&PanelView<'_>) -> R) -> R {
        let st = self.lock();
        let view = st.history_view.derive(st.history.records());
        f(&view)
    }

    // ── Detail ──

    pub fn open_detail(&self, numero: &str) -> Result<DetailView, PanelError> {
        let mut st = self.lock();
        let record = st
            .panel
            .find_by_numero(numero)
            .or_else(|| st.history.find_by_numero(numero))
            .cloned()
            .ok_or_else(|| PanelError::UnknownProcess(numero.to_string()))?;
        let view = DetailView::project(&record);
        st.detail.open(record);
        Ok(view)
    }

    pub fn close_detail(&self) {
        self.lock().detail.close();
    }

    pub fn detail(&self) -> Option<DetailView> {
        self.lock().detail.view()
    }

    /// Record behind the open detail view.
    pub fn selected(&self) -> Option<ProcessRecord> {
        self.lock().detail.selected().cloned()
    }

    // ── Actions ──

    /// Parse a pasted block and submit it. Validation failures never reach the backend.
    pub async fn submit_paste(
        &self,
        parser: &BatchParser,
        text: &str,
    ) -> Result<SubmitReport, PanelError> {
        let batch = parser.parse(text).map_err(|e| self.fail(e.into()))?;

        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(self.fail(PanelError::Busy));
        }
        let _guard = InFlight(&self.submitting);

        self.set_notice(Notice::info(format!(
            "Enviando {} processo(s)...",
            batch.records.len()
        )));
        let update = self
            .backend
            .submit_batch(&batch.records)
            .await
            .map_err(|e| self.fail(e.into()))?;

        let fallback = format!("{} processo(s) enviados.", batch.records.len());
        let message = self.apply_update(update, &fallback).await?;
        Ok(SubmitReport {
            submitted: batch.records.len(),
            discarded: batch.discarded,
            message,
        })
    }

    /// Adopt a returned panel, or re-fetch when the backend only sent a message.
    async fn apply_update(&self, update: PanelUpdate, fallback: &str) -> Result<String, PanelError> {
        match update {
            PanelUpdate::Panel(records) => {
                let mut st = self.lock();
                let ticket = st.panel.begin_fetch();
                st.panel.commit(ticket, records);
                st.notice = Some(Notice::success(fallback));
                Ok(fallback.to_string())
            }
            PanelUpdate::Message(msg) => {
                let text = success_text(&msg.message, fallback);
                self.refresh_after(&text).await;
                Ok(text)
            }
        }
    }

    /// Re-fetch after a mutation the backend already accepted. A failed
    /// re-fetch downgrades the notice to a warning; the mutation still stands.
    async fn refresh_after(&self, text: &str) {
        match self.refresh().await {
            Ok(_) => self.set_notice(Notice::success(text)),
            Err(e) if e.is_session_expired() => {}
            Err(e) => {
                warn!(error = %e, "panel refresh after a successful action failed");
                self.set_notice(Notice::warning(format!(
                    "{text} (não foi possível atualizar o painel: {e})"
                )));
            }
        }
    }

    pub async fn add_process(
        &self,
        numero: &str,
        executante: Option<&str>,
    ) -> Result<String, PanelError> {
        let numero = numero.trim();
        if numero.is_empty() {
            return Err(self.fail(PanelError::Invalid(
                "Por favor, insira o número do processo.".to_string(),
            )));
        }
        let process = NewProcess {
            numero_processo: numero.to_string(),
            executante: executante
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        };
        let reply = self
            .backend
            .add_process(&process)
            .await
            .map_err(|e| self.fail(e.into()))?;
        let text = success_text(&reply.message, "Processo adicionado.");
        self.refresh_after(&text).await;
        Ok(text)
    }

    pub async fn run_monitoring(&self) -> Result<String, PanelError> {
        self.set_notice(Notice::info("Executando monitoramento..."));
        let update = self
            .backend
            .run_monitoring()
            .await
            .map_err(|e| self.fail(e.into()))?;
        self.apply_update(update, "Monitoramento concluído.").await
    }

    /// Acknowledge a pending process and drop it from the local panel.
    pub async fn acknowledge(&self, numero: &str) -> Result<String, PanelError> {
        let archivable = self
            .lock()
            .panel
            .find_by_numero(numero)
            .map(ProcessRecord::can_archive);
        match archivable {
            Some(true) => {}
            Some(false) => {
                return Err(self.fail(PanelError::Invalid(format!(
                    "Processo {numero} não está pendente de ciência."
                ))));
            }
            None => return Err(self.fail(PanelError::UnknownProcess(numero.to_string()))),
        }

        let reply = self
            .backend
            .acknowledge(numero)
            .await
            .map_err(|e| self.fail(e.into()))?;
        let text = success_text(&reply.message, "Processo arquivado.");

        let mut st = self.lock();
        st.panel.remove_by_numero(numero);
        if st.detail.selected().is_some_and(|r| r.numero_processo == numero) {
            st.detail.close();
        }
        st.notice = Some(Notice::success(text.clone()));
        info!(numero, "process acknowledged");
        Ok(text)
    }

    pub async fn import_legal_one(&self) -> Result<String, PanelError> {
        self.set_notice(Notice::info("Iniciando importação do Legal One..."));
        let reply = self
            .backend
            .import_legal_one()
            .await
            .map_err(|e| self.fail(e.into()))?;
        let text = success_text(&reply.message, "Importação concluída.");
        self.refresh_after(&text).await;
        Ok(text)
    }

    pub async fn export_excel(&self) -> Result<Vec<u8>, PanelError> {
        let bytes = self
            .backend
            .export_excel()
            .await
            .map_err(|e| self.fail(e.into()))?;
        self.set_notice(Notice::success("Planilha exportada com sucesso!"));
        Ok(bytes)
    }

    pub async fn export_json(&self) -> Result<serde_json::Value, PanelError> {
        let data = self
            .backend
            .export_json()
            .await
            .map_err(|e| self.fail(e.into()))?;
        self.set_notice(Notice::success("Arquivo JSON exportado com sucesso!"));
        Ok(data)
    }

    pub fn notice(&self) -> Option<Notice> {
        self.lock().notice.clone()
    }

    pub fn clear_notice(&self) {
        self.lock().notice = None;
    }
}
