//! Settings controller.
//!
//! Admins edit the master relevant-item list and manage users; everyone else
//! toggles their own preferences. The panel does not own the session, so a
//! [`PanelError::is_session_expired`] failure has to be passed on to
//! [`Dashboard::expire_session`](crate::Dashboard::expire_session) by the caller.

use std::sync::Arc;

use onesid_core::{
    Capabilities, LoadState, MasterList, NewUser, PreferenceList, User, UserPreference,
};
use onesid_sync::Backend;
use tracing::{info, warn};

use crate::error::{Notice, PanelError, success_text};

pub struct SettingsPanel<B: Backend> {
    backend: Arc<B>,
    caps: Capabilities,
    master: LoadState<MasterList>,
    prefs: LoadState<PreferenceList>,
    users: LoadState<Vec<User>>,
    notice: Option<Notice>,
}

impl<B: Backend> SettingsPanel<B> {
    pub fn new(backend: Arc<B>, caps: Capabilities) -> Self {
        Self {
            backend,
            caps,
            master: LoadState::Loading,
            prefs: LoadState::Loading,
            users: LoadState::Loading,
            notice: None,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Admins edit the master list instead of personal toggles.
    pub fn is_master_mode(&self) -> bool {
        self.caps.can_edit_master
    }

    pub fn master(&self) -> &LoadState<MasterList> {
        &self.master
    }

    pub fn preferences(&self) -> &LoadState<PreferenceList> {
        &self.prefs
    }

    pub fn users(&self) -> &LoadState<Vec<User>> {
        &self.users
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn fail(&mut self, err: PanelError) -> PanelError {
        self.notice = Some(Notice::from(&err));
        err
    }

    /// Fetch the list for the current mode. It is swapped in only once complete.
    pub async fn load(&mut self) -> Result<(), PanelError> {
        if self.is_master_mode() {
            self.master = LoadState::Loading;
            match self.backend.relevant_items().await {
                Ok(items) => {
                    let list = MasterList::from_items(items);
                    info!(count = list.items().len(), "master list loaded");
                    self.master = LoadState::Ready(list);
                    Ok(())
                }
                Err(e) => {
                    let err = PanelError::from(e);
                    self.master = LoadState::Error(err.to_string());
                    Err(self.fail(err))
                }
            }
        } else {
            self.prefs = LoadState::Loading;
            match self.backend.preferences().await {
                Ok(prefs) => {
                    info!(count = prefs.len(), "preferences loaded");
                    self.prefs = LoadState::Ready(PreferenceList::new(prefs));
                    Ok(())
                }
                Err(e) => {
                    let err = PanelError::from(e);
                    self.prefs = LoadState::Error(err.to_string());
                    Err(self.fail(err))
                }
            }
        }
    }

    fn master_mut(&mut self) -> Result<&mut MasterList, PanelError> {
        if !self.caps.can_edit_master {
            return Err(PanelError::NotPermitted);
        }
        self.master.ready_mut().ok_or(PanelError::NotLoaded)
    }

    pub fn add_item(&mut self, name: &str) -> Result<(), PanelError> {
        let added = self
            .master_mut()
            .and_then(|list| list.add(name).map_err(PanelError::from));
        added.map_err(|e| self.fail(e))
    }

    pub fn remove_item(&mut self, name: &str) -> Result<bool, PanelError> {
        let removed = self.master_mut().map(|list| list.remove(name));
        removed.map_err(|e| self.fail(e))
    }

    /// Persist the master list. On failure the local edits stay in place.
    pub async fn save(&mut self) -> Result<String, PanelError> {
        let items = self.master_mut().map(|list| list.to_relevant_items());
        let items = items.map_err(|e| self.fail(e))?;
        match self.backend.save_relevant_items(&items).await {
            Ok(reply) => {
                if let Some(list) = self.master.ready_mut() {
                    list.mark_saved();
                }
                let text = success_text(&reply.message, "Lista salva com sucesso!");
                self.notice = Some(Notice::success(text.clone()));
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "saving master list failed, keeping local edits");
                Err(self.fail(e.into()))
            }
        }
    }

    /// Upload an item file, then reload the master list from the backend.
    ///
    /// Refused while the list has unsaved edits, since the reload would
    /// replace them. A failed reload keeps the current list and only warns:
    /// the backend has already taken the file.
    pub async fn import_file(
        &mut self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<String, PanelError> {
        if !self.caps.can_edit_master {
            return Err(self.fail(PanelError::NotPermitted));
        }
        if self.master.ready().is_some_and(MasterList::is_dirty) {
            return Err(self.fail(PanelError::UnsavedChanges));
        }
        if contents.is_empty() {
            return Err(self.fail(PanelError::Invalid(
                "Por favor, selecione um arquivo.".to_string(),
            )));
        }
        let reply = match self.backend.import_items(file_name, contents).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail(e.into())),
        };
        let text = success_text(&reply.message, "Itens importados com sucesso!");

        match self.backend.relevant_items().await {
            Ok(items) => {
                let list = MasterList::from_items(items);
                info!(count = list.items().len(), file_name, "master list reloaded after import");
                self.master = LoadState::Ready(list);
                self.notice = Some(Notice::success(text.clone()));
            }
            Err(e) => {
                let err = PanelError::from(e);
                if err.is_session_expired() {
                    return Err(self.fail(err));
                }
                warn!(error = %err, "reloading master list after import failed");
                self.notice = Some(Notice::warning(format!(
                    "{text} (não foi possível recarregar a lista: {err})"
                )));
            }
        }
        Ok(text)
    }

    /// Flip a preference right away and confirm with the backend. A rejected
    /// update puts the previous value back.
    pub async fn toggle(&mut self, id: i64) -> Result<UserPreference, PanelError> {
        if self.is_master_mode() {
            return Err(self.fail(PanelError::NotPermitted));
        }
        let applied = self
            .prefs
            .ready_mut()
            .ok_or(PanelError::NotLoaded)
            .and_then(|list| {
                let transition = list.toggle_transition(id)?;
                let updated = list.apply(transition)?.clone();
                Ok((transition, updated))
            });
        let (transition, updated) = applied.map_err(|e| self.fail(e))?;

        match self.backend.update_preference(&updated).await {
            Ok(_) => {
                self.notice = None;
                Ok(updated)
            }
            Err(e) => {
                warn!(id, error = %e, "preference update rejected, reverting");
                if let Some(list) = self.prefs.ready_mut() {
                    let _ = list.apply(transition.inverse());
                }
                Err(self.fail(e.into()))
            }
        }
    }

    pub async fn load_users(&mut self) -> Result<(), PanelError> {
        if !self.caps.can_manage_users {
            return Err(self.fail(PanelError::NotPermitted));
        }
        self.users = LoadState::Loading;
        match self.backend.users().await {
            Ok(users) => {
                self.users = LoadState::Ready(users);
                Ok(())
            }
            Err(e) => {
                let err = PanelError::from(e);
                self.users = LoadState::Error(err.to_string());
                Err(self.fail(err))
            }
        }
    }

    pub async fn create_user(&mut self, user: NewUser) -> Result<String, PanelError> {
        if !self.caps.can_manage_users {
            return Err(self.fail(PanelError::NotPermitted));
        }
        if user.username.trim().is_empty() || user.password.is_empty() {
            return Err(self.fail(PanelError::Invalid(
                "Informe usuário e senha.".to_string(),
            )));
        }
        let reply = match self.backend.create_user(&user).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.load_users().await?;
        let text = success_text(&reply.message, "Usuário criado com sucesso!");
        self.notice = Some(Notice::success(text.clone()));
        Ok(text)
    }
}
