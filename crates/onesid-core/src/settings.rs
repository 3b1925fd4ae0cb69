//! Settings state: capabilities, the editable master list and per-user toggles.
//!
//! Network calls live in the panel controller; this module only holds the
//! state transitions so they can be tested in isolation.

use thiserror::Error;

use crate::model::{RelevantItem, Role, UserPreference};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("o nome do item não pode ser vazio")]
    EmptyName,
    #[error("o item \"{0}\" já está na lista")]
    Duplicate(String),
    #[error("preferência {0} não encontrada")]
    UnknownPreference(i64),
}

/// What the current user may do in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub can_edit_master: bool,
    pub can_manage_users: bool,
}

impl Capabilities {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self {
                can_edit_master: true,
                can_manage_users: true,
            },
            Role::User => Self::default(),
        }
    }
}

/// Load lifecycle of a settings list. The list only appears once fully fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Error(String),
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// Locally editable copy of the master relevant-item list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasterList {
    items: Vec<String>,
    dirty: bool,
}

impl MasterList {
    pub fn from_items(items: Vec<RelevantItem>) -> Self {
        let mut list = Self::default();
        for item in items {
            // Server data may already contain duplicates; keep the first.
            let _ = list.insert(&item.item_nome);
        }
        list.dirty = false;
        list
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Unsaved local edits exist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn add(&mut self, name: &str) -> Result<(), SettingsError> {
        self.insert(name)?;
        self.dirty = true;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.items.len();
        self.items.retain(|i| i != name);
        let removed = self.items.len() != before;
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub fn to_relevant_items(&self) -> Vec<RelevantItem> {
        self.items
            .iter()
            .map(|item_nome| RelevantItem {
                item_nome: item_nome.clone(),
            })
            .collect()
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn insert(&mut self, name: &str) -> Result<(), SettingsError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SettingsError::EmptyName);
        }
        if self.items.iter().any(|i| i == name) {
            return Err(SettingsError::Duplicate(name.to_string()));
        }
        self.items.push(name.to_string());
        Ok(())
    }
}

/// A single preference flip, invertible without consulting current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleTransition {
    pub id: i64,
    pub from: bool,
    pub to: bool,
}

impl ToggleTransition {
    pub fn inverse(self) -> Self {
        Self {
            id: self.id,
            from: self.to,
            to: self.from,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceList {
    prefs: Vec<UserPreference>,
}

impl PreferenceList {
    pub fn new(prefs: Vec<UserPreference>) -> Self {
        Self { prefs }
    }

    pub fn prefs(&self) -> &[UserPreference] {
        &self.prefs
    }

    pub fn get(&self, id: i64) -> Option<&UserPreference> {
        self.prefs.iter().find(|p| p.id == id)
    }

    /// Transition that flips preference `id`, without applying it.
    pub fn toggle_transition(&self, id: i64) -> Result<ToggleTransition, SettingsError> {
        let pref = self.get(id).ok_or(SettingsError::UnknownPreference(id))?;
        Ok(ToggleTransition {
            id,
            from: pref.is_enabled,
            to: !pref.is_enabled,
        })
    }

    /// Apply `t` and return the updated preference.
    pub fn apply(&mut self, t: ToggleTransition) -> Result<&UserPreference, SettingsError> {
        let pref = self
            .prefs
            .iter_mut()
            .find(|p| p.id == t.id)
            .ok_or(SettingsError::UnknownPreference(t.id))?;
        pref.is_enabled = t.to;
        Ok(pref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<RelevantItem> {
        names
            .iter()
            .map(|n| RelevantItem {
                item_nome: (*n).into(),
            })
            .collect()
    }

    #[test]
    fn capabilities_follow_role() {
        assert!(Capabilities::for_role(Role::Admin).can_edit_master);
        assert!(Capabilities::for_role(Role::Admin).can_manage_users);
        assert_eq!(Capabilities::for_role(Role::User), Capabilities::default());
    }

    #[test]
    fn add_trims_and_rejects_duplicates() {
        let mut list = MasterList::from_items(items(&["Contrato"]));
        assert!(!list.is_dirty());
        list.add("  Extrato ").unwrap();
        assert_eq!(list.items(), ["Contrato", "Extrato"]);
        assert_eq!(
            list.add("Contrato "),
            Err(SettingsError::Duplicate("Contrato".into()))
        );
        assert_eq!(list.add("   "), Err(SettingsError::EmptyName));
        assert!(list.is_dirty());
    }

    #[test]
    fn loading_dedups_server_list() {
        let list = MasterList::from_items(items(&["A", "B", "A"]));
        assert_eq!(list.items(), ["A", "B"]);
    }

    #[test]
    fn remove_by_name() {
        let mut list = MasterList::from_items(items(&["A", "B"]));
        assert!(list.remove("A"));
        assert!(!list.remove("Z"));
        assert_eq!(list.to_relevant_items(), items(&["B"]));
        list.mark_saved();
        assert!(!list.is_dirty());
    }

    #[test]
    fn toggle_then_inverse_restores() {
        let mut prefs = PreferenceList::new(vec![UserPreference {
            id: 5,
            item_nome: "Contrato".into(),
            is_enabled: true,
        }]);
        let t = prefs.toggle_transition(5).unwrap();
        assert_eq!(t, ToggleTransition { id: 5, from: true, to: false });
        assert!(!prefs.apply(t).unwrap().is_enabled);
        assert!(prefs.apply(t.inverse()).unwrap().is_enabled);
        assert_eq!(
            prefs.toggle_transition(9),
            Err(SettingsError::UnknownPreference(9))
        );
    }

    #[test]
    fn load_state_accessors() {
        let mut state: LoadState<Vec<u8>> = LoadState::Loading;
        assert!(state.ready().is_none());
        state = LoadState::Ready(vec![1]);
        state.ready_mut().unwrap().push(2);
        assert_eq!(state.ready(), Some(&vec![1, 2]));
    }
}
