//! In-memory store for panel (or history) records.
//!
//! The store is replaced wholesale after each fetch. Every fetch takes a
//! [`FetchTicket`] first; a response is only committed if its ticket is the
//! most recently issued one, so a slow early fetch can never overwrite the
//! result of a later one.

use chrono::{DateTime, Utc};
use onesid_core::ProcessRecord;
use tracing::{debug, info};

/// Sequence number handed out when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct ProcessStore {
    records: Vec<ProcessRecord>,
    issued: u64,
    refreshed_at: Option<DateTime<Utc>>,
}

impl ProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// When the last accepted fetch landed.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Start a fetch; any ticket issued earlier becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    pub fn is_latest(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Replace the records if `ticket` is still the latest. Returns whether it was applied.
    pub fn commit(&mut self, ticket: FetchTicket, records: Vec<ProcessRecord>) -> bool {
        if !self.is_latest(ticket) {
            debug!(
                ticket = ticket.0,
                latest = self.issued,
                "discarding stale panel response"
            );
            return false;
        }
        info!(count = records.len(), ticket = ticket.0, "panel records replaced");
        self.records = records;
        self.refreshed_at = Some(Utc::now());
        true
    }

    pub fn find_by_id(&self, id: i64) -> Option<&ProcessRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn find_by_numero(&self, numero: &str) -> Option<&ProcessRecord> {
        self.records.iter().find(|r| r.numero_processo == numero)
    }

    /// Drop a record locally after it was archived on the backend.
    pub fn remove_by_numero(&mut self, numero: &str) -> Option<ProcessRecord> {
        let idx = self.records.iter().position(|r| r.numero_processo == numero)?;
        Some(self.records.remove(idx))
    }

    /// Forget all records, e.g. on logout. Outstanding tickets become stale.
    pub fn clear(&mut self) {
        self.records.clear();
        self.refreshed_at = None;
        self.issued += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onesid_core::StatusGeral;

    fn rec(id: i64, numero: &str) -> ProcessRecord {
        ProcessRecord {
            id,
            numero_processo: numero.into(),
            responsavel_principal: None,
            classificacao: None,
            status_geral: StatusGeral::Monitorando,
            data_ultima_atualizacao: None,
            subsidios: Vec::new(),
            subsidios_pendentes: Vec::new(),
        }
    }

    #[test]
    fn latest_ticket_wins_even_if_it_lands_first() {
        let mut store = ProcessStore::new();
        let slow = store.begin_fetch();
        let fast = store.begin_fetch();

        assert!(store.commit(fast, vec![rec(2, "B")]));
        assert!(!store.commit(slow, vec![rec(1, "A")]));
        assert_eq!(store.records()[0].id, 2);
    }

    #[test]
    fn in_order_responses_apply() {
        let mut store = ProcessStore::new();
        let t1 = store.begin_fetch();
        assert!(store.commit(t1, vec![rec(1, "A")]));
        let t2 = store.begin_fetch();
        assert!(store.commit(t2, vec![rec(1, "A"), rec(2, "B")]));
        assert_eq!(store.len(), 2);
        assert!(store.refreshed_at().is_some());
    }

    #[test]
    fn remove_after_archive() {
        let mut store = ProcessStore::new();
        let t = store.begin_fetch();
        store.commit(t, vec![rec(1, "A"), rec(2, "B")]);
        assert_eq!(store.remove_by_numero("A").map(|r| r.id), Some(1));
        assert!(store.remove_by_numero("A").is_none());
        assert!(store.find_by_numero("B").is_some());
        assert!(store.find_by_id(1).is_none());
    }

    #[test]
    fn clear_invalidates_pending_fetch() {
        let mut store = ProcessStore::new();
        let t = store.begin_fetch();
        store.clear();
        assert!(!store.commit(t, vec![rec(1, "A")]));
        assert!(store.is_empty());
    }
}
