//! Detail projection for a selected process.

use crate::model::{ProcessRecord, Subsidio};

/// What the detail modal shows for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub numero_processo: String,
    pub pending: Vec<String>,
    pub found: Vec<Subsidio>,
}

impl DetailView {
    pub fn project(record: &ProcessRecord) -> Self {
        Self {
            numero_processo: record.numero_processo.clone(),
            pending: record.subsidios_pendentes.clone(),
            found: record.subsidios.clone(),
        }
    }

    /// Every relevant item was located.
    pub fn all_found(&self) -> bool {
        self.pending.is_empty() && !self.found.is_empty()
    }

    pub fn nothing_found(&self) -> bool {
        self.pending.is_empty() && self.found.is_empty()
    }

    pub fn summary(&self) -> &'static str {
        if self.all_found() {
            "Todos os itens relevantes foram encontrados."
        } else if self.nothing_found() {
            "Nenhum subsídio encontrado."
        } else if self.found.is_empty() {
            "Nenhum item relevante encontrado até o momento."
        } else {
            "Itens relevantes ainda pendentes."
        }
    }
}

/// Selection state of the detail modal.
#[derive(Debug, Clone, Default)]
pub struct DetailModal {
    selected: Option<ProcessRecord>,
}

impl DetailModal {
    pub fn open(&mut self, record: ProcessRecord) {
        self.selected = Some(record);
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&ProcessRecord> {
        self.selected.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    /// `None` when nothing is selected.
    pub fn view(&self) -> Option<DetailView> {
        self.selected.as_ref().map(DetailView::project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatusGeral;

    fn record(found: &[(&str, &str)], pending: &[&str]) -> ProcessRecord {
        ProcessRecord {
            id: 1,
            numero_processo: "0001234-56.2024.8.01.0001".into(),
            responsavel_principal: None,
            classificacao: None,
            status_geral: StatusGeral::Monitorando,
            data_ultima_atualizacao: None,
            subsidios: found
                .iter()
                .map(|(item, status)| Subsidio {
                    item: (*item).into(),
                    status: (*status).into(),
                })
                .collect(),
            subsidios_pendentes: pending.iter().map(|s| (*s).into()).collect(),
        }
    }

    #[test]
    fn closed_modal_renders_nothing() {
        let mut modal = DetailModal::default();
        assert!(modal.view().is_none());
        modal.open(record(&[], &[]));
        assert!(modal.is_open());
        modal.close();
        assert!(modal.view().is_none());
    }

    #[test]
    fn all_found_when_no_pending() {
        let view = DetailView::project(&record(&[("Contrato", "Encontrado")], &[]));
        assert!(view.all_found());
        assert_eq!(view.summary(), "Todos os itens relevantes foram encontrados.");
    }

    #[test]
    fn pending_and_found_listed_in_order() {
        let view = DetailView::project(&record(
            &[("Contrato", "Encontrado"), ("Extrato", "Parcial")],
            &["Procuração", "Laudo"],
        ));
        assert!(!view.all_found());
        assert_eq!(view.pending, vec!["Procuração", "Laudo"]);
        assert_eq!(view.found[1].status, "Parcial");
        assert_eq!(view.summary(), "Itens relevantes ainda pendentes.");
    }

    #[test]
    fn empty_record_projects_without_fault() {
        let view = DetailView::project(&record(&[], &[]));
        assert!(view.nothing_found());
        assert!(!view.all_found());
        assert_eq!(view.summary(), "Nenhum subsídio encontrado.");
    }
}
