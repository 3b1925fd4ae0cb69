//! Filter / sort / paginate derivation of the visible panel rows.
//!
//! [`derive_view`] is a pure function of the records and the view state, so
//! every front-end computes the same page for the same inputs.

use std::cmp::Ordering;

use crate::model::ProcessRecord;

/// Substring filters, matched case-insensitively. Empty fields are inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub responsavel: String,
    pub numero_processo: String,
    pub classificacao: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Responsavel,
    NumeroProcesso,
    Classificacao,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.responsavel.is_empty()
            && self.numero_processo.is_empty()
            && self.classificacao.is_empty()
    }

    /// A missing record field never hides the row.
    pub fn matches(&self, record: &ProcessRecord) -> bool {
        contains_ci(record.responsavel_principal.as_deref(), &self.responsavel)
            && contains_ci(Some(&record.numero_processo), &self.numero_processo)
            && contains_ci(record.classificacao.as_deref(), &self.classificacao)
    }

    fn field_mut(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::Responsavel => &mut self.responsavel,
            FilterField::NumeroProcesso => &mut self.numero_processo,
            FilterField::Classificacao => &mut self.classificacao,
        }
    }
}

fn contains_ci(value: Option<&str>, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    match value {
        Some(v) => v.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    NumeroProcesso,
    Responsavel,
    Classificacao,
    Status,
    DataUltimaAtualizacao,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "numero" | "numero_processo" => Some(Self::NumeroProcesso),
            "responsavel" | "responsavel_principal" => Some(Self::Responsavel),
            "classificacao" => Some(Self::Classificacao),
            "status" | "status_geral" => Some(Self::Status),
            "data" | "data_ultima_atualizacao" => Some(Self::DataUltimaAtualizacao),
            _ => None,
        }
    }

    fn compare(self, a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::NumeroProcesso => a.numero_processo.cmp(&b.numero_processo),
            Self::Responsavel => a.responsavel_principal.cmp(&b.responsavel_principal),
            Self::Classificacao => a.classificacao.cmp(&b.classificacao),
            Self::Status => a.status_geral.as_str().cmp(b.status_geral.as_str()),
            Self::DataUltimaAtualizacao => a.updated_at().cmp(&b.updated_at()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Active sort. `key == None` keeps backend order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortConfig {
    pub key: Option<SortKey>,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn by(key: SortKey, direction: SortDirection) -> Self {
        Self {
            key: Some(key),
            direction,
        }
    }

    /// Header click: a new key starts ascending, the same key flips.
    pub fn toggled(self, key: SortKey) -> Self {
        match self.key {
            Some(current) if current == key => Self::by(key, self.direction.reversed()),
            _ => Self::by(key, SortDirection::Ascending),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [Self::Ten, Self::TwentyFive, Self::Fifty, Self::Hundred];

    pub fn get(self) -> usize {
        match self {
            Self::Ten => 10,
            Self::TwentyFive => 25,
            Self::Fifty => 50,
            Self::Hundred => 100,
        }
    }

    pub fn from_usize(n: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.get() == n)
    }
}

/// One visible row with the actions it offers.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow<'a> {
    pub record: &'a ProcessRecord,
    pub can_archive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView<'a> {
    pub rows: Vec<PanelRow<'a>>,
    pub filtered_count: usize,
    pub total_pages: usize,
    /// Page actually shown after clamping.
    pub current_page: usize,
}

impl PanelView<'_> {
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// `ceil(count / page_size)`; zero for an empty result.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Filter, sort and cut one page out of `records`.
pub fn derive_view<'a>(
    records: &'a [ProcessRecord],
    filters: &Filters,
    sort: SortConfig,
    page: usize,
    page_size: PageSize,
) -> PanelView<'a> {
    let mut filtered: Vec<&ProcessRecord> =
        records.iter().filter(|r| filters.matches(r)).collect();

    if let Some(key) = sort.key {
        filtered.sort_by(|a, b| {
            let ord = key.compare(a, b);
            match sort.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }

    let size = page_size.get();
    let filtered_count = filtered.len();
    let total = total_pages(filtered_count, size);
    let current_page = page.clamp(1, total.max(1));

    let rows = filtered
        .into_iter()
        .skip((current_page - 1) * size)
        .take(size)
        .map(|record| PanelRow {
            record,
            can_archive: record.can_archive(),
        })
        .collect();

    PanelView {
        rows,
        filtered_count,
        total_pages: total,
        current_page,
    }
}

/// Client-side view state of the panel table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    filters: Filters,
    sort: SortConfig,
    current_page: usize,
    page_size: PageSize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            sort: SortConfig::default(),
            current_page: 1,
            page_size: PageSize::default(),
        }
    }
}

impl ViewState {
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn sort(&self) -> SortConfig {
        self.sort
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn set_filter(&mut self, field: FilterField, value: impl Into<String>) {
        *self.filters.field_mut(field) = value.into();
        self.current_page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filters = Filters::default();
        self.current_page = 1;
    }

    pub fn request_sort(&mut self, key: SortKey) {
        self.sort = self.sort.toggled(key);
        self.current_page = 1;
    }

    pub fn set_sort(&mut self, sort: SortConfig) {
        self.sort = sort;
        self.current_page = 1;
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        self.page_size = size;
        self.current_page = 1;
    }

    /// Jump to `page`, clamped to the available range.
    pub fn go_to_page(&mut self, page: usize, total_pages: usize) {
        self.current_page = page.clamp(1, total_pages.max(1));
    }

    /// No-op on the last page.
    pub fn next_page(&mut self, total_pages: usize) {
        if self.current_page < total_pages {
            self.current_page += 1;
        }
    }

    /// No-op on the first page.
    pub fn previous_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    pub fn derive<'a>(&self, records: &'a [ProcessRecord]) -> PanelView<'a> {
        derive_view(
            records,
            &self.filters,
            self.sort,
            self.current_page,
            self.page_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatusGeral;

    fn rec(id: i64, numero: &str, resp: Option<&str>, class: Option<&str>) -> ProcessRecord {
        ProcessRecord {
            id,
            numero_processo: numero.into(),
            responsavel_principal: resp.map(Into::into),
            classificacao: class.map(Into::into),
            status_geral: StatusGeral::Monitorando,
            data_ultima_atualizacao: None,
            subsidios: Vec::new(),
            subsidios_pendentes: Vec::new(),
        }
    }

    fn sample() -> Vec<ProcessRecord> {
        vec![
            rec(3, "0003", Some("Carla Souza"), Some("Urgente")),
            rec(1, "0001", Some("Ana Lima"), Some("Normal")),
            rec(2, "0002", Some("bruno ana"), None),
            rec(4, "0004", None, Some("urgente - revisar")),
        ]
    }

    fn ids(view: &PanelView<'_>) -> Vec<i64> {
        view.rows.iter().map(|r| r.record.id).collect()
    }

    #[test]
    fn no_filters_keeps_backend_order() {
        let records = sample();
        let view = ViewState::default().derive(&records);
        assert_eq!(ids(&view), vec![3, 1, 2, 4]);
        assert_eq!(view.filtered_count, 4);
        assert_eq!(view.total_pages, 1);
    }

    #[test]
    fn substring_filter_is_case_insensitive() {
        let records = sample();
        let mut state = ViewState::default();
        state.set_filter(FilterField::Responsavel, "ANA");
        // Row 4 has no responsavel and therefore stays visible.
        assert_eq!(ids(&state.derive(&records)), vec![1, 2, 4]);
    }

    #[test]
    fn filter_text_is_matched_as_typed() {
        let records = sample();
        let mut state = ViewState::default();
        state.set_filter(FilterField::Responsavel, " ana ");
        // Padding is part of the match text.
        assert_eq!(ids(&state.derive(&records)), vec![4]);

        state.set_filter(FilterField::Responsavel, "a l");
        assert_eq!(ids(&state.derive(&records)), vec![1, 4]);
    }

    #[test]
    fn every_visible_row_satisfies_all_filters() {
        let records = sample();
        let mut state = ViewState::default();
        state.set_filter(FilterField::Classificacao, "urg");
        state.set_filter(FilterField::NumeroProcesso, "000");
        let view = state.derive(&records);
        for row in &view.rows {
            assert!(state.filters().matches(row.record));
        }
        // Row 2 lacks a classification, so it is not hidden by that filter.
        assert_eq!(ids(&view), vec![3, 2, 4]);
        let hidden: Vec<i64> = records
            .iter()
            .filter(|r| !ids(&view).contains(&r.id))
            .map(|r| r.id)
            .collect();
        assert_eq!(hidden, vec![1]);
    }

    #[test]
    fn sort_toggle_cycle() {
        let mut state = ViewState::default();
        state.request_sort(SortKey::Id);
        assert_eq!(state.sort(), SortConfig::by(SortKey::Id, SortDirection::Ascending));
        state.request_sort(SortKey::Id);
        assert_eq!(state.sort(), SortConfig::by(SortKey::Id, SortDirection::Descending));
        state.request_sort(SortKey::NumeroProcesso);
        assert_eq!(
            state.sort(),
            SortConfig::by(SortKey::NumeroProcesso, SortDirection::Ascending)
        );
    }

    #[test]
    fn numeric_sort_on_id() {
        let records = sample();
        let asc = derive_view(
            &records,
            &Filters::default(),
            SortConfig::by(SortKey::Id, SortDirection::Ascending),
            1,
            PageSize::Ten,
        );
        assert_eq!(ids(&asc), vec![1, 2, 3, 4]);
        let desc = derive_view(
            &records,
            &Filters::default(),
            SortConfig::by(SortKey::Id, SortDirection::Descending),
            1,
            PageSize::Ten,
        );
        assert_eq!(ids(&desc), vec![4, 3, 2, 1]);
    }

    #[test]
    fn chronological_sort_across_timestamp_forms() {
        let mut records = sample();
        records[0].data_ultima_atualizacao = Some("2024-03-01T09:00:00".into());
        records[1].data_ultima_atualizacao = Some("Fri, 01 Mar 2024 08:00:00 GMT".into());
        records[2].data_ultima_atualizacao = Some("2024-02-28T23:00:00-03:00".into());
        records[3].data_ultima_atualizacao = None;
        let view = derive_view(
            &records,
            &Filters::default(),
            SortConfig::by(SortKey::DataUltimaAtualizacao, SortDirection::Ascending),
            1,
            PageSize::Ten,
        );
        // 2024-02-29T02:00Z < 2024-03-01T08:00Z < 2024-03-01T09:00Z, missing first.
        assert_eq!(ids(&view), vec![4, 2, 1, 3]);
    }

    #[test]
    fn page_count_is_ceiling() {
        for (count, size, expected) in [(0, 10, 0), (1, 10, 1), (10, 10, 1), (11, 10, 2), (101, 25, 5)] {
            assert_eq!(total_pages(count, size), expected, "{count}/{size}");
        }
    }

    #[test]
    fn pagination_and_boundaries() {
        let records: Vec<ProcessRecord> = (1..=23)
            .map(|i| rec(i, &format!("{i:04}"), None, None))
            .collect();
        let mut state = ViewState::default();
        let view = state.derive(&records);
        assert_eq!(view.total_pages, 3);
        assert!(!view.has_previous());

        state.next_page(view.total_pages);
        state.next_page(view.total_pages);
        state.next_page(view.total_pages);
        assert_eq!(state.current_page(), 3);
        let last = state.derive(&records);
        assert_eq!(last.rows.len(), 3);
        assert!(!last.has_next());

        state.previous_page();
        state.previous_page();
        state.previous_page();
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn filter_or_sort_change_resets_page() {
        let mut state = ViewState::default();
        state.go_to_page(3, 5);
        state.set_filter(FilterField::Responsavel, "a");
        assert_eq!(state.current_page(), 1);

        state.go_to_page(2, 5);
        state.request_sort(SortKey::Status);
        assert_eq!(state.current_page(), 1);

        state.go_to_page(2, 5);
        state.set_page_size(PageSize::Fifty);
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn stale_page_is_clamped_when_result_shrinks() {
        let records = sample();
        let view = derive_view(&records, &Filters::default(), SortConfig::default(), 9, PageSize::Ten);
        assert_eq!(view.current_page, 1);
        assert_eq!(view.rows.len(), 4);
    }

    #[test]
    fn archive_action_only_on_pending_rows() {
        let mut records = sample();
        records[1].status_geral = StatusGeral::PendenteCiencia;
        let view = ViewState::default().derive(&records);
        let archivable: Vec<i64> = view
            .rows
            .iter()
            .filter(|r| r.can_archive)
            .map(|r| r.record.id)
            .collect();
        assert_eq!(archivable, vec![1]);
    }

    #[test]
    fn derivation_is_deterministic() {
        let records = sample();
        let mut state = ViewState::default();
        state.request_sort(SortKey::Responsavel);
        assert_eq!(state.derive(&records), state.derive(&records));
    }

    #[test]
    fn page_size_choices() {
        assert_eq!(PageSize::from_usize(25), Some(PageSize::TwentyFive));
        assert_eq!(PageSize::from_usize(20), None);
        assert_eq!(PageSize::default().get(), 10);
    }
}
