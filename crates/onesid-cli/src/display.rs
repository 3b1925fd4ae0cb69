//! Terminal rendering for the panel table, detail card and settings lists.
//!
//! The table mirrors the web panel's columns; the detail card groups found
//! and pending relevant items the way the modal does.

use onesid_core::{
    DetailView, MasterList, PanelView, PreferenceList, ProcessRecord, User,
};
use onesid_panel::{Notice, NoticeKind};

const MAX_LIST_ITEMS: usize = 25;
const NUMERO_WIDTH: usize = 27;
const NAME_WIDTH: usize = 22;
const CLASS_WIDTH: usize = 14;
const STATUS_WIDTH: usize = 18;

// ── Panel table ──

/// Print one page of the panel with paging footer.
pub fn print_panel(view: &PanelView<'_>, title: &str) {
    println!("=== {title} ===");
    if view.rows.is_empty() {
        println!("Nenhum processo encontrado.");
        return;
    }

    println!("{}", header_line());
    for row in &view.rows {
        println!("{}", format_row(row.record, row.can_archive));
    }
    println!();
    print!(
        "Página {} de {} ({} processo(s))",
        view.current_page, view.total_pages, view.filtered_count
    );
    if view.has_previous() {
        print!("  [--page {}]", view.current_page - 1);
    }
    if view.has_next() {
        print!("  [--page {}]", view.current_page + 1);
    }
    println!();
}

fn header_line() -> String {
    format!(
        "{:>6}  {:<nw$}  {:<w$}  {:<cw$}  {:<sw$}  {:<16}  {}",
        "ID",
        "Número do processo",
        "Responsável",
        "Classificação",
        "Status",
        "Atualizado",
        "Ação",
        nw = NUMERO_WIDTH,
        w = NAME_WIDTH,
        cw = CLASS_WIDTH,
        sw = STATUS_WIDTH,
    )
}

/// One table line. Rows awaiting acknowledgment carry the archive marker.
pub fn format_row(record: &ProcessRecord, can_archive: bool) -> String {
    format!(
        "{:>6}  {:<nw$}  {:<w$}  {:<cw$}  {:<sw$}  {:<16}  {}",
        record.id,
        truncate(&record.numero_processo, NUMERO_WIDTH),
        truncate(record.responsavel_principal.as_deref().unwrap_or("-"), NAME_WIDTH),
        truncate(record.classificacao.as_deref().unwrap_or("-"), CLASS_WIDTH),
        truncate(record.status_geral.as_str(), STATUS_WIDTH),
        format_timestamp(record),
        if can_archive { "[arquivar]" } else { "" },
        nw = NUMERO_WIDTH,
        w = NAME_WIDTH,
        cw = CLASS_WIDTH,
        sw = STATUS_WIDTH,
    )
    .trim_end()
    .to_string()
}

/// Local `dd/mm/yyyy HH:MM`, the raw backend value if it cannot be parsed.
pub fn format_timestamp(record: &ProcessRecord) -> String {
    match (record.updated_at(), record.data_ultima_atualizacao.as_deref()) {
        (Some(ts), _) => ts
            .with_timezone(&chrono::Local)
            .format("%d/%m/%Y %H:%M")
            .to_string(),
        (None, Some(raw)) if !raw.trim().is_empty() => raw.to_string(),
        _ => "-".to_string(),
    }
}

/// Cut to `width` characters, marking the cut with `...`.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

// ── Detail card ──

pub fn print_detail(view: &DetailView, record: &ProcessRecord) {
    println!("=== {} ===", view.numero_processo);
    println!();

    println!("Processo");
    print_field("responsável", record.responsavel_principal.as_deref());
    print_field("classificação", record.classificacao.as_deref());
    print_field("status", Some(record.status_geral.as_str()));
    println!("  {:<20} {}", "atualizado", format_timestamp(record));
    println!();

    if !view.found.is_empty() {
        println!("Subsídios encontrados ({}):", view.found.len());
        for sub in view.found.iter().take(MAX_LIST_ITEMS) {
            println!("    {:<40}  {}", sub.item, sub.status);
        }
        if view.found.len() > MAX_LIST_ITEMS {
            println!("    ... e mais {}", view.found.len() - MAX_LIST_ITEMS);
        }
        println!();
    }

    if !view.pending.is_empty() {
        println!("Itens pendentes ({}):", view.pending.len());
        for item in view.pending.iter().take(MAX_LIST_ITEMS) {
            println!("    {item}");
        }
        if view.pending.len() > MAX_LIST_ITEMS {
            println!("    ... e mais {}", view.pending.len() - MAX_LIST_ITEMS);
        }
        println!();
    }

    println!("{}", view.summary());
}

fn print_field(name: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        println!("  {name:<20} {v}");
    }
}

// ── Settings ──

pub fn print_master(list: &MasterList) {
    println!("=== Itens relevantes ({}) ===", list.items().len());
    for item in list.items() {
        println!("  {item}");
    }
}

pub fn print_preferences(prefs: &PreferenceList) {
    println!("=== Preferências ===");
    for p in prefs.prefs() {
        let mark = if p.is_enabled { "[x]" } else { "[ ]" };
        println!("  {mark} {:>4}  {}", p.id, p.item_nome);
    }
}

pub fn print_users(users: &[User]) {
    println!("=== Usuários ({}) ===", users.len());
    for u in users {
        println!("  {:>4}  {:<24} {}", u.id, u.username, u.role);
    }
}

/// Status line on stderr, so stdout stays clean for piping.
pub fn print_notice(notice: &Notice) {
    let tag = match notice.kind {
        NoticeKind::Info => "..",
        NoticeKind::Success => "ok",
        NoticeKind::Warning => "aviso",
        NoticeKind::Error => "erro",
    };
    eprintln!("[{tag}] {}", notice.text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use onesid_core::StatusGeral;

    fn record(status: StatusGeral, updated: Option<&str>) -> ProcessRecord {
        ProcessRecord {
            id: 42,
            numero_processo: "0001234-56.2024.8.01.0001".into(),
            responsavel_principal: Some("Maria Aparecida dos Santos Oliveira".into()),
            classificacao: None,
            status_geral: status,
            data_ultima_atualizacao: updated.map(str::to_string),
            subsidios: Vec::new(),
            subsidios_pendentes: Vec::new(),
        }
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("curto", 10), "curto");
        assert_eq!(truncate("Responsável Principal", 10), "Respons...");
        assert_eq!(truncate("ção", 3), "ção");
    }

    #[test]
    fn row_marks_archivable_records() {
        let pending = record(StatusGeral::PendenteCiencia, None);
        let line = format_row(&pending, true);
        assert!(line.starts_with("    42"));
        assert!(line.ends_with("[arquivar]"));
        assert!(line.contains("Maria Aparecida dos..."));

        let monitoring = record(StatusGeral::Monitorando, None);
        assert!(!format_row(&monitoring, false).contains("[arquivar]"));
    }

    #[test]
    fn unparseable_timestamp_is_shown_raw() {
        assert_eq!(format_timestamp(&record(StatusGeral::Monitorando, None)), "-");
        assert_eq!(
            format_timestamp(&record(StatusGeral::Monitorando, Some("ontem"))),
            "ontem"
        );
        let parsed = format_timestamp(&record(
            StatusGeral::Monitorando,
            Some("2024-05-02T10:30:00Z"),
        ));
        assert_eq!(parsed.len(), "02/05/2024 10:30".len());
    }
}
