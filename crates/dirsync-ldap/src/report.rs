//! Tabular report over a directory snapshot.

use crate::entry::{DirectoryEntry, DirectorySnapshot};
use comfy_table::{presets::UTF8_FULL, Table};

const TITLE_WIDTH: usize = 40;

const HEADER: [&str; 9] = [
    "ID",
    "First",
    "Last",
    "Department",
    "Job title",
    "Mobile",
    "Email",
    "Division",
    "uid",
];

/// Renders the snapshot as a table sorted by surname.
///
/// Multi-valued attributes are comma-joined, absent attributes render blank
/// and the job title is truncated to 40 characters. Entries with equal
/// surnames keep their snapshot (DN) order.
pub(crate) fn render(snapshot: &DirectorySnapshot) -> String {
    let mut entries: Vec<&DirectoryEntry> = snapshot.values().collect();
    entries.sort_by_key(|entry| entry.text("sn").to_lowercase());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(HEADER.to_vec());

    for entry in entries {
        table.add_row(vec![
            entry.text("employeeNumber"),
            entry.text("givenName"),
            entry.text("sn"),
            entry.text("departmentNumber"),
            truncate(&entry.text("title"), TITLE_WIDTH),
            entry.text("mobile"),
            entry.text("mail"),
            entry.text("ou"),
            entry.uid().unwrap_or_default().to_string(),
        ]);
    }

    table.to_string()
}

fn truncate(value: &str, width: usize) -> String {
    value.chars().take(width).collect()
}
