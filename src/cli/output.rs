//! CLI output rendering

use crate::diff::{Change, DiffEntry, DiffResult};
use crate::error::OpError;
use crate::tree::Tree;
use comfy_table::{presets, Table};
use owo_colors::OwoColorize;

/// Human-readable size with a 1024 divisor.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}{}", UNITS[0])
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

/// Plain `oid<TAB>path` listing, one entry per line.
pub fn render_ls(tree: &Tree) -> String {
    let mut lines = Vec::with_capacity(tree.len());
    for (key, entry) in tree.iter() {
        lines.push(format!("{}\t{}", entry.oid(), key));
    }
    lines.join("\n")
}

/// Tabular listing with metadata columns.
pub fn render_ls_long(tree: &Tree) -> String {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(vec!["PATH", "KIND", "SIZE", "MTIME", "OID"]);

    for (key, entry) in tree.iter() {
        let kind = if entry.is_dir() { "dir" } else { "file" };
        let mtime = entry
            .meta
            .mtime_utc()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            key.to_string(),
            kind.to_string(),
            format_size(entry.meta.size),
            mtime,
            entry.oid().short(),
        ]);
    }

    table.to_string()
}

fn entry_info(entry: &DiffEntry) -> String {
    let path = if entry.key.is_root() {
        "ROOT".to_string()
    } else {
        entry.key.to_string()
    };
    let cache_info = if entry.in_cache { "" } else { ", missing" };
    format!("{path} ({}{cache_info})", entry.oid.short())
}

fn change_line(state: &str, change: &Change) -> String {
    match (&change.old, &change.new) {
        (Some(old), Some(new)) if state == "modified" => {
            format!("{state}: {} -> {}", entry_info(old), entry_info(new))
        }
        (_, Some(new)) if state == "added" => format!("{state}: {}", entry_info(new)),
        (Some(old), _) => format!("{state}: {}", entry_info(old)),
        (_, Some(new)) => format!("{state}: {}", entry_info(new)),
        (None, None) => unreachable!("change with neither side"),
    }
}

/// Render a diff, one classified entry per line, in classification order.
/// Unchanged entries that are present in the store stay hidden unless
/// requested.
pub fn render_diff(diff: &DiffResult, show_unchanged: bool) -> String {
    let mut lines = Vec::new();

    for change in &diff.added {
        lines.push(change_line("added", change).green().to_string());
    }
    for change in &diff.deleted {
        lines.push(change_line("deleted", change).red().to_string());
    }
    for change in &diff.modified {
        lines.push(change_line("modified", change).yellow().to_string());
    }
    for change in &diff.unchanged {
        let in_cache = change.new.as_ref().map_or(false, |e| e.in_cache);
        if show_unchanged || !in_cache {
            lines.push(change_line("unchanged", change));
        }
    }

    lines.join("\n")
}

/// Object count / total size summary table.
pub fn render_count(count: usize, total_bytes: u64) -> String {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(vec!["OBJECTS", "SIZE"]);
    table.add_row(vec![count.to_string(), format_size(total_bytes)]);
    table.to_string()
}

/// User-facing error rendering: the error kind plus the offending path or
/// reference, without internal chains.
pub fn map_error(error: &OpError) -> String {
    match error {
        OpError::Conflict(paths) => {
            let mut out = String::from("Following files in conflicts:\n");
            out.push_str(&paths.join("\n"));
            out
        }
        other => format!("error: {other}"),
    }
}
