//! Reports printed at the end of each command.

use owo_colors::OwoColorize;

use super::Section;
use crate::budget::{CostEstimate, GateDecision};
use crate::hierarchy::Hierarchy;
use crate::ledger::{Ledger, LedgerEntry};
use crate::migrate::{EstimateReport, MigrationReport, RunOutcome};

fn usd(amount: f64) -> String {
    format!("${amount:.4}")
}

fn estimate_lines(section: Section, estimate: &CostEstimate) -> Section {
    section
        .item("Documents", estimate.documents)
        .item("New folders", estimate.folders)
        .item(
            "Estimated tokens",
            format!(
                "{} ({} in / {} out)",
                estimate.tokens.total(),
                estimate.tokens.input_tokens,
                estimate.tokens.output_tokens
            ),
        )
        .item("Estimated cost", usd(estimate.cost))
}

/// Summary of a `run`. The batch counts are always present.
pub fn render_report(report: &MigrationReport, color: bool) -> String {
    let stats = &report.stats;
    let title = if stats.simulated > 0 { "Dry run summary" } else { "Run summary" };
    let mut section = Section::new(color).title(title);

    match &report.outcome {
        RunOutcome::NothingToDo => {
            section = section.text("  Every document is already translated and current.");
        }
        RunOutcome::BudgetRejected { estimated, ceiling } => {
            section = section.warning(
                "Budget exceeded",
                format!("estimated {} > limit {}", usd(*estimated), usd(*ceiling)),
            );
        }
        RunOutcome::Aborted { reason } => {
            section = section.warning("Stopped early", reason);
        }
        RunOutcome::Completed => {}
    }

    section = section
        .item("Translated", stats.translated)
        .item("Skipped", stats.skipped);
    section = if stats.is_clean() {
        section.item("Errored", stats.errored)
    } else {
        section.warning("Errored", stats.errored)
    };
    if stats.simulated > 0 {
        section = section.item("Simulated", stats.simulated);
    }
    if stats.superseded > 0 {
        section = section.item("Superseded", stats.superseded);
    }
    section = section
        .item("Already current", stats.up_to_date)
        .item("Left for later runs", stats.remaining);

    let folders = &stats.folders;
    if folders.created + folders.reused_from_cache + folders.reused_from_ledger + folders.adopted_existing > 0 {
        section = section.empty_line().title("Folders").item("Created", folders.created).item(
            "Reused",
            folders.reused_from_cache + folders.reused_from_ledger + folders.adopted_existing,
        );
        if folders.search_failures > 0 {
            section = section.warning("Search failures", folders.search_failures);
        }
    }

    if let Some(estimate) = &report.estimate {
        section = estimate_lines(section.empty_line().title("Cost"), estimate);
    }
    section = section
        .item("Actual tokens", report.usage.total())
        .item("Actual cost", usd(report.actual_cost))
        .item("Elapsed", format!("{:.1}s", stats.duration.as_secs_f64()));

    if let Some(preview) = &report.preview {
        section = section
            .empty_line()
            .title(format!("Sample translation of '{}'", preview.source_title))
            .item("Title", &preview.translated_title)
            .text(indent(&preview.translated_body));
    }

    if !stats.failures.is_empty() {
        section = section.empty_line().title("Failures");
        for failure in &stats.failures {
            section = section.warning(&failure.title, &failure.error);
        }
    }

    section.render()
}

/// Output of the `estimate` command.
pub fn render_estimate(report: &EstimateReport, color: bool) -> String {
    let mut section = estimate_lines(Section::new(color).title("Next batch"), &report.estimate)
        .item("Already current", report.up_to_date)
        .item("Left for later runs", report.remaining);

    section = match report.decision {
        GateDecision::Allow => section.item("Budget", "within limit"),
        GateDecision::Reject { estimated, ceiling } => section.warning(
            "Budget",
            format!("estimated {} > limit {}", usd(estimated), usd(ceiling)),
        ),
    };
    section.render()
}

/// Indented tree of a collection, marking ledger status and orphans.
pub fn render_tree(hierarchy: &Hierarchy, ledger: &Ledger, color: bool) -> String {
    let orphans: Vec<&str> = hierarchy.orphans().map(|node| node.id()).collect();
    let mut out = String::new();

    for (depth, node) in hierarchy.walk() {
        let doc = node.document();
        let status = match ledger.get(&doc.id) {
            Some(_) if ledger.needs_update(doc) => "modified",
            Some(_) => "translated",
            None => "pending",
        };
        let marker = match (status, color) {
            (_, false) => format!("[{status}]"),
            ("translated", true) => format!("[{}]", status.green()),
            ("modified", true) => format!("[{}]", status.yellow()),
            (_, true) => format!("[{}]", status.dimmed()),
        };
        let orphan = if orphans.contains(&node.id()) { " (orphan)" } else { "" };
        out.push_str(&format!(
            "{}{} {}{}\n",
            "  ".repeat(depth),
            doc.title,
            marker,
            orphan
        ));
    }

    out.push_str(&format!(
        "\n{} documents, {} roots, {} orphans\n",
        hierarchy.len(),
        hierarchy.roots().count(),
        orphans.len()
    ));
    out
}

/// One line per ledger entry.
pub fn render_ledger(entries: &[(String, LedgerEntry)], color: bool) -> String {
    if entries.is_empty() {
        return "Ledger is empty\n".to_string();
    }
    let mut out = String::new();
    for (source_id, entry) in entries {
        let arrow = if color { "->".dimmed().to_string() } else { "->".to_string() };
        out.push_str(&format!(
            "{source_id} {arrow} {}  {} ({})\n",
            entry.destination_id,
            entry.source_title,
            entry.translated_at.format("%Y-%m-%d %H:%M")
        ));
    }
    out.push_str(&format!("\n{} entries\n", entries.len()));
    out
}

/// Every field of a single entry.
pub fn render_ledger_entry(source_id: &str, entry: &LedgerEntry, color: bool) -> String {
    Section::new(color)
        .title(source_id)
        .item("Destination id", &entry.destination_id)
        .item("Source title", &entry.source_title)
        .item("Destination title", &entry.destination_title)
        .item("Source updated", entry.source_updated_at.to_rfc3339())
        .item("Translated at", entry.translated_at.to_rfc3339())
        .render()
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
