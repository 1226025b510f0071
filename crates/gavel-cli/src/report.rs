//! Final report export: JSON file plus human-readable summaries.

use std::fmt::Write as _;
use std::path::Path;

use gavel_types::constants::PAISE_PER_CRORE;
use gavel_types::{Amount, FinalReport, Lot, LotCategory, Result, to_crore};
use rust_decimal::Decimal;

/// Write `report` as pretty JSON.
pub fn write_report(path: &Path, report: &FinalReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Multi-line summary for the terminal. Amounts in crore.
pub fn summary(report: &FinalReport) -> String {
    let stats = &report.statistics;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Room {}{}",
        report.code,
        if report.ended_early { " (ended early)" } else { "" }
    );
    let _ = writeln!(
        out,
        "  sold {} / unsold {} of {} lots, spent {} Cr, average {} Cr",
        stats.total_players_sold,
        stats.total_unsold,
        stats.total_lots,
        to_crore(stats.total_spent),
        (stats.average_price / Decimal::from(PAISE_PER_CRORE))
            .round_dp(2)
            .normalize(),
    );
    if let Some(top) = &stats.most_expensive {
        let _ = writeln!(
            out,
            "  most expensive: {} to {} at {} Cr",
            top.lot.name,
            top.winner_name.as_deref().unwrap_or("-"),
            to_crore(top.final_price)
        );
    }
    for team in &report.teams {
        let _ = writeln!(
            out,
            "  {:<20} {:>2} lots, spent {:>6} Cr, left {:>6} Cr",
            team.display_name,
            team.roster.len(),
            to_crore(team.total_spent),
            to_crore(team.purse_remaining),
        );
    }
    out
}

/// Per-category breakdown of a parsed catalog.
pub fn catalog_summary(source: &str, lots: &[Lot]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} lots in {source}", lots.len());
    for category in LotCategory::ALL {
        let count = lots.iter().filter(|l| l.category == category).count();
        let _ = writeln!(out, "  {category}: {count}");
    }
    let total: Amount = lots.iter().map(|l| l.base_price).sum();
    let _ = writeln!(out, "  total base value: {} Cr", to_crore(total));
    out
}
