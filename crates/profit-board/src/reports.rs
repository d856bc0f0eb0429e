//! Console output and CSV export

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use csv::Writer;
use std::path::Path;

use profit_core::constants;
use profit_core::{
    format_grouped, format_limited, Bucket, FilterKind, IdentityEntry, Overview, ProfitRecord,
    WorkerCard, WorkerLookupResult,
};

/// Amount with grouped thousands and the currency suffix
pub fn money(value: f64, currency: &str) -> String {
    format!("{} {}", format_grouped(value), currency)
}

/// "19.08 10:15" in local time
pub fn short_date(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%d.%m %H:%M").to_string()
}

pub fn print_stats(overview: &Overview, currency: &str) {
    let stats = &overview.stats;

    println!("\n============================================================");
    println!("                      PROFIT SUMMARY");
    println!("============================================================\n");
    println!("  Total amount:       {:>20}", money(stats.total_amount, currency));
    println!("  Workers:            {:>20}", stats.worker_count);
    println!("  Profits:            {:>20}", stats.record_count);
    println!(
        "  Average per profit: {:>20}",
        format!(
            "{} {}",
            format_limited(overview.average_per_record, constants::DISPLAY_DECIMALS),
            currency
        )
    );
    println!("============================================================");
}

pub fn print_feed(records: &[ProfitRecord], filter: FilterKind, currency: &str) {
    if records.is_empty() {
        match filter {
            FilterKind::Today => println!("No profits today."),
            _ => println!("No profits yet."),
        }
        return;
    }

    println!(
        "{:<12} {:<14} {:<18} {:>14} {:>6} {:>16}",
        "Date", "Service", "Worker", "Amount", "Share", "Project total"
    );
    println!("{}", "-".repeat(85));

    for record in records {
        println!(
            "{:<12} {:<14} {:<18} {:>14} {:>6} {:>16}",
            short_date(&record.date),
            record.service,
            record.worker,
            money(record.amount, currency),
            record.worker_percent_text(),
            money(record.project_running_total, currency),
        );
    }

    println!("{}", "-".repeat(85));
    println!("{} profit(s) shown ({})", records.len(), filter);
}

pub fn print_breakdown(title: &str, buckets: &[Bucket], currency: &str) {
    if buckets.is_empty() {
        println!("No data for {} breakdown.", title.to_lowercase());
        return;
    }

    println!("{:<20} {:>8} {:>18}", title, "Profits", "Total");
    println!("{}", "-".repeat(48));
    for bucket in buckets {
        println!(
            "{:<20} {:>8} {:>18}",
            bucket.label,
            bucket.count,
            money(bucket.total_amount, currency)
        );
    }
}

pub fn print_workers(cards: &[WorkerCard], currency: &str) {
    if cards.is_empty() {
        println!("No workers registered.");
        return;
    }

    println!(
        "{:<4} {:<18} {:<22} {:<8} {:>8} {:>16}",
        "", "Username", "Name", "Status", "Profits", "Total"
    );
    println!("{}", "-".repeat(81));
    for card in cards {
        println!(
            "{:<4} {:<18} {:<22} {:<8} {:>8} {:>16}",
            card.initials,
            card.username,
            card.display_name,
            if card.active { "active" } else { "pending" },
            card.count,
            money(card.total_amount, currency)
        );
    }
}

pub fn print_identity(entry: &IdentityEntry) {
    println!("Handle:     @{}", entry.handle);
    println!("Name:       {} {}", entry.first_name, entry.last_name);
    println!(
        "Identity:   {}",
        entry.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("Source:     {}", entry.source);
}

pub fn print_worker_lookup(result: &WorkerLookupResult) {
    print_identity(&result.entry);
    match &result.registration {
        Some(Ok(response)) => {
            let action = response
                .action
                .map(|a| a.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("Backend:    {}", action);
        }
        Some(Err(e)) => println!("Backend:    failed ({})", e),
        None => println!("Backend:    offline, not registered"),
    }
}

/// Write records to a CSV file. Returns the number of rows written.
pub fn export_records(path: &Path, records: &[ProfitRecord]) -> Result<usize> {
    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    // Header
    wtr.write_record([
        "Date",
        "Service",
        "Worker",
        "Amount",
        "Worker_Percent",
        "Project_Total",
    ])?;

    for record in records {
        wtr.write_record([
            &record.date.to_rfc3339(),
            &record.service,
            &record.worker,
            &record.amount.to_string(),
            &record.worker_percent.to_string(),
            &record.project_running_total.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(records.len())
}
