//! Aggregate statistics and per-service / per-worker breakdowns

use std::collections::HashMap;

use crate::models::{ProfitRecord, Worker};
use crate::store::AggregateStats;

/// One group of a breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub label: String,
    pub count: u64,
    pub total_amount: f64,
}

/// Group by exact service label (no case folding, no trimming).
/// Sorted by total descending; ties keep first-seen order.
pub fn by_service(records: &[ProfitRecord]) -> Vec<Bucket> {
    group_by(records, |r| r.service.as_str())
}

/// Group by worker handle with the leading `@` removed, so "@alice" and
/// "alice" share a bucket. Same ordering as [`by_service`].
pub fn by_worker(records: &[ProfitRecord]) -> Vec<Bucket> {
    group_by(records, |r| worker_handle(&r.worker))
}

/// Average amount per record over backend totals; zero with no records
pub fn average_per_record(stats: &AggregateStats) -> f64 {
    if stats.record_count > 0 {
        stats.total_amount / stats.record_count as f64
    } else {
        0.0
    }
}

/// Strip one leading `@` from a worker handle
pub fn worker_handle(raw: &str) -> &str {
    raw.strip_prefix('@').unwrap_or(raw)
}

fn group_by<'a, F>(records: &'a [ProfitRecord], key: F) -> Vec<Bucket>
where
    F: Fn(&'a ProfitRecord) -> &'a str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();

    for record in records {
        let label = key(record);
        let slot = *index.entry(label).or_insert_with(|| {
            buckets.push(Bucket {
                label: label.to_string(),
                count: 0,
                total_amount: 0.0,
            });
            buckets.len() - 1
        });
        buckets[slot].count += 1;
        buckets[slot].total_amount += record.amount;
    }

    // sort_by is stable: equal totals keep encounter order
    buckets.sort_by(|a, b| b.total_amount.total_cmp(&a.total_amount));
    buckets
}

/// Worker listing joined with its profit statistics
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerCard {
    pub username: String,
    pub display_name: String,
    pub initials: String,
    pub active: bool,
    pub count: u64,
    pub total_amount: f64,
}

/// Join backend workers with the per-worker breakdown of `records`.
/// Workers without profits get zero counts; order follows `workers`.
pub fn worker_cards(workers: &[Worker], records: &[ProfitRecord]) -> Vec<WorkerCard> {
    let breakdown = by_worker(records);
    let lookup: HashMap<&str, &Bucket> = breakdown.iter().map(|b| (b.label.as_str(), b)).collect();

    workers
        .iter()
        .map(|worker| {
            let bucket = lookup.get(worker_handle(&worker.username));
            WorkerCard {
                username: worker.username.clone(),
                display_name: worker.display_name().to_string(),
                initials: initials(worker.display_name()),
                active: worker.is_active(),
                count: bucket.map(|b| b.count).unwrap_or(0),
                total_amount: bucket.map(|b| b.total_amount).unwrap_or(0.0),
            }
        })
        .collect()
}

/// Avatar initials: "Alice Smith" -> "AS", "@bob" -> "BO", "" -> "?"
pub fn initials(name: &str) -> String {
    let clean = name.replacen('@', "", 1);
    let words: Vec<&str> = clean.split(' ').filter(|w| !w.is_empty()).collect();

    match words.as_slice() {
        [] => "?".to_string(),
        [word] => word.chars().take(2).collect::<String>().to_uppercase(),
        _ => words
            .iter()
            .take(2)
            .filter_map(|w| w.chars().next())
            .collect::<String>()
            .to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record(service: &str, worker: &str, amount: f64) -> ProfitRecord {
        ProfitRecord {
            amount,
            worker_percent: 70,
            service: service.to_string(),
            worker: worker.to_string(),
            date: Utc::now(),
            project_running_total: 0.0,
        }
    }

    #[test]
    fn test_by_service_sorted_descending() {
        let records = vec![
            record("WalletPay", "a", 100.0),
            record("BankApp", "a", 500.0),
            record("WalletPay", "b", 50.0),
        ];
        let buckets = by_service(&records);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "BankApp");
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].label, "WalletPay");
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[1].total_amount, 150.0);
    }

    #[test]
    fn test_by_service_is_case_sensitive() {
        let records = vec![record("walletpay", "a", 1.0), record("WalletPay", "a", 1.0)];
        assert_eq!(by_service(&records).len(), 2);
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let records = vec![
            record("Zeta", "a", 10.0),
            record("Alpha", "a", 10.0),
            record("Mid", "a", 10.0),
        ];
        let labels: Vec<_> = by_service(&records).into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_by_worker_strips_at_prefix() {
        let records = vec![
            record("s", "@alice", 10.0),
            record("s", "alice", 5.0),
            record("s", "bob", 1.0),
        ];
        let buckets = by_worker(&records);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "alice");
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].total_amount, 15.0);
    }

    #[test]
    fn test_average_per_record() {
        let stats = AggregateStats {
            total_amount: 34463.0,
            worker_count: 6,
            record_count: 156,
        };
        assert!((average_per_record(&stats) - 220.916_666).abs() < 1e-3);
        assert_eq!(average_per_record(&AggregateStats::ZERO), 0.0);
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Alice Smith"), "AS");
        assert_eq!(initials("@bob"), "BO");
        assert_eq!(initials("anna maria lopez"), "AM");
        assert_eq!(initials("x"), "X");
        assert_eq!(initials(""), "?");
        assert_eq!(initials("   "), "?");
    }

    #[test]
    fn test_worker_cards() {
        let workers = vec![
            Worker {
                username: "alice".to_string(),
                name: Some("Alice Smith".to_string()),
                telegram_id: Some(json!("123")),
                register_date: None,
            },
            Worker {
                username: "carol".to_string(),
                ..Default::default()
            },
        ];
        let records = vec![record("s", "@alice", 10.0), record("s", "alice", 5.0)];

        let cards = worker_cards(&workers, &records);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].initials, "AS");
        assert!(cards[0].active);
        assert_eq!(cards[0].count, 2);
        assert_eq!(cards[0].total_amount, 15.0);
        assert_eq!(cards[1].display_name, "carol");
        assert!(!cards[1].active);
        assert_eq!(cards[1].count, 0);
        assert_eq!(cards[1].total_amount, 0.0);
    }
}
