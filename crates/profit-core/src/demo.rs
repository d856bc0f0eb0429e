//! Offline demo data set
//!
//! Used when no backend is configured. The running project total is
//! accumulated here on the client in chronological order; the records are
//! then delivered newest first, the way the backend would send them.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::codec;
use crate::constants;
use crate::models::ProfitRecord;
use crate::store::AggregateStats;

struct DemoProfit {
    amount: &'static str,
    worker_percent: u32,
    service: &'static str,
    worker: &'static str,
    /// (year, month, day, hour, minute), local time
    at: (i32, u32, u32, u32, u32),
}

const DEMO_PROFITS: &[DemoProfit] = &[
    DemoProfit {
        amount: "5.400",
        worker_percent: 85,
        service: "WalletPay",
        worker: "#cryptohunter",
        at: (2025, 8, 17, 21, 10),
    },
    DemoProfit {
        amount: "12.300",
        worker_percent: 65,
        service: "FiatGate",
        worker: "#protrader",
        at: (2025, 8, 18, 15, 20),
    },
    DemoProfit {
        amount: "7.850",
        worker_percent: 75,
        service: "CryptoEx",
        worker: "#moneymaker",
        at: (2025, 8, 18, 19, 30),
    },
    DemoProfit {
        amount: "15.200",
        worker_percent: 70,
        service: "BankApp",
        worker: "#cryptomaster",
        at: (2025, 8, 18, 22, 45),
    },
    DemoProfit {
        amount: "9.600",
        worker_percent: 80,
        service: "MarketPlace",
        worker: "#unluckdays",
        at: (2025, 8, 19, 10, 15),
    },
];

/// Demo records (newest first) and the matching demo totals
pub fn demo_snapshot() -> (Vec<ProfitRecord>, AggregateStats) {
    let mut running_total = 0.0;

    let mut records: Vec<ProfitRecord> = DEMO_PROFITS
        .iter()
        .map(|p| {
            let amount = codec::parse_amount(p.amount);
            running_total += amount;
            ProfitRecord {
                amount,
                worker_percent: p.worker_percent,
                service: p.service.to_string(),
                worker: p.worker.to_string(),
                date: local_time(p.at),
                project_running_total: running_total,
            }
        })
        .collect();
    records.reverse();

    let stats = AggregateStats {
        total_amount: constants::DEMO_TOTAL_AMOUNT,
        worker_count: constants::DEMO_WORKER_COUNT,
        record_count: constants::DEMO_PROFIT_COUNT,
    };
    (records, stats)
}

fn local_time((year, month, day, hour, minute): (i32, u32, u32, u32, u32)) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
