use chrono::Days;
use clap::Subcommand;
use focusplus_core::{format_duration, AppConfig, DailySummary};
use serde::Serialize;

use super::{open_engine, print_json, CmdResult};

/// Each day in a range is one store read.
const MAX_RANGE_DAYS: u32 = 3660;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's totals
    Today,
    /// One summary per day, ending today
    Range {
        /// Number of days to include
        #[arg(long, default_value = "7")]
        days: u32,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Today {
    #[serde(flatten)]
    summary: DailySummary,
    total_focus: String,
}

pub fn run(action: StatsAction, config: &AppConfig) -> CmdResult {
    let engine = open_engine(config)?;

    match action {
        StatsAction::Today => {
            let summary = engine.daily_summary(engine.today())?;
            let total_focus = format_duration(summary.total_focus_ms);
            print_json(&Today {
                summary,
                total_focus,
            })?;
        }
        StatsAction::Range { days } => {
            if days == 0 || days > MAX_RANGE_DAYS {
                return Err(format!("--days must be between 1 and {MAX_RANGE_DAYS}").into());
            }
            let to = engine.today();
            let from = to
                .checked_sub_days(Days::new(u64::from(days) - 1))
                .ok_or("--days reaches before the earliest supported date")?;
            print_json(&engine.summaries_between(from, to)?)?;
        }
    }
    Ok(())
}
