use std::path::PathBuf;

use csv::WriterBuilder;
use greensand_core::{
    db::{Aggregate, ReadingStore},
    reading::SeriesId,
    summary::{summarize, RangeSummary},
};

use crate::{
    commands::{common, Result},
    util::{self, bold},
};

#[derive(Debug)]
pub struct SummaryCommandArgs {
    pub series: String,
    pub day: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub json: bool,
    pub out: Option<PathBuf>,
}

/// Summarize a series over a day range and print it as an aligned table,
/// JSON, or a CSV file.
pub async fn summary(db: &impl ReadingStore, args: SummaryCommandArgs) -> Result<()> {
    let series: SeriesId = args.series.parse()?;
    let (start, end) = common::resolve_range(args.day, args.start, args.end)?;
    let limits = common::resolve_limits(args.lower, args.upper)?;

    let Some(summary) = summarize(db, series, start, end, limits)? else {
        println!("no readings for {series} in {start}..{end}");
        return Ok(());
    };

    if let Some(out_path) = args.out {
        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .from_path(&out_path)?;
        util::write_summary_rows(&mut writer, &summary)?;
        println!("daily breakdown written to {}", out_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RangeSummary) {
    let overall = &summary.overall;
    let band = match overall.limits {
        Some(limits) => format!("limits {limits}"),
        None => "no limits".to_owned(),
    };
    println!(
        "{} {}..{} ({band})",
        bold(summary.series.to_string()),
        summary.start,
        summary.end,
    );

    println!("{}", stat_row("overall", overall));
    let stats = &overall.stats;
    if let (Some(three_sigma), Some(six_sigma)) = (stats.three_sigma, stats.six_sigma) {
        println!("{:<12} 3s {three_sigma:.3}  6s {six_sigma:.3}", "control");
    }

    println!("{}", bold("daily:"));
    for slice in &summary.daily {
        println!("{}", stat_row(&slice.day.to_string(), &slice.aggregate));
    }
}

fn stat_row(label: &str, aggregate: &Aggregate) -> String {
    let stats = &aggregate.stats;
    format!(
        "{label:<12} count {:>4}  avg {:>9}  min {:>9}  max {:>9}  sd {:>8}  cp {:>6}  cpk {:>6}",
        stats.count,
        fmt_opt(stats.average),
        fmt_opt(stats.min),
        fmt_opt(stats.max),
        fmt_opt(stats.std_dev),
        fmt_opt(stats.cp),
        fmt_opt(stats.cpk),
    )
}

/// `-` for a statistic that isn't available.
fn fmt_opt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "-".to_owned())
}
