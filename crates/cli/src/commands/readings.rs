use greensand_core::{db::ReadingStore, reading::SeriesId, summary::list_readings};

use crate::{
    commands::{common, Result},
    util::bold,
};

/// List stored readings of one series, with the ids that `edit` and
/// `delete` take.
pub async fn readings(
    db: &impl ReadingStore,
    series: String,
    day: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let series: SeriesId = series.parse()?;
    let (start, end) = common::resolve_range(day, start, end)?;

    let rows = list_readings(db, series, start, end)?;
    if rows.is_empty() {
        println!("no readings for {series} in {start}..{end}");
        return Ok(());
    }

    let header = format!("{series} {start}..{end}, {} readings", rows.len());
    println!("{}", bold(header));
    let unit = series.unit();
    for (_, stored) in rows {
        let reading = &stored.reading;
        match &reading.remark {
            Some(remark) => println!(
                "{:>6}  {}  {:>10.3} {unit}  # {remark}",
                stored.id, reading.taken_at, reading.value
            ),
            None => println!(
                "{:>6}  {}  {:>10.3} {unit}",
                stored.id, reading.taken_at, reading.value
            ),
        }
    }
    Ok(())
}
