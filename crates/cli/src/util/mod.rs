pub mod error;

use chrono::NaiveDate;
use csv::Writer;
use greensand_core::summary::{DailySlice, RangeSummary};
use nu_ansi_term::AnsiGenericString;
use serde::Serialize;

use error::UtilError;

/// One day of a range summary, flattened for CSV export. Nested optional
/// structs don't serialize through `csv`, so limits and stats are spread
/// into plain columns here.
#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub day: NaiveDate,
    pub count: u64,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std_dev: Option<f64>,
    pub three_sigma: Option<f64>,
    pub six_sigma: Option<f64>,
    pub cp: Option<f64>,
    pub cpk_upper: Option<f64>,
    pub cpk_lower: Option<f64>,
    pub cpk: Option<f64>,
    pub lower_limit: Option<f64>,
    pub upper_limit: Option<f64>,
}

impl From<&DailySlice> for SummaryRow {
    fn from(slice: &DailySlice) -> Self {
        let stats = slice.aggregate.stats;
        let limits = slice.aggregate.limits;
        Self {
            day: slice.day,
            count: stats.count,
            average: stats.average,
            min: stats.min,
            max: stats.max,
            std_dev: stats.std_dev,
            three_sigma: stats.three_sigma,
            six_sigma: stats.six_sigma,
            cp: stats.cp,
            cpk_upper: stats.cpk_upper,
            cpk_lower: stats.cpk_lower,
            cpk: stats.cpk,
            lower_limit: limits.map(|l| l.lower),
            upper_limit: limits.map(|l| l.upper),
        }
    }
}

pub fn write_summary_rows<T: std::io::Write>(
    writer: &mut Writer<T>,
    summary: &RangeSummary,
) -> Result<(), csv::Error> {
    for slice in &summary.daily {
        writer.serialize(SummaryRow::from(slice))?;
    }
    writer.flush()?;
    Ok(())
}

/// Returns the path to the data directory.
/// The directory is created if it does not exist.
pub fn data_dir() -> Result<String, UtilError> {
    let home_dir = if cfg!(windows) {
        std::env::var("USERPROFILE")?
    } else {
        std::env::var("HOME")?
    };

    let dir = format!("{home_dir}/.greensand");

    // ensure directory exists
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns path to the default greensand DB file.
pub fn db_file() -> Result<String, UtilError> {
    let data_path = data_dir()?;
    Ok(format!("{data_path}/greensand.db"))
}

pub fn bold<'a>(msg: impl AsRef<str> + 'a) -> AnsiGenericString<'a, str> {
    nu_ansi_term::Style::new()
        .bold()
        .paint(msg.as_ref().to_owned())
}
