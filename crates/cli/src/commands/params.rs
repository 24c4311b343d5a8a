use greensand_core::reading::{Family, SeriesId};
use strum::IntoEnumIterator;

use crate::{commands::Result, util::bold};

/// List every known series name with its unit, grouped by family.
pub async fn params() -> Result<()> {
    for family in Family::iter() {
        println!("{}", bold(format!("{family} series:")));
        for series in SeriesId::all().filter(|s| s.family() == family) {
            println!("  {series} ({})", series.unit());
        }
    }
    Ok(())
}
