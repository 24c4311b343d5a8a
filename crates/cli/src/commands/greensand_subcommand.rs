use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum GreensandSubcommand {
    #[command(name = "add", long_about = "Record a single measurement.")]
    Add {
        #[arg(help = "Series to record under. See `greensand params` for names.")]
        series: String,

        #[arg(help = "Measured value.", allow_negative_numbers = true)]
        value: f64,

        #[arg(
            long,
            short = 't',
            help = "Timestamp of the measurement, 'YYYY-MM-DD HH:MM[:SS]'. Defaults to now."
        )]
        at: Option<String>,

        #[arg(long, short, help = "Free-form note stored with the reading.")]
        remark: Option<String>,
    },

    #[command(
        name = "edit",
        long_about = "Correct a stored measurement; its daily bucket is recomputed."
    )]
    Edit {
        #[arg(help = "Reading ID, as shown by `greensand readings`.")]
        id: i64,

        #[arg(
            long,
            short,
            help = "New value for the reading.",
            allow_negative_numbers = true
        )]
        value: Option<f64>,

        #[arg(
            long,
            short,
            help = "Replace the reading's remark.",
            conflicts_with = "clear_remark"
        )]
        remark: Option<String>,

        #[arg(long, help = "Remove the reading's remark.")]
        clear_remark: bool,
    },

    #[command(
        name = "delete",
        long_about = "Delete a stored measurement; its daily bucket is recomputed."
    )]
    Delete {
        #[arg(help = "Reading ID, as shown by `greensand readings`.")]
        id: i64,
    },

    #[command(
        name = "set-limits",
        long_about = "Set or clear the specification limits of one daily bucket."
    )]
    SetLimits {
        #[arg(help = "Series the bucket belongs to.")]
        series: String,

        #[arg(help = "Bucket day, e.g. '2025-01-13'.")]
        day: String,

        #[arg(
            long,
            requires = "upper",
            help = "Lower specification limit.",
            allow_negative_numbers = true
        )]
        lower: Option<f64>,

        #[arg(
            long,
            requires = "lower",
            help = "Upper specification limit.",
            allow_negative_numbers = true
        )]
        upper: Option<f64>,

        #[arg(
            long,
            conflicts_with_all = ["lower", "upper"],
            help = "Drop the bucket's limits; statistics stay, capability goes."
        )]
        clear: bool,
    },

    #[command(
        name = "import",
        long_about = "Import a CSV batch of measurements. Duplicate rows are reported and \
                      skipped; each touched bucket is recomputed once."
    )]
    Import {
        #[arg(help = "Measurement family the payload belongs to: 'sand' or 'runner'.")]
        family: String,

        #[arg(help = "Path to the CSV payload.")]
        path: String,

        #[arg(
            long,
            short,
            env = "GREENSAND_LIMITS",
            help = "TOML file with default spec limits for buckets created by this import."
        )]
        limits: Option<String>,
    },

    #[command(
        name = "summary",
        long_about = "Summarize a series over a day range: per-day breakdown plus overall \
                      statistics recomputed from the raw readings. Defaults to today."
    )]
    Summary {
        #[arg(help = "Series to summarize.")]
        series: String,

        #[arg(
            long,
            short,
            conflicts_with_all = ["start", "end"],
            help = "Single day to summarize."
        )]
        day: Option<String>,

        #[arg(long, requires = "end", help = "First day of the range (inclusive).")]
        start: Option<String>,

        #[arg(long, requires = "start", help = "Last day of the range (inclusive).")]
        end: Option<String>,

        #[arg(
            long,
            requires = "upper",
            help = "Override the lower spec limit for the overall statistics.",
            allow_negative_numbers = true
        )]
        lower: Option<f64>,

        #[arg(
            long,
            requires = "lower",
            help = "Override the upper spec limit for the overall statistics.",
            allow_negative_numbers = true
        )]
        upper: Option<f64>,

        #[arg(long, help = "Print the summary as JSON.")]
        json: bool,

        #[arg(long, short, help = "Write the daily breakdown to a CSV file.")]
        out: Option<PathBuf>,
    },

    #[command(
        name = "readings",
        long_about = "List stored readings of a series with their IDs. Defaults to today."
    )]
    Readings {
        #[arg(help = "Series to list.")]
        series: String,

        #[arg(
            long,
            short,
            conflicts_with_all = ["start", "end"],
            help = "Single day to list."
        )]
        day: Option<String>,

        #[arg(long, requires = "end", help = "First day of the range (inclusive).")]
        start: Option<String>,

        #[arg(long, requires = "start", help = "Last day of the range (inclusive).")]
        end: Option<String>,
    },

    #[command(name = "params", about = "List every known series with its unit")]
    Params,

    #[command(name = "db", about = "Database management commands")]
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum DbCommand {
    #[command(name = "drop", about = "Delete the database file")]
    Drop,

    #[command(name = "reset", about = "Drop and re-initialize the database")]
    Reset,

    #[command(name = "export", about = "Save database to a new file")]
    Export {
        /// Path where to save the database file
        #[arg(help = "Path where to save the database file")]
        out_path: PathBuf,
    },

    #[command(name = "import", about = "Import database from a file")]
    Import {
        /// Path to the database file to import
        #[arg(help = "Path to the database file to import")]
        src_path: PathBuf,
    },
}
