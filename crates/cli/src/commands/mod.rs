mod greensand_subcommand;

pub mod add;
pub mod common;
pub mod db;
pub mod delete;
pub mod edit;
pub mod error;
pub mod import;
pub mod limits;
pub mod params;
pub mod readings;
pub mod summary;

use clap::Parser;

pub use add::add;
pub use delete::delete;
pub use edit::edit;
pub use greensand_subcommand::{DbCommand, GreensandSubcommand};
pub use import::import;
pub use limits::set_limits;
pub use params::params;
pub use readings::readings;
pub use summary::{summary, SummaryCommandArgs};

pub type Result<T> = std::result::Result<T, crate::error::CliError>;

#[derive(Parser, Debug)]
pub struct GreensandCli {
    #[command(subcommand)]
    pub command: GreensandSubcommand,
}

impl GreensandCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::GreensandCli;
    use clap::CommandFactory;

    #[test]
    fn cli_args_are_well_formed() {
        GreensandCli::command().debug_assert();
    }
}
