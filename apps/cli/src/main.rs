//! BrandPlanner CLI: pharma brand planning questionnaire.
//!
//! Walks a lifecycle stage, strategic imperatives, differentiators, tone, and
//! objectives through the dataset workbook, then generates a brand plan.

mod commands;
mod render;
mod wizard;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
