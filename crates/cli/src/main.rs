mod cli;
mod output;
mod runtime;
mod summary;

use anyhow::{bail, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use reader::UnifiedLogReader;

use crate::cli::Args;
use crate::runtime::{boot, run};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    boot::init_logging(args.log_level);

    info!("Starting gclog v{}", env!("CARGO_PKG_VERSION"));
    let config = boot::load_config(args.config.as_deref())?;
    let reader = Arc::new(UnifiedLogReader::new(&config));

    let total = args.files.len();
    let failed = run::read_all(reader, args.files, args.format).await;
    if failed > 0 {
        bail!("{} of {} file(s) could not be read", failed, total);
    }
    Ok(())
}
