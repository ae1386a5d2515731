//! Example of using iconmine-core directly from Rust.
//!
//! ```sh
//! cargo run -p iconmine-core --example mine_log -- path/to/LOG.run.o
//! ```

use std::path::PathBuf;

use iconmine_core::{JsonLinesSink, LogMiner, MinerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path: PathBuf = std::env::args()
        .nth(1)
        .ok_or("usage: mine_log <log file>")?
        .into();

    // 1. Compile the default patterns
    let miner = LogMiner::new(&MinerConfig::default())?;

    // 2. Mine the file
    let Some(mined) = miner.mine_file(&path)? else {
        println!("No timer table in {}", path.display());
        return Ok(());
    };
    println!(
        "Experiment '{}' at {}: {} tables, {} rows",
        mined.experiment,
        mined.time_stamp,
        mined.tables,
        mined.documents.len()
    );

    // 3. Print the documents as JSON lines
    let mut sink = JsonLinesSink::new(std::io::stdout().lock());
    let (indexed, rejected) = miner.ingest(&mined.documents, &mut sink)?;
    eprintln!("{} written, {} rejected", indexed, rejected);

    Ok(())
}
