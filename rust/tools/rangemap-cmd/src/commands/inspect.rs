//! Inspect command implementation

use std::fs;

use anyhow::{Context, Result};
use rangemap::{RangeMap, Snapshot};

pub fn run(verbose: u8, snapshot_path: String) -> Result<()> {
    let text = fs::read_to_string(&snapshot_path)
        .with_context(|| format!("reading snapshot file '{snapshot_path}'"))?;
    let snapshot: Snapshot<String> =
        serde_json::from_str(&text).context("parsing the snapshot JSON")?;
    let map = RangeMap::from_snapshot(snapshot).context("rebuilding the range map")?;

    println!("{map}");

    let allocated = map.length() - map.unallocated();
    println!(
        "{} of {} units allocated across {} segments",
        allocated,
        map.length(),
        map.segment_count()
    );

    if verbose > 0 {
        for (_, segment) in map.segments() {
            println!("  {segment}");
        }
    }

    Ok(())
}
