//! Simulate command implementation

use anyhow::{Context, Result, ensure};
use rangemap::{ErrorKind, RangeMap, RangeMapConfig};

#[allow(clippy::too_many_arguments)]
pub fn run(
    length: u64,
    owners: usize,
    ops: u64,
    seed: u64,
    use_pool: bool,
    defrag: bool,
    json: bool,
) -> Result<()> {
    ensure!(owners > 0, "at least one owner is required");

    let config = RangeMapConfig::new()
        .use_pool(use_pool)
        .defrag_after_clear(defrag);
    let mut map: RangeMap<String> =
        RangeMap::with_length_and_config(length, config).context("creating the range map")?;

    let owner_names: Vec<String> = (0..owners).map(|i| format!("owner-{i}")).collect();
    let max_request = (length / 16).max(1);
    let mut rng = fastrand::Rng::with_seed(seed);

    let mut allocations = 0u64;
    let mut pieces = 0u64;
    let mut denied = 0u64;
    let mut freed = 0u64;
    let mut cleared = 0u64;

    for _ in 0..ops {
        let owner = &owner_names[rng.usize(0..owner_names.len())];
        match rng.u32(0..4) {
            0 | 1 => {
                let request = rng.u64(1..=max_request);
                match map.allocate(request, owner.clone()) {
                    Ok(ids) => {
                        allocations += 1;
                        pieces += ids.len() as u64;
                    }
                    Err(err) if matches!(err.kind(), ErrorKind::InsufficientSpace { .. }) => {
                        denied += 1;
                    }
                    Err(err) => return Err(err).context("allocating"),
                }
            }
            2 => {
                freed += map.deallocate(owner).context("deallocating")?;
            }
            _ => {
                let a = rng.u64(0..length);
                let b = rng.u64(0..length);
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                cleared += map.clear(start, end).context("clearing")?;
            }
        }
    }

    println!("{map}");
    println!(
        "{allocations} allocations in {pieces} pieces, {denied} denied, \
         {freed} units deallocated, {cleared} units cleared"
    );

    if json {
        let snapshot = map.snapshot().context("capturing the snapshot")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("encoding the snapshot")?
        );
    }

    Ok(())
}
