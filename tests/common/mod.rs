#![allow(dead_code)]

use epi_surrogate::prelude::*;

/// Parameters covering every required key of the four policy zones.
pub fn full_parameters() -> ParameterTable {
    ParameterTable::from_pairs([
        ("red_work_contacts", 0.2),
        ("work_contacts", 0.6),
        ("school_contacts", 0.5),
        ("casual_contacts", 0.4),
        ("init_imports", 3.0),
        ("init_beta", 0.05),
        ("summer_beta", 0.03),
        ("winter_beta", 0.06),
        ("trace_prob", 0.7),
    ])
    .unwrap()
}

/// `n` records over `2 * w` days where quantity `q` on day `d` of record `i`
/// is `(i + 1)(q + 1)(d + 1)`, cycling through every zone pair.
pub fn ramp_records(n: usize, w: usize) -> Vec<TimeSeriesRecord> {
    let zones = ["W", "Y", "O", "R"];
    (0..n)
        .map(|i| {
            let values = (0..6 * w)
                .map(|v| ((i + 1) * (v % 3 + 1) * (v / 3 + 1)) as f64)
                .collect();
            TimeSeriesRecord::new(values, zones[i % 4], zones[(i / 4 + 1) % 4])
        })
        .collect()
}

pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("epi-surrogate-it-{}", std::process::id()))
        .join(name)
}
