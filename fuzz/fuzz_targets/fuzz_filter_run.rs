//! Fuzz target for the particle filter.
//!
//! Drives a small filter over arbitrary series and model parameters. The run
//! may fail with an error, but must never panic, and every particle it keeps
//! must have a finite non-negative rate.

#![no_main]

use arbitrary::Arbitrary;
use dw_config::{FilterConfig, TapSet};
use dw_core::inference::{DayToDayModel, NormalParams, ParticleFilter};
use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Arbitrary)]
struct Input {
    series: Vec<Option<u16>>,
    taps: Vec<u8>,
    mean: i8,
    std: u8,
    seed: u64,
}

fuzz_target!(|input: Input| {
    if input.series.len() > 40 {
        return;
    }
    let Ok(taps) = TapSet::new(input.taps.iter().map(|&t| u32::from(t % 8))) else {
        return;
    };
    let params = NormalParams::new(f64::from(input.mean) / 100.0, f64::from(input.std) / 500.0);
    let model = DayToDayModel::uniform(&taps, input.series.len(), params);
    let config = FilterConfig {
        particle_count: 20,
        max_proposal_retries: 200,
        ..FilterConfig::default()
    };
    let Ok(filter) = ParticleFilter::new(&config, &taps, &model) else {
        return;
    };
    let series: Vec<Option<u64>> = input.series.iter().map(|v| v.map(u64::from)).collect();
    let mut rng = StdRng::seed_from_u64(input.seed);
    if let Ok(run) = filter.run_raw(&mut rng, &series) {
        for population in run.history.iter() {
            for p in population {
                assert!(p.rate.is_finite() && p.rate >= 0.0);
            }
        }
    }
});
