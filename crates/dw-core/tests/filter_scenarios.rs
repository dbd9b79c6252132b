//! End-to-end filter scenarios on synthetic series.
//!
//! A uniform day-to-day model (mean 0, std 0.02) stands in for a trained
//! one, so the only signal is the series itself.

use dw_config::{FilterConfig, TapSet};
use dw_core::inference::{extract_events, DayToDayModel, NormalParams, ParticleFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn uniform_model(taps: &TapSet, len: usize) -> DayToDayModel {
    DayToDayModel::uniform(taps, len, NormalParams::new(0.0, 0.02))
}

/// Immediate-flag fraction per step, summed over several seeds.
fn summed_fractions(series: &[u64], taps: &TapSet, config: &FilterConfig, seeds: &[u64]) -> Vec<f64> {
    let model = uniform_model(taps, series.len());
    let filter = ParticleFilter::new(config, taps, &model).expect("valid filter");
    let mut totals = vec![0.0; series.len()];
    for &seed in seeds {
        let mut rng = StdRng::seed_from_u64(seed);
        let run = filter.run(&mut rng, series).expect("filter run");
        for (t, s) in run.steps.iter().enumerate() {
            totals[t] += s.censored_fraction();
        }
    }
    totals
}

#[test]
fn sudden_drop_is_flagged() {
    let series = [10, 10, 10, 10, 10, 1, 10, 10];
    let taps = TapSet::new([1]).unwrap();
    let config = FilterConfig {
        particle_count: 200,
        ..FilterConfig::default()
    };
    let f = summed_fractions(&series, &taps, &config, &[7, 11, 23]);

    let others: Vec<f64> = [1, 2, 3, 4, 6, 7].iter().map(|&t| f[t]).collect();
    let baseline = others.iter().sum::<f64>() / others.len() as f64;
    assert!(
        f[5] > 3.0 * baseline,
        "drop fraction {} vs baseline {} ({:?})",
        f[5],
        baseline,
        f
    );
}

#[test]
fn flat_series_stays_quiet() {
    let series = vec![50; 30];
    let taps = TapSet::new([1, 7]).unwrap();
    let config = FilterConfig::default();
    let model = uniform_model(&taps, series.len());
    let filter = ParticleFilter::new(&config, &taps, &model).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let run = filter.run(&mut rng, &series).unwrap();

    for s in run.steps.iter().skip(7) {
        assert!(
            s.censored_fraction() < 0.06,
            "step {} fraction {}",
            s.step,
            s.censored_fraction()
        );
    }
}

#[test]
fn extracted_counts_match_summaries() {
    let series = [30, 31, 29, 5, 30, 32];
    let taps = TapSet::new([1, 2]).unwrap();
    let config = FilterConfig {
        particle_count: 150,
        ..FilterConfig::default()
    };
    let model = uniform_model(&taps, series.len());
    let filter = ParticleFilter::new(&config, &taps, &model).unwrap();
    let run = filter.run(&mut StdRng::seed_from_u64(13), &series).unwrap();

    let counts = extract_events(&run.history);
    assert_eq!(counts.len(), run.steps.len());
    for (c, s) in counts.iter().zip(&run.steps) {
        assert_eq!(c.censored, s.censored_count);
        assert_eq!(c.cumulative, s.cumulative_count);
        assert_eq!(c.total, 150);
        assert!(c.cumulative >= c.censored);
    }
}

#[test]
fn band_tracks_the_observed_level() {
    let series = vec![200; 12];
    let taps = TapSet::new([1]).unwrap();
    let config = FilterConfig {
        particle_count: 300,
        ..FilterConfig::default()
    };
    let model = uniform_model(&taps, series.len());
    let filter = ParticleFilter::new(&config, &taps, &model).unwrap();
    let run = filter.run(&mut StdRng::seed_from_u64(17), &series).unwrap();

    let last = run.steps.last().unwrap();
    let band = last.band.expect("band present");
    assert!(band.low <= band.median && band.median <= band.high);
    assert!(band.low < 200.0 && band.high > 200.0, "{:?}", band);
    assert!(last.diversity > 0);
    assert!(run.log_evidence.is_finite());
}
