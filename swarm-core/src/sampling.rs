use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;

use crate::config::SkillLevel;

/// Number of items a user visits: `ceil(n × fraction)` clamped to `[1, n]`, or 0 for an empty
/// catalog.
pub fn coverage_count(catalog_len: usize, fraction: f64) -> usize {
    if catalog_len == 0 {
        return 0;
    }
    let raw = ((catalog_len as f64) * fraction.clamp(0.0, 1.0) - 1e-9).ceil();
    (raw as usize).clamp(1, catalog_len)
}

/// Uniformly shuffles a copy of `catalog` and keeps the first [`coverage_count`] items.
pub fn sample_coverage<R: rand::Rng + ?Sized>(
    catalog: &[u64],
    fraction: f64,
    rng: &mut R,
) -> Vec<u64> {
    let mut items = catalog.to_vec();
    items.shuffle(rng);
    items.truncate(coverage_count(catalog.len(), fraction));
    items
}

/// Per-user RNG: reproducible from `(seed, cohort, index)` when a seed is given.
pub fn user_rng(seed: Option<u64>, cohort: SkillLevel, index: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(mix(seed, cohort as u64, index)),
        None => StdRng::from_entropy(),
    }
}

// splitmix64 finalizer over the combined inputs.
fn mix(seed: u64, cohort: u64, index: u64) -> u64 {
    let mut z = seed
        ^ cohort.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ index.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
