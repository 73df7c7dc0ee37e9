//! Knobs shared by unit, property and fuzz tests.

pub fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
}

/// Proptest case count, overridable with `PROPTEST_CASES`.
pub fn proptest_cases(default: u32) -> u32 {
    env_u32("PROPTEST_CASES").unwrap_or(default)
}

/// Operations per fuzz case, scaled by `PROPTEST_FUZZ_MULTIPLIER`.
pub fn fuzz_steps(default: usize) -> usize {
    let multiplier = env_u32("PROPTEST_FUZZ_MULTIPLIER").unwrap_or(1).max(1);
    default.saturating_mul(multiplier as usize)
}
