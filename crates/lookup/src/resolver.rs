//! Nationality resolution.
//!
//! Picks the single most probable country from the nationality candidates.
//! Ties go to the first candidate in delivery order. An invalid candidate
//! fails the whole resolution rather than being skipped, since skipping could
//! move the maximum.

use engine_core::{CountryProbability, LookupFailure, LookupOutcome};

/// Returns the country code with the strictly greatest probability.
///
/// - empty input -> `NoCandidate`
/// - empty country code, or probability not in `[0, 1]` -> `MalformedResponse`
pub fn resolve(countries: &[CountryProbability]) -> LookupOutcome<String> {
    let mut best: Option<&CountryProbability> = None;

    for (index, candidate) in countries.iter().enumerate() {
        check_candidate(index, candidate)?;

        match best {
            Some(current) if candidate.probability <= current.probability => {}
            _ => best = Some(candidate),
        }
    }

    best.map(|c| c.country_id.clone())
        .ok_or(LookupFailure::NoCandidate)
}

fn check_candidate(index: usize, candidate: &CountryProbability) -> LookupOutcome<()> {
    if candidate.country_id.trim().is_empty() {
        return Err(LookupFailure::malformed(format!(
            "candidate {} has no country code",
            index
        )));
    }

    if !(0.0..=1.0).contains(&candidate.probability) {
        return Err(LookupFailure::malformed(format!(
            "candidate {} ({}) has probability {} outside [0, 1]",
            index, candidate.country_id, candidate.probability
        )));
    }

    Ok(())
}
