//! Country disambiguation for free-text profile locations.
//!
//! # Algorithm
//!
//! 1. **Alias pass.** Walk the alias list (longest first) and collect every
//!    alias that occurs in the cleaned location. Once the first hit is found,
//!    only hits of the same length are kept: "san jose" beats "jose", and
//!    two-letter aliases never contribute once something longer matched.
//! 2. **Country pass.** Every country name that occurs in the location is
//!    added twice, so naming a country outweighs naming one of its cities.
//! 3. **Resolution.** The candidates go through an ordered chain of
//!    resolvers; the first one that produces a result wins:
//!
//! | Resolver | Succeeds when |
//! |----------|---------------|
//! | single-match | every candidate is the same (country, token) pair |
//! | multiple-match-one-country | all candidates name one country |
//! | dominant-count | one country has strictly more votes than any other |
//! | capital-tiebreak | some candidate token is its country's capital |
//! | population-tiebreak | a candidate country has population > 0 (largest wins) |
//!
//! No candidates at all, or a tie that no rule breaks, is a no-match.
//! The matcher never fails; iteration order of aliases and countries is
//! fixed by [`ReferenceData`], so results are reproducible.

use crate::models::{MatchReason, MatchResult};
use crate::reference::ReferenceData;

/// One (country, token) hit found while scanning a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub country: &'a str,
    pub token: &'a str,
}

/// All hits for one location plus per-country vote counts.
///
/// `votes` keeps countries in first-seen order.
#[derive(Debug, Default)]
pub struct Candidates<'a> {
    pub hits: Vec<Candidate<'a>>,
    pub votes: Vec<(&'a str, usize)>,
}

impl<'a> Candidates<'a> {
    fn push(&mut self, country: &'a str, token: &'a str) {
        self.hits.push(Candidate { country, token });
        match self.votes.iter_mut().find(|(c, _)| *c == country) {
            Some((_, n)) => *n += 1,
            None => self.votes.push((country, 1)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

type Resolver = fn(&Candidates<'_>, &ReferenceData) -> Option<MatchResult>;

const RESOLVERS: &[Resolver] = &[
    single_match,
    one_country,
    dominant_count,
    capital_tiebreak,
    population_tiebreak,
];

/// Matches cleaned location strings against borrowed reference data.
#[derive(Debug, Clone, Copy)]
pub struct CountryMatcher<'r> {
    reference: &'r ReferenceData,
}

impl<'r> CountryMatcher<'r> {
    pub fn new(reference: &'r ReferenceData) -> Self {
        Self { reference }
    }

    /// Best-guess country for an already-normalized location string.
    pub fn match_location(&self, cleaned: &str) -> MatchResult {
        let candidates = self.collect(cleaned);
        if candidates.is_empty() {
            return MatchResult::no_match();
        }
        RESOLVERS
            .iter()
            .find_map(|resolve| resolve(&candidates, self.reference))
            .unwrap_or_else(MatchResult::no_match)
    }

    /// Run the alias and country passes without resolving.
    pub fn collect(&self, cleaned: &str) -> Candidates<'r> {
        let mut candidates = Candidates::default();
        if cleaned.is_empty() {
            return candidates;
        }

        let mut longest: Option<usize> = None;
        for alias in self.reference.aliases() {
            if let Some(len) = longest {
                // Sorted longest-first: nothing shorter can qualify any more.
                if alias.len < len {
                    break;
                }
            }
            if cleaned.contains(alias.alias.as_str()) {
                longest.get_or_insert(alias.len);
                candidates.push(&alias.country, &alias.alias);
            }
        }

        for (country, _) in self.reference.countries().iter() {
            if cleaned.contains(country) {
                candidates.push(country, country);
                candidates.push(country, country);
            }
        }

        candidates
    }
}

fn single_match(c: &Candidates<'_>, _: &ReferenceData) -> Option<MatchResult> {
    let first = c.hits.first()?;
    c.hits
        .iter()
        .all(|hit| hit == first)
        .then(|| MatchResult::matched(first.country, first.token, MatchReason::SingleMatch))
}

fn one_country(c: &Candidates<'_>, _: &ReferenceData) -> Option<MatchResult> {
    if c.votes.len() != 1 {
        return None;
    }
    let first = c.hits.first()?;
    Some(MatchResult::matched(
        first.country,
        first.token,
        MatchReason::MultipleMatchOneCountry,
    ))
}

fn dominant_count(c: &Candidates<'_>, _: &ReferenceData) -> Option<MatchResult> {
    let mut ranked = c.votes.clone();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    match ranked.as_slice() {
        [(top, top_n), (_, next_n), ..] if top_n > next_n => {
            Some(MatchResult::matched(top, top, MatchReason::DominantCount))
        }
        _ => None,
    }
}

fn capital_tiebreak(c: &Candidates<'_>, reference: &ReferenceData) -> Option<MatchResult> {
    c.hits
        .iter()
        .find(|hit| {
            reference
                .countries()
                .get(hit.country)
                .is_some_and(|record| record.capital == hit.token)
        })
        .map(|hit| MatchResult::matched(hit.country, hit.token, MatchReason::CapitalTiebreak))
}

fn population_tiebreak(c: &Candidates<'_>, reference: &ReferenceData) -> Option<MatchResult> {
    // A country has to beat population 0 to win; unknown countries never do.
    let mut best: Option<&Candidate<'_>> = None;
    let mut top = 0u64;
    for hit in &c.hits {
        let population = reference
            .countries()
            .get(hit.country)
            .map_or(0, |record| record.population);
        if population > top {
            best = Some(hit);
            top = population;
        }
    }
    best.map(|hit| MatchResult::matched(hit.country, hit.token, MatchReason::PopulationTiebreak))
}
