//! Levenshtein automata for fuzzy term expansion.

use levenshtein_automata::{DFA, Distance, LevenshteinAutomatonBuilder, SINK_STATE};
use tantivy_fst::Automaton;

/// Largest edit distance with a prebuilt automaton builder.
const MAX_DISTANCE: u8 = 2;

/// Wrapper that implements `tantivy_fst::Automaton` for `levenshtein_automata::DFA`.
pub struct LevenshteinDfa(DFA);

impl Automaton for LevenshteinDfa {
    type State = u32;

    fn start(&self) -> Self::State {
        self.0.initial_state()
    }

    fn is_match(&self, state: &Self::State) -> bool {
        matches!(self.0.distance(*state), Distance::Exact(_))
    }

    fn can_match(&self, state: &Self::State) -> bool {
        *state != SINK_STATE
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        self.0.transition(*state, byte)
    }
}

/// Builds Levenshtein automata for edit distances one and two.
///
/// Builder construction is expensive, so both are built once per searcher. Transpositions
/// count as a single edit.
pub struct FuzzyMatcher {
    /// Builders indexed by distance minus one.
    builders: [LevenshteinAutomatonBuilder; MAX_DISTANCE as usize],
}

impl FuzzyMatcher {
    /// Prebuilds the automaton builders.
    pub(crate) fn new() -> Self {
        Self {
            builders: [
                LevenshteinAutomatonBuilder::new(1, true),
                LevenshteinAutomatonBuilder::new(2, true),
            ],
        }
    }

    /// Returns an automaton matching terms within `distance` edits of `text`.
    ///
    /// Distances above two are clamped. Distance zero has no automaton.
    pub(crate) fn automaton(&self, text: &str, distance: u8) -> Option<LevenshteinDfa> {
        let distance = distance.min(MAX_DISTANCE);
        let builder = self.builders.get(usize::from(distance).checked_sub(1)?)?;
        Some(LevenshteinDfa(builder.build_dfa(text)))
    }
}
