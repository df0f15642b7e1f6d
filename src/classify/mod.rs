//! Message direction classification
//!
//! AgencyZoom does not reliably say whether a text was sent by the agency or
//! by the contact. Classification sits behind [`DirectionClassifier`] so the
//! heuristics can be tuned per tenant or swapped out without touching the
//! fetch path.

mod heuristic;
mod types;

pub use heuristic::{HeuristicClassifier, PassthroughClassifier};
pub use types::{ClassifierConfig, DirectionClassifier};
