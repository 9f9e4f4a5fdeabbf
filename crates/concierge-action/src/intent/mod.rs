//! Intent detection from normalized utterances.
//!
//! The rule table lives in [`patterns`]; timer durations and spoken
//! arithmetic have their own small parsers.

pub mod arithmetic;
pub mod patterns;
pub mod time_parser;

pub use patterns::{MatchContext, PatternSet};
