//! Emotion Arc — lexicon-based emotion tagging for narrative text.
//!
//! Scores every sentence of a document against a word-sense emotion
//! lexicon, optionally disambiguating ambiguous words from their
//! neighbours, and smooths the per-sentence sequence into a coarse
//! narrative arc with a frequency-domain low-pass filter.

pub mod core;
pub mod schema;
