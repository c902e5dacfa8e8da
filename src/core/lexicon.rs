/// Word-sense emotion lexicon with RON loading.

use rustc_hash::FxHashMap;
use std::path::Path;
use thiserror::Error;

use crate::schema::emotion::EmotionVector;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("word '{word}' sense {sense} has {found} emotions, expected {expected}")]
    ShapeMismatch {
        word: String,
        sense: usize,
        expected: usize,
        found: usize,
    },
    #[error("word '{0}' has no senses")]
    NoSenses(String),
    #[error("cannot merge a {found}-emotion lexicon into a {expected}-emotion lexicon")]
    IncompatibleMerge { expected: usize, found: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Read-only access to word senses.
///
/// `lookup` returns `None` for words the lexicon does not know; that is a
/// filtering decision for callers, never an error.
pub trait LexiconGateway {
    /// All senses of `word`, in lexicon order.
    fn lookup(&self, word: &str) -> Option<&[EmotionVector]>;

    /// Length shared by every sense vector.
    fn emotion_count(&self) -> usize;

    fn contains(&self, word: &str) -> bool {
        self.lookup(word).is_some()
    }
}

/// In-memory lexicon: word → one or more sense vectors.
///
/// Every sense has exactly `emotion_count` components and every word has
/// at least one sense; both are checked on insertion.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    emotion_count: usize,
    entries: FxHashMap<String, Vec<EmotionVector>>,
}

impl Lexicon {
    pub fn new(emotion_count: usize) -> Self {
        Self {
            emotion_count,
            entries: FxHashMap::default(),
        }
    }

    /// Load a lexicon from a RON file of the form `{ "word": [[..], ..], .. }`.
    pub fn load_from_ron(path: &Path, emotion_count: usize) -> Result<Lexicon, LexiconError> {
        tracing::info!("Loading lexicon from: {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        let lexicon = Self::parse_ron(&contents, emotion_count)?;
        tracing::info!("Loaded {} lexicon entries", lexicon.len());
        Ok(lexicon)
    }

    /// Parse a lexicon from a RON string.
    pub fn parse_ron(input: &str, emotion_count: usize) -> Result<Lexicon, LexiconError> {
        let raw: FxHashMap<String, Vec<Vec<u32>>> = ron::from_str(input)?;
        let mut lexicon = Lexicon::new(emotion_count);
        for (word, senses) in raw {
            lexicon.insert(word, senses.into_iter().map(EmotionVector::from).collect())?;
        }
        Ok(lexicon)
    }

    /// Insert or replace the senses of `word`.
    pub fn insert(
        &mut self,
        word: impl Into<String>,
        senses: Vec<EmotionVector>,
    ) -> Result<(), LexiconError> {
        let word = word.into();
        if senses.is_empty() {
            return Err(LexiconError::NoSenses(word));
        }
        if let Some((sense, v)) = senses
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != self.emotion_count)
        {
            return Err(LexiconError::ShapeMismatch {
                word,
                sense,
                expected: self.emotion_count,
                found: v.len(),
            });
        }
        self.entries.insert(word, senses);
        Ok(())
    }

    /// Overlay another lexicon onto this one. Entries from `other` replace
    /// entries in `self` for the same word.
    pub fn merge(&mut self, other: Lexicon) -> Result<(), LexiconError> {
        if other.emotion_count != self.emotion_count {
            return Err(LexiconError::IncompatibleMerge {
                expected: self.emotion_count,
                found: other.emotion_count,
            });
        }
        self.entries.extend(other.entries);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of words with more than one sense.
    pub fn ambiguous_count(&self) -> usize {
        self.entries.values().filter(|s| s.len() > 1).count()
    }
}

impl LexiconGateway for Lexicon {
    fn lookup(&self, word: &str) -> Option<&[EmotionVector]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    fn emotion_count(&self) -> usize {
        self.emotion_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "perdere": [[0, 0, 0, 0, 0, 1, 0, 0, 0, 0]],
        "amore": [
            [1, 0, 0, 0, 0, 0, 1, 0, 0, 1],
            [0, 1, 0, 0, 0, 1, 0, 1, 0, 0],
        ],
    }"#;

    #[test]
    fn parse_sample() {
        let lex = Lexicon::parse_ron(SAMPLE, 10).unwrap();
        assert_eq!(lex.len(), 2);
        assert_eq!(lex.ambiguous_count(), 1);
        assert_eq!(lex.lookup("amore").unwrap().len(), 2);
        assert!(lex.contains("perdere"));
        assert!(lex.lookup("anello").is_none());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = Lexicon::parse_ron(r#"{ "gioia": [[1, 0, 0]] }"#, 10).unwrap_err();
        assert!(matches!(
            err,
            LexiconError::ShapeMismatch {
                expected: 10,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn parse_rejects_empty_senses() {
        let err = Lexicon::parse_ron(r#"{ "vuoto": [] }"#, 10).unwrap_err();
        assert!(matches!(err, LexiconError::NoSenses(w) if w == "vuoto"));
    }

    #[test]
    fn parse_rejects_malformed_ron() {
        assert!(matches!(
            Lexicon::parse_ron("{ not ron", 10),
            Err(LexiconError::Ron(_))
        ));
    }

    #[test]
    fn merge_overrides() {
        let mut base = Lexicon::parse_ron(SAMPLE, 10).unwrap();
        let enhanced =
            Lexicon::parse_ron(r#"{ "perdere": [[0, 1, 0, 0, 0, 0, 0, 1, 0, 0]] }"#, 10).unwrap();
        base.merge(enhanced).unwrap();
        assert_eq!(base.len(), 2);
        assert_eq!(base.lookup("perdere").unwrap()[0][7], 1);
    }

    #[test]
    fn merge_rejects_other_length() {
        let mut base = Lexicon::new(10);
        assert!(matches!(
            base.merge(Lexicon::new(8)),
            Err(LexiconError::IncompatibleMerge { .. })
        ));
    }
}
