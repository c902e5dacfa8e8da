/// Sentence scoring strategies and document aggregation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::disambiguation::{resolve, DisambiguationError};
use crate::core::lexicon::LexiconGateway;
use crate::schema::emotion::EmotionVector;
use crate::schema::result::AnalysisResult;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("disambiguation failed for word {word}: {source}")]
    Disambiguation {
        word: usize,
        #[source]
        source: DisambiguationError,
    },
    #[error("word {word} has a {found}-emotion sense, expected {expected}")]
    ShapeMismatch {
        word: usize,
        expected: usize,
        found: usize,
    },
}

/// Scores one sentence from the senses of its words.
///
/// `senses[i]` holds every lexicon sense of the i-th kept word. The result
/// always has `emotion_count` components; an empty sentence scores zero.
pub trait SentenceScorer {
    fn score_sentence(
        &self,
        senses: &[&[EmotionVector]],
        emotion_count: usize,
    ) -> Result<EmotionVector, ScoringError>;
}

/// Counts, per emotion, the words expressing it in any of their senses.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnfilteredScorer;

impl SentenceScorer for UnfilteredScorer {
    fn score_sentence(
        &self,
        senses: &[&[EmotionVector]],
        emotion_count: usize,
    ) -> Result<EmotionVector, ScoringError> {
        let mut result = EmotionVector::zeros(emotion_count);
        for (word, word_senses) in senses.iter().enumerate() {
            let mut collapsed = EmotionVector::zeros(emotion_count);
            for sense in word_senses.iter() {
                if sense.len() != emotion_count {
                    return Err(ScoringError::ShapeMismatch {
                        word,
                        expected: emotion_count,
                        found: sense.len(),
                    });
                }
                collapsed = collapsed.or(sense);
            }
            result += &collapsed;
        }
        Ok(result)
    }
}

/// Disambiguates every word against its neighbours before summing.
///
/// Boundary words look two words inwards, interior words one word on each
/// side. Two-word sentences resolve each word against the other.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilteredScorer;

impl FilteredScorer {
    fn resolve_at(
        window: &[&[EmotionVector]],
        reference: usize,
        word: usize,
        emotion_count: usize,
    ) -> Result<EmotionVector, ScoringError> {
        let resolved = resolve(window, reference)
            .map_err(|source| ScoringError::Disambiguation { word, source })?;
        if resolved.len() != emotion_count {
            return Err(ScoringError::ShapeMismatch {
                word,
                expected: emotion_count,
                found: resolved.len(),
            });
        }
        Ok(resolved)
    }
}

impl SentenceScorer for FilteredScorer {
    fn score_sentence(
        &self,
        senses: &[&[EmotionVector]],
        emotion_count: usize,
    ) -> Result<EmotionVector, ScoringError> {
        let n = senses.len();
        let mut result = EmotionVector::zeros(emotion_count);

        let k = emotion_count;

        match n {
            0 => {}
            1 => result += &Self::resolve_at(senses, 0, 0, k)?,
            2 => {
                result += &Self::resolve_at(senses, 0, 0, k)?;
                result += &Self::resolve_at(senses, 1, 1, k)?;
            }
            _ => {
                result += &Self::resolve_at(&senses[..3], 0, 0, k)?;
                for i in 1..n - 1 {
                    result += &Self::resolve_at(&senses[i - 1..=i + 1], 1, i, k)?;
                }
                result += &Self::resolve_at(&senses[n - 3..], 2, n - 1, k)?;
            }
        }
        Ok(result)
    }
}

/// Which scorer to run, as chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    Filtered,
    Unfiltered,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Filtered => "filtered",
            Self::Unfiltered => "unfiltered",
        }
    }
}

impl SentenceScorer for Strategy {
    fn score_sentence(
        &self,
        senses: &[&[EmotionVector]],
        emotion_count: usize,
    ) -> Result<EmotionVector, ScoringError> {
        match self {
            Self::Filtered => FilteredScorer.score_sentence(senses, emotion_count),
            Self::Unfiltered => UnfilteredScorer.score_sentence(senses, emotion_count),
        }
    }
}

/// Score every sentence with `scorer` and sum them into a document result.
///
/// Words the lexicon does not know are skipped.
pub fn score_document<S, L>(
    scorer: &S,
    sentences: &[Vec<String>],
    lexicon: &L,
) -> Result<AnalysisResult, ScoringError>
where
    S: SentenceScorer + ?Sized,
    L: LexiconGateway + ?Sized,
{
    let emotion_count = lexicon.emotion_count();
    let per_sentence = sentences
        .iter()
        .map(|sentence| {
            let senses: Vec<&[EmotionVector]> =
                sentence.iter().filter_map(|w| lexicon.lookup(w)).collect();
            scorer.score_sentence(&senses, emotion_count)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnalysisResult::from_sentences(per_sentence, emotion_count))
}
