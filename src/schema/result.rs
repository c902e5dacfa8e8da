use serde::{Deserialize, Serialize};

use super::emotion::{EmotionNames, EmotionVector};

/// The outcome of analyzing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Elementwise sum of every per-sentence vector.
    pub aggregate: EmotionVector,
    /// One vector per sentence, in document order.
    pub per_sentence: Vec<EmotionVector>,
}

impl AnalysisResult {
    /// Build a result from per-sentence vectors, summing them in order.
    ///
    /// An empty document yields a zero aggregate of length `emotion_count`.
    pub fn from_sentences(per_sentence: Vec<EmotionVector>, emotion_count: usize) -> Self {
        let mut aggregate = EmotionVector::zeros(emotion_count);
        for sentence in &per_sentence {
            aggregate += sentence;
        }
        Self {
            aggregate,
            per_sentence,
        }
    }

    pub fn sentence_count(&self) -> usize {
        self.per_sentence.len()
    }

    /// The aggregate paired with emotion names.
    pub fn labelled(&self, names: &EmotionNames) -> Vec<(String, u32)> {
        names.label(&self.aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_sums_sentences() {
        let result = AnalysisResult::from_sentences(
            vec![
                EmotionVector::from(vec![1, 0, 2]),
                EmotionVector::from(vec![0, 1, 1]),
            ],
            3,
        );
        assert_eq!(result.aggregate.values(), &[1, 1, 3]);
        assert_eq!(result.sentence_count(), 2);
    }

    #[test]
    fn empty_document_has_zero_aggregate() {
        let result = AnalysisResult::from_sentences(Vec::new(), 4);
        assert_eq!(result.aggregate, EmotionVector::zeros(4));
        assert!(result.per_sentence.is_empty());
    }
}
