/// The main analysis pipeline: Document → per-sentence emotions → arcs.
///
/// Wires together normalization, tokenization, lemmatization, sentence
/// preparation, valence filtering, scoring, and smoothing.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::core::cache::{ResultCache, SessionId};
use crate::core::config::{AnalyzerConfig, ConfigError};
use crate::core::lexicon::{Lexicon, LexiconError, LexiconGateway};
use crate::core::prepare::{filter_valence, prepare_sentence};
use crate::core::smoothing::{NarrativeSmoother, Series, SmoothedArcs, SmoothingError, TransformKind};
use crate::core::strategy::{score_document, ScoringError, Strategy};
use crate::core::text::{
    preprocess_for_analysis, IdentityLemmatizer, Lemmatizer, PunctuationTokenizer, TextError,
    Tokenizer,
};
use crate::schema::emotion::{EmotionNames, EmotionVector};
use crate::schema::result::AnalysisResult;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("lexicon error: {0}")]
    Lexicon(#[from] LexiconError),
    #[error("text error: {0}")]
    Text(#[from] TextError),
    #[error("scoring error: {0}")]
    Scoring(#[from] ScoringError),
    #[error("smoothing error: {0}")]
    Smoothing(#[from] SmoothingError),
    #[error("sentence {sentence} has {tokens} tokens but {lemmas} lemmas")]
    LemmaMismatch {
        sentence: usize,
        tokens: usize,
        lemmas: usize,
    },
    #[error("unknown lexicon variant: {0}")]
    UnknownLexicon(String),
    #[error("lexicon '{variant}' has {found} emotions, configured for {expected}")]
    LexiconShape {
        variant: String,
        expected: usize,
        found: usize,
    },
    #[error("nothing cached for session {0}")]
    NothingCached(SessionId),
}

/// The top-level analyzer. Built via `EmotionAnalyzer::builder()`.
pub struct EmotionAnalyzer {
    config: AnalyzerConfig,
    names: EmotionNames,
    lexicons: FxHashMap<String, Arc<Lexicon>>,
    tokenizer: Box<dyn Tokenizer + Send + Sync>,
    lemmatizer: Box<dyn Lemmatizer + Send + Sync>,
    smoother: NarrativeSmoother,
}

/// Builder for constructing an `EmotionAnalyzer`.
pub struct EmotionAnalyzerBuilder {
    config_path: Option<String>,
    /// Directly provided configuration (for testing without files).
    config: Option<AnalyzerConfig>,
    /// Directly provided lexicons; these win over configured paths.
    lexicons: FxHashMap<String, Lexicon>,
    tokenizer: Option<Box<dyn Tokenizer + Send + Sync>>,
    lemmatizer: Option<Box<dyn Lemmatizer + Send + Sync>>,
}

impl EmotionAnalyzer {
    pub fn builder() -> EmotionAnalyzerBuilder {
        EmotionAnalyzerBuilder {
            config_path: None,
            config: None,
            lexicons: FxHashMap::default(),
            tokenizer: None,
            lemmatizer: None,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn names(&self) -> &EmotionNames {
        &self.names
    }

    /// Registered lexicon variants, sorted.
    pub fn variants(&self) -> Vec<&str> {
        let mut variants: Vec<&str> = self.lexicons.keys().map(String::as_str).collect();
        variants.sort_unstable();
        variants
    }

    /// A cache sized by the configured capacity.
    pub fn new_cache(&self) -> ResultCache {
        ResultCache::new(self.config.cache_capacity)
    }

    /// Analyze with the configured default strategy and lexicon.
    pub fn analyze_default(&self, document: &str) -> Result<AnalysisResult, AnalysisError> {
        self.analyze(document, self.config.default_strategy, &self.config.default_lexicon)
    }

    /// Score every sentence of `document` with `strategy` against the
    /// `variant` lexicon.
    pub fn analyze(
        &self,
        document: &str,
        strategy: Strategy,
        variant: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let lexicon = self
            .lexicons
            .get(variant)
            .ok_or_else(|| AnalysisError::UnknownLexicon(variant.to_string()))?;

        // 1. Normalize
        let text = if self.config.preprocess {
            preprocess_for_analysis(document)
        } else {
            document.to_string()
        };

        // 2. Segment
        let language = self.config.language.as_str();
        let sentences = self.tokenizer.segment(&text, language);
        tracing::debug!("Segmented document into {} sentence(s)", sentences.len());

        // 3-5. Tokenize, lemmatize, prepare, filter
        let mut prepared = Vec::with_capacity(sentences.len());
        for (index, sentence) in sentences.iter().enumerate() {
            let tokens = self.tokenizer.split_words(sentence, language);
            let lemmas = self.lemmatizer.lemmatize(&tokens);
            if tokens.len() != lemmas.len() {
                return Err(AnalysisError::LemmaMismatch {
                    sentence: index,
                    tokens: tokens.len(),
                    lemmas: lemmas.len(),
                });
            }
            let words = prepare_sentence(&tokens, &lemmas, lexicon.as_ref());
            let kept = filter_valence(words, lexicon.as_ref());
            tracing::trace!("Sentence {}: {} token(s), {} with valence", index, tokens.len(), kept.len());
            prepared.push(kept);
        }

        // 6. Score
        let result = score_document(&strategy, &prepared, lexicon.as_ref())?;
        tracing::debug!(
            "Scored {} sentence(s) with {} strategy on '{}' lexicon",
            result.sentence_count(),
            strategy.name(),
            variant
        );
        Ok(result)
    }

    /// Low-pass the per-sentence sequence once per harmonic count.
    pub fn smooth(
        &mut self,
        per_sentence: &[EmotionVector],
        keep_harmonics: &BTreeSet<usize>,
        kind: TransformKind,
    ) -> Result<SmoothedArcs, AnalysisError> {
        let series = Series::from_emotion_vectors(per_sentence)?;
        Ok(self.smoother.smooth(&series, keep_harmonics, kind)?)
    }

    /// Analyze and remember the per-sentence result under `session`.
    pub fn analyze_cached(
        &self,
        cache: &ResultCache,
        session: SessionId,
        document: &str,
        strategy: Strategy,
        variant: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let result = self.analyze(document, strategy, variant)?;
        cache.store(session, result.per_sentence.clone());
        Ok(result)
    }

    /// Smooth the last result cached for `session` without re-analyzing.
    pub fn resmooth(
        &mut self,
        cache: &ResultCache,
        session: SessionId,
        keep_harmonics: &BTreeSet<usize>,
        kind: TransformKind,
    ) -> Result<SmoothedArcs, AnalysisError> {
        let per_sentence = cache
            .get(session)
            .ok_or(AnalysisError::NothingCached(session))?;
        let series = Series::from_emotion_vectors(&per_sentence)?;
        Ok(self.smoother.smooth(&series, keep_harmonics, kind)?)
    }
}

impl EmotionAnalyzerBuilder {
    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    /// Provide configuration directly (for testing without files).
    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a lexicon variant directly (for testing without files).
    pub fn with_lexicon(mut self, variant: &str, lexicon: Lexicon) -> Self {
        self.lexicons.insert(variant.to_string(), lexicon);
        self
    }

    pub fn tokenizer<T>(mut self, tokenizer: T) -> Self
    where
        T: Tokenizer + Send + Sync + 'static,
    {
        self.tokenizer = Some(Box::new(tokenizer));
        self
    }

    pub fn lemmatizer<L>(mut self, lemmatizer: L) -> Self
    where
        L: Lemmatizer + Send + Sync + 'static,
    {
        self.lemmatizer = Some(Box::new(lemmatizer));
        self
    }

    pub fn build(self) -> Result<EmotionAnalyzer, AnalysisError> {
        // Directly provided config wins over a config file
        let config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => AnalyzerConfig::load_from_ron(Path::new(&path))?,
            (None, None) => return Err(ConfigError::Missing("configuration").into()),
        };
        config.validate()?;

        let mut lexicons = FxHashMap::default();
        for (variant, lexicon) in self.lexicons {
            lexicons.insert(variant, Arc::new(lexicon));
        }

        // Load configured lexicon files not already provided
        for (variant, path) in &config.lexicons {
            if lexicons.contains_key(variant) {
                continue;
            }
            let lexicon = Lexicon::load_from_ron(Path::new(path), config.emotion_count)?;
            lexicons.insert(variant.clone(), Arc::new(lexicon));
        }

        if lexicons.is_empty() {
            return Err(ConfigError::Missing("lexicons").into());
        }
        for (variant, lexicon) in &lexicons {
            if lexicon.emotion_count() != config.emotion_count {
                return Err(AnalysisError::LexiconShape {
                    variant: variant.clone(),
                    expected: config.emotion_count,
                    found: lexicon.emotion_count(),
                });
            }
        }
        if !lexicons.contains_key(&config.default_lexicon) {
            return Err(ConfigError::Invalid(format!(
                "default lexicon '{}' is not registered",
                config.default_lexicon
            ))
            .into());
        }

        tracing::info!(
            "Emotion analyzer ready: {} lexicon variant(s), {} emotions, language '{}'",
            lexicons.len(),
            config.emotion_count,
            config.language
        );

        Ok(EmotionAnalyzer {
            names: config.names(),
            config,
            lexicons,
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(PunctuationTokenizer)),
            lemmatizer: self
                .lemmatizer
                .unwrap_or_else(|| Box::new(IdentityLemmatizer)),
            smoother: NarrativeSmoother::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::text::TableLemmatizer;

    const SADNESS: usize = 7;

    fn test_lexicon() -> Lexicon {
        let lexicon_ron = r#"{
            "perdere": [[0, 1, 0, 0, 0, 0, 0, 1, 0, 0]],
            "distruggere": [[0, 1, 1, 0, 0, 0, 0, 1, 0, 0], [0, 1, 0, 0, 0, 0, 0, 1, 0, 0]],
            "matrimonio": [[1, 0, 0, 1, 0, 0, 1, 0, 0, 1]],
            "anello": [[0, 0, 0, 0, 0, 0, 0, 0, 0, 0]],
        }"#;
        Lexicon::parse_ron(lexicon_ron, 10).unwrap()
    }

    fn test_lemmatizer() -> TableLemmatizer {
        let mut lemmatizer = TableLemmatizer::new();
        lemmatizer.insert("perso", "perdere");
        lemmatizer.insert("distrutta", "distruggere");
        lemmatizer
    }

    fn build_test_analyzer() -> EmotionAnalyzer {
        let mut config = AnalyzerConfig::new("italian", 10);
        config.default_lexicon = "it".to_string();
        config.cache_capacity = 2;
        EmotionAnalyzer::builder()
            .with_config(config)
            .with_lexicon("it", test_lexicon())
            .lemmatizer(test_lemmatizer())
            .build()
            .unwrap()
    }

    const DOCUMENT: &str = "Ho perso il mio anello di matrimonio. Sono distrutta.";

    #[test]
    fn analyze_unfiltered_document() {
        let analyzer = build_test_analyzer();
        let result = analyzer.analyze(DOCUMENT, Strategy::Unfiltered, "it").unwrap();

        assert_eq!(result.sentence_count(), 2);
        // perdere + matrimonio; distruggere's senses OR together
        assert_eq!(result.per_sentence[0].values(), &[1, 1, 0, 1, 0, 0, 1, 1, 0, 1]);
        assert_eq!(result.per_sentence[1].values(), &[0, 1, 1, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(result.aggregate[SADNESS], 2);
    }

    #[test]
    fn analyze_filtered_document() {
        let analyzer = build_test_analyzer();
        let result = analyzer.analyze(DOCUMENT, Strategy::Filtered, "it").unwrap();

        assert_eq!(result.sentence_count(), 2);
        // Lone word: distruggere senses summed [0,2,1,0,0,0,0,2,0,0], maxima {1, 7}
        assert_eq!(result.per_sentence[1].values(), &[0, 1, 0, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(result.aggregate[SADNESS], 1 + result.per_sentence[0][SADNESS]);
    }

    #[test]
    fn zero_valence_words_are_dropped() {
        let analyzer = build_test_analyzer();
        let result = analyzer.analyze("Un anello.", Strategy::Unfiltered, "it").unwrap();
        assert_eq!(result.sentence_count(), 1);
        assert_eq!(result.aggregate, EmotionVector::zeros(10));
    }

    #[test]
    fn empty_document_gives_zero_aggregate() {
        let analyzer = build_test_analyzer();
        let result = analyzer.analyze_default("").unwrap();
        assert!(result.per_sentence.is_empty());
        assert_eq!(result.aggregate, EmotionVector::zeros(10));
    }

    #[test]
    fn unknown_variant_rejected() {
        let analyzer = build_test_analyzer();
        let err = analyzer.analyze(DOCUMENT, Strategy::Filtered, "en").unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownLexicon(v) if v == "en"));
    }

    struct DroppingLemmatizer;

    impl Lemmatizer for DroppingLemmatizer {
        fn lemmatize(&self, tokens: &[String]) -> Vec<String> {
            tokens.iter().skip(1).cloned().collect()
        }
    }

    #[test]
    fn misaligned_lemmas_rejected() {
        let analyzer = EmotionAnalyzer::builder()
            .with_config(AnalyzerConfig::new("italian", 10))
            .with_lexicon("default", test_lexicon())
            .lemmatizer(DroppingLemmatizer)
            .build()
            .unwrap();
        let err = analyzer.analyze_default(DOCUMENT).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::LemmaMismatch {
                sentence: 0,
                tokens: 7,
                lemmas: 6
            }
        ));
    }

    #[test]
    fn build_requires_configuration() {
        let err = EmotionAnalyzer::builder()
            .with_lexicon("default", test_lexicon())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::Config(ConfigError::Missing(_))));
    }

    #[test]
    fn build_rejects_mismatched_lexicon() {
        let err = EmotionAnalyzer::builder()
            .with_config(AnalyzerConfig::new("italian", 8))
            .with_lexicon("default", test_lexicon())
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AnalysisError::LexiconShape {
                expected: 8,
                found: 10,
                ..
            }
        ));
    }

    #[test]
    fn build_rejects_unregistered_default() {
        let err = EmotionAnalyzer::builder()
            .with_config(AnalyzerConfig::new("italian", 10))
            .with_lexicon("it", test_lexicon())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn resmooth_uses_cached_session() {
        let mut analyzer = build_test_analyzer();
        let cache = analyzer.new_cache();
        let keep: BTreeSet<usize> = [1].into_iter().collect();

        let missing = analyzer
            .resmooth(&cache, SessionId(1), &keep, TransformKind::FullComplex)
            .unwrap_err();
        assert!(matches!(missing, AnalysisError::NothingCached(SessionId(1))));

        analyzer
            .analyze_cached(&cache, SessionId(1), DOCUMENT, Strategy::Unfiltered, "it")
            .unwrap();
        let arcs = analyzer
            .resmooth(&cache, SessionId(1), &keep, TransformKind::FullComplex)
            .unwrap();
        let Series::TwoD(rows) = arcs.get(1).unwrap() else {
            panic!("expected a 2-D arc");
        };
        // One harmonic leaves the per-emotion mean on every row
        assert_eq!(rows.len(), 2);
        assert!((rows[0][SADNESS] - 1.0).abs() < 1e-9);
        assert!((rows[1][SADNESS] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sessions_are_isolated() {
        let mut analyzer = build_test_analyzer();
        let cache = analyzer.new_cache();
        analyzer
            .analyze_cached(&cache, SessionId(1), DOCUMENT, Strategy::Unfiltered, "it")
            .unwrap();
        analyzer
            .analyze_cached(&cache, SessionId(2), "Sono distrutta.", Strategy::Unfiltered, "it")
            .unwrap();

        let keep: BTreeSet<usize> = [1].into_iter().collect();
        let first = analyzer
            .resmooth(&cache, SessionId(1), &keep, TransformKind::FullComplex)
            .unwrap();
        let second = analyzer
            .resmooth(&cache, SessionId(2), &keep, TransformKind::FullComplex)
            .unwrap();
        assert_eq!(first.get(1).unwrap().len(), 2);
        assert_eq!(second.get(1).unwrap().len(), 1);
    }

    #[test]
    fn lost_ring_with_one_hot_lexicon() {
        let lexicon = Lexicon::parse_ron(
            r#"{
                "perdere": [[0, 0, 0, 0, 0, 1, 0, 0, 0, 0]],
                "distruggere": [[0, 0, 0, 0, 0, 1, 0, 0, 0, 0]],
            }"#,
            10,
        )
        .unwrap();
        let analyzer = EmotionAnalyzer::builder()
            .with_config(AnalyzerConfig::new("italian", 10))
            .with_lexicon("default", lexicon)
            .lemmatizer(test_lemmatizer())
            .build()
            .unwrap();

        let sad = EmotionVector::one_hot(10, &[5]);
        for strategy in [Strategy::Unfiltered, Strategy::Filtered] {
            let result = analyzer.analyze(DOCUMENT, strategy, "default").unwrap();
            assert_eq!(result.aggregate.values(), &[0, 0, 0, 0, 0, 2, 0, 0, 0, 0]);
            assert_eq!(result.per_sentence, vec![sad.clone(), sad.clone()]);
        }
    }
}
