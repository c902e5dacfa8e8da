/// Text seams: sentence segmentation, word splitting, lemmatization, and
/// the optional normalization pass run before tokenizing.

use lazy_static::lazy_static;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Splits documents into sentences and sentences into words.
pub trait Tokenizer {
    /// Ordered sentences of `document`.
    fn segment(&self, document: &str, language: &str) -> Vec<String>;

    /// Ordered, lower-cased word tokens of `sentence`.
    fn split_words(&self, sentence: &str, language: &str) -> Vec<String>;
}

/// Maps word tokens to their lemmas.
///
/// Implementations return exactly one lemma per token, in token order.
pub trait Lemmatizer {
    fn lemmatize(&self, tokens: &[String]) -> Vec<String>;
}

lazy_static! {
    // A sentence runs up to and including its closing punctuation run.
    static ref RE_SENTENCE: Regex = Regex::new(r"[^.!?…]+[.!?…]*").unwrap();

    static ref RE_APOSTROPHE: Regex = Regex::new(r"['’ʼ]+").unwrap();
    static ref RE_FULL_STOP: Regex = Regex::new(r"\.").unwrap();
    static ref RE_LINE_BREAK: Regex = Regex::new(r"[\t\n\r\v\f]+").unwrap();
    static ref RE_GUILLEMETS: Regex = Regex::new(r"«([^»]+)»").unwrap();
    static ref RE_QUOTATIONS: Regex = Regex::new(r#""([^"]+)""#).unwrap();
    static ref RE_MULTIPLE_SPACES: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref RE_ELLIPSIS: Regex = Regex::new(r"\.{2,}").unwrap();
    static ref RE_FULL_STOP_RUN: Regex = Regex::new(r"\.(\s*\.*)*").unwrap();
}

/// Language-agnostic tokenizer: sentences end at `.`, `!`, `?` or `…`,
/// words are maximal alphanumeric runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationTokenizer;

impl Tokenizer for PunctuationTokenizer {
    fn segment(&self, document: &str, _language: &str) -> Vec<String> {
        RE_SENTENCE
            .find_iter(document)
            .map(|m| m.as_str().trim())
            .filter(|s| s.chars().any(char::is_alphanumeric))
            .map(str::to_string)
            .collect()
    }

    fn split_words(&self, sentence: &str, _language: &str) -> Vec<String> {
        sentence
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

/// Every token is its own lemma.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemmatize(&self, tokens: &[String]) -> Vec<String> {
        tokens.to_vec()
    }
}

/// Form → lemma lookup table; unknown forms are their own lemma.
#[derive(Debug, Clone, Default)]
pub struct TableLemmatizer {
    forms: FxHashMap<String, String>,
}

impl TableLemmatizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a RON map of the form `{ "persa": "perdere", .. }`.
    pub fn load_from_ron(path: &Path) -> Result<TableLemmatizer, TextError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<TableLemmatizer, TextError> {
        let forms: FxHashMap<String, String> = ron::from_str(input)?;
        Ok(TableLemmatizer { forms })
    }

    pub fn insert(&mut self, form: impl Into<String>, lemma: impl Into<String>) {
        self.forms.insert(form.into(), lemma.into());
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl Lemmatizer for TableLemmatizer {
    fn lemmatize(&self, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| self.forms.get(t).cloned().unwrap_or_else(|| t.clone()))
            .collect()
    }
}

/// Normalize raw narrative text so sentence splitting behaves.
///
/// Apostrophes become spaces, line breaks and tabs become sentence stops,
/// quoted and guillemet-delimited speech is unwrapped into the surrounding
/// sentence, whitespace runs collapse, ellipses become a single stop and
/// stray full-stop runs are merged.
pub fn preprocess_for_analysis(text: &str) -> String {
    let text = RE_APOSTROPHE.replace_all(text, " ");
    let text = RE_FULL_STOP.replace_all(&text, ". ");
    let text = RE_LINE_BREAK.replace_all(&text, ". ");
    let text = RE_GUILLEMETS.replace_all(&text, " $1 ");
    let text = RE_QUOTATIONS.replace_all(&text, " $1 ");
    let text = RE_MULTIPLE_SPACES.replace_all(&text, " ");
    let text = RE_ELLIPSIS.replace_all(&text, ".");
    RE_FULL_STOP_RUN.replace_all(&text, ". ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn segment_sentences() {
        let sentences = PunctuationTokenizer
            .segment("Ho perso il mio anello di matrimonio. Sono distrutta!", "italian");
        assert_eq!(
            sentences,
            strings(&["Ho perso il mio anello di matrimonio.", "Sono distrutta!"])
        );
    }

    #[test]
    fn segment_keeps_trailing_fragment_and_drops_punctuation_only() {
        let sentences = PunctuationTokenizer.segment("Davvero?! ... E poi", "italian");
        assert_eq!(sentences, strings(&["Davvero?!", "E poi"]));
    }

    #[test]
    fn segment_empty_document() {
        assert!(PunctuationTokenizer.segment("", "italian").is_empty());
        assert!(PunctuationTokenizer.segment("  \n ", "italian").is_empty());
    }

    #[test]
    fn split_words_lowercases_and_drops_punctuation() {
        let words = PunctuationTokenizer.split_words("Sono distrutta, l'anello è perso.", "italian");
        assert_eq!(words, strings(&["sono", "distrutta", "l", "anello", "è", "perso"]));
    }

    #[test]
    fn identity_lemmatizer() {
        let tokens = strings(&["perso", "anello"]);
        assert_eq!(IdentityLemmatizer.lemmatize(&tokens), tokens);
    }

    #[test]
    fn table_lemmatizer_falls_back_to_form() {
        let lemmatizer = TableLemmatizer::parse_ron(r#"{ "perso": "perdere" }"#).unwrap();
        assert_eq!(lemmatizer.len(), 1);
        assert_eq!(
            lemmatizer.lemmatize(&strings(&["ho", "perso"])),
            strings(&["ho", "perdere"])
        );
    }

    #[test]
    fn preprocess_unwraps_guillemets() {
        assert_eq!(preprocess_for_analysis("Disse «aiuto» piano"), "Disse aiuto piano");
    }

    #[test]
    fn preprocess_line_breaks_and_ellipses() {
        let out = preprocess_for_analysis("Era l'alba...\nPiove.");
        assert_eq!(out.trim(), "Era l alba. Piove.");
    }

    #[test]
    fn preprocess_then_segment() {
        let text = preprocess_for_analysis("Prima riga\nSeconda riga");
        let sentences = PunctuationTokenizer.segment(&text, "italian");
        assert_eq!(sentences, strings(&["Prima riga.", "Seconda riga"]));
    }
}
