/// Word selection ahead of scoring: surface-vs-lemma choice and valence filtering.

use crate::core::lexicon::LexiconGateway;

/// Pick, per position, the raw token if the lexicon knows it, else its lemma.
///
/// `tokens` and `lemmas` are order-aligned; callers check that their
/// lengths agree. Extra trailing items on either side are dropped.
pub fn prepare_sentence<L>(tokens: &[String], lemmas: &[String], lexicon: &L) -> Vec<String>
where
    L: LexiconGateway + ?Sized,
{
    tokens
        .iter()
        .zip(lemmas)
        .map(|(token, lemma)| {
            if lexicon.contains(token) {
                token.clone()
            } else {
                lemma.clone()
            }
        })
        .collect()
}

/// True if `word` is in the lexicon and at least one of its senses is
/// non-zero.
pub fn has_valence<L>(word: &str, lexicon: &L) -> bool
where
    L: LexiconGateway + ?Sized,
{
    lexicon
        .lookup(word)
        .map(|senses| senses.iter().any(|s| s.has_valence()))
        .unwrap_or(false)
}

/// Keep only the words that carry emotional valence, preserving order.
pub fn filter_valence<L>(words: Vec<String>, lexicon: &L) -> Vec<String>
where
    L: LexiconGateway + ?Sized,
{
    words
        .into_iter()
        .filter(|w| has_valence(w, lexicon))
        .collect()
}
