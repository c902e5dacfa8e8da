/// Word-sense disambiguation. Picks the emotion dimensions that apply to a
/// word given the words around it.
///
/// A window holds one to three consecutive words, each with every sense the
/// lexicon lists for it. The senses of each word are summed, so ambiguity
/// accumulates into intensity instead of being collapsed early. The
/// reference word then keeps its strongest dimensions that also appear in
/// the context, searching greedily from the strongest downwards.

use thiserror::Error;

use crate::schema::emotion::EmotionVector;

/// Largest window `resolve` accepts.
pub const MAX_WINDOW: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisambiguationError {
    #[error("window must hold 1 to 3 words, got {0}")]
    WindowSize(usize),
    #[error("reference position {reference} is outside a window of {len} words")]
    ReferenceOutOfRange { reference: usize, len: usize },
    #[error("window position {0} has no senses")]
    NoSenses(usize),
    #[error("window position {position} has a {found}-emotion sense, expected {expected}")]
    ShapeMismatch {
        position: usize,
        expected: usize,
        found: usize,
    },
}

/// Find the maximum of `values` and every index where it occurs.
///
/// Scans left to right: index 0 seeds the maximum, a strictly greater value
/// restarts the index list, an equal value is appended. Indices therefore
/// come back in ascending order. An empty slice yields `(0, [])`.
pub fn find_multiple_max(values: &[u32]) -> (u32, Vec<usize>) {
    let Some(&first) = values.first() else {
        return (0, Vec::new());
    };

    let mut max_value = first;
    let mut max_indices = vec![0];
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > max_value {
            max_value = value;
            max_indices.clear();
            max_indices.push(i);
        } else if value == max_value {
            max_indices.push(i);
        }
    }
    (max_value, max_indices)
}

/// State of the greedy overlap search.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Search {
    Searching,
    Found(Vec<usize>),
    Exhausted,
}

/// Resolve the emotions of the word at `reference` within `window`.
///
/// `window[p]` lists every sense of the word at position `p`. Returns a 0/1
/// vector marking the chosen dimensions.
pub fn resolve(
    window: &[&[EmotionVector]],
    reference: usize,
) -> Result<EmotionVector, DisambiguationError> {
    if window.is_empty() || window.len() > MAX_WINDOW {
        return Err(DisambiguationError::WindowSize(window.len()));
    }
    if reference >= window.len() {
        return Err(DisambiguationError::ReferenceOutOfRange {
            reference,
            len: window.len(),
        });
    }

    let sums = candidate_sums(window)?;
    let target = &sums[reference];
    let emotion_count = target.len();

    let context: Vec<&EmotionVector> = sums
        .iter()
        .enumerate()
        .filter(|(p, _)| *p != reference)
        .map(|(_, s)| s)
        .collect();

    if context.is_empty() {
        let (_, maxima) = find_multiple_max(target.values());
        return Ok(EmotionVector::one_hot(emotion_count, &maxima));
    }

    let mut mask = vec![false; emotion_count];
    for sum in &context {
        for (d, &v) in sum.values().iter().enumerate() {
            mask[d] |= v > 0;
        }
    }

    let chosen = overlap_search(target, &mask);
    Ok(EmotionVector::one_hot(emotion_count, &chosen))
}

/// Sum the senses at each window position, checking they share one length.
fn candidate_sums(window: &[&[EmotionVector]]) -> Result<Vec<EmotionVector>, DisambiguationError> {
    let expected = window[0]
        .first()
        .map(EmotionVector::len)
        .ok_or(DisambiguationError::NoSenses(0))?;

    window
        .iter()
        .enumerate()
        .map(|(position, senses)| {
            if senses.is_empty() {
                return Err(DisambiguationError::NoSenses(position));
            }
            let mut sum = EmotionVector::zeros(expected);
            for sense in senses.iter() {
                if sense.len() != expected {
                    return Err(DisambiguationError::ShapeMismatch {
                        position,
                        expected,
                        found: sense.len(),
                    });
                }
                sum += sense;
            }
            Ok(sum)
        })
        .collect()
}

/// Greedy search for the strongest target dimensions shared with the context.
///
/// Each round takes the maxima of the working copy; if any of them is in the
/// context they win. Otherwise they are zeroed and the next-strongest tier is
/// tried. Zeroed dimensions stay zero, so exclusions accumulate and every
/// round removes at least one positive dimension. When nothing is left the
/// context is ignored and the maxima of the untouched target win.
fn overlap_search(target: &EmotionVector, context_mask: &[bool]) -> Vec<usize> {
    let mut working = target.values().to_vec();
    let mut state = Search::Searching;

    for _ in 0..=working.len() {
        state = if working.iter().all(|&v| v == 0) {
            Search::Exhausted
        } else {
            let (_, maxima) = find_multiple_max(&working);
            let overlap: Vec<usize> = maxima
                .iter()
                .copied()
                .filter(|&d| context_mask[d])
                .collect();
            if overlap.is_empty() {
                for d in maxima {
                    working[d] = 0;
                }
                Search::Searching
            } else {
                Search::Found(overlap)
            }
        };

        if state != Search::Searching {
            break;
        }
    }

    match state {
        Search::Found(overlap) => overlap,
        Search::Searching | Search::Exhausted => {
            tracing::trace!("no context overlap, keeping the target maxima");
            find_multiple_max(target.values()).1
        }
    }
}
