use serde::{Deserialize, Serialize};
use std::ops::{AddAssign, Index};

/// A fixed-length vector of emotion intensities.
///
/// Index `i` holds the intensity (or count) of emotion `i`. The length is
/// the configured emotion count and never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionVector(Vec<u32>);

impl EmotionVector {
    /// All-zero vector of length `len`.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// Vector of length `len` with a 1 at every index in `indices`.
    ///
    /// Indices past the end are ignored.
    pub fn one_hot(len: usize, indices: &[usize]) -> Self {
        let mut values = vec![0; len];
        for &i in indices {
            if let Some(v) = values.get_mut(i) {
                *v = 1;
            }
        }
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[u32] {
        &self.0
    }

    /// Sum of all components, widened so long documents cannot overflow.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&v| v as u64).sum()
    }

    /// True if at least one component is positive.
    pub fn has_valence(&self) -> bool {
        self.0.iter().any(|&v| v > 0)
    }

    /// Elementwise boolean OR, as a 0/1 vector.
    pub fn or(&self, other: &EmotionVector) -> EmotionVector {
        EmotionVector(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(&a, &b)| u32::from(a > 0 || b > 0))
                .collect(),
        )
    }

    /// Components as `f64`, for feeding the smoother.
    pub fn to_f64(&self) -> Vec<f64> {
        self.0.iter().map(|&v| v as f64).collect()
    }
}

impl From<Vec<u32>> for EmotionVector {
    fn from(values: Vec<u32>) -> Self {
        Self(values)
    }
}

impl Index<usize> for EmotionVector {
    type Output = u32;

    fn index(&self, index: usize) -> &u32 {
        &self.0[index]
    }
}

impl AddAssign<&EmotionVector> for EmotionVector {
    /// Elementwise addition, saturating at `u32::MAX`. Both vectors must
    /// have the same length.
    fn add_assign(&mut self, rhs: &EmotionVector) {
        debug_assert_eq!(self.len(), rhs.len());
        for (a, b) in self.0.iter_mut().zip(&rhs.0) {
            *a = a.saturating_add(*b);
        }
    }
}

/// Display names for the emotion dimensions, in index order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionNames(Vec<String>);

impl EmotionNames {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Index of the emotion with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    /// Pair every component of `vector` with its emotion name.
    ///
    /// Unnamed dimensions are labelled by their index.
    pub fn label(&self, vector: &EmotionVector) -> Vec<(String, u32)> {
        vector
            .values()
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let name = self
                    .get(i)
                    .map(str::to_string)
                    .unwrap_or_else(|| i.to_string());
                (name, v)
            })
            .collect()
    }
}
