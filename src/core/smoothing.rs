/// Narrative arc smoothing — Fourier low-pass filtering of per-sentence
/// emotion sequences, plus normalization and masking helpers.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::schema::emotion::EmotionVector;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SmoothingError {
    #[error("series must be 1-D or 2-D, got rank {0}")]
    InvalidRank(usize),
    #[error("shape {shape:?} needs {expected} values, got {found}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("keep_harmonics must be between 1 and {len}, got {keep}")]
    InvalidHarmonics { keep: usize, len: usize },
    #[error("no harmonic counts requested")]
    NoHarmonics,
    #[error("reference shape {reference:?} differs from values shape {values:?}")]
    MaskShape {
        reference: Vec<usize>,
        values: Vec<usize>,
    },
}

/// How the sequence is taken to the frequency domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransformKind {
    /// Complex spectrum of the full input length.
    #[default]
    FullComplex,
    /// Packed real spectrum `[y0, Re y1, Im y1, Re y2, Im y2, ...]`, relying
    /// on the conjugate symmetry of real input.
    RealOnly,
}

/// A real sequence to smooth: one emotion, or one column per emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Series {
    /// One emotion over time.
    OneD(Vec<f64>),
    /// Rows are time points (sentences), columns are emotions.
    TwoD(Vec<Vec<f64>>),
}

impl Series {
    /// Build a series from a row-major buffer and its shape.
    ///
    /// Only ranks 1 and 2 are accepted.
    pub fn from_shape(shape: &[usize], data: Vec<f64>) -> Result<Series, SmoothingError> {
        let expected: usize = shape.iter().product();
        if shape.is_empty() || shape.len() > 2 {
            return Err(SmoothingError::InvalidRank(shape.len()));
        }
        if expected != data.len() {
            return Err(SmoothingError::ShapeMismatch {
                shape: shape.to_vec(),
                expected,
                found: data.len(),
            });
        }

        if shape.len() == 1 {
            return Ok(Series::OneD(data));
        }

        let (rows, cols) = (shape[0], shape[1]);
        if cols == 0 {
            return Ok(Series::TwoD(vec![Vec::new(); rows]));
        }
        Ok(Series::TwoD(data.chunks(cols).map(<[f64]>::to_vec).collect()))
    }

    /// Build a 2-D series, checking every row has the same width.
    pub fn two_d(rows: Vec<Vec<f64>>) -> Result<Series, SmoothingError> {
        let series = Series::TwoD(rows);
        series.validate()?;
        Ok(series)
    }

    /// Check that every row of a 2-D series has the width of the first.
    pub fn validate(&self) -> Result<(), SmoothingError> {
        if let Series::TwoD(rows) = self {
            if let Some(first) = rows.first() {
                let expected = first.len();
                if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
                    return Err(SmoothingError::RaggedRows {
                        row,
                        expected,
                        found: r.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// One row per sentence, one column per emotion.
    pub fn from_emotion_vectors(vectors: &[EmotionVector]) -> Result<Series, SmoothingError> {
        Series::two_d(vectors.iter().map(EmotionVector::to_f64).collect())
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            Series::OneD(values) => vec![values.len()],
            Series::TwoD(rows) => vec![rows.len(), rows.first().map_or(0, Vec::len)],
        }
    }

    /// Number of time points.
    pub fn len(&self) -> usize {
        match self {
            Series::OneD(values) => values.len(),
            Series::TwoD(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sequence of each emotion, in column order.
    pub fn columns(&self) -> Vec<Vec<f64>> {
        match self {
            Series::OneD(values) => vec![values.clone()],
            Series::TwoD(rows) => {
                let width = rows.first().map_or(0, Vec::len);
                (0..width)
                    .map(|c| rows.iter().map(|row| row[c]).collect())
                    .collect()
            }
        }
    }

    /// Rebuild a series of the same rank as `self` from columns.
    fn with_columns(&self, columns: Vec<Vec<f64>>) -> Series {
        match self {
            Series::OneD(_) => Series::OneD(columns.into_iter().next().unwrap_or_default()),
            Series::TwoD(rows) => {
                let mut out = vec![Vec::with_capacity(columns.len()); rows.len()];
                for column in &columns {
                    for (row, &value) in out.iter_mut().zip(column) {
                        row.push(value);
                    }
                }
                Series::TwoD(out)
            }
        }
    }
}

/// Frequency-domain view of one column of the input.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSpectrum {
    Complex(Vec<Complex<f64>>),
    Real(Vec<f64>),
}

/// Output of a smoothing pass: one smoothed series per harmonic count,
/// plus the spectrum of each input column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothedArcs {
    pub arcs: BTreeMap<usize, Series>,
    #[serde(skip_serializing)]
    pub spectra: Vec<ColumnSpectrum>,
}

impl SmoothedArcs {
    pub fn get(&self, keep_harmonics: usize) -> Option<&Series> {
        self.arcs.get(&keep_harmonics)
    }
}

/// Fourier low-pass smoother. Holds the FFT planner so repeated calls on
/// sequences of the same length reuse plans.
pub struct NarrativeSmoother {
    planner: FftPlanner<f64>,
}

impl Default for NarrativeSmoother {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrativeSmoother {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Low-pass `series` once per entry of `keep_harmonics`.
    ///
    /// 2-D input is smoothed column by column. Each count is applied to the
    /// same input spectrum independently.
    pub fn smooth(
        &mut self,
        series: &Series,
        keep_harmonics: &BTreeSet<usize>,
        kind: TransformKind,
    ) -> Result<SmoothedArcs, SmoothingError> {
        series.validate()?;
        if keep_harmonics.is_empty() {
            return Err(SmoothingError::NoHarmonics);
        }
        let len = series.len();
        for &keep in keep_harmonics {
            if keep == 0 || (len > 0 && keep > len) {
                return Err(SmoothingError::InvalidHarmonics { keep, len });
            }
        }

        let columns = series.columns();
        tracing::debug!(
            "Smoothing {} column(s) of length {} with {:?} ({:?})",
            columns.len(),
            len,
            keep_harmonics,
            kind
        );

        let spectra: Vec<ColumnSpectrum> = columns
            .iter()
            .map(|column| self.transform(column, kind))
            .collect();

        let mut arcs = BTreeMap::new();
        for &keep in keep_harmonics {
            let mut smoothed = Vec::with_capacity(spectra.len());
            for spectrum in &spectra {
                smoothed.push(self.low_pass(spectrum, keep));
            }
            arcs.insert(keep, series.with_columns(smoothed));
        }

        Ok(SmoothedArcs { arcs, spectra })
    }

    fn transform(&mut self, column: &[f64], kind: TransformKind) -> ColumnSpectrum {
        let spectrum = self.forward(column);
        match kind {
            TransformKind::FullComplex => ColumnSpectrum::Complex(spectrum),
            TransformKind::RealOnly => ColumnSpectrum::Real(pack_real(&spectrum)),
        }
    }

    fn low_pass(&mut self, spectrum: &ColumnSpectrum, keep: usize) -> Vec<f64> {
        match spectrum {
            ColumnSpectrum::Complex(bins) => {
                let n = bins.len();
                let mut filtered = bins.clone();
                // low bins and their mirror images survive
                for bin in filtered.iter_mut().take(n.saturating_sub(keep)).skip(keep) {
                    *bin = Complex::new(0.0, 0.0);
                }
                self.inverse(filtered)
            }
            ColumnSpectrum::Real(packed) => {
                let mut filtered = packed.clone();
                for value in filtered.iter_mut().skip(keep) {
                    *value = 0.0;
                }
                self.inverse(unpack_real(&filtered))
            }
        }
    }

    fn forward(&mut self, column: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> = column.iter().map(|&x| Complex::new(x, 0.0)).collect();
        if !buffer.is_empty() {
            let fft = self.planner.plan_fft_forward(buffer.len());
            fft.process(&mut buffer);
        }
        buffer
    }

    /// Inverse transform, normalized, keeping the real part.
    fn inverse(&mut self, mut buffer: Vec<Complex<f64>>) -> Vec<f64> {
        let n = buffer.len();
        if n == 0 {
            return Vec::new();
        }
        let ifft = self.planner.plan_fft_inverse(n);
        ifft.process(&mut buffer);
        buffer.iter().map(|c| c.re / n as f64).collect()
    }
}

/// Pack the non-redundant half of a real signal's spectrum into `n` reals.
fn pack_real(spectrum: &[Complex<f64>]) -> Vec<f64> {
    let n = spectrum.len();
    let mut packed = vec![0.0; n];
    if n == 0 {
        return packed;
    }
    packed[0] = spectrum[0].re;
    for j in 1..=(n - 1) / 2 {
        packed[2 * j - 1] = spectrum[j].re;
        packed[2 * j] = spectrum[j].im;
    }
    if n % 2 == 0 && n > 1 {
        packed[n - 1] = spectrum[n / 2].re;
    }
    packed
}

/// Rebuild the full conjugate-symmetric spectrum from its packed form.
fn unpack_real(packed: &[f64]) -> Vec<Complex<f64>> {
    let n = packed.len();
    let mut spectrum = vec![Complex::new(0.0, 0.0); n];
    if n == 0 {
        return spectrum;
    }
    spectrum[0] = Complex::new(packed[0], 0.0);
    for j in 1..=(n - 1) / 2 {
        let bin = Complex::new(packed[2 * j - 1], packed[2 * j]);
        spectrum[j] = bin;
        spectrum[n - j] = bin.conj();
    }
    if n % 2 == 0 && n > 1 {
        spectrum[n / 2] = Complex::new(packed[n - 1], 0.0);
    }
    spectrum
}

/// Smooth with a throwaway planner.
pub fn smooth(
    series: &Series,
    keep_harmonics: &BTreeSet<usize>,
    kind: TransformKind,
) -> Result<SmoothedArcs, SmoothingError> {
    NarrativeSmoother::new().smooth(series, keep_harmonics, kind)
}

/// Divide a 1-D series, or each column of a 2-D one, by its maximum.
///
/// A zero maximum yields non-finite values; callers that can see all-zero
/// channels must guard for it.
pub fn normalize(series: &Series) -> Result<Series, SmoothingError> {
    series.validate()?;
    let columns = series
        .columns()
        .into_iter()
        .map(|column| {
            let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            column.into_iter().map(|x| x / max).collect()
        })
        .collect();
    Ok(series.with_columns(columns))
}

/// Zero every value whose counterpart in `reference` is not positive.
///
/// Used to silence smoothing ripple in channels the raw signal never
/// touched.
pub fn mask_by_reference(reference: &Series, values: &Series) -> Result<Series, SmoothingError> {
    reference.validate()?;
    values.validate()?;
    if reference.shape() != values.shape() {
        return Err(SmoothingError::MaskShape {
            reference: reference.shape(),
            values: values.shape(),
        });
    }

    let masked = reference
        .columns()
        .iter()
        .zip(values.columns())
        .map(|(r, v)| {
            r.iter()
                .zip(v)
                .map(|(&r, v)| if r > 0.0 { v } else { 0.0 })
                .collect()
        })
        .collect();
    Ok(values.with_columns(masked))
}
