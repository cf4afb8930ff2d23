use crate::error::{AppError, Result};
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Sampling strategy. A closed enum rather than a trait object: the method
/// set is small and known, so new strategies are new variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMethod {
    Uniform,
}

impl SampleMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uniform" => Some(Self::Uniform),
            _ => None,
        }
    }

    pub fn sample(&self, data: &[u8], target_size: usize) -> Result<SampleResult> {
        match self {
            Self::Uniform => sample_uniform(data, target_size),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleResult {
    pub data: Vec<u8>,
    pub metadata: SampleMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub original_size: usize,
    pub sample_size: usize,
    pub method: String,
}

fn full_copy(data: &[u8]) -> SampleResult {
    SampleResult {
        data: data.to_vec(),
        metadata: SampleMetadata {
            original_size: data.len(),
            sample_size: data.len(),
            method: "full".to_string(),
        },
    }
}

/// Windowed uniform sampling: `windows_count` disjoint windows of
/// `window_size = floor(sqrt(target_size))` bytes each, drawn uniformly
/// over the file and concatenated in ascending offset order.
///
/// The output length is `windows_count * window_size`, which integer
/// truncation can leave strictly below `target_size`.
fn sample_uniform(data: &[u8], target_size: usize) -> Result<SampleResult> {
    if target_size == 0 {
        // window_size would be 0 and windows_count a division by zero.
        return Err(AppError::InvalidSampleSize(0));
    }

    let data_size = data.len();

    if data_size <= target_size {
        return Ok(full_copy(data));
    }

    // target_size >= 1 keeps window_size >= 1.
    let window_size = (target_size as f64).sqrt().floor() as usize;
    let windows_count = target_size / window_size;

    let mut rng = thread_rng();
    let offsets = draw_offsets(&mut rng, data_size, window_size, windows_count);

    // Parallel extraction: pure data-parallel map, no shared mutable state.
    let windows: Vec<&[u8]> = offsets
        .par_iter()
        .map(|&offset| {
            let end = (offset + window_size).min(data_size);
            if offset > end {
                return Err(AppError::SamplingFailed(format!(
                    "window at {} past end of {}-byte data",
                    offset, data_size
                )));
            }
            Ok(&data[offset..end])
        })
        .collect::<Result<_>>()?;

    let mut result = Vec::with_capacity(windows_count * window_size);
    for window in windows {
        result.extend_from_slice(window);
    }

    let sample_size = result.len();

    Ok(SampleResult {
        data: result,
        metadata: SampleMetadata {
            original_size: data_size,
            sample_size,
            method: "uniform".to_string(),
        },
    })
}

/// Pick `windows_count` window start offsets.
///
/// Draw uniformly in `[0, max_offset]` with replacement, sort ascending,
/// then shift the i-th offset by `i * window_size`. The shift makes the
/// windows pairwise disjoint, and because `max_offset` already excludes the
/// combined window span, the final window ends at or before `data_size`.
fn draw_offsets<R: Rng>(
    rng: &mut R,
    data_size: usize,
    window_size: usize,
    windows_count: usize,
) -> Vec<usize> {
    let max_offset = data_size.saturating_sub(windows_count * window_size);

    let mut offsets: Vec<usize> = (0..windows_count)
        .map(|_| {
            if max_offset == 0 {
                0
            } else {
                rng.gen_range(0..=max_offset)
            }
        })
        .collect();

    offsets.sort_unstable();

    for (i, offset) in offsets.iter_mut().enumerate() {
        *offset += i * window_size;
    }

    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn small_input_is_returned_verbatim() {
        let data: Vec<u8> = (0..100u8).collect();
        let result = SampleMethod::Uniform.sample(&data, 1000).unwrap();

        assert_eq!(result.metadata.method, "full");
        assert_eq!(result.metadata.original_size, 100);
        assert_eq!(result.metadata.sample_size, 100);
        assert_eq!(result.data, data);
    }

    #[test]
    fn exact_size_input_is_full() {
        let data = vec![0xCCu8; 256];
        let result = SampleMethod::Uniform.sample(&data, 256).unwrap();
        assert_eq!(result.metadata.method, "full");
        assert_eq!(result.data, data);
    }

    #[test]
    fn one_mib_at_target_1024_yields_exactly_1024_bytes() {
        let data = vec![0u8; 1_048_576];
        let result = SampleMethod::Uniform.sample(&data, 1024).unwrap();

        // floor(sqrt(1024)) = 32 -> 32 windows of 32 bytes.
        assert_eq!(result.metadata.method, "uniform");
        assert_eq!(result.data.len(), 1024);
        assert_eq!(result.metadata.sample_size, 1024);
        assert_eq!(result.metadata.original_size, 1_048_576);
    }

    #[test]
    fn zero_target_size_is_rejected() {
        let data = vec![1u8; 64];
        match SampleMethod::Uniform.sample(&data, 0) {
            Err(AppError::InvalidSampleSize(0)) => {}
            other => panic!("expected InvalidSampleSize, got {:?}", other),
        }
    }

    #[test]
    fn output_never_exceeds_target() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let target = rng.gen_range(1..4096usize);
            let data_size = target + rng.gen_range(1..100_000usize);
            let data = vec![0u8; data_size];

            let result = SampleMethod::Uniform.sample(&data, target).unwrap();

            let window_size = (target as f64).sqrt().floor() as usize;
            let windows_count = target / window_size;
            assert_eq!(result.data.len(), windows_count * window_size);
            assert!(result.data.len() <= target);
        }
    }

    #[test]
    fn drawn_windows_are_disjoint_and_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let target = rng.gen_range(1..8192usize);
            let window_size = (target as f64).sqrt().floor() as usize;
            let windows_count = target / window_size;
            // data strictly larger than target, down to the tightest ratio
            let data_size = target + rng.gen_range(1..65_536usize);

            let offsets = draw_offsets(&mut rng, data_size, window_size, windows_count);

            assert_eq!(offsets.len(), windows_count);
            for pair in offsets.windows(2) {
                // Disjoint half-open ranges: next window starts at or after
                // the previous one ends.
                assert!(pair[0] + window_size <= pair[1]);
            }
            let last = offsets[windows_count - 1];
            assert!(last + window_size <= data_size);
        }
    }

    #[test]
    fn tightest_ratio_stays_in_bounds() {
        // data_size exactly one byte over the combined window span.
        let mut rng = StdRng::seed_from_u64(3);
        let target = 1024;
        let window_size = 32;
        let windows_count = 32;
        let data_size = windows_count * window_size + 1;

        for _ in 0..100 {
            let offsets = draw_offsets(&mut rng, data_size, window_size, windows_count);
            assert!(offsets[windows_count - 1] + window_size <= data_size);
        }
    }

    #[test]
    fn uniform_output_is_made_of_contiguous_source_runs() {
        // data[i] = i mod 251: any contiguous source run increments by one
        // modulo 251, so each output window can be checked for contiguity
        // whatever offset it was cut at.
        let data_size = 1 << 20;
        let data: Vec<u8> = (0..data_size).map(|i| (i % 251) as u8).collect();

        let target = 4096; // window_size 64, 64 windows
        let result = SampleMethod::Uniform.sample(&data, target).unwrap();

        for window in result.data.chunks_exact(64) {
            for (j, &byte) in window.iter().enumerate() {
                assert_eq!(byte, ((window[0] as usize + j) % 251) as u8);
            }
        }
    }

    #[test]
    fn unknown_method_name_is_rejected() {
        assert_eq!(SampleMethod::from_name("uniform"), Some(SampleMethod::Uniform));
        assert_eq!(SampleMethod::from_name("stratified"), None);
        assert_eq!(SampleMethod::from_name(""), None);
    }
}
