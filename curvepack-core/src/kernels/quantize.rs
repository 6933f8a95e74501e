//! Uniform scalar quantization of curve samples within a segment range.
//!
//! A segment stores `range_min`, `range_extent` and a bit width `b`. Each sample
//! is normalized into `[0, 1]` over the range and rounded onto `2^b - 1` steps,
//! so the worst-case reconstruction error is half a step:
//! `range_extent / (2 * (2^b - 1))`.
//!
//! Two widths are special:
//! - `0`: no per-sample data, every sample reconstructs to `range_min`.
//! - `32` (`RAW_BIT_WIDTH`): the sample's f32 bit pattern is stored verbatim.
//!
//! Widths between 24 and 31 are never produced; above 23 bits the normalized
//! value no longer fits the f32 mantissa and raw storage is both exact and cheap.
//!
//! The encoder and the decoder both call `dequantize`, so an error bound verified
//! at compression time holds bit-for-bit at playback.

/// The widest quantized (non-raw) encoding.
pub const MAX_QUANTIZED_BIT_WIDTH: u8 = 23;
/// Samples stored as raw f32 bit patterns.
pub const RAW_BIT_WIDTH: u8 = 32;

/// Returns `true` for the widths a segment may legally carry.
pub fn is_valid_bit_width(bit_width: u8) -> bool {
    bit_width <= MAX_QUANTIZED_BIT_WIDTH || bit_width == RAW_BIT_WIDTH
}

#[inline]
fn max_quantized_value(bit_width: u8) -> u32 {
    (1u32 << bit_width) - 1
}

/// Maps `value` onto the integer grid of the segment.
#[inline]
pub fn quantize(value: f32, range_min: f32, range_extent: f32, bit_width: u8) -> u32 {
    match bit_width {
        0 => 0,
        RAW_BIT_WIDTH => value.to_bits(),
        b => {
            if range_extent <= 0.0 {
                return 0;
            }
            let max_value = max_quantized_value(b);
            let normalized = ((value - range_min) / range_extent).clamp(0.0, 1.0);
            let q = (normalized * max_value as f32).round() as u32;
            q.min(max_value)
        }
    }
}

/// Reconstructs a sample from its quantized form.
#[inline]
pub fn dequantize(quantized: u32, range_min: f32, range_extent: f32, bit_width: u8) -> f32 {
    match bit_width {
        0 => range_min,
        RAW_BIT_WIDTH => f32::from_bits(quantized),
        b => {
            let normalized = quantized as f32 / max_quantized_value(b) as f32;
            range_min + normalized * range_extent
        }
    }
}

/// Smallest bit width whose half-step fits within `precision` for a range of
/// `range_extent`. Returns `RAW_BIT_WIDTH` when no quantized width suffices.
pub fn estimate_bit_width(range_extent: f32, precision: f32) -> u8 {
    if range_extent <= precision {
        return 0;
    }
    let extent = range_extent as f64;
    let precision = precision as f64;
    (1..=MAX_QUANTIZED_BIT_WIDTH)
        .find(|&b| extent / (2.0 * max_quantized_value(b) as f64) <= precision)
        .unwrap_or(RAW_BIT_WIDTH)
}

/// Largest absolute reconstruction error over `samples` at `bit_width`.
pub fn max_reconstruction_error(samples: &[f32], range_min: f32, range_extent: f32, bit_width: u8) -> f32 {
    samples
        .iter()
        .map(|&v| {
            let q = quantize(v, range_min, range_extent, bit_width);
            (dequantize(q, range_min, range_extent, bit_width) - v).abs()
        })
        .fold(0.0f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_bit_width_matches_half_step_bound() {
        // extent 1.0 at precision 0.01 needs 2^b - 1 >= 50, i.e. b = 6.
        assert_eq!(estimate_bit_width(1.0, 0.01), 6);
        // extent within precision collapses to zero bits.
        assert_eq!(estimate_bit_width(0.005, 0.01), 0);
        // absurd precision falls back to raw.
        assert_eq!(estimate_bit_width(1000.0, 1.0e-9), RAW_BIT_WIDTH);
    }

    #[test]
    fn test_quantize_dequantize_endpoints_exact() {
        let (min, extent) = (-2.0f32, 5.0f32);
        for b in [1u8, 8, 16, 23] {
            let q_min = quantize(min, min, extent, b);
            let q_max = quantize(min + extent, min, extent, b);
            assert_eq!(q_min, 0);
            assert_eq!(q_max, (1u32 << b) - 1);
            assert_eq!(dequantize(q_min, min, extent, b), min);
            assert!((dequantize(q_max, min, extent, b) - (min + extent)).abs() < 1.0e-6);
        }
    }

    #[test]
    fn test_raw_width_is_lossless() {
        let v = 0.123_456_79f32;
        let q = quantize(v, 0.0, 1.0, RAW_BIT_WIDTH);
        assert_eq!(dequantize(q, 0.0, 1.0, RAW_BIT_WIDTH), v);
    }

    #[test]
    fn test_error_within_half_step() {
        let samples: Vec<f32> = (0..100).map(|i| (i as f32 * 0.37).sin()).collect();
        let min = samples.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = samples.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let b = estimate_bit_width(max - min, 0.001);
        let err = max_reconstruction_error(&samples, min, max - min, b);
        assert!(err <= 0.001 + 1.0e-6, "error {} too large for {} bits", err, b);
    }

    #[test]
    fn test_valid_bit_widths() {
        assert!(is_valid_bit_width(0));
        assert!(is_valid_bit_width(23));
        assert!(!is_valid_bit_width(24));
        assert!(is_valid_bit_width(32));
        assert!(!is_valid_bit_width(33));
    }
}
