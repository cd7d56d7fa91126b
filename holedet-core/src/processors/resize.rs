//! Resize planning under a pixel budget and a size-quantization factor.

use crate::core::constants::MAX_ASPECT_RATIO;
use crate::core::{HoleError, HoleResult, ResizeConfig};
use tracing::debug;

/// Rounds half to even.
#[inline]
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Computes target dimensions that are multiples of `factor` and whose area
/// lies within `[min_pixels, max_pixels]`, keeping the aspect ratio as close
/// as the quantization allows.
///
/// Each side is first rounded to the nearest multiple of `factor`. When the
/// resulting area exceeds `max_pixels`, both sides are scaled down by
/// `sqrt(h*w / max_pixels)` and floored to the grid, so neither grows past the
/// original. When it falls below `min_pixels`, both sides are scaled up by
/// `sqrt(min_pixels / (h*w))` and rounded up to the grid. No side is ever
/// smaller than one `factor`.
///
/// # Errors
///
/// [`HoleError::InvalidDimension`] when a side is zero, `factor` is zero, the
/// pixel budget is empty or inverted, or the long side is more than 200 times
/// the short side.
///
/// # Returns
///
/// `(new_height, new_width)`.
pub fn plan_resize(
    height: u32,
    width: u32,
    factor: u32,
    min_pixels: u64,
    max_pixels: u64,
) -> HoleResult<(u32, u32)> {
    if height == 0 || width == 0 {
        return Err(HoleError::invalid_dimension(format!(
            "image dimensions must be > 0, got {height}x{width}"
        )));
    }
    if factor == 0 {
        return Err(HoleError::invalid_dimension("factor must be >= 1"));
    }
    if min_pixels == 0 || min_pixels > max_pixels {
        return Err(HoleError::invalid_dimension(format!(
            "pixel budget must satisfy 0 < min_pixels <= max_pixels, got [{min_pixels}, {max_pixels}]"
        )));
    }

    let h = height as f64;
    let w = width as f64;
    let ratio = h.max(w) / h.min(w);
    if ratio > MAX_ASPECT_RATIO {
        return Err(HoleError::invalid_dimension(format!(
            "absolute aspect ratio must be <= {MAX_ASPECT_RATIO}, got {ratio:.3}"
        )));
    }

    let f = factor as f64;
    let mut h_bar = (round_half_even(h / f) * f).max(f);
    let mut w_bar = (round_half_even(w / f) * f).max(f);

    if h_bar * w_bar > max_pixels as f64 {
        let beta = ((h * w) / max_pixels as f64).sqrt();
        debug!("{height}x{width} exceeds {max_pixels} pixels, scaling down by {beta:.3}");
        h_bar = ((h / beta / f).floor() * f).max(f);
        w_bar = ((w / beta / f).floor() * f).max(f);
    } else if h_bar * w_bar < min_pixels as f64 {
        let beta = (min_pixels as f64 / (h * w)).sqrt();
        debug!("{height}x{width} is below {min_pixels} pixels, scaling up by {beta:.3}");
        h_bar = (h * beta / f).ceil() * f;
        w_bar = (w * beta / f).ceil() * f;
    }

    Ok((h_bar as u32, w_bar as u32))
}

/// [`plan_resize`] with constraints taken from a [`ResizeConfig`].
pub fn plan_resize_with(height: u32, width: u32, config: &ResizeConfig) -> HoleResult<(u32, u32)> {
    plan_resize(
        height,
        width,
        config.factor,
        config.min_pixels,
        config.max_pixels,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{DEFAULT_MAX_PIXELS, DEFAULT_MIN_PIXELS};

    #[test]
    fn test_outputs_are_multiples_and_within_budget() -> HoleResult<()> {
        let sizes = [
            (1000, 2000),
            (37, 59),
            (10, 10),
            (4961, 7016),
            (3508, 2480),
            (640, 480),
            (123, 4567),
            (9000, 9000),
        ];
        for factor in [14, 28, 32] {
            for &(h, w) in &sizes {
                let (nh, nw) = plan_resize(h, w, factor, DEFAULT_MIN_PIXELS, DEFAULT_MAX_PIXELS)?;
                assert_eq!(nh % factor, 0, "{h}x{w} factor {factor}");
                assert_eq!(nw % factor, 0, "{h}x{w} factor {factor}");
                let area = nh as u64 * nw as u64;
                assert!(area >= DEFAULT_MIN_PIXELS, "{h}x{w} -> {nh}x{nw}");
                assert!(area <= DEFAULT_MAX_PIXELS, "{h}x{w} -> {nh}x{nw}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_in_budget_rounds_to_nearest_multiple() -> HoleResult<()> {
        assert_eq!(plan_resize(1000, 2000, 32, 4096, 10_485_760)?, (992, 1984));
        assert_eq!(plan_resize(640, 480, 32, 4096, 10_485_760)?, (640, 480));
        Ok(())
    }

    #[test]
    fn test_downscale_never_exceeds_original() -> HoleResult<()> {
        let (h, w) = plan_resize(7016, 4961, 32, 4096, 1_000_000)?;
        assert!(h <= 7016 && w <= 4961);
        assert!(h as u64 * w as u64 <= 1_000_000);
        // aspect ratio is preserved within one grid step
        let before = 7016.0 / 4961.0;
        let after = h as f64 / w as f64;
        assert!((before - after).abs() < 0.05);
        Ok(())
    }

    #[test]
    fn test_upscale_reaches_min_pixels() -> HoleResult<()> {
        assert_eq!(plan_resize(10, 10, 32, 4096, 10_485_760)?, (64, 64));
        Ok(())
    }

    #[test]
    fn test_invalid_inputs() {
        for result in [
            plan_resize(0, 100, 32, 4096, 10_000),
            plan_resize(100, 0, 32, 4096, 10_000),
            plan_resize(100, 100, 0, 4096, 10_000),
            plan_resize(100, 100, 32, 0, 10_000),
            plan_resize(100, 100, 32, 20_000, 10_000),
            plan_resize(10, 2010, 32, 4096, 10_485_760),
        ] {
            assert!(matches!(result, Err(HoleError::InvalidDimension { .. })));
        }
    }

    #[test]
    fn test_config_variant_matches() -> HoleResult<()> {
        let cfg = ResizeConfig::default();
        assert_eq!(
            plan_resize_with(1234, 987, &cfg)?,
            plan_resize(1234, 987, cfg.factor, cfg.min_pixels, cfg.max_pixels)?
        );
        Ok(())
    }
}
