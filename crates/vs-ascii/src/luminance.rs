use rayon::prelude::*;
use vs_core::frame::{LuminanceGrid, RGB_CHANNELS, SampledGrid};

/// Luma BT.601 (pondération standard des décodeurs vidéo).
///
/// # Example
/// ```
/// use vs_ascii::luminance::luma;
/// assert!((luma(255, 255, 255) - 255.0).abs() < 1e-3);
/// assert_eq!(luma(0, 0, 0), 0.0);
/// ```
#[inline(always)]
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)
}

/// Remplace une valeur non finie et borne le résultat à [0, 255].
///
/// NaN → 0, +Inf → 255, −Inf → 0.
#[inline(always)]
#[must_use]
pub fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        // clamp() envoie déjà ±Inf sur la borne la plus proche
        value.clamp(0.0, 255.0)
    }
}

/// Convertit `grid` en luminance et l'étire sur toute la plage [0, 255].
///
/// Deux passes : luma + min/max, puis rééchelonnage. Si toutes les valeurs sont
/// égales, le dénominateur est forcé à 1 et chaque cellule vaut 0.
///
/// `out` est redimensionné si besoin et réutilisé.
///
/// # Example
/// ```
/// use vs_core::frame::{LuminanceGrid, SampledGrid};
/// use vs_ascii::luminance::normalize_into;
///
/// let mut grid = SampledGrid::new(2, 1);
/// grid.data.copy_from_slice(&[10, 10, 10, 60, 60, 60]);
/// let mut lum = LuminanceGrid::default();
/// normalize_into(&grid, &mut lum);
/// assert_eq!(lum.get(0, 0), 0.0);
/// assert!((lum.get(1, 0) - 255.0).abs() < 1e-3);
/// ```
pub fn normalize_into(grid: &SampledGrid, out: &mut LuminanceGrid) {
    out.width = grid.width;
    out.height = grid.height;

    grid.data
        .par_chunks_exact(RGB_CHANNELS)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect_into_vec(&mut out.values);

    let Some((min, max)) = min_max(&out.values) else {
        return;
    };
    let max = if max == min { min + 1.0 } else { max };
    let range = max - min;

    for v in &mut out.values {
        *v = sanitize((*v - min) / range * 255.0);
    }
}

/// Allocating convenience around [`normalize_into`]. DO NOT use in hot path.
#[must_use]
pub fn normalize(grid: &SampledGrid) -> LuminanceGrid {
    let mut out = LuminanceGrid::default();
    normalize_into(grid, &mut out);
    out
}

/// Min et max des valeurs finies. `None` si aucune.
fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(pixels: &[(u8, u8, u8)], width: u32) -> SampledGrid {
        let height = pixels.len() as u32 / width;
        let mut grid = SampledGrid::new(width, height);
        for (i, &(r, g, b)) in pixels.iter().enumerate() {
            grid.data[i * 3..i * 3 + 3].copy_from_slice(&[r, g, b]);
        }
        grid
    }

    #[test]
    fn uniform_grid_normalizes_to_zero_without_nan() {
        for v in [0u8, 1, 128, 254, 255] {
            let grid = grid_from(&[(v, v, v); 16], 4);
            let lum = normalize(&grid);
            assert_eq!(lum.values.len(), 16);
            for &x in &lum.values {
                assert!(x.is_finite());
                assert_eq!(x, 0.0);
            }
        }
    }

    #[test]
    fn extremes_map_to_full_range() {
        let grid = grid_from(&[(30, 30, 30), (90, 90, 90), (150, 150, 150)], 3);
        let lum = normalize(&grid);
        assert_eq!(lum.get(0, 0), 0.0);
        assert!((lum.get(1, 0) - 127.5).abs() < 0.01);
        assert!((lum.get(2, 0) - 255.0).abs() < 0.01);
    }

    #[test]
    fn rescale_preserves_order() {
        let pixels: Vec<(u8, u8, u8)> = (0..64u32)
            .map(|i| {
                let k = (i * 37 % 256) as u8;
                (k, k.wrapping_mul(3), 255 - k)
            })
            .collect();
        let grid = grid_from(&pixels, 8);
        let lum = normalize(&grid);
        for (a, &(ra, ga, ba)) in pixels.iter().enumerate() {
            for (b, &(rb, gb, bb)) in pixels.iter().enumerate() {
                if luma(ra, ga, ba) >= luma(rb, gb, bb) {
                    assert!(lum.values[a] >= lum.values[b]);
                }
            }
        }
    }

    #[test]
    fn output_stays_in_range() {
        let grid = grid_from(&[(0, 0, 0), (255, 0, 0), (0, 255, 0), (0, 0, 255)], 2);
        let lum = normalize(&grid);
        assert!(lum.values.iter().all(|v| (0.0..=255.0).contains(v)));
    }

    #[test]
    fn sanitize_replaces_non_finite() {
        assert_eq!(sanitize(f32::NAN), 0.0);
        assert_eq!(sanitize(f32::INFINITY), 255.0);
        assert_eq!(sanitize(f32::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(300.0), 255.0);
        assert_eq!(sanitize(42.0), 42.0);
    }

    #[test]
    fn buffer_is_reused_across_sizes() {
        let mut lum = LuminanceGrid::default();
        normalize_into(&grid_from(&[(1, 1, 1); 12], 4), &mut lum);
        assert_eq!((lum.width, lum.height, lum.values.len()), (4, 3, 12));
        normalize_into(&grid_from(&[(1, 1, 1); 2], 2), &mut lum);
        assert_eq!((lum.width, lum.height, lum.values.len()), (2, 1, 2));
    }
}
