//! River, water, and beach mask derivation.

use crate::terrain::HeightField;

/// Builds a river mask in `[0, 1]` from flow accumulation.
///
/// Flow is normalized by its maximum. Cells above `threshold` ramp up to
/// full strength; a tributary band between `0.3 * threshold` and
/// `threshold` contributes at reduced strength. Strong river cells are
/// then dilated into their 8-neighborhood with distance falloff so
/// channels read as more than one pixel wide.
///
/// An all-zero flow field yields an all-zero mask.
pub fn river_mask(flow: &[f32], size: usize, threshold: f32) -> Vec<f32> {
    let mut mask = vec![0.0f32; size * size];

    let max_flow = flow.iter().fold(0.0f32, |m, &f| m.max(f));
    if max_flow == 0.0 {
        return mask;
    }

    for i in 0..mask.len() {
        let normalized = flow[i] / max_flow;

        if normalized > threshold {
            mask[i] = ((normalized - threshold) / (1.0 - threshold)).min(1.0);
        } else if normalized > threshold * 0.3 {
            let bank = (normalized - threshold * 0.3) / (threshold * 0.7);
            mask[i] = bank * 0.3;
        }
    }

    // Dilate strong channels; the result at each cell is the max of its
    // own strength and every expansion reaching it.
    let mut dilated = mask.clone();
    for y in 0..size {
        for x in 0..size {
            let idx = y * size + x;
            if mask[idx] <= 0.5 {
                continue;
            }

            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || nx >= size as i32 || ny < 0 || ny >= size as i32 {
                        continue;
                    }

                    let distance = ((dx * dx + dy * dy) as f32).sqrt();
                    if distance <= 1.5 {
                        let n_idx = ny as usize * size + nx as usize;
                        let expansion = mask[idx] * 0.6 * (1.0 - distance / 1.5);
                        dilated[n_idx] = dilated[n_idx].max(expansion);
                    }
                }
            }
        }
    }

    dilated
}

/// Water mask: a cell is water if it sits at or below sea level or carries
/// river strength. `water(p) = max([H(p) <= sea_level], river(p))`.
pub fn water_mask(hf: &HeightField, river: &[f32], sea_level: f32) -> Vec<f32> {
    let data = hf.data();
    let mut mask = vec![0.0f32; data.len()];

    for i in 0..mask.len() {
        let below = if data[i] <= sea_level { 1.0f32 } else { 0.0 };
        mask[i] = below.max(river[i]);
    }

    mask
}

/// Beach mask from a water mask: water cells are 1; land cells fall off
/// linearly with their distance to the nearest water cell inside a
/// `(2W+1)²` window, `W = ceil(beach_width)`.
pub fn beach_mask(water: &[f32], size: usize, beach_width: f32) -> Vec<f32> {
    let mut beach = vec![0.0f32; size * size];
    let w = beach_width.ceil();
    let reach = w as i32;

    for y in 0..size {
        for x in 0..size {
            let idx = y * size + x;

            if water[idx] > 0.0 {
                beach[idx] = 1.0;
                continue;
            }

            let mut min_dist = f32::MAX;
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || nx >= size as i32 || ny < 0 || ny >= size as i32 {
                        continue;
                    }

                    let n_idx = ny as usize * size + nx as usize;
                    if water[n_idx] > 0.0 {
                        let distance = ((dx * dx + dy * dy) as f32).sqrt();
                        min_dist = min_dist.min(distance);
                    }
                }
            }

            if min_dist < f32::MAX {
                beach[idx] = (1.0 - min_dist / w).max(0.0);
            }
        }
    }

    beach
}
