//! River channel carving with hardness-adaptive profiles.

use crate::terrain::HeightField;

use super::WaterParams;

/// Channel cross-section selected by local rock hardness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelProfile {
    /// Hard rock: narrow, deep, V-shaped canyon.
    Canyon,
    /// Medium rock: regular channel.
    Normal,
    /// Soft sediment: wide, shallow, U-shaped bed.
    Broad,
}

impl ChannelProfile {
    fn for_hardness(hardness: f32) -> Self {
        if hardness > 0.7 {
            ChannelProfile::Canyon
        } else if hardness > 0.4 {
            ChannelProfile::Normal
        } else {
            ChannelProfile::Broad
        }
    }

    /// Multipliers on the biome's river width and depth.
    fn width_depth_mul(&self) -> (f32, f32) {
        match self {
            ChannelProfile::Canyon => (0.3, 2.0),
            ChannelProfile::Normal => (0.7, 1.2),
            ChannelProfile::Broad => (1.8, 0.4),
        }
    }

    /// Erosion falloff over normalized distance `d` in `[0, 1]`.
    fn shape(&self, d: f32) -> f32 {
        match self {
            ChannelProfile::Canyon => (1.0 - d * d).max(0.0),
            ChannelProfile::Normal => (1.0 - d.powf(1.5)).max(0.0),
            ChannelProfile::Broad => (std::f32::consts::FRAC_PI_2 * d).cos().max(0.0),
        }
    }
}

/// Synthetic per-cell resistance to fluvial erosion in `[0, 1]`, derived
/// from local slope and absolute height.
fn hardness_field(hf: &HeightField) -> Vec<f32> {
    let size = hf.size();
    let data = hf.data();
    let mut hardness = vec![0.0f32; size * size];

    for y in 0..size {
        for x in 0..size {
            let idx = y * size + x;

            let mut slope = 0.0;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    slope += (data[idx] - hf.get_clamped(x as i32 + dx, y as i32 + dy)).abs();
                }
            }
            slope /= 8.0;

            let height_factor = (data[idx] + 0.3).max(0.0);
            hardness[idx] = (slope * 3.0 + height_factor * 0.4).min(1.0);
        }
    }

    hardness
}

/// Carves river channels into the heightfield.
///
/// For every river cell, a profile is chosen from the hardness field
/// (computed once from the pre-carve heights) and erosion is blended into
/// the surrounding pixels: never below the local river level, and always
/// as a 0.7 blend toward the target rather than a hard cut. Cells are
/// visited row-major; later carves see earlier ones.
///
/// A second pass smooths channel connections so confluences do not leave
/// steps.
pub fn carve_rivers(hf: &mut HeightField, river: &[f32], params: &WaterParams) {
    let size = hf.size();
    let hardness = hardness_field(hf);

    for y in 0..size {
        for x in 0..size {
            let idx = y * size + x;
            let strength = river[idx];
            if strength <= 0.0 {
                continue;
            }

            let profile = ChannelProfile::for_hardness(hardness[idx]);
            let (width_mul, depth_mul) = profile.width_depth_mul();
            let carve_width = width_mul * params.river_width;
            let carve_depth = depth_mul * params.river_depth;

            let radius = ((carve_width * 0.5).ceil() as i32).max(1);
            let radius_f = radius as f32;
            let river_level = hf.get(x, y) - carve_depth * strength;

            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || nx >= size as i32 || ny < 0 || ny >= size as i32 {
                        continue;
                    }

                    let distance = ((dx * dx + dy * dy) as f32).sqrt();
                    if distance > radius_f {
                        continue;
                    }

                    let falloff = profile.shape(distance / radius_f);
                    if falloff <= 0.0 {
                        continue;
                    }

                    let nxu = nx as usize;
                    let nyu = ny as usize;
                    let h_n = hf.get(nxu, nyu);
                    let max_erosion = carve_depth * strength * falloff;
                    let target = river_level.max(h_n - max_erosion);
                    hf.set(nxu, nyu, h_n + (target - h_n) * 0.7);
                }
            }
        }
    }

    smooth_connections(hf, river);
}

/// Relaxes heights along the channel network: strong river cells take the
/// mean of their in-channel neighbors, weak ones blend 30% toward the
/// full neighborhood mean.
fn smooth_connections(hf: &mut HeightField, river: &[f32]) {
    let size = hf.size();

    for y in 0..size {
        for x in 0..size {
            let idx = y * size + x;
            let strength = river[idx];

            if strength > 0.5 {
                let mut sum = 0.0;
                let mut count = 0u32;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx < 0 || nx >= size as i32 || ny < 0 || ny >= size as i32 {
                            continue;
                        }
                        let n_idx = ny as usize * size + nx as usize;
                        if river[n_idx] > 0.3 {
                            sum += hf.get(nx as usize, ny as usize);
                            count += 1;
                        }
                    }
                }
                if count > 0 {
                    hf.set(x, y, sum / count as f32);
                }
            } else if strength > 0.1 {
                let mut sum = 0.0;
                let mut count = 0u32;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx < 0 || nx >= size as i32 || ny < 0 || ny >= size as i32 {
                            continue;
                        }
                        sum += hf.get(nx as usize, ny as usize);
                        count += 1;
                    }
                }
                if count > 0 {
                    let mean = sum / count as f32;
                    let current = hf.get(x, y);
                    hf.set(x, y, 0.7 * current + 0.3 * mean);
                }
            }
        }
    }
}

/// Lowers beach cells by `amount * beach(p)`, never below 30% of the
/// current height, so coastlines soften without digging trenches.
pub fn apply_coastal_erosion(hf: &mut HeightField, beach: &[f32], amount: f32) {
    let data = hf.data_mut();

    for i in 0..data.len() {
        if beach[i] > 0.0 {
            let erosion = amount * beach[i];
            data[i] = (data[i] - erosion).max(data[i] * 0.3);
        }
    }
}
