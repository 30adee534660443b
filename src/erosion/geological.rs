//! CPU geological erosion: wind, thermal, and hydraulic passes.
//!
//! Pass order is fixed: wind, then thermal, then hydraulic with a flow
//! recomputation, then mask finalization. Passes with a zero strength
//! parameter are skipped entirely. Interior cells only; the one-pixel
//! border is left untouched by every pass.

use crate::hydrology::{WaterFeatures, WaterParams, WaterSystem};
use crate::terrain::HeightField;

use super::config::{ErosionBackend, ErosionParams};
use super::gpu;

/// Talus threshold for the thermal pass: height differences above this are
/// unstable and shed material.
const TALUS_THRESHOLD: f32 = 0.8;

/// Per-cell masks accumulated over all erosion passes.
#[derive(Debug, Clone, PartialEq)]
pub struct ErosionMasks {
    /// Total material removed per cell.
    pub erosion: Vec<f32>,
    /// Total material deposited per cell.
    pub deposition: Vec<f32>,
}

/// Runs the geological erosion passes and owns their working buffers so
/// repeated runs on the same generator do not reallocate.
#[derive(Debug, Default)]
pub struct GeologicalEroder {
    tmp: Vec<f32>,
}

impl GeologicalEroder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies wind, thermal, and hydraulic erosion to the heightfield,
    /// with iteration counts derived from `params.time_years`.
    ///
    /// `features` must hold the water features computed on the pre-erosion
    /// terrain; the hydraulic pass refreshes its flow and river grids, and
    /// the beach and water masks are finalized from the eroded heights.
    /// With a zero time budget every pass is skipped and the heightfield
    /// is returned bit-identical.
    pub fn apply(
        &mut self,
        hf: &mut HeightField,
        params: &ErosionParams,
        water_params: &WaterParams,
        water: &mut WaterSystem,
        features: &mut WaterFeatures,
        backend: ErosionBackend,
    ) -> ErosionMasks {
        let total = hf.size() * hf.size();
        let mut masks = ErosionMasks {
            erosion: vec![0.0; total],
            deposition: vec![0.0; total],
        };

        if params.wind_strength > 0.0 {
            let iterations = params.wind_iterations();
            if iterations > 0 {
                wind_pass(hf, params.wind_strength, iterations, &mut masks.erosion);
            }
        }

        if params.temperature_cycles > 0.0 {
            let iterations = params.thermal_iterations();
            if iterations > 0 {
                self.thermal_pass(hf, params.temperature_cycles, iterations, &mut masks);
            }
        }

        if params.rain_intensity > 0.0 {
            let iterations = params.hydraulic_iterations();
            if iterations > 0 {
                let (flow, river) = water.reflow(hf, water_params);

                let ran_on_gpu = backend == ErosionBackend::Auto
                    && gpu::run_hydraulic(hf, &flow, &river, params.rain_intensity, iterations)
                        .is_ok();
                if !ran_on_gpu {
                    hydraulic_pass(
                        hf,
                        &flow,
                        &river,
                        params.rain_intensity,
                        iterations,
                        &mut masks,
                    );
                }

                features.flow_accumulation = flow;
                features.river_mask = river;
            }
        }

        water.refresh_masks(hf, features, water_params);

        masks
    }

    /// Freeze-thaw rockfall: slopes steeper than the talus threshold shed
    /// material to the neighbor below. Double-buffered per iteration so a
    /// cell's outflow is judged against the pre-iteration surface.
    fn thermal_pass(
        &mut self,
        hf: &mut HeightField,
        temperature_cycles: f32,
        iterations: u32,
        masks: &mut ErosionMasks,
    ) {
        let size = hf.size();
        self.tmp.clear();
        self.tmp.resize(size * size, 0.0);

        for _ in 0..iterations {
            let data = hf.data();
            self.tmp.copy_from_slice(data);

            for y in 1..size - 1 {
                for x in 1..size - 1 {
                    let idx = y * size + x;
                    let height = data[idx];

                    for dy in -1i32..=1 {
                        for dx in -1i32..=1 {
                            if dx == 0 && dy == 0 {
                                continue;
                            }

                            let n_idx = ((y as i32 + dy) as usize) * size + (x as i32 + dx) as usize;
                            let diff = height - data[n_idx];

                            if diff > TALUS_THRESHOLD {
                                let moved =
                                    (diff - TALUS_THRESHOLD) * temperature_cycles * 0.001 * 0.5;
                                self.tmp[idx] -= moved;
                                self.tmp[n_idx] += moved;
                                masks.erosion[idx] += moved;
                                masks.deposition[n_idx] += moved;
                            }
                        }
                    }
                }
            }

            for (h, &t) in hf.data_mut().iter_mut().zip(self.tmp.iter()) {
                *h = t.max(0.0);
            }
        }
    }
}

/// Wind scouring of exposed ridges: cells standing proud of their whole
/// neighborhood lose material proportional to the exposure.
fn wind_pass(hf: &mut HeightField, wind_strength: f32, iterations: u32, erosion: &mut [f32]) {
    let size = hf.size();
    let data = hf.data_mut();

    for _ in 0..iterations {
        for y in 1..size - 1 {
            for x in 1..size - 1 {
                let idx = y * size + x;
                let height = data[idx];

                let mut max_neighbor = f32::MIN;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let n_idx = ((y as i32 + dy) as usize) * size + (x as i32 + dx) as usize;
                        max_neighbor = max_neighbor.max(data[n_idx]);
                    }
                }

                let exposure = (height - max_neighbor + 0.1).max(0.0);
                let delta = wind_strength * exposure * 0.01;

                if delta > 0.0 {
                    data[idx] = (height - delta).max(0.0);
                    erosion[idx] += delta;
                }
            }
        }
    }
}

/// Water-driven erosion: removal scales with normalized flow, local slope,
/// and rain intensity, with extra wear along river channels; 30% of the
/// removed material deposits on the steepest downhill neighbor.
fn hydraulic_pass(
    hf: &mut HeightField,
    flow: &[f32],
    river: &[f32],
    rain_intensity: f32,
    iterations: u32,
    masks: &mut ErosionMasks,
) {
    let size = hf.size();
    let max_flow = flow.iter().fold(0.0f32, |m, &f| m.max(f));
    if max_flow == 0.0 {
        return;
    }

    let data = hf.data_mut();

    for _ in 0..iterations {
        for y in 1..size - 1 {
            for x in 1..size - 1 {
                let idx = y * size + x;

                let flow_n = flow[idx] / max_flow;
                let river_strength = river[idx];

                let mut total_slope = 0.0f32;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let n_idx = ((y as i32 + dy) as usize) * size + (x as i32 + dx) as usize;
                        total_slope += (data[idx] - data[n_idx]).abs();
                    }
                }
                let avg_slope = total_slope / 8.0;

                let hydro = flow_n * avg_slope * rain_intensity * 0.02;
                let channel = river_strength * avg_slope * rain_intensity * 0.05;
                let total = hydro + channel;

                if total <= 0.0 {
                    continue;
                }

                data[idx] -= total;
                masks.erosion[idx] += total;

                // Deposit part of the load on the steepest downhill neighbor.
                let mut steepest = 0.0f32;
                let mut deposit_idx = None;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let n_idx = ((y as i32 + dy) as usize) * size + (x as i32 + dx) as usize;
                        let drop = data[idx] - data[n_idx];
                        if drop > steepest {
                            steepest = drop;
                            deposit_idx = Some(n_idx);
                        }
                    }
                }

                if let Some(n_idx) = deposit_idx {
                    let deposited = total * 0.3;
                    data[n_idx] += deposited;
                    masks.deposition[n_idx] += deposited;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ridge_field(size: usize) -> HeightField {
        let mut hf = HeightField::new(size);
        for y in 0..size {
            for x in 0..size {
                let d = (x as f32 - size as f32 / 2.0).abs();
                hf.set(x, y, (2.0 - d * 0.25).max(0.1));
            }
        }
        hf
    }

    fn run_erosion(hf: &mut HeightField, params: &ErosionParams) -> (ErosionMasks, WaterFeatures) {
        let water_params = WaterParams::with_sea_level(0.05);
        let mut water = WaterSystem::new();
        let mut features = water.apply(hf, &water_params);
        let mut eroder = GeologicalEroder::new();
        let masks = eroder.apply(
            hf,
            params,
            &water_params,
            &mut water,
            &mut features,
            ErosionBackend::CpuOnly,
        );
        (masks, features)
    }

    #[test]
    fn test_zero_time_leaves_heightfield_unchanged() {
        let mut hf = ridge_field(24);

        let water_params = WaterParams::with_sea_level(0.05);
        let mut water = WaterSystem::new();
        let mut features = water.apply(&mut hf, &water_params);
        let carved = hf.clone();

        let params = ErosionParams {
            time_years: 0.0,
            sea_level_m: 23.0,
            wind_strength: 0.2,
            rain_intensity: 1.0,
            temperature_cycles: 25.0,
        };
        let masks = GeologicalEroder::new().apply(
            &mut hf,
            &params,
            &water_params,
            &mut water,
            &mut features,
            ErosionBackend::CpuOnly,
        );

        assert_eq!(hf, carved);
        assert!(masks.erosion.iter().all(|&e| e == 0.0));
        assert!(masks.deposition.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_wind_erodes_exposed_peak() {
        let size = 16;
        let mut hf = HeightField::with_fill(size, 0.5);
        hf.set(8, 8, 2.0);

        let mut erosion = vec![0.0f32; size * size];
        wind_pass(&mut hf, 0.5, 3, &mut erosion);

        assert!(hf.get(8, 8) < 2.0);
        assert!(erosion[8 * size + 8] > 0.0);
        // The 0.1 exposure bias wears flat ground too, but far slower
        // than the exposed peak.
        assert!(erosion[2 * size + 2] < erosion[8 * size + 8] * 0.1);
    }

    #[test]
    fn test_thermal_relaxes_talus_violation() {
        let size = 16;
        let mut hf = HeightField::with_fill(size, 0.0);
        hf.set(8, 8, 3.0);

        let params = ErosionParams {
            time_years: 5000.0,
            sea_level_m: 23.0,
            wind_strength: 0.0,
            rain_intensity: 0.0,
            temperature_cycles: 50.0,
        };
        let (masks, _) = run_erosion(&mut hf, &params);

        // The spike sheds material to its neighbors.
        assert!(hf.get(8, 8) < 3.0);
        assert!(hf.get(7, 8) > 0.0);
        assert!(masks.erosion[8 * size + 8] > 0.0);
        assert!(masks.deposition[8 * size + 7] > 0.0);
    }

    #[test]
    fn test_heights_stay_non_negative() {
        let mut hf = ridge_field(24);
        let params = ErosionParams {
            time_years: 2000.0,
            sea_level_m: 23.0,
            wind_strength: 5.0,
            rain_intensity: 0.0,
            temperature_cycles: 100.0,
        };
        run_erosion(&mut hf, &params);

        assert!(hf.data().iter().all(|&h| h >= 0.0));
    }

    #[test]
    fn test_hydraulic_erodes_slopes() {
        let mut hf = ridge_field(24);
        let before = hf.clone();

        let params = ErosionParams {
            time_years: 500.0,
            sea_level_m: 23.0,
            wind_strength: 0.0,
            rain_intensity: 1.0,
            temperature_cycles: 0.0,
        };
        let (masks, _) = run_erosion(&mut hf, &params);

        assert_ne!(hf, before);
        assert!(masks.erosion.iter().any(|&e| e > 0.0));
        assert!(masks.deposition.iter().any(|&d| d > 0.0));
    }

    #[test]
    fn test_finalized_masks_stay_in_domain() {
        let mut hf = ridge_field(24);
        let params = ErosionParams {
            time_years: 1000.0,
            sea_level_m: 23.0,
            wind_strength: 0.11,
            rain_intensity: 1.0,
            temperature_cycles: 25.0,
        };
        let (_, features) = run_erosion(&mut hf, &params);

        assert!(features.water_mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(features.beach_mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(features.river_mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(features.flow_accumulation.iter().all(|&v| v >= 1.0));
    }

    #[test]
    fn test_erosion_is_deterministic() {
        let params = ErosionParams {
            time_years: 750.0,
            sea_level_m: 23.0,
            wind_strength: 0.11,
            rain_intensity: 1.0,
            temperature_cycles: 25.0,
        };

        let mut a = ridge_field(20);
        let mut b = ridge_field(20);
        let (masks_a, feat_a) = run_erosion(&mut a, &params);
        let (masks_b, feat_b) = run_erosion(&mut b, &params);

        assert_eq!(a, b);
        assert_eq!(masks_a, masks_b);
        assert_eq!(feat_a, feat_b);
    }
}
