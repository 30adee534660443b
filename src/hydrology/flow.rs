//! D8 flow accumulation.

use crate::terrain::HeightField;

// D8 neighbor offsets: N, NE, E, SE, S, SW, W, NW.
pub(crate) const DX: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];
pub(crate) const DY: [i32; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];

/// Computes D8 flow accumulation over a heightfield.
///
/// Every cell is seeded with one unit of flow. Cells are visited from
/// highest to lowest; each passes its accumulated flow to the neighbor
/// with the steepest downhill slope (diagonal distance √2). Cells with no
/// strictly downhill neighbor are sinks and keep what they have, so the
/// result is never below 1 anywhere.
pub fn flow_accumulation(hf: &HeightField) -> Vec<f32> {
    let mut order = Vec::new();
    flow_accumulation_with(hf, &mut order)
}

/// Same as [`flow_accumulation`], reusing a caller-owned ordering buffer.
pub(crate) fn flow_accumulation_with(hf: &HeightField, order: &mut Vec<u32>) -> Vec<f32> {
    let size = hf.size();
    let data = hf.data();
    let total = size * size;

    if total == 0 {
        return Vec::new();
    }

    let mut flow = vec![1.0f32; total];

    // Highest first; ties broken by row-major index so the sweep order is
    // identical on every platform.
    order.clear();
    order.extend(0..total as u32);
    order.sort_unstable_by(|&a, &b| {
        let ha = data[a as usize];
        let hb = data[b as usize];
        hb.partial_cmp(&ha)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    for &idx in order.iter() {
        let idx = idx as usize;
        let x = (idx % size) as i32;
        let y = (idx / size) as i32;

        let mut steepest = 0.0f32;
        let mut target = None;

        for dir in 0..8 {
            let nx = x + DX[dir];
            let ny = y + DY[dir];
            if nx < 0 || nx >= size as i32 || ny < 0 || ny >= size as i32 {
                continue;
            }

            let n_idx = ny as usize * size + nx as usize;
            let distance = ((DX[dir] * DX[dir] + DY[dir] * DY[dir]) as f32).sqrt();
            let slope = (data[idx] - data[n_idx]) / distance;

            if slope > steepest {
                steepest = slope;
                target = Some(n_idx);
            }
        }

        if let Some(n_idx) = target {
            flow[n_idx] += flow[idx];
        }
    }

    flow
}
