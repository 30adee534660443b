//! Tile extraction and atlas packing.
//!
//! The continuous heightfield carries an `overlap`-pixel margin on all
//! sides. Tiles of side `tile_size` are cut at `inner`-pixel stride, so
//! each tile includes its neighbors' margins; only the inner regions land
//! in the atlas, side by side and without seams by construction.

use serde::{Deserialize, Serialize};

use crate::hydrology::crop_grid;
use crate::terrain::HeightField;

/// Normalized atlas sub-rectangle of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

/// Cuts the `rows x cols` tile grid out of the continuous field.
///
/// The tile at `(r, c)` is the `tile_size`-sized block starting at
/// `(c * inner, r * inner)`; tiles are returned in row-major order.
pub fn extract_tiles(
    field: &HeightField,
    rows: usize,
    cols: usize,
    tile_size: usize,
    inner: usize,
) -> Vec<HeightField> {
    let mut tiles = Vec::with_capacity(rows * cols);

    for r in 0..rows {
        for c in 0..cols {
            let mut tile = HeightField::new(tile_size);
            let src_x = c * inner;
            let src_y = r * inner;

            for y in 0..tile_size {
                for x in 0..tile_size {
                    tile.set(x, y, field.get(src_x + x, src_y + y));
                }
            }

            tiles.push(tile);
        }
    }

    tiles
}

/// Packs the inner regions into a row-major `cols*inner x rows*inner`
/// atlas. Every atlas cell is a verbatim copy of the corresponding
/// continuous-field cell at offset `overlap`.
pub fn pack_atlas(
    field: &HeightField,
    rows: usize,
    cols: usize,
    inner: usize,
    overlap: usize,
) -> (Vec<f32>, usize, usize) {
    let atlas_w = cols * inner;
    let atlas_h = rows * inner;
    let atlas = crop_grid(field.data(), field.size(), overlap, atlas_w, atlas_h);
    (atlas, atlas_w, atlas_h)
}

/// UV rectangles for every tile, row-major in `(r, c)`.
pub fn uv_rects(rows: usize, cols: usize, inner: usize) -> Vec<UvRect> {
    let atlas_w = (cols * inner) as f32;
    let atlas_h = (rows * inner) as f32;
    let mut rects = Vec::with_capacity(rows * cols);

    for r in 0..rows {
        for c in 0..cols {
            rects.push(UvRect {
                u0: (c * inner) as f32 / atlas_w,
                v0: (r * inner) as f32 / atlas_h,
                u1: ((c + 1) * inner) as f32 / atlas_w,
                v1: ((r + 1) * inner) as f32 / atlas_h,
            });
        }
    }

    rects
}

/// Legacy seam blending: linearly mixes the `overlap`-pixel inner borders
/// of grid-adjacent tiles. Tiles cut from one continuous field already
/// agree on those pixels, making this a numeric no-op there; for
/// externally generated per-tile fields it hides first-order seams at the
/// cost of the exact-equality guarantee.
pub fn blend_tile_seams(
    tiles: &mut [HeightField],
    rows: usize,
    cols: usize,
    tile_size: usize,
    overlap: usize,
) {
    let inner = tile_size - 2 * overlap;
    let denom = (overlap.saturating_sub(1)).max(1) as f32;

    // Horizontal neighbors: blend the left tile's column `inner + k`
    // against the right tile's column `k`, k in [0, overlap).
    for r in 0..rows {
        for c in 0..cols.saturating_sub(1) {
            let left = r * cols + c;
            let right = r * cols + c + 1;

            for k in 0..overlap {
                let w_left = 1.0 - k as f32 / denom;
                for y in 0..tile_size {
                    let a = tiles[left].get(inner + k, y);
                    let b = tiles[right].get(k, y);
                    let blended = a * w_left + b * (1.0 - w_left);
                    tiles[left].set(inner + k, y, blended);
                    tiles[right].set(k, y, blended);
                }
            }
        }
    }

    // Vertical neighbors: same along rows.
    for r in 0..rows.saturating_sub(1) {
        for c in 0..cols {
            let top = r * cols + c;
            let bottom = (r + 1) * cols + c;

            for k in 0..overlap {
                let w_top = 1.0 - k as f32 / denom;
                for x in 0..tile_size {
                    let a = tiles[top].get(x, inner + k);
                    let b = tiles[bottom].get(x, k);
                    let blended = a * w_top + b * (1.0 - w_top);
                    tiles[top].set(x, inner + k, blended);
                    tiles[bottom].set(x, k, blended);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_field(size: usize) -> HeightField {
        let mut field = HeightField::new(size);
        for y in 0..size {
            for x in 0..size {
                field.set(x, y, (x * 1000 + y) as f32);
            }
        }
        field
    }

    #[test]
    fn test_tiles_share_overlap_bands() {
        let rows = 1;
        let cols = 2;
        let tile_size = 16;
        let overlap = 4;
        let inner = tile_size - 2 * overlap;
        let field = gradient_field(cols * inner + 2 * overlap);

        let tiles = extract_tiles(&field, rows, cols, tile_size, inner);

        // Tile 0's columns [inner, tile_size) and tile 1's [0, 2*overlap)
        // cover the same field columns, pointwise.
        for k in 0..2 * overlap {
            for y in 0..tile_size {
                assert_eq!(tiles[0].get(inner + k, y), tiles[1].get(k, y));
            }
        }

        // In particular the right-inner edge of tile 0 equals the
        // left-inner edge of tile 1.
        for y in 0..tile_size {
            assert_eq!(tiles[0].get(inner + overlap, y), tiles[1].get(overlap, y));
        }
    }

    #[test]
    fn test_atlas_is_field_crop() {
        let rows = 2;
        let cols = 3;
        let inner = 8;
        let overlap = 2;
        let field = gradient_field(cols * inner + 2 * overlap);

        let (atlas, w, h) = pack_atlas(&field, rows, cols, inner, overlap);
        assert_eq!(w, 24);
        assert_eq!(h, 16);

        for y in 0..h {
            for x in 0..w {
                assert_eq!(atlas[y * w + x], field.get(x + overlap, y + overlap));
            }
        }
    }

    #[test]
    fn test_atlas_matches_tile_inner_regions() {
        let rows = 2;
        let cols = 2;
        let tile_size = 12;
        let overlap = 2;
        let inner = tile_size - 2 * overlap;
        let field = gradient_field(cols.max(rows) * inner + 2 * overlap);

        let tiles = extract_tiles(&field, rows, cols, tile_size, inner);
        let (atlas, w, _) = pack_atlas(&field, rows, cols, inner, overlap);

        for r in 0..rows {
            for c in 0..cols {
                let tile = &tiles[r * cols + c];
                for y in 0..inner {
                    for x in 0..inner {
                        let atlas_v = atlas[(r * inner + y) * w + c * inner + x];
                        assert_eq!(atlas_v, tile.get(overlap + x, overlap + y));
                    }
                }
            }
        }
    }

    #[test]
    fn test_uv_rects_partition_unit_square() {
        let rows = 2;
        let cols = 3;
        let rects = uv_rects(rows, cols, 8);
        assert_eq!(rects.len(), 6);

        // Adjacent rects share edges exactly; the grid covers [0,1]^2.
        for r in 0..rows {
            for c in 0..cols {
                let rect = rects[r * cols + c];
                assert!(rect.u0 < rect.u1 && rect.v0 < rect.v1);
                if c + 1 < cols {
                    assert_eq!(rect.u1, rects[r * cols + c + 1].u0);
                }
                if r + 1 < rows {
                    assert_eq!(rect.v1, rects[(r + 1) * cols + c].v0);
                }
            }
        }

        assert_eq!(rects[0].u0, 0.0);
        assert_eq!(rects[0].v0, 0.0);
        assert_eq!(rects[rows * cols - 1].u1, 1.0);
        assert_eq!(rects[rows * cols - 1].v1, 1.0);
    }

    #[test]
    fn test_single_tile_rect_is_identity() {
        let rects = uv_rects(1, 1, 32);
        assert_eq!(rects.len(), 1);
        assert_eq!(
            rects[0],
            UvRect {
                u0: 0.0,
                v0: 0.0,
                u1: 1.0,
                v1: 1.0
            }
        );
    }

    #[test]
    fn test_seam_blend_is_noop_on_continuous_tiles() {
        let rows = 2;
        let cols = 2;
        let tile_size = 16;
        let overlap = 4;
        let inner = tile_size - 2 * overlap;
        let field = gradient_field(cols.max(rows) * inner + 2 * overlap);

        let mut tiles = extract_tiles(&field, rows, cols, tile_size, inner);
        let original = tiles.clone();

        blend_tile_seams(&mut tiles, rows, cols, tile_size, overlap);
        assert_eq!(tiles, original);
    }

    #[test]
    fn test_seam_blend_converges_disagreeing_tiles() {
        let tile_size = 12;
        let overlap = 2;
        let inner = tile_size - 2 * overlap;

        let mut tiles = vec![
            HeightField::with_fill(tile_size, 0.0),
            HeightField::with_fill(tile_size, 1.0),
        ];
        blend_tile_seams(&mut tiles, 1, 2, tile_size, overlap);

        // k = 0 keeps the left tile's value; k = overlap-1 keeps the
        // right tile's. Both tiles agree on the blended band.
        assert_eq!(tiles[0].get(inner, 0), 0.0);
        assert_eq!(tiles[1].get(0, 0), 0.0);
        assert_eq!(tiles[0].get(inner + 1, 0), 1.0);
        assert_eq!(tiles[1].get(1, 0), 1.0);
    }
}
