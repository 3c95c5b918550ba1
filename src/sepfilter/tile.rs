//! Output-extent tiling and band dispatch.
//!
//! Tiles partition the output extent exactly: row bands advance by the band
//! height, column blocks by the block width, and the final band/block on
//! each axis is sized to the remainder. Halo only widens the input window a
//! tile reads; output regions never overlap, so bands can run on any number
//! of threads in any order with identical results.

use itertools::iproduct;

use crate::error::TileConfigError;
use super::lanes::LANES;

/// Tile geometry for the vectorized pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileConfig {
    /// Rows per band.
    pub band_rows: usize,
    /// Columns per block within a band.
    pub block_cols: usize,
}

impl Default for TileConfig {
    /// The 256x32 schedule: 32-row bands keep a block's strip and halo rows
    /// resident in cache while 256-column blocks divide into whole lane
    /// steps.
    fn default() -> Self {
        Self {
            band_rows: 32,
            block_cols: 256,
        }
    }
}

impl TileConfig {
    /// Reject geometries the vectorized variants cannot honor. The naive
    /// reference variants take no tile configuration and always succeed.
    pub fn validate(&self) -> Result<(), TileConfigError> {
        if self.band_rows == 0 {
            return Err(TileConfigError::ZeroBandRows);
        }
        if self.block_cols == 0 {
            return Err(TileConfigError::ZeroBlockCols);
        }
        if self.block_cols % LANES != 0 {
            return Err(TileConfigError::BlockColsNotLaneAligned {
                block_cols: self.block_cols,
                lanes: LANES,
            });
        }
        Ok(())
    }
}

/// A rectangular output sub-region plus the halo its passes may read.
///
/// `row`/`col` address the output extent. A halo of `h` grants the tile
/// `2*h` extra trailing input rows and columns beyond its output extent;
/// a halo below the kernel radius forces edge replication at the tile
/// boundary and diverges from the whole-image result there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
    pub halo: usize,
}

/// Disjoint full cover of a `width x height` output extent.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: usize,
    height: usize,
    config: TileConfig,
    halo: usize,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, config: TileConfig, halo: usize) -> Self {
        Self {
            width,
            height,
            config,
            halo,
        }
    }

    pub fn band_count(&self) -> usize {
        self.height.div_ceil(self.config.band_rows)
    }

    /// All tiles, row-major.
    pub fn tiles(&self) -> Vec<Tile> {
        let bands = (0..self.height).step_by(self.config.band_rows);
        let blocks = (0..self.width).step_by(self.config.block_cols);
        iproduct!(bands, blocks)
            .map(|(row, col)| self.tile_at(row, col))
            .collect()
    }

    /// Tiles of one row band.
    pub fn band_tiles(&self, band: usize) -> Vec<Tile> {
        let row = band * self.config.band_rows;
        (0..self.width)
            .step_by(self.config.block_cols)
            .map(|col| self.tile_at(row, col))
            .collect()
    }

    fn tile_at(&self, row: usize, col: usize) -> Tile {
        Tile {
            row,
            col,
            rows: self.config.band_rows.min(self.height - row),
            cols: self.config.block_cols.min(self.width - col),
            halo: self.halo,
        }
    }
}

/// Run `body` once per row band over disjoint chunks of `data`.
///
/// `data` is split every `band_len` elements; each call receives the band
/// index and its chunk. Bands run on the rayon pool when the `rayon`
/// feature is enabled and sequentially otherwise; outputs are identical
/// either way because the chunks are disjoint.
#[cfg(feature = "rayon")]
pub fn for_each_band<T, F>(data: &mut [T], band_len: usize, body: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    use rayon::prelude::*;

    data.par_chunks_mut(band_len)
        .enumerate()
        .for_each(|(band, chunk)| body(band, chunk));
}

/// Run `body` once per row band over disjoint chunks of `data`.
///
/// Sequential fallback used when the `rayon` feature is disabled.
#[cfg(not(feature = "rayon"))]
pub fn for_each_band<T, F>(data: &mut [T], band_len: usize, body: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    for (band, chunk) in data.chunks_mut(band_len).enumerate() {
        body(band, chunk);
    }
}
