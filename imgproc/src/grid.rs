use crate::{ImgprocError, Result};

/// Axis-aligned pixel rectangle, `x`/`y` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BlockRect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Splits a `width × height` image into `rows × cols` non-overlapping blocks,
/// row-major.
///
/// Boundaries are `floor(i · height / rows)` and `floor(j · width / cols)`, so
/// blocks differ by at most one pixel and nothing is padded. When the image is
/// smaller than the grid some blocks are empty.
pub fn grid_blocks(width: u32, height: u32, rows: u32, cols: u32) -> Result<Vec<BlockRect>> {
    if rows == 0 || cols == 0 {
        return Err(ImgprocError::DimensionMismatch(format!(
            "grid must have at least one row and column, got {rows}x{cols}"
        )));
    }

    let bound = |i: u32, extent: u32, parts: u32| (i as u64 * extent as u64 / parts as u64) as u32;

    let mut blocks = Vec::with_capacity((rows * cols) as usize);
    for i in 0..rows {
        let y0 = bound(i, height, rows);
        let y1 = bound(i + 1, height, rows);
        for j in 0..cols {
            let x0 = bound(j, width, cols);
            let x1 = bound(j + 1, width, cols);
            blocks.push(BlockRect {
                x: x0,
                y: y0,
                width: x1 - x0,
                height: y1 - y0,
            });
        }
    }

    Ok(blocks)
}
