use crate::core::ndv::NdvDef;
use crate::error::{Error, Result};
use crate::io::RasterSource;

/// A rectangular window of a band, addressed by its top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub x_off: usize,
    pub y_off: usize,
    pub width: usize,
    pub height: usize,
}

impl BlockWindow {
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row-major iterator over the blocks covering a `width x height` raster.
/// Blocks on the right and bottom edges are clipped to the raster extent.
#[derive(Debug, Clone)]
pub struct BlockWindows {
    width: usize,
    height: usize,
    block_x: usize,
    block_y: usize,
    next_x: usize,
    next_y: usize,
}

impl BlockWindows {
    pub fn new(size: (usize, usize), block_size: (usize, usize)) -> Self {
        Self {
            width: size.0,
            height: size.1,
            block_x: block_size.0.max(1),
            block_y: block_size.1.max(1),
            next_x: 0,
            next_y: 0,
        }
    }

    /// Number of samples in the largest block, i.e. the buffer length a pass needs.
    pub fn max_block_len(&self) -> usize {
        self.block_x.min(self.width) * self.block_y.min(self.height)
    }
}

impl Iterator for BlockWindows {
    type Item = BlockWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.width == 0 || self.next_y >= self.height {
            return None;
        }
        let window = BlockWindow {
            x_off: self.next_x,
            y_off: self.next_y,
            width: self.block_x.min(self.width - self.next_x),
            height: self.block_y.min(self.height - self.next_y),
        };
        self.next_x += self.block_x;
        if self.next_x >= self.width {
            self.next_x = 0;
            self.next_y += self.block_y;
        }
        Some(window)
    }
}

/// Per-band input buffers and the no-data mask of one pass, sized for the
/// largest block and reused for every block of the pass.
#[derive(Debug, Clone)]
pub struct BlockBuffers {
    pub bands: Vec<Vec<f64>>,
    pub mask: Vec<bool>,
}

impl BlockBuffers {
    pub fn new(band_count: usize, block_len: usize) -> Self {
        Self {
            bands: vec![vec![0.0; block_len]; band_count],
            mask: vec![false; block_len],
        }
    }

    /// Buffers sized for every block `windows` will yield.
    pub fn for_windows(band_count: usize, windows: &BlockWindows) -> Self {
        Self::new(band_count, windows.max_block_len())
    }

    /// Read every band of `window` from `source` and classify its pixels.
    pub fn load<S: RasterSource + ?Sized>(
        &mut self,
        source: &S,
        window: &BlockWindow,
        ndv: &NdvDef,
    ) -> Result<()> {
        let len = window.len();
        if len > self.mask.len() {
            return Err(Error::BufferSize {
                got: self.mask.len(),
                needed: len,
            });
        }
        for (band, buf) in self.bands.iter_mut().enumerate() {
            source.read_block(band, window, &mut buf[..len])?;
        }
        ndv.fill_mask(&self.bands, len, &mut self.mask);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_raster_with_clipped_edges() {
        let windows: Vec<_> = BlockWindows::new((5, 3), (2, 2)).collect();
        assert_eq!(windows.len(), 6);
        assert_eq!(
            windows[2],
            BlockWindow {
                x_off: 4,
                y_off: 0,
                width: 1,
                height: 2
            }
        );
        assert_eq!(
            windows[5],
            BlockWindow {
                x_off: 4,
                y_off: 2,
                width: 1,
                height: 1
            }
        );
        let total: usize = windows.iter().map(BlockWindow::len).sum();
        assert_eq!(total, 15);
    }

    #[test]
    fn strip_blocks_wider_than_raster() {
        let it = BlockWindows::new((4, 4), (256, 1));
        assert_eq!(it.max_block_len(), 4);
        let windows: Vec<_> = it.collect();
        assert_eq!(windows.len(), 4);
        assert!(windows.iter().all(|w| w.width == 4 && w.height == 1));
    }

    #[test]
    fn empty_raster_yields_nothing() {
        assert_eq!(BlockWindows::new((0, 10), (4, 4)).count(), 0);
        assert_eq!(BlockWindows::new((10, 0), (4, 4)).count(), 0);
    }
}
