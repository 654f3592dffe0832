use rayon::prelude::*;

use crate::errors::CodecError;

/// Define a single frame that the video will play
/// E.g. on a 30fps video, there will be 30 VideoFrame every second
///
/// The pixel buffer is owned RGB24, row-major, the exact layout an external
/// muxer consumes one frame at a time. Blocks are painted in grey so every
/// channel carries the same value and compression chroma loss costs nothing.
#[derive(Clone)]
pub struct VideoFrame {
    pub width: u16,
    pub height: u16,
    data: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u16, height: u16) -> VideoFrame {
        let data = vec![0u8; width as usize * height as usize * 3];
        VideoFrame {
            width,
            height,
            data,
        }
    }

    /// Wrap a captured RGB24 buffer, e.g. one handed back by a demuxer.
    pub fn from_rgb24(width: u16, height: u16, data: Vec<u8>) -> Result<VideoFrame, CodecError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(CodecError::Format(format!(
                "frame buffer holds {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(VideoFrame {
            width,
            height,
            data,
        })
    }

    pub fn as_rgb24(&self) -> &[u8] {
        &self.data
    }

    pub fn into_rgb24(self) -> Vec<u8> {
        self.data
    }

    /// Paint one block: a `size`x`size` pixel square at pixel position
    /// (x, y), all channels set to `value`.
    pub fn paint_block(&mut self, x: u16, y: u16, size: u16, value: u8) {
        let width = self.width as usize;
        for dy in 0..size as usize {
            let row = (y as usize + dy) * width;
            let start = (row + x as usize) * 3;
            let end = start + size as usize * 3;
            for px in self.data[start..end].iter_mut() {
                *px = value;
            }
        }
    }

    /// Paint the whole grid from per-cell grey levels, one pixel row at a
    /// time in parallel. `cells` is row-major, `cols` cells per row.
    pub fn fill_from_cells(&mut self, cells: &[u8], block_size: u16) {
        let width = self.width as usize;
        let size = block_size as usize;
        let cols = width / size;
        self.data
            .par_chunks_mut(width * 3)
            .enumerate()
            .for_each(|(y, row)| {
                let cy = y / size;
                for cx in 0..cols {
                    let value = cells[cy * cols + cx];
                    let start = cx * size * 3;
                    for px in row[start..start + size * 3].iter_mut() {
                        *px = value;
                    }
                }
            });
    }

    /// Average the luminance of a whole block region. Averaging over every
    /// pixel of the block absorbs the ringing a lossy codec smears around
    /// block edges.
    pub fn sample_block(&self, x: u16, y: u16, size: u16) -> u8 {
        let width = self.width as usize;
        let mut sum: u64 = 0;
        for dy in 0..size as usize {
            let row = (y as usize + dy) * width;
            let start = (row + x as usize) * 3;
            let end = start + size as usize * 3;
            for px in &self.data[start..end] {
                sum += *px as u64;
            }
        }
        (sum / (size as u64 * size as u64 * 3)) as u8
    }

    /// Sample every cell of the grid, row-major, rows in parallel.
    pub fn sample_cells(&self, block_size: u16) -> Vec<u8> {
        let cols = self.width as usize / block_size as usize;
        let rows = self.height as usize / block_size as usize;
        (0..rows)
            .into_par_iter()
            .flat_map_iter(|cy| {
                let this = self;
                (0..cols).map(move |cx| {
                    this.sample_block(
                        (cx * block_size as usize) as u16,
                        (cy * block_size as usize) as u16,
                        block_size,
                    )
                })
            })
            .collect()
    }

    pub fn read_coordinate_color(&self, x: u16, y: u16) -> (u8, u8, u8) {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }
}
