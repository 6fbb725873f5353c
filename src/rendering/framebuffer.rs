/// Framebuffer for software rendering
/// Stores color and depth information
///
/// Both buffers are row-major, `width * height` long and always resized
/// together, so a pixel index is valid for either.
use super::color::ColorRgb;
use super::depth::{depth_test_and_write, DEPTH_CLEAR};
use crate::count_call;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;

/// View into a contiguous set of rows in the framebuffer.
/// Used for multi-core rasterization where each worker owns a disjoint slice.
pub struct FrameSlice<'a> {
    pub width: usize,
    pub full_height: usize,
    pub y0: usize,
    pub height: usize,
    pub color: &'a mut [u32],
    pub depth: &'a mut [f32],
}

impl<'a> FrameSlice<'a> {
    /// Perform a depth test at (x, y_global) and, if it passes, update depth and
    /// return the linear index into the local color buffer. Returns None if the
    /// pixel lies outside this slice or fails the depth test.
    #[inline]
    pub fn test_depth_and_get_index(
        &mut self,
        x: usize,
        y_global: usize,
        depth: f32,
    ) -> Option<usize> {
        let index = self.local_index(x, y_global)?;
        if depth_test_and_write(&mut self.depth[index], depth) {
            count_call!(FUNCTION_COUNTERS.depth_test_passed);
            Some(index)
        } else {
            count_call!(FUNCTION_COUNTERS.depth_test_failed);
            None
        }
    }

    /// Local buffer index for a global pixel, or None outside this slice.
    #[inline]
    pub fn local_index(&self, x: usize, y_global: usize) -> Option<usize> {
        if x >= self.width || y_global < self.y0 {
            return None;
        }
        let y_local = y_global - self.y0;
        if y_local >= self.height {
            return None;
        }
        Some(y_local * self.width + x)
    }

    #[inline]
    pub fn write_color(&mut self, index: usize, color: u32) {
        self.color[index] = color;
    }

    /// Rows covered by this slice, in global framebuffer coordinates.
    #[inline]
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.y0..self.y0 + self.height
    }
}

pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    pub color_buffer: Vec<u32>, // ARGB format
    pub depth_buffer: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let pixel_count = width * height;
        Self {
            width,
            height,
            color_buffer: vec![0; pixel_count],
            depth_buffer: vec![DEPTH_CLEAR; pixel_count],
        }
    }

    /// Clear color and depth buffers
    pub fn clear(&mut self, clear_color: u32) {
        count_call!(FUNCTION_COUNTERS.framebuffer_clear_calls);
        self.color_buffer.fill(clear_color);
        self.depth_buffer.fill(DEPTH_CLEAR);
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Set pixel with depth test
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32, depth: f32) -> bool {
        let Some(index) = self.index(x, y) else {
            return false;
        };
        if depth_test_and_write(&mut self.depth_buffer[index], depth) {
            self.color_buffer[index] = color;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        self.index(x, y).map(|i| self.color_buffer[i])
    }

    #[inline]
    pub fn pixel_rgb(&self, x: usize, y: usize) -> Option<ColorRgb> {
        self.pixel(x, y).map(super::color::unpack_color)
    }

    #[inline]
    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        self.index(x, y).map(|i| self.depth_buffer[i])
    }

    /// Get color buffer as slice
    pub fn color_buffer_slice(&self) -> &[u32] {
        &self.color_buffer
    }

    /// Create a FrameSlice covering the entire framebuffer
    pub fn as_full_slice_mut(&mut self) -> FrameSlice<'_> {
        FrameSlice {
            width: self.width,
            full_height: self.height,
            y0: 0,
            height: self.height,
            color: &mut self.color_buffer,
            depth: &mut self.depth_buffer,
        }
    }

    /// Resize framebuffer. Contents are undefined until the next clear.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let pixel_count = width * height;
        self.color_buffer.resize(pixel_count, 0);
        self.depth_buffer.resize(pixel_count, DEPTH_CLEAR);
    }

    /// Split the framebuffer into horizontal stripes for multi-core rendering.
    /// Each stripe owns a disjoint subset of rows, so they can be rendered in parallel.
    pub fn split_into_stripes(&mut self, stripes: usize) -> Vec<FrameSlice<'_>> {
        let stripes = stripes.max(1);
        let width = self.width;
        let height = self.height;

        let mut slices = Vec::with_capacity(stripes);

        let mut remaining_color: &mut [u32] = self.color_buffer.as_mut_slice();
        let mut remaining_depth: &mut [f32] = self.depth_buffer.as_mut_slice();

        let mut y0 = 0usize;
        let rows_per_stripe = height.div_ceil(stripes);

        while y0 < height {
            let rows = (height - y0).min(rows_per_stripe);
            let pixels = rows * width;

            let (color_head, color_tail) = remaining_color.split_at_mut(pixels);
            let (depth_head, depth_tail) = remaining_depth.split_at_mut(pixels);

            slices.push(FrameSlice {
                width,
                full_height: height,
                y0,
                height: rows,
                color: color_head,
                depth: depth_head,
            });

            remaining_color = color_tail;
            remaining_depth = depth_tail;
            y0 += rows;
        }

        slices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_depth_to_max() {
        let mut fb = Framebuffer::new(4, 3);
        assert!(fb.set_pixel(1, 1, 0xFFFFFFFF, 0.5));
        fb.clear(0xFF000000);
        assert!(fb.color_buffer.iter().all(|&c| c == 0xFF000000));
        assert!(fb.depth_buffer.iter().all(|&d| d == DEPTH_CLEAR));
    }

    #[test]
    fn stripes_cover_every_row_once() {
        let mut fb = Framebuffer::new(5, 11);
        let slices = fb.split_into_stripes(4);
        let mut next_row = 0;
        for slice in &slices {
            assert_eq!(slice.y0, next_row);
            assert_eq!(slice.color.len(), slice.height * 5);
            next_row += slice.height;
        }
        assert_eq!(next_row, 11);
    }

    #[test]
    fn slice_rejects_pixels_outside_its_rows() {
        let mut fb = Framebuffer::new(4, 8);
        let mut slices = fb.split_into_stripes(2);
        let lower = &mut slices[1];
        assert_eq!(lower.rows(), 4..8);
        assert!(lower.test_depth_and_get_index(0, 2, 0.5).is_none());
        assert_eq!(lower.test_depth_and_get_index(1, 5, 0.5), Some(5));
    }

    #[test]
    fn resize_keeps_buffers_in_lockstep() {
        let mut fb = Framebuffer::new(2, 2);
        fb.resize(7, 3);
        assert_eq!(fb.color_buffer.len(), 21);
        assert_eq!(fb.depth_buffer.len(), 21);
    }
}
