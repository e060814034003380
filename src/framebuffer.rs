//! CPU-side render target.
//!
//! The draw-command pipeline rasterizes into this RGBA8 buffer; the platform
//! layer uploads it to the display on present.

/// An RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }
}

/// Off-screen pixel buffer, row-major with row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Framebuffer {
    /// Create a black framebuffer. Zero dimensions are bumped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut frame = Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        };
        frame.fill(Rgba::BLACK);
        frame
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes, `width * height * 4` long.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[i..i + 4]);
        Some(Rgba(px))
    }

    pub fn fill(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color.0);
        }
    }

    /// Draw a line segment of the given thickness between two points in
    /// pixel space. Pixels whose centre lies within `thickness / 2` of the
    /// segment are painted; anything outside the buffer is clipped.
    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Rgba) {
        let radius = (thickness * 0.5).max(0.5);
        let min_x = (from.0.min(to.0) - radius).floor().max(0.0);
        let max_x = (from.0.max(to.0) + radius).ceil().min(self.width as f32 - 1.0);
        let min_y = (from.1.min(to.1) - radius).floor().max(0.0);
        let max_y = (from.1.max(to.1) + radius).ceil().min(self.height as f32 - 1.0);
        if !(min_x <= max_x && min_y <= max_y) {
            return;
        }

        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length_sq = dx * dx + dy * dy;
        let radius_sq = radius * radius;

        for y in min_y as u32..=max_y as u32 {
            for x in min_x as u32..=max_x as u32 {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                // Project onto the segment, clamped to its endpoints.
                let t = if length_sq > 0.0 {
                    (((px - from.0) * dx + (py - from.1) * dy) / length_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (cx, cy) = (from.0 + t * dx, from.1 + t * dy);
                let dist_sq = (px - cx) * (px - cx) + (py - cy) * (py - cy);
                if dist_sq <= radius_sq {
                    let i = self.offset(x, y);
                    self.pixels[i..i + 4].copy_from_slice(&color.0);
                }
            }
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::rgb(255, 0, 0);

    #[test]
    fn test_new_is_black() {
        let frame = Framebuffer::new(4, 3);
        assert_eq!(frame.pixels().len(), 4 * 3 * 4);
        assert_eq!(frame.pixel(3, 2), Some(Rgba::BLACK));
        assert_eq!(frame.pixel(4, 0), None);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let frame = Framebuffer::new(0, 0);
        assert_eq!((frame.width(), frame.height()), (1, 1));
    }

    #[test]
    fn test_horizontal_line() {
        let mut frame = Framebuffer::new(10, 10);
        frame.draw_line((1.0, 5.0), (9.0, 5.0), 3.0, RED);
        assert_eq!(frame.pixel(5, 5), Some(RED));
        assert_eq!(frame.pixel(5, 4), Some(RED));
        assert_eq!(frame.pixel(5, 1), Some(Rgba::BLACK));
    }

    #[test]
    fn test_line_outside_is_clipped() {
        let mut frame = Framebuffer::new(10, 10);
        frame.draw_line((-50.0, -50.0), (-20.0, -20.0), 3.0, RED);
        assert!(frame.pixels().chunks_exact(4).all(|px| px == Rgba::BLACK.0));
    }

    #[test]
    fn test_degenerate_line_paints_a_dot() {
        let mut frame = Framebuffer::new(10, 10);
        frame.draw_line((5.0, 5.0), (5.0, 5.0), 3.0, RED);
        assert_eq!(frame.pixel(5, 5), Some(RED));
    }
}
