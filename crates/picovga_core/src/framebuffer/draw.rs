/*
    PicoVGA

    Copyright 2024-2025 The PicoVGA Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    framebuffer::draw.rs

    Drawing primitives on the packed framebuffer.

    Spans are half open: fast_hline(x1, x2, ..) covers x1..x2 and
    fast_vline(x, y1, y2, ..) covers y1..y2. Coordinates are clamped into
    the visible raster first and each pair is put in ascending order.

*/

use super::*;

impl Framebuffer<'_> {
    #[inline]
    fn clamp_x(&self, x: i32) -> u32 {
        x.clamp(0, self.mode.h_res() as i32 - 1) as u32
    }

    #[inline]
    fn clamp_y(&self, y: i32) -> u32 {
        y.clamp(0, self.mode.v_res() as i32 - 1) as u32
    }

    /// Plot a pixel if it lies inside the raster.
    #[inline]
    fn plot_clipped(&mut self, x: i32, y: i32, color: Color) {
        if self.mode.contains(x, y) {
            self.set_pixel(x as u32, y as u32, color);
        }
    }

    /// Horizontal span from `x1` up to, not including, `x2`.
    ///
    /// Partial words at either end are masked in, every whole word between
    /// them is overwritten with the tiling word.
    pub fn fast_hline(&mut self, x1: i32, x2: i32, y: i32, color: Color) {
        let (mut x1, mut x2) = (self.clamp_x(x1), self.clamp_x(x2));
        let y = self.clamp_y(y);
        if x2 < x1 {
            std::mem::swap(&mut x1, &mut x2);
        }
        self.hspan(x1, x2, y, color);
    }

    /// Fill `x1..x2` of row `y`. Expects `x1 <= x2 <= H` and `y < V`.
    ///
    /// An end of `H` addresses the first group of the next row with a zero
    /// bit offset, so that word is left alone.
    fn hspan(&mut self, x1: u32, x2: u32, y: u32, color: Color) {
        let (k1, p1) = self.mode.pixel_address(x1, y);
        let (k2, p2) = self.mode.pixel_address(x2, y);

        if k1 == k2 {
            // Shorter than one packing group.
            for x in x1..x2 {
                self.set_pixel(x, y, color);
            }
            return;
        }

        let bits = color.bits();
        let head = p1 / BITS_PER_PIXEL;
        let tail = p2 / BITS_PER_PIXEL;
        let head_keep = !tiling_mask(PIXEL_MASK, head, PIXELS_PER_WORD);
        let tail_keep = !tiling_mask(PIXEL_MASK, 0, tail);

        self.words[k1] = (self.words[k1] & head_keep) | tiling_mask(bits, head, PIXELS_PER_WORD);
        self.words[k2] = (self.words[k2] & tail_keep) | tiling_mask(bits, 0, tail);

        // k1 is the last word when the span starts in the first group of the frame.
        let fill = tiling_word(color);
        let start = if k1 + 1 >= self.words.len() { 0 } else { k1 + 1 };
        if start < k2 {
            self.words[start..k2].fill(fill);
        }
    }

    /// Vertical span from `y1` up to, not including, `y2`.
    ///
    /// The word and bit offset are computed once for the top pixel, each
    /// following row is one row stride further on.
    pub fn fast_vline(&mut self, x: i32, y1: i32, y2: i32, color: Color) {
        let x = self.clamp_x(x);
        let (mut y1, mut y2) = (self.clamp_y(y1), self.clamp_y(y2));
        if y2 < y1 {
            std::mem::swap(&mut y1, &mut y2);
        }

        let (k1, p1) = self.mode.pixel_address(x, y1);
        let stride = self.words.len() / self.mode.v_res() as usize;
        let len = self.words.len();
        let keep = !(PIXEL_MASK << p1);
        let set = color.bits() << p1;

        for i in 0..(y2 - y1) as usize {
            // Only the first group of row 0 sits at the end of the buffer; the
            // modulo brings the following rows back to the start.
            let k = (k1 + i * stride) % len;
            self.words[k] = (self.words[k] & keep) | set;
        }
    }

    /// Line by slope evaluation, one pixel per column from `x1` to `x2`
    /// inclusive.
    ///
    /// A line with `x1 == x2` is treated as having zero slope and draws the
    /// single pixel at (x1, y1), not a vertical segment. Use fast_vline()
    /// for vertical lines.
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let (mut x1, mut y1) = (self.clamp_x(x1) as i32, self.clamp_y(y1) as i32);
        let (mut x2, mut y2) = (self.clamp_x(x2) as i32, self.clamp_y(y2) as i32);
        if x2 < x1 {
            std::mem::swap(&mut x1, &mut x2);
            std::mem::swap(&mut y1, &mut y2);
        }

        let a = if x1 == x2 {
            0.0
        }
        else {
            (y2 - y1) as f64 / (x2 - x1) as f64
        };
        let b = y1 as f64 - a * x1 as f64;

        for x in x1..=x2 {
            let y = (a * x as f64 + b).round() as i32;
            let y = self.clamp_y(y);
            self.set_pixel(x as u32, y, color);
        }
    }

    /// Filled rectangle covering `x1..x2` by `y1..y2`.
    pub fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let (y1, y2) = (self.clamp_y(y1), self.clamp_y(y2));
        for y in y1.min(y2)..y1.max(y2) {
            self.fast_hline(x1, x2, y as i32, color);
        }
    }

    /// Rectangle outline: spans along y1 and y2 and along x1 and x2.
    pub fn draw_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        self.fast_hline(x1, x2, y1, color);
        self.fast_hline(x1, x2, y2, color);
        self.fast_vline(x1, y1, y2, color);
        self.fast_vline(x2, y1, y2, color);
    }

    /// Circle outline by the integer midpoint algorithm, mirrored about both
    /// axes through the center. Nothing is drawn if the center is off screen.
    /// Points falling outside the raster are skipped.
    pub fn draw_circle(&mut self, cx: i32, cy: i32, r: i32, color: Color) {
        if !self.mode.contains(cx, cy) || r < 0 {
            return;
        }
        for (dx, dy) in midpoint_quadrant(r) {
            self.plot_clipped(cx - dx, cy + dy, color);
            self.plot_clipped(cx - dx, cy - dy, color);
            self.plot_clipped(cx + dx, cy + dy, color);
            self.plot_clipped(cx + dx, cy - dy, color);
        }
    }

    /// Filled disk. Walks the same boundary as draw_circle() and joins each
    /// mirrored pair of boundary points with a horizontal span, boundary
    /// pixels included.
    pub fn fill_disk(&mut self, cx: i32, cy: i32, r: i32, color: Color) {
        if !self.mode.contains(cx, cy) || r < 0 {
            return;
        }
        let h_res = self.mode.h_res() as i32;
        let v_res = self.mode.v_res() as i32;
        for (dx, dy) in midpoint_quadrant(r) {
            // dx runs from -r up to 0, so the span is cx + dx ..= cx - dx,
            // clipped rather than clamped so the last column can be reached.
            let left = (cx + dx).max(0);
            let right = (cx - dx + 1).min(h_res);
            for row in [cy + dy, cy - dy] {
                if (0..v_res).contains(&row) && left < right {
                    self.hspan(left as u32, right as u32, row as u32, color);
                }
            }
        }
    }
}

/// Boundary points of one quadrant of a circle of radius `r`, as offsets
/// `(dx, dy)` with `dx` climbing from `-r` to 0 and `dy` from 0 to `r`.
///
/// The error term is updated by `2 * coord + 1` on every step, so the walk
/// needs no multiplication by `r` and no floating point.
fn midpoint_quadrant(r: i32) -> impl Iterator<Item = (i32, i32)> {
    let mut x_pos = -r;
    let mut y_pos = 0;
    let mut err = 2 - 2 * r;
    let mut done = false;

    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let point = (x_pos, y_pos);

        let mut e2 = err;
        if e2 <= y_pos {
            y_pos += 1;
            err += y_pos * 2 + 1;
            if -x_pos == y_pos && e2 <= x_pos {
                e2 = 0;
            }
        }
        if e2 > x_pos {
            x_pos += 1;
            err += x_pos * 2 + 1;
        }
        if x_pos > 0 {
            done = true;
        }
        Some(point)
    })
}
