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

    picovga_headless::scene.rs

    Demo scenes drawn into the framebuffer before scanout.

*/

use std::f64::consts::PI;

use picovga_config::DemoScene;
use picovga_core::{color::*, font::Font, framebuffer::Framebuffer, text::TextRenderer};

pub fn draw_scene(fb: &mut Framebuffer, scene: DemoScene, background: Color, font: &Font) {
    log::debug!("draw_scene(): {:?} on {}", scene, background);
    match scene {
        DemoScene::Shapes => shapes(fb, background, font),
        DemoScene::Checker => checker(fb),
        DemoScene::Plot => plot(fb, &PlotParams::default(), background, font),
        DemoScene::Text => text_sample(fb, background, font),
    }
}

/// Rectangles, circles and concentric disks over the background.
fn shapes(fb: &mut Framebuffer, background: Color, font: &Font) {
    fb.fill_all(background);
    fb.fill_rect(20, 20, 150, 150, BLACK);
    fb.fill_rect(20, 200, 150, 400, BLUE);
    fb.fill_rect(200, 205, 205, 150, WHITE);
    fb.fill_rect(300, 415, 350, 300, YELLOW);
    fb.fill_rect(550, 450, 640, 150, CYAN);
    fb.draw_circle(100, 400, 75, YELLOW);
    fb.draw_circle(150, 150, 98, CYAN);
    fb.fill_disk(320, 240, 150, BLACK);
    fb.fill_disk(320, 240, 120, RED);
    fb.fill_disk(320, 240, 80, GREEN);
    fb.fill_disk(320, 240, 50, WHITE);
    fb.draw_rect(500, 50, 620, 70, BLACK);
    fb.draw_rect(100, 390, 600, 480, RED);
    fb.fill_rect(400, 120, 640, 360, WHITE);

    let mut text = TextRenderer::new(font);
    text.set_cursor(402, 140);
    text.set_color(GREEN);
    text.print_text(fb, "Testing font n1");
}

/// Eight bands of eight cells, each band rotating the palette by one.
fn checker(fb: &mut Framebuffer) {
    let cell_w = (fb.width() / 8) as i32;
    let cell_h = (fb.height() / 8) as i32;
    for band in 0..8 {
        for row in 0..cell_h {
            for k in 0..8 {
                let color = Color::from_bits((band + k) as u32);
                fb.fast_hline(k * cell_w, (k + 1) * cell_w, band * cell_h + row, color);
            }
        }
    }
}

pub struct PlotParams {
    /// The x axis spans -range..range.
    pub range: f64,
    /// Samples per pixel of the cartesian curves.
    pub resolution: f64,
    pub rose_petals: f64,
    pub rose_offset: f64,
    /// Sample density multiplier of the polar curve.
    pub polar_resolution: f64,
    pub axes: Color,
    pub curves: [Color; 4],
    pub rose: Color,
}

impl Default for PlotParams {
    fn default() -> Self {
        Self {
            range: 9.6,
            resolution: 10.0,
            rose_petals: 5.0,
            rose_offset: 2.0,
            polar_resolution: 2.0,
            axes: WHITE,
            curves: [CYAN, RED, GREEN, YELLOW],
            rose: MAGENTA,
        }
    }
}

// Curve values near a pole run far off screen. Keep them well inside i32.
const PLOT_LIMIT: f64 = 100_000.0;

fn to_screen(v: f64) -> i32 {
    v.clamp(-PLOT_LIMIT, PLOT_LIMIT) as i32
}

/// Axes with tick labels, four cartesian curves and a polar rose.
fn plot(fb: &mut Framebuffer, p: &PlotParams, background: Color, font: &Font) {
    let cx = (fb.width() / 2) as i32;
    let cy = (fb.height() / 2) as i32;
    let scale = cx as f64 / p.range;
    let step = 1.0 / scale / p.resolution;

    fb.fill_all(background);
    let mut text = TextRenderer::new(font);
    let legend = [
        (p.curves[0], "y = x.cos(x)".to_string()),
        (p.curves[1], "y = x.sin(x)".to_string()),
        (p.rose, format!("r = sin({}.theta) + {}", p.rose_petals, p.rose_offset)),
        (p.curves[2], "y = 1/x^3-1/x^2-1/x+1".to_string()),
        (p.curves[3], "y = 2x.ln(3/x)".to_string()),
    ];
    for (i, (color, label)) in legend.iter().enumerate() {
        text.set_cursor(10, 20 + 20 * i as i32);
        text.set_color(*color);
        text.print_text(fb, label);
    }

    fb.fast_hline(0, fb.width() as i32, cy, p.axes);
    fb.fast_vline(cx, 0, fb.height() as i32, p.axes);
    text.set_color(p.axes);
    for i in (20..fb.width() as i32).step_by(40) {
        fb.fast_vline(i, cy, cy + 5, p.axes);
        text.set_cursor(i - 10, cy + 15);
        text.print_text(fb, &format!("{:.1}", (i - cx) as f64 / scale));
    }
    for i in (20..fb.height() as i32).step_by(40) {
        fb.fast_hline(cx - 5, cx, i, p.axes);
        text.set_cursor(cx - 30, i + 5);
        text.print_text(fb, &format!("{:.1}", (cy - i) as f64 / scale));
    }

    let curve = |fb: &mut Framebuffer, from: f64, f: &dyn Fn(f64) -> f64, color: Color| {
        let point = |x: f64| (to_screen(scale * x), to_screen(scale * f(x)));
        let mut x = from;
        let (mut x0, mut y0) = point(x);
        while x < p.range {
            x += step;
            let (x1, y1) = point(x);
            segment(fb, (cx + x0, cy - y0), (cx + x1, cy - y1), color);
            (x0, y0) = (x1, y1);
        }
    };
    curve(fb, -p.range, &|x| x * x.cos(), p.curves[0]);
    curve(fb, -p.range, &|x| x * x.sin(), p.curves[1]);
    curve(fb, -p.range, &|x| 1.0 / (x * x * x) - 1.0 / (x * x) - 1.0 / x + 1.0, p.curves[2]);
    curve(fb, 0.0001, &|x| 2.0 * x * (3.0 / x).ln(), p.curves[3]);

    let polar = |theta: f64| {
        let r = (p.rose_petals * theta).sin() + p.rose_offset;
        (to_screen(scale * r * theta.cos()), to_screen(scale * r * theta.sin()))
    };
    let mut theta = 0.0;
    let (mut x0, mut y0) = polar(theta);
    while theta <= 2.0 * PI {
        theta += 0.005 / p.polar_resolution;
        let (x1, y1) = polar(theta);
        segment(fb, (cx + x0, cy - y0), (cx + x1, cy - y1), p.rose);
        (x0, y0) = (x1, y1);
    }
}

/// draw_line() clamps its endpoints onto the raster, which would trace
/// off-screen parts of a curve along the border. Drop those segments.
fn segment(fb: &mut Framebuffer, from: (i32, i32), to: (i32, i32), color: Color) {
    if fb.mode().contains(from.0, from.1) && fb.mode().contains(to.0, to.1) {
        fb.draw_line(from.0, from.1, to.0, to.1, color);
    }
}

fn text_sample(fb: &mut Framebuffer, background: Color, font: &Font) {
    fb.fill_all(background);
    let mut text = TextRenderer::new(font);
    text.set_cursor(8, 16);
    for color in [RED, GREEN, YELLOW, BLUE, MAGENTA, CYAN, WHITE] {
        text.set_color(color);
        text.print_text(fb, &format!("{} The quick brown fox jumps over the lazy dog\n", color));
    }
    text.set_color(WHITE);
    text.print_text(fb, "\n !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~\n");
    text.print_text(
        fb,
        "\nLong lines wrap at the right edge of the screen and continue on the next line \
         at the left edge, one glyph at a time.",
    );
}
