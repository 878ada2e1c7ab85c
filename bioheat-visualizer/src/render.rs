use crate::colormap::Colormap;
use anyhow::Result;
use bioheat_common::{ScalarField, SimulationResult};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, ImageBuffer, Rgba, RgbaImage};
use std::io::Write;

/// Gap between the temperature and damage panels, pixels.
const PANEL_GAP_PX: u32 = 8;
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Value range mapped onto a colormap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            (value - self.min) / span
        } else {
            0.0
        }
    }
}

/// Temperature range spanning every snapshot and the final state, ignoring
/// non-finite cells.
pub fn temperature_range(result: &SimulationResult) -> ValueRange {
    let mut range = ValueRange { min: f64::INFINITY, max: f64::NEG_INFINITY };
    let fields = result.temperature_snapshots().chain(std::iter::once(&result.final_temperature));
    for field in fields {
        let stats = field.stats();
        range.min = range.min.min(stats.min);
        range.max = range.max.max(stats.max);
    }
    if !range.min.is_finite() || !range.max.is_finite() {
        range = ValueRange { min: 0.0, max: 1.0 };
    }
    range
}

/// Renders sets of panels for one time point.
pub struct FrameRenderer {
    pub scale: u32,
    pub temperature_range: ValueRange,
    temperature_map: Colormap,
    damage_map: Colormap,
}

impl FrameRenderer {
    pub fn new(scale: u32, temperature_range: ValueRange) -> Self {
        FrameRenderer {
            scale: scale.max(1),
            temperature_range,
            temperature_map: Colormap::hot(),
            damage_map: Colormap::inferno(),
        }
    }

    /// Paints `field` into `image` at horizontal offset `x0`. Row 0 of the
    /// field is drawn at the bottom.
    fn draw_panel(&self, image: &mut RgbaImage, x0: u32, field: &ScalarField, colormap: &Colormap, range: ValueRange) {
        let n = field.size() as u32;
        for i in 0..n {
            let y0 = (n - 1 - i) * self.scale;
            for j in 0..n {
                let color = colormap.sample(range.normalize(field.get(i as usize, j as usize)));
                for dy in 0..self.scale {
                    for dx in 0..self.scale {
                        image.put_pixel(x0 + j * self.scale + dx, y0 + dy, color);
                    }
                }
            }
        }
    }

    /// Temperature panel on the left, damage fraction (fixed to [0, 1]) on the right.
    pub fn render(&self, temperature: &ScalarField, damage_fraction: &ScalarField) -> RgbaImage {
        let panel = temperature.size() as u32 * self.scale;
        let mut image = ImageBuffer::from_pixel(panel * 2 + PANEL_GAP_PX, panel, BACKGROUND);
        self.draw_panel(&mut image, 0, temperature, &self.temperature_map, self.temperature_range);
        self.draw_panel(
            &mut image,
            panel + PANEL_GAP_PX,
            damage_fraction,
            &self.damage_map,
            ValueRange { min: 0.0, max: 1.0 },
        );
        image
    }
}

/// Encodes `frames` as an endlessly looping animated GIF.
pub fn encode_gif<W: Write>(writer: W, frames: Vec<RgbaImage>, delay_ms: u32) -> Result<()> {
    let mut encoder = GifEncoder::new(writer);
    encoder.set_repeat(Repeat::Infinite)?;
    for image in frames {
        encoder.encode_frame(Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1)))?;
    }
    Ok(())
}
