use image::Rgba;
use palette::{LinSrgb, Mix, Srgb};

const LUT_SIZE: usize = 256;

/// Piecewise-linear colormap, interpolated in linear sRGB and baked into a
/// 256-entry lookup table.
pub struct Colormap {
    lut: Vec<[u8; 3]>,
}

impl Colormap {
    /// Builds a colormap from `(position, [r, g, b])` stops with positions
    /// ascending from 0.0 to 1.0.
    pub fn from_stops(stops: &[(f32, [u8; 3])]) -> Self {
        let linear: Vec<(f32, LinSrgb<f32>)> = stops
            .iter()
            .map(|&(pos, [r, g, b])| (pos, Srgb::new(r, g, b).into_format::<f32>().into_linear()))
            .collect();

        let lut = (0..LUT_SIZE)
            .map(|k| {
                let t = k as f32 / (LUT_SIZE - 1) as f32;
                let upper = linear.iter().position(|&(pos, _)| pos >= t).unwrap_or(linear.len() - 1);
                let color = if upper == 0 {
                    linear[0].1
                } else {
                    let (p0, c0) = linear[upper - 1];
                    let (p1, c1) = linear[upper];
                    let span = (p1 - p0).max(f32::EPSILON);
                    c0.mix(c1, ((t - p0) / span).clamp(0.0, 1.0))
                };
                let srgb = Srgb::<f32>::from_linear(color).into_format::<u8>();
                [srgb.red, srgb.green, srgb.blue]
            })
            .collect();

        Colormap { lut }
    }

    /// Black → red → yellow → white.
    pub fn hot() -> Self {
        Self::from_stops(&[
            (0.0, [10, 0, 0]),
            (0.365, [255, 0, 0]),
            (0.746, [255, 255, 0]),
            (1.0, [255, 255, 255]),
        ])
    }

    /// Perceptually ordered dark purple → orange → pale yellow.
    pub fn inferno() -> Self {
        Self::from_stops(&[
            (0.0, [0, 0, 4]),
            (0.25, [87, 16, 110]),
            (0.5, [188, 55, 84]),
            (0.75, [249, 142, 9]),
            (1.0, [252, 255, 164]),
        ])
    }

    /// Color for a normalized value. Values outside `[0, 1]` are clamped;
    /// NaN maps to the low end.
    pub fn sample(&self, t: f64) -> Rgba<u8> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let [r, g, b] = self.lut[(t * (LUT_SIZE - 1) as f64).round() as usize];
        Rgba([r, g, b, 255])
    }
}
