//! Quantized parameter axes of the Hough space.

/// `n` evenly spaced values from `a` to `b`, both inclusive.
///
/// The last element is exactly `b`. `n == 1` yields `[a]` and `n == 0` an
/// empty vector; neither divides by `n - 1`.
pub fn linear_spaced_array(a: f32, b: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / (n - 1) as f32;
            let mut out: Vec<f32> = (0..n).map(|i| a + step * i as f32).collect();
            out[n - 1] = b;
            out
        }
    }
}

/// Quantized ρ axis spanning `[-rho_max, rho_max]`.
#[derive(Clone, Debug, PartialEq)]
pub struct RhoAxis {
    pub rho_max: f32,
    pub bins: usize,
    step: f32,
}

impl RhoAxis {
    /// Axis for a `w × h` image with the origin at the image center.
    ///
    /// `rho_max` is half the image diagonal, which bounds `|x cos θ + y sin θ|`
    /// for every pixel. Callers guarantee `bins >= 2` and a non-empty image.
    pub fn for_image(w: usize, h: usize, bins: usize) -> Self {
        let rho_max = (w as f32).hypot(h as f32) * 0.5;
        Self {
            rho_max,
            bins,
            step: 2.0 * rho_max / (bins - 1) as f32,
        }
    }

    /// Bin width in pixels.
    #[inline]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Nearest bin for `rho`, clamped into `0..bins`.
    #[inline]
    pub fn index_of(&self, rho: f32) -> usize {
        let idx = ((rho + self.rho_max) / self.step).round();
        if idx.is_nan() || idx <= 0.0 {
            0
        } else {
            (idx as usize).min(self.bins - 1)
        }
    }

    /// Center value of bin `idx` (clamped to the last bin).
    #[inline]
    pub fn value_at(&self, idx: usize) -> f32 {
        let idx = idx.min(self.bins - 1);
        if idx == self.bins - 1 {
            return self.rho_max;
        }
        -self.rho_max + self.step * idx as f32
    }
}
