// ============================================================
// Layer 4 - Pixel Normaliser
// ============================================================
// Maps raw MNIST pixels (0.0 ..= 255.0) onto a zero-centred
// scale before they reach the network:
//
//   x = ((pixel / 255) - mean) / std
//
// The mean / std pair is the MNIST training-set statistic
// (0.1307, 0.3081). Output is row-major, one value per pixel,
// ready to be reshaped into [1, 28, 28].

/// Side length of an MNIST image.
pub const IMAGE_SIDE: usize = 28;

/// Number of pixels in one MNIST image.
pub const IMAGE_PIXELS: usize = IMAGE_SIDE * IMAGE_SIDE;

pub const MNIST_MEAN: f32 = 0.1307;
pub const MNIST_STD:  f32 = 0.3081;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    mean: f32,
    std:  f32,
}

impl Normalizer {
    pub fn new(mean: f32, std: f32) -> Self {
        Self { mean, std }
    }

    /// The standard MNIST statistics.
    pub fn mnist() -> Self {
        Self::new(MNIST_MEAN, MNIST_STD)
    }

    pub fn pixel(&self, raw: f32) -> f32 {
        ((raw / 255.0) - self.mean) / self.std
    }

    /// Normalise a whole image, appending the values to `out`.
    pub fn extend_image(&self, image: &[[f32; IMAGE_SIDE]; IMAGE_SIDE], out: &mut Vec<f32>) {
        out.extend(image.iter().flat_map(|row| row.iter().map(|&p| self.pixel(p))));
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::mnist()
    }
}
