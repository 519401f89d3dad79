// ============================================================
// Layer 4 - Digit Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<MnistItem>
// into device tensors.
//
//   Input:  N items, each a 28x28 pixel grid + label
//   Output: DigitBatch
//             images  [N, 1, 28, 28]  (normalised floats)
//             targets [N]             (labels 0..=9)
//
// All pixels are normalised into one flat Vec and reshaped
// once, rather than building N small tensors and concatenating.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::{dataloader::batcher::Batcher, dataset::vision::MnistItem},
    prelude::*,
};

use crate::data::preprocessor::{Normalizer, IMAGE_PIXELS, IMAGE_SIDE};

// ─── DigitBatch ───────────────────────────────────────────────────────────────
/// A batch of digit images ready for the forward pass.
#[derive(Debug, Clone)]
pub struct DigitBatch<B: Backend> {
    /// shape: [batch_size, 1, 28, 28]
    pub images: Tensor<B, 4>,

    /// shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> DigitBatch<B> {
    pub fn len(&self) -> usize {
        self.targets.dims()[0]
    }
}

// ─── DigitBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct DigitBatcher<B: Backend> {
    device:     B::Device,
    normalizer: Normalizer,
}

impl<B: Backend> DigitBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, normalizer: Normalizer::mnist() }
    }
}

impl<B: Backend> Batcher<MnistItem, DigitBatch<B>> for DigitBatcher<B> {
    fn batch(&self, items: Vec<MnistItem>) -> DigitBatch<B> {
        let batch_size = items.len();

        let mut pixels = Vec::with_capacity(batch_size * IMAGE_PIXELS);
        for item in &items {
            self.normalizer.extend_image(&item.image, &mut pixels);
        }

        let labels: Vec<i64> = items.iter().map(|item| item.label as i64).collect();

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(pixels, [batch_size, 1, IMAGE_SIDE, IMAGE_SIDE]),
            &self.device,
        );
        let targets = Tensor::<B, 1, Int>::from_ints(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        DigitBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = DigitBatcher::<TestBackend>::new(device);
        let items   = vec![
            MnistItem { image: [[0.0; IMAGE_SIDE]; IMAGE_SIDE],   label: 1 },
            MnistItem { image: [[255.0; IMAGE_SIDE]; IMAGE_SIDE], label: 9 },
            MnistItem { image: [[0.0; IMAGE_SIDE]; IMAGE_SIDE],   label: 4 },
        ];

        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [3, 1, IMAGE_SIDE, IMAGE_SIDE]);
        assert_eq!(batch.targets.dims(), [3]);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_labels_and_pixels_are_carried() {
        let device  = Default::default();
        let batcher = DigitBatcher::<TestBackend>::new(device);
        let items   = vec![
            MnistItem { image: [[255.0; IMAGE_SIDE]; IMAGE_SIDE], label: 5 },
            MnistItem { image: [[0.0; IMAGE_SIDE]; IMAGE_SIDE],   label: 2 },
        ];

        let batch = batcher.batch(items);

        let labels: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![5, 2]);

        let pixels: Vec<f32> = batch.images.into_data().convert::<f32>().to_vec().unwrap();
        let n = Normalizer::mnist();
        assert!((pixels[0] - n.pixel(255.0)).abs() < 1e-6);
        assert!((pixels[IMAGE_PIXELS] - n.pixel(0.0)).abs() < 1e-6);
    }
}
