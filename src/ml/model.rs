use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{MaxPool2d, MaxPool2dConfig},
        Linear, LinearConfig, Relu,
    },
    prelude::*,
};

/// Channels after the second convolution.
const CONV2_CHANNELS: usize = 16;

/// Spatial side after conv(5) → pool(2) → conv(5) → pool(2) on a 28x28 input.
const FEATURE_SIDE: usize = 4;

const FLAT_FEATURES: usize = CONV2_CHANNELS * FEATURE_SIDE * FEATURE_SIDE;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct LeNetConfig {
    #[config(default = 10)]
    pub num_classes: usize,
}

impl LeNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LeNet<B> {
        LeNet {
            conv1:      Conv2dConfig::new([1, 6], [5, 5]).init(device),
            conv2:      Conv2dConfig::new([6, CONV2_CHANNELS], [5, 5]).init(device),
            pool:       MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            fc1:        LinearConfig::new(FLAT_FEATURES, 120).init(device),
            fc2:        LinearConfig::new(120, 84).init(device),
            fc3:        LinearConfig::new(84, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }

    /// Seed the backend RNG, then initialise. The same seed on the same
    /// backend always yields the same starting weights.
    pub fn init_seeded<B: Backend>(&self, seed: u64, device: &B::Device) -> LeNet<B> {
        B::seed(seed);
        self.init(device)
    }
}

/// LeNet-5 for 1x28x28 digits:
/// conv(1→6,5x5) relu pool, conv(6→16,5x5) relu pool, 256→120→84→classes.
#[derive(Module, Debug)]
pub struct LeNet<B: Backend> {
    pub conv1:      Conv2d<B>,
    pub conv2:      Conv2d<B>,
    pub pool:       MaxPool2d,
    pub fc1:        Linear<B>,
    pub fc2:        Linear<B>,
    pub fc3:        Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> LeNet<B> {
    /// images: [batch, 1, 28, 28] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _, _, _] = images.dims();

        let x = self.pool.forward(self.activation.forward(self.conv1.forward(images)));
        let x = self.pool.forward(self.activation.forward(self.conv2.forward(x)));
        let x = x.reshape([batch_size, FLAT_FEATURES]);

        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.activation.forward(self.fc2.forward(x));
        self.fc3.forward(x)
    }

    /// Forward pass plus mean cross-entropy against `targets`.
    pub fn forward_classification(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let output = self.forward(images);
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets);
        (loss, output)
    }
}
