use burn::data::dataset::{
    vision::{MnistDataset, MnistItem},
    Dataset, InMemDataset,
};

/// Which half of MNIST to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test  => "test",
        }
    }
}

enum Source {
    Mnist(MnistDataset),
    Memory(InMemDataset<MnistItem>),
}

/// Handwritten-digit samples, either the real MNIST split
/// (downloaded into Burn's dataset cache on first use) or an
/// in-memory list.
pub struct DigitDataset {
    source: Source,
}

impl DigitDataset {
    pub fn load(split: Split) -> Self {
        let inner = match split {
            Split::Train => MnistDataset::train(),
            Split::Test  => MnistDataset::test(),
        };
        let dataset = Self { source: Source::Mnist(inner) };
        tracing::info!("MNIST {} split: {} samples", split.name(), dataset.sample_count());
        dataset
    }

    pub fn train() -> Self { Self::load(Split::Train) }

    pub fn test() -> Self { Self::load(Split::Test) }

    pub fn from_items(items: Vec<MnistItem>) -> Self {
        Self { source: Source::Memory(InMemDataset::new(items)) }
    }

    pub fn sample_count(&self) -> usize { self.len() }
}

impl Dataset<MnistItem> for DigitDataset {
    fn get(&self, index: usize) -> Option<MnistItem> {
        match &self.source {
            Source::Mnist(d)  => d.get(index),
            Source::Memory(d) => d.get(index),
        }
    }

    fn len(&self) -> usize {
        match &self.source {
            Source::Mnist(d)  => d.len(),
            Source::Memory(d) => d.len(),
        }
    }
}
