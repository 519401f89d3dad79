// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from raw MNIST samples to device-ready batches:
//
//   MnistDataset (Burn, downloaded on first use)
//       │
//       ▼
//   DigitDataset      → train / test split, or in-memory items
//       │
//       ▼
//   Normalizer        → pixel / 255, then (x - mean) / std
//       │
//       ▼
//   DigitBatcher      → stacks items into [N, 1, 28, 28] tensors
//       │
//       ▼
//   DataLoader        → shuffles, batches, prefetches on workers
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Wraps Burn's MNIST dataset and in-memory sample lists
pub mod dataset;

/// Normalises raw pixels with the MNIST mean / std
pub mod preprocessor;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
