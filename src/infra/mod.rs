// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Persistence used by the other layers:
//
//   checkpoint.rs - per-epoch model weights (Burn recorder),
//                   latest-epoch pointer, run config as JSON
//
//   metrics.rs    - epoch-level metrics appended to a CSV file
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
