// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// Tensor math, autodiff and optimisers all come from Burn and
// are only touched from here (plus the batcher and recorder
// at the data / infra edges).
//
//   model.rs     - LeNet-5: two conv + pool stages, three linear layers
//
//   backend.rs   - compute backend selected once at startup
//                  (Wgpu accelerator or NdArray CPU)
//
//   trainer.rs   - the Training Driver: learning-rate schedule,
//                  train pass, evaluation pass, per-epoch checkpoint
//
//   evaluator.rs - read-only evaluation pass shared by training
//                  and the `evaluate` command
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            LeCun et al. (1998) Gradient-Based Learning Applied
//            to Document Recognition

/// LeNet-5 architecture
pub mod model;

/// Accelerator / CPU backend selection
pub mod backend;

/// Epoch loop with checkpointing
pub mod trainer;

/// Loss and accuracy over an evaluation loader
pub mod evaluator;
