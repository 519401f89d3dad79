// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits describing a training run.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, functions and traits
//
// Everything here is unit-testable without a tensor backend.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Learning-rate schedules (piecewise constant per epoch)
pub mod schedule;

// Running evaluation metrics and progress arithmetic
pub mod metrics;

// Core abstractions that other layers implement
pub mod traits;
