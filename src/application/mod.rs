// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Coordinates the other layers to accomplish one goal each.
//
// Rules for this layer:
//   - No tensor code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;

// Scoring a saved checkpoint
pub mod evaluate_use_case;
