// ============================================================
// Layer 5 - Compute Backend Selection
// ============================================================
// The device is chosen once, at startup, and the rest of the
// code is generic over `B: Backend` / `B: AutodiffBackend`.
//
//   Accelerator → Wgpu   (GPU through Vulkan / Metal / DX12)
//   Cpu         → NdArray
//
// Training wraps either one in Autodiff. Evaluation-only runs
// use the plain backend.
//
// Asking for the accelerator on a host without a usable wgpu
// adapter falls back to the CPU with a warning.

use std::panic::{self, AssertUnwindSafe};

use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

pub type AccelBackend = burn::backend::Wgpu;
pub type CpuBackend   = burn::backend::NdArray;

pub type AccelTrainBackend = burn::backend::Autodiff<AccelBackend>;
pub type CpuTrainBackend   = burn::backend::Autodiff<CpuBackend>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeBackend {
    Accelerator,
    Cpu,
}

impl ComputeBackend {
    /// `--no-accel` forces the CPU backend; otherwise the accelerator is used.
    pub fn select(disable_accelerator: bool) -> Self {
        if disable_accelerator { Self::Cpu } else { Self::Accelerator }
    }

    /// The backend to actually run on: `Cpu` stays `Cpu`, `Accelerator`
    /// is checked against the host first.
    pub fn resolve(self) -> Self {
        match self {
            Self::Accelerator => self.or_cpu_fallback(accelerator_available()),
            Self::Cpu         => Self::Cpu,
        }
    }

    pub fn or_cpu_fallback(self, accelerator_available: bool) -> Self {
        match self {
            Self::Accelerator if !accelerator_available => {
                tracing::warn!("No usable wgpu adapter, falling back to the ndarray CPU backend (--no-accel skips this check)");
                Self::Cpu
            }
            other => other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Accelerator => "wgpu",
            Self::Cpu         => "ndarray",
        }
    }
}

pub fn accel_device() -> burn::backend::wgpu::WgpuDevice {
    burn::backend::wgpu::WgpuDevice::default()
}

pub fn cpu_device() -> burn::backend::ndarray::NdArrayDevice {
    burn::backend::ndarray::NdArrayDevice::Cpu
}

/// Runs one tiny op on the default wgpu device. Adapter selection
/// panics when there is none, so the op runs under `catch_unwind`
/// with the panic message suppressed.
pub fn accelerator_available() -> bool {
    let device = accel_device();

    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        Tensor::<AccelBackend, 1>::zeros([1], &device).into_data()
    }));
    panic::set_hook(hook);

    match outcome {
        Ok(_) => true,
        Err(_) => {
            tracing::debug!("wgpu device {:?} failed to initialise", device);
            false
        }
    }
}
