//! Backend abstraction - Multi-backend support
//!
//! Supports both CUDA (GPU) and NdArray (CPU) backends. When the GPU backend
//! is compiled in, training is pinned to a single visible GPU; if no GPU can
//! be found the run continues on the default device.

use burn::backend::Autodiff;
use tracing::{info, warn};

use crate::config::DeviceConfig;

// --------------------------------------------------------------------------------
// BACKEND SELECTION: CUDA (when enabled) or NdArray (default)
// --------------------------------------------------------------------------------

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn_cuda::Cuda;

#[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
pub type DefaultBackend = burn_ndarray::NdArray;

#[cfg(all(not(feature = "cuda"), not(feature = "ndarray")))]
compile_error!("At least one backend (cuda or ndarray) must be enabled!");

/// The default autodiff backend for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Device type of the selected backend
pub type Device = <DefaultBackend as burn::tensor::backend::Backend>::Device;

/// Get the default device
pub fn default_device() -> Device {
    Device::default()
}

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }

    #[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
    {
        "NdArray (CPU)"
    }
}

/// Select the compute device for this run.
///
/// With the GPU backend only the configured GPU is used. A missing GPU is
/// not fatal: the failure is logged and the default device is returned.
pub fn select_device(config: &DeviceConfig) -> Device {
    #[cfg(feature = "cuda")]
    {
        if has_nvidia_gpu() {
            info!("Restricting training to GPU {}", config.gpu_index);
            return burn_cuda::CudaDevice::new(config.gpu_index);
        }
        warn!(
            "Could not restrict visible devices to GPU {}: no NVIDIA GPU detected, using default device placement",
            config.gpu_index
        );
        default_device()
    }

    #[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
    {
        if config.prefer_gpu {
            warn!(
                "GPU {} requested but this build has no GPU backend, using default device placement",
                config.gpu_index
            );
        }
        info!("Using {} backend", backend_name());
        default_device()
    }
}

/// Check for an NVIDIA driver on the host
#[cfg(feature = "cuda")]
fn has_nvidia_gpu() -> bool {
    #[cfg(target_os = "linux")]
    {
        std::path::Path::new("/proc/driver/nvidia/version").exists()
            || std::path::Path::new("/dev/nvidia0").exists()
            || std::process::Command::new("nvidia-smi")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("nvidia-smi.exe")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name_not_empty() {
        assert!(!backend_name().is_empty());
    }

    #[test]
    fn test_select_device_without_gpu_falls_back() {
        let config = DeviceConfig {
            gpu_index: 0,
            prefer_gpu: true,
        };
        // Must not panic even when no GPU is present.
        let _device = select_device(&config);
    }
}
