use candle_core::Device;
use tracing::{debug, info, warn};

use super::error::EmbeddingError;

/// Where the sentence model runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Use a compiled-in GPU backend when one initialises, else CPU.
    #[default]
    Auto,
    /// Always run on CPU.
    Cpu,
}

impl std::str::FromStr for DevicePreference {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            other => Err(EmbeddingError::InvalidConfig {
                reason: format!("unknown device preference '{other}' (expected 'auto' or 'cpu')"),
            }),
        }
    }
}

/// Selects the compute device. GPU failures are logged and fall back to CPU.
pub fn select_device(preference: DevicePreference) -> Result<Device, EmbeddingError> {
    if preference == DevicePreference::Cpu {
        debug!("CPU device requested explicitly");
        return Ok(Device::Cpu);
    }

    let mut failures: Vec<String> = Vec::new();

    if cfg!(feature = "metal") {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU acceleration");
                return Ok(device);
            }
            Err(e) => failures.push(format!("metal failed: {e}")),
        }
    }

    if cfg!(feature = "cuda") {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Using CUDA GPU acceleration");
                return Ok(device);
            }
            Err(e) => failures.push(format!("cuda failed: {e}")),
        }
    }

    if failures.is_empty() {
        debug!("No GPU backend compiled, using CPU");
    } else {
        warn!(reason = %failures.join("; "), "Falling back to CPU device");
    }

    Ok(Device::Cpu)
}
