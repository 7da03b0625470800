//! Accelerator and environment probe
//!
//! Reports backend build capabilities, CUDA/Metal availability, and GPU
//! devices. Device enumeration goes through the [`AcceleratorRuntime`]
//! trait so the no-GPU path stays testable without hardware.

use crate::errors::Result;
use candle_core::Device;
use colored::Colorize;
use sysinfo::System;

/// Numerical backend behind the probe and the trainer
pub const BACKEND_NAME: &str = "candle";

/// One visible GPU device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub ordinal: usize,
    pub label: String,
}

/// Compile-time CPU capabilities of the backend
#[derive(Debug, Clone, Default)]
pub struct CpuFeatures {
    pub avx: bool,
    pub neon: bool,
    pub simd128: bool,
    pub f16c: bool,
    pub mkl: bool,
    pub accelerate: bool,
}

impl CpuFeatures {
    /// Comma-separated list of the enabled features, or "none"
    pub fn summary(&self) -> String {
        let mut enabled = Vec::new();
        if self.avx {
            enabled.push("avx");
        }
        if self.neon {
            enabled.push("neon");
        }
        if self.simd128 {
            enabled.push("simd128");
        }
        if self.f16c {
            enabled.push("f16c");
        }
        if self.mkl {
            enabled.push("mkl");
        }
        if self.accelerate {
            enabled.push("accelerate");
        }
        if enabled.is_empty() {
            "none".to_string()
        } else {
            enabled.join(", ")
        }
    }
}

/// Abstraction over the accelerator runtime
///
/// Implementations must only be asked to enumerate devices when
/// `cuda_available` returned true.
pub trait AcceleratorRuntime {
    fn cpu_features(&self) -> CpuFeatures;
    fn cuda_available(&self) -> bool;
    fn metal_available(&self) -> bool;
    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>>;
}

/// Candle-backed runtime
pub struct CandleRuntime;

impl AcceleratorRuntime for CandleRuntime {
    fn cpu_features(&self) -> CpuFeatures {
        CpuFeatures {
            avx: candle_core::utils::with_avx(),
            neon: candle_core::utils::with_neon(),
            simd128: candle_core::utils::with_simd128(),
            f16c: candle_core::utils::with_f16c(),
            mkl: candle_core::utils::has_mkl(),
            accelerate: candle_core::utils::has_accelerate(),
        }
    }

    fn cuda_available(&self) -> bool {
        candle_core::utils::cuda_is_available()
    }

    fn metal_available(&self) -> bool {
        candle_core::utils::metal_is_available()
    }

    /// Probe ordinals until instantiation fails. Candle does not expose
    /// driver device names, so devices are labelled by ordinal.
    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>> {
        let mut devices = Vec::new();
        for ordinal in 0..MAX_DEVICE_ORDINALS {
            match Device::new_cuda(ordinal) {
                Ok(_) => devices.push(DeviceInfo {
                    ordinal,
                    label: format!("cuda:{}", ordinal),
                }),
                Err(_) => break,
            }
        }
        Ok(devices)
    }
}

const MAX_DEVICE_ORDINALS: usize = 16;

/// Probe report for one invocation
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub crate_version: String,
    pub cpu_features: CpuFeatures,
    pub cuda_available: bool,
    pub metal_available: bool,
    pub devices: Vec<DeviceInfo>,
    pub total_memory_gb: u64,
    pub available_memory_gb: u64,
}

impl ProbeReport {
    /// Run the probe against a runtime
    pub fn collect<R: AcceleratorRuntime>(runtime: &R) -> Result<Self> {
        let cuda_available = runtime.cuda_available();

        // No device instantiation is attempted without an accelerator.
        let devices = if cuda_available {
            runtime.enumerate_devices()?
        } else {
            Vec::new()
        };

        let mut sys = System::new();
        sys.refresh_memory();

        Ok(Self {
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            cpu_features: runtime.cpu_features(),
            cuda_available,
            metal_available: runtime.metal_available(),
            devices,
            total_memory_gb: sys.total_memory() / (1024 * 1024 * 1024),
            available_memory_gb: sys.available_memory() / (1024 * 1024 * 1024),
        })
    }

    /// Print the report to standard output
    pub fn print(&self) {
        println!();
        println!("Lumina environment probe");
        println!("{}", "=".repeat(50));
        println!(
            "{:<20} {} {} (lumina {})",
            "Backend",
            BACKEND_NAME,
            "ok".green(),
            self.crate_version
        );
        println!("{:<20} {}", "CPU features", self.cpu_features.summary());
        println!(
            "{:<20} {}",
            "Host memory",
            format!(
                "{} GB available / {} GB total",
                self.available_memory_gb, self.total_memory_gb
            )
        );

        if self.cuda_available {
            println!("{:<20} {}", "CUDA", "available".green());
            println!("{:<20} {}", "Device count", self.devices.len());
            for device in &self.devices {
                println!("{:<20} {}", format!("Device {}", device.ordinal), device.label);
            }
        } else {
            println!("{:<20} {}", "CUDA", "not available".yellow());
        }

        if self.metal_available {
            println!("{:<20} {}", "Metal", "available".green());
        }
        println!();
    }
}
