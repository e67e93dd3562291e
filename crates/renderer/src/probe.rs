//! Start-up check for GPU support.
//!
//! The probe asks for a modern context first and falls back to a
//! compatibility (GL) context. It never panics: provider errors and panics are
//! folded into the report's `failure` field.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::types::AdapterProfile;

pub const UNSUPPORTED_MESSAGE: &str = "GPU rendering not supported";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRequest {
    /// Vulkan, Metal, DX12 or WebGPU.
    Modern,
    /// OpenGL / GLES.
    Compatibility,
}

impl ContextRequest {
    pub const ORDER: [ContextRequest; 2] = [ContextRequest::Modern, ContextRequest::Compatibility];

    pub fn backends(self) -> wgpu::Backends {
        match self {
            ContextRequest::Modern => wgpu::Backends::PRIMARY,
            ContextRequest::Compatibility => wgpu::Backends::GL,
        }
    }
}

impl fmt::Display for ContextRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextRequest::Modern => f.write_str("modern"),
            ContextRequest::Compatibility => f.write_str("compatibility"),
        }
    }
}

/// Source of GPU contexts; `Ok(None)` means the request found nothing.
pub trait ContextProvider {
    fn request(&self, request: ContextRequest) -> Result<Option<AdapterProfile>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityReport {
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_texture_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub software: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl CapabilityReport {
    fn supported(request: ContextRequest, profile: &AdapterProfile) -> Self {
        Self {
            supported: true,
            context: Some(request.to_string()),
            version: Some(profile.api_version()),
            vendor: Some(profile.vendor.clone()),
            renderer: Some(profile.name.clone()),
            max_texture_size: Some(profile.max_texture_dimension_2d),
            backend: Some(format!("{:?}", profile.backend)),
            software: profile.is_software(),
            failure: None,
        }
    }

    fn unsupported(failure: String) -> Self {
        Self {
            supported: false,
            context: None,
            version: None,
            vendor: None,
            renderer: None,
            max_texture_size: None,
            backend: None,
            software: false,
            failure: Some(failure),
        }
    }
}

impl fmt::Display for CapabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.supported {
            return write!(
                f,
                "{}",
                self.failure.as_deref().unwrap_or(UNSUPPORTED_MESSAGE)
            );
        }
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "unknown".into());
        writeln!(f, "context:          {}", field(&self.context))?;
        writeln!(f, "version:          {}", field(&self.version))?;
        writeln!(f, "vendor:           {}", field(&self.vendor))?;
        writeln!(f, "renderer:         {}", field(&self.renderer))?;
        writeln!(f, "backend:          {}", field(&self.backend))?;
        match self.max_texture_size {
            Some(size) => writeln!(f, "max texture size: {size}")?,
            None => writeln!(f, "max texture size: unknown")?,
        }
        write!(f, "software:         {}", self.software)
    }
}

pub fn probe(provider: &dyn ContextProvider) -> CapabilityReport {
    let mut failures = Vec::new();
    for request in ContextRequest::ORDER {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| provider.request(request)));
        match attempt {
            Ok(Ok(Some(profile))) => {
                debug!(%request, adapter = %profile.name, "GPU context available");
                return CapabilityReport::supported(request, &profile);
            }
            Ok(Ok(None)) => debug!(%request, "no adapter for context request"),
            Ok(Err(err)) => {
                debug!(%request, error = %err, "context request failed");
                failures.push(format!("{request}: {err:#}"));
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                debug!(%request, %reason, "context request panicked");
                failures.push(format!("{request}: {reason}"));
            }
        }
    }

    let failure = if failures.is_empty() {
        UNSUPPORTED_MESSAGE.to_string()
    } else {
        format!("{UNSUPPORTED_MESSAGE} ({})", failures.join("; "))
    };
    CapabilityReport::unsupported(failure)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}

/// Asks wgpu for an adapter without opening a window.
#[derive(Debug, Default, Clone, Copy)]
pub struct WgpuProvider;

impl ContextProvider for WgpuProvider {
    fn request(&self, request: ContextRequest) -> Result<Option<AdapterProfile>> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: request.backends(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }));
        match adapter {
            Ok(adapter) => Ok(Some(AdapterProfile::from_wgpu(
                &adapter.get_info(),
                &adapter.limits(),
            ))),
            Err(err) => {
                debug!(%request, error = %err, "no wgpu adapter");
                Ok(None)
            }
        }
    }
}
