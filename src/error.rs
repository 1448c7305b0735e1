//! Error types for gpgpu-flow.
//!
//! Almost every error here is a startup failure: loading the particle
//! source, bringing up the GPU, or opening the window. State readback can
//! also fail. The frame loop itself has no error channel beyond surface
//! acquisition, which [`FrameError`] covers.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a [`ParticleSet`](crate::ParticleSet).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The model file could not be read or decoded.
    #[error("failed to load model '{path}': {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    /// The model decoded but holds no mesh.
    #[error("model '{0}' contains no mesh")]
    NoMesh(PathBuf),
    /// The first mesh has no `POSITION` attribute.
    #[error("first mesh of '{0}' has no vertex positions")]
    NoPositions(PathBuf),
    /// The source produced zero particles.
    #[error("particle source is empty")]
    Empty,
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system has a GPU with Vulkan/Metal/DX12/WebGPU support")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable format for this adapter.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
    /// The adapter cannot write RGBA32F storage textures from compute.
    #[error("adapter does not support Rgba32Float storage textures")]
    NoFloatStorage,
    /// Mapping a readback buffer failed.
    #[error("failed to map readback buffer: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
    /// The device dropped a readback before it completed.
    #[error("readback was aborted before the buffer was mapped")]
    ReadbackAborted,
}

/// Errors that can occur when running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Particle source could not be built.
    #[error("particle source error: {0}")]
    Source(#[from] SourceError),
}

/// Errors a frame can hit while drawing.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The swap chain texture could not be acquired.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
