//! Shared test mocks and utilities for SketchRelay.

mod blob;
mod clock;
mod renderer;

pub use blob::{FailingBlobStore, MemoryBlobStore};
pub use clock::FixedClock;
pub use renderer::RecordingRenderer;
