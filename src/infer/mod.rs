//! Inference backends.
//!
//! The model is an opaque capability: a backend consumes one frame ROI and
//! produces a heat-map `ModelOutput`. Two implementations:
//! - `StubBackend`: deterministic brightness heuristic, no model file needed
//! - `TractBackend`: ONNX inference via tract (feature: backend-tract)
//!
//! Backends must not retain pixel data beyond the `infer` call.

mod backend;
mod stub;
#[cfg(feature = "backend-tract")]
mod tract;

pub use backend::{InferenceBackend, OutputDims};
pub use stub::StubBackend;
#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
