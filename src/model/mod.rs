//! Model interfaces and implementations
//!
//! This module provides:
//! - `ModelInvoker` trait for all model backends
//! - Model registry with metadata
//! - The Cortex REST backend
//! - Mock implementations for testing

mod cortex;
mod invoker;
mod mock;
mod registry;

pub use cortex::{parse_completion, CortexInvoker};
pub use invoker::{InvocationError, ModelInvoker};
pub use mock::{MockInvoker, ScriptedInvoker};
pub use registry::{ModelInfo, ModelRegistry};
