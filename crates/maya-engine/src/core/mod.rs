//! Core engine-facing contracts.
//!
//! [`Engine`] owns the device, input state and clock; [`App`] is what higher
//! layers implement. The runtime (or a test harness) sits between them and
//! feeds platform events in. There are no global singletons.

mod app;
mod ctx;
mod engine;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
pub use engine::Engine;
