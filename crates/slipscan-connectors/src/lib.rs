//! Adapters connecting the slipscan relay to external services.
//!
//! This crate provides:
//! - `VisionOcr` for Google Cloud Vision text detection
//! - `LineMessaging` for LINE Messaging API content download and push
//! - `LocalSlipStore` for keeping slip images on the local filesystem

mod line;
mod store;
mod vision;

pub use line::{LineMessaging, PushRequest};
pub use store::LocalSlipStore;
pub use vision::{AnnotateRequest, AnnotateResponse, VisionOcr};
