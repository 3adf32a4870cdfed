//! Web ROI capture node.
//!
//! Decodes the base64 data URL written by the companion front-end widget into
//! a normalized `(1, H, W, 3)` float tensor. Any failure yields a blank
//! placeholder tensor instead of an error.

pub mod capture;
pub mod config;
pub mod image;
pub mod node;

// Re-export commonly used types
pub use capture::{capture_screen, capture_screen_with, Capture, CaptureError};
pub use config::NodeConfig;
pub use crate::image::{ImageFormat, ImageTensor, PngCompression};
pub use node::{NodeDescriptor, NodeRegistry, WEB_ROI_CAPTURE};
