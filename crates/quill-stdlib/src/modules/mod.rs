//! Built-in modules.
//!
//! Each module implements [`StdlibModule`](crate::registry::StdlibModule)
//! and lists the built-ins it contributes.

pub mod convert;
pub mod core;
pub mod encoding;
pub mod json;
pub mod math;
pub mod strings;
pub mod time;
