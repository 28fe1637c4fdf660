//! Typed view of an introspected MolCore API surface.
//!
//! The wrapper generator never parses native headers itself. A separate
//! extractor dumps the public API to JSON, and this crate loads that dump
//! into plain data types the rest of the workspace can query: classes,
//! method overloads, and parameters with their reference and const
//! qualifiers.
//!
//! # Examples
//!
//! ```
//! use molwrap_surface::ApiSurface;
//!
//! let surface = ApiSurface::from_json_str(
//!     r#"{"classes": [{"name": "Vec3", "methods": []}]}"#,
//! )?;
//! assert!(surface.contains_class("Vec3"));
//! # Ok::<(), molwrap_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod types;

pub use types::{ApiSurface, ClassDescription, MethodDescription, ParameterDescription};
