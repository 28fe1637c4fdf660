//! Core domain types for the MolCore wrapper-generation workspace.
//!
//! This crate holds the vocabulary shared by every stage of the generator:
//! strongly typed class, method, and unit names, plus the workspace-wide
//! [`Error`] and [`Result`] types. It deliberately has no I/O of its own.
//!
//! # Examples
//!
//! ```
//! use molwrap_core::{ClassName, MethodName, UnitExpr};
//!
//! let class = ClassName::new("System");
//! let method = MethodName::new("addForce");
//! let unit = UnitExpr::new("unit.kilojoule_per_mole")?;
//!
//! assert_eq!(class.as_str(), "System");
//! assert_eq!(method.as_str(), "addForce");
//! assert_eq!(unit.as_str(), "unit.kilojoule_per_mole");
//! # Ok::<(), molwrap_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{ClassName, MethodName, UnitExpr};
