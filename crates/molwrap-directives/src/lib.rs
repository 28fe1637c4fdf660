//! Binding directive tables for the MolCore wrapper generator.
//!
//! Generating wrappers for a native library is mostly mechanical, but a
//! real API carries exceptions no generator can infer from headers alone:
//! classes with handwritten wrappers, reference parameters that are inputs
//! despite looking like outputs, calls that take ownership of their
//! arguments, values that carry physical units. This crate owns the table
//! of those exceptions.
//!
//! A [`DirectiveSet`] is loaded once at generator startup, either the
//! built-in copy tracking the MolCore public API or an external TOML file,
//! and is then a read-only lookup service for the generation loop. It can
//! be cross-checked against an introspected API surface with
//! [`DirectiveSet::validate_against`] to catch entries stranded by header
//! changes.
//!
//! # Examples
//!
//! ```
//! use molwrap_directives::DirectiveSet;
//!
//! let directives = DirectiveSet::builtin()?;
//!
//! // Vec3 has a handwritten wrapper, so the generator skips it.
//! assert!(directives.should_skip("Vec3", "Vec3", 3));
//!
//! // minimize updates its context handle in place; without this entry the
//! // non-const reference would be misread as an output argument.
//! assert!(!directives.is_output_argument(
//!     "LocalEnergyMinimizer",
//!     "minimize",
//!     "context",
//!     true,
//! ));
//! # Ok::<(), molwrap_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod schema;
mod table;
mod validate;

pub use table::{DirectiveSet, DirectiveSetBuilder, SkipMatch, UnitSpec, WILDCARD_CLASS};
