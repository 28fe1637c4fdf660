//! Strong domain types shared across the wrapper-generation workspace.
//!
//! Class and method names travel through every stage of wrapper generation,
//! so they get dedicated newtypes instead of bare strings. Unit expressions
//! are validated at construction time.
//!
//! # Examples
//!
//! ```
//! use molwrap_core::{ClassName, MethodName, UnitExpr};
//!
//! let class = ClassName::new("NonbondedForce");
//! let method = MethodName::new("getCutoffDistance");
//! let unit = UnitExpr::new("unit.nanometer").unwrap();
//!
//! assert_eq!(class.as_str(), "NonbondedForce");
//! assert_eq!(format!("{class}.{method}"), "NonbondedForce.getCutoffDistance");
//! assert_eq!(unit.as_str(), "unit.nanometer");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Name of a class in the native library's public API.
///
/// # Examples
///
/// ```
/// use molwrap_core::ClassName;
///
/// let name = ClassName::new("Context");
/// assert_eq!(name.as_str(), "Context");
/// assert_eq!(name.to_string(), "Context");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassName(String);

impl ClassName {
    /// Creates a new class name.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the class name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes and returns the inner string.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClassName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Name of a method declared by a native class.
///
/// Overloads share one method name; a specific overload is identified by
/// the pair of method name and parameter count.
///
/// # Examples
///
/// ```
/// use molwrap_core::MethodName;
///
/// let name = MethodName::new("addParticle");
/// assert_eq!(name.as_str(), "addParticle");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodName(String);

impl MethodName {
    /// Creates a new method name.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the method name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes and returns the inner string.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MethodName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for MethodName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A symbolic unit expression attached to a return value or parameter.
///
/// The text is opaque to this workspace; it is emitted verbatim into
/// generated wrapper code, where the target language's unit package
/// resolves it (for example `unit.nanometer` or
/// `unit.kilojoule_per_mole/unit.nanometer`). The only structural rule is
/// that an expression must not be blank: "no unit" is represented by the
/// absence of an expression, never by an empty one.
///
/// # Examples
///
/// ```
/// use molwrap_core::UnitExpr;
///
/// let expr = UnitExpr::new("unit.kelvin").unwrap();
/// assert_eq!(expr.as_str(), "unit.kelvin");
///
/// assert!(UnitExpr::new("").is_err());
/// assert!(UnitExpr::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitExpr(String);

impl UnitExpr {
    /// Creates a unit expression from its source text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUnitExpr`] if the text is empty or consists
    /// only of whitespace.
    pub fn new(expr: impl Into<String>) -> Result<Self> {
        let expr = expr.into();
        if expr.trim().is_empty() {
            return Err(Error::InvalidUnitExpr { value: expr });
        }
        Ok(Self(expr))
    }

    /// Returns the expression as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes and returns the inner string.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UnitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UnitExpr {
    type Error = Error;

    fn try_from(expr: String) -> Result<Self> {
        Self::new(expr)
    }
}

impl TryFrom<&str> for UnitExpr {
    type Error = Error;

    fn try_from(expr: &str) -> Result<Self> {
        Self::new(expr)
    }
}

impl From<UnitExpr> for String {
    fn from(expr: UnitExpr) -> Self {
        expr.0
    }
}
