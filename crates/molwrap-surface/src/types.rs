//! Data model for an introspected API surface.
//!
//! The surface extractor walks the native library's public headers and dumps
//! every class, method overload, and parameter into a JSON document. This
//! module is the typed view of that document. Directive tables are checked
//! against a loaded surface before generation starts, and the generator
//! walks it class by class while emitting wrappers.
//!
//! # Examples
//!
//! ```
//! use molwrap_surface::ApiSurface;
//!
//! let surface = ApiSurface::from_json_str(
//!     r#"{
//!         "classes": [
//!             {
//!                 "name": "VerletIntegrator",
//!                 "methods": [
//!                     {
//!                         "name": "getStepSize",
//!                         "return_type": "double"
//!                     }
//!                 ]
//!             }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//!
//! let class = surface.class("VerletIntegrator").unwrap();
//! assert!(class.has_method("getStepSize"));
//! assert_eq!(class.max_arity("getStepSize"), Some(0));
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use molwrap_core::{ClassName, Error, MethodName, Result};

/// The complete public API surface of one native library build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSurface {
    /// Library version the dump was extracted from, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Every public class, in header order.
    pub classes: Vec<ClassDescription>,
}

impl ApiSurface {
    /// Parses a surface dump from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the text is not a valid surface document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Parse {
            message: format!("invalid API surface JSON: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Reads and parses a surface dump from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the file cannot be read and
    /// [`Error::Parse`] if its contents are not a valid surface document.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let surface = Self::from_json_str(&json)?;
        tracing::debug!(
            "loaded API surface with {} classes from {}",
            surface.classes.len(),
            path.display()
        );
        Ok(surface)
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDescription> {
        self.classes.iter().find(|c| c.name.as_str() == name)
    }

    /// Returns `true` if the surface declares a class with this name.
    #[must_use]
    pub fn contains_class(&self, name: &str) -> bool {
        self.class(name).is_some()
    }

    /// Number of classes in the surface.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if the surface declares no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// One public class and its declared methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescription {
    /// Class name as written in the native headers.
    pub name: ClassName,
    /// Direct base classes, when the extractor could resolve them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<ClassName>,
    /// Declared methods, constructors included, one entry per overload.
    #[serde(default)]
    pub methods: Vec<MethodDescription>,
}

impl ClassDescription {
    /// Iterates over every overload of the named method.
    pub fn overloads<'a>(
        &'a self,
        method: &'a str,
    ) -> impl Iterator<Item = &'a MethodDescription> + 'a {
        self.methods.iter().filter(move |m| m.name.as_str() == method)
    }

    /// Returns `true` if the class declares at least one overload of the
    /// named method.
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.overloads(method).next().is_some()
    }

    /// Largest parameter count among overloads of the named method, or
    /// `None` if the class does not declare it.
    #[must_use]
    pub fn max_arity(&self, method: &str) -> Option<usize> {
        self.overloads(method).map(MethodDescription::arity).max()
    }

    /// Number of declared method overloads.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

/// One method overload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescription {
    /// Method name; constructors carry the class name.
    pub name: MethodName,
    /// Return type as written in the native headers, `void` for none.
    #[serde(default = "default_return_type")]
    pub return_type: String,
    /// Declared parameters, in order.
    #[serde(default)]
    pub parameters: Vec<ParameterDescription>,
}

impl MethodDescription {
    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescription> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Returns `true` if this overload declares the named parameter.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }
}

fn default_return_type() -> String {
    "void".to_string()
}

/// One declared parameter of a method overload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescription {
    /// Parameter name as written in the native headers.
    pub name: String,
    /// Base type with reference and const qualifiers stripped.
    pub type_name: String,
    /// Whether the parameter is passed by reference.
    #[serde(default)]
    pub is_reference: bool,
    /// Whether the parameter is const-qualified.
    #[serde(default)]
    pub is_const: bool,
}

impl ParameterDescription {
    /// Returns `true` for non-const reference parameters, the shape the
    /// generator treats as an output argument unless a directive says
    /// otherwise.
    #[must_use]
    pub const fn is_non_const_reference(&self) -> bool {
        self.is_reference && !self.is_const
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_surface_json() -> &'static str {
        r#"{
            "version": "9.1",
            "classes": [
                {
                    "name": "System",
                    "methods": [
                        {
                            "name": "addParticle",
                            "return_type": "int",
                            "parameters": [
                                {"name": "mass", "type_name": "double"}
                            ]
                        },
                        {
                            "name": "getNumParticles",
                            "return_type": "int"
                        }
                    ]
                },
                {
                    "name": "State",
                    "methods": [
                        {
                            "name": "getPeriodicBoxVectors",
                            "parameters": [
                                {"name": "a", "type_name": "Vec3", "is_reference": true},
                                {"name": "b", "type_name": "Vec3", "is_reference": true},
                                {"name": "c", "type_name": "Vec3", "is_reference": true}
                            ]
                        },
                        {
                            "name": "getPeriodicBoxVectors"
                        }
                    ]
                }
            ]
        }"#
    }

    #[test]
    fn test_parses_sample_surface() {
        let surface = ApiSurface::from_json_str(sample_surface_json()).unwrap();
        assert_eq!(surface.version.as_deref(), Some("9.1"));
        assert_eq!(surface.class_count(), 2);
        assert!(!surface.is_empty());
        assert!(surface.contains_class("System"));
        assert!(!surface.contains_class("Nonexistent"));
    }

    #[test]
    fn test_omitted_fields_use_defaults() {
        let surface = ApiSurface::from_json_str(sample_surface_json()).unwrap();
        let state = surface.class("State").unwrap();
        let bare = state
            .overloads("getPeriodicBoxVectors")
            .find(|m| m.arity() == 0)
            .unwrap();
        assert_eq!(bare.return_type, "void");
        assert!(state.bases.is_empty());
    }

    #[test]
    fn test_overload_queries() {
        let surface = ApiSurface::from_json_str(sample_surface_json()).unwrap();
        let state = surface.class("State").unwrap();
        assert_eq!(state.overloads("getPeriodicBoxVectors").count(), 2);
        assert_eq!(state.max_arity("getPeriodicBoxVectors"), Some(3));
        assert_eq!(state.max_arity("getPositions"), None);
        assert!(state.has_method("getPeriodicBoxVectors"));
        assert!(!state.has_method("getForces"));
        assert_eq!(state.method_count(), 2);
    }

    #[test]
    fn test_parameter_queries() {
        let surface = ApiSurface::from_json_str(sample_surface_json()).unwrap();
        let state = surface.class("State").unwrap();
        let full = state
            .overloads("getPeriodicBoxVectors")
            .find(|m| m.arity() == 3)
            .unwrap();
        assert!(full.has_parameter("a"));
        assert!(!full.has_parameter("d"));
        let a = full.parameter("a").unwrap();
        assert!(a.is_reference);
        assert!(!a.is_const);
        assert!(a.is_non_const_reference());
    }

    #[test]
    fn test_const_reference_is_not_output_shaped() {
        let param = ParameterDescription {
            name: "positions".to_string(),
            type_name: "std::vector<Vec3>".to_string(),
            is_reference: true,
            is_const: true,
        };
        assert!(!param.is_non_const_reference());

        let by_value = ParameterDescription {
            name: "mass".to_string(),
            type_name: "double".to_string(),
            is_reference: false,
            is_const: false,
        };
        assert!(!by_value.is_non_const_reference());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = ApiSurface::from_json_str("{\"classes\": 42}").unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("API surface"));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface.json");
        std::fs::write(&path, sample_surface_json()).unwrap();

        let surface = ApiSurface::from_file(&path).unwrap();
        assert_eq!(surface.class_count(), 2);
    }

    #[test]
    fn test_from_file_missing_path_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ApiSurface::from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(err.is_read());
    }

    #[test]
    fn test_serialize_round_trip_preserves_surface() {
        let surface = ApiSurface::from_json_str(sample_surface_json()).unwrap();
        let json = serde_json::to_string(&surface).unwrap();
        let back = ApiSurface::from_json_str(&json).unwrap();
        assert_eq!(back, surface);
    }
}
