//! Cross-reference validation of a directive table against an API surface.
//!
//! Directive tables live apart from the headers they describe, so renamed
//! classes, removed overloads, and changed signatures silently strand
//! entries. The validation pass walks every key in the table, checks it
//! against an introspected [`ApiSurface`], and reports all mismatches at
//! once so a stale table can be repaired in a single pass.

use molwrap_core::{Error, Result};
use molwrap_surface::{ApiSurface, ClassDescription};

use crate::table::{DirectiveSet, UnitSpec};

impl DirectiveSet {
    /// Checks every directive key against an introspected API surface.
    ///
    /// The pass verifies that:
    ///
    /// - base class overrides and skip rules name classes the surface
    ///   declares, and method- or overload-level skip rules name methods
    ///   and arities that exist;
    /// - doc string overrides name existing methods;
    /// - output argument exceptions name a parameter declared by at least
    ///   one overload;
    /// - ownership transfer and ordered set positions fall inside at least
    ///   one overload's parameter list;
    /// - unit annotations name existing methods and carry no more
    ///   parameter slots than some overload has input parameters. Unit
    ///   slots annotate input parameters from the left, so a shorter tuple
    ///   leaves trailing parameters unannotated, but a longer one can
    ///   never line up. A `"*"` wildcard is checked against every class
    ///   declaring the method, except classes with an exact entry of their
    ///   own, and must match at least one class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] carrying one message per mismatch,
    /// sorted by key, with every problem collected before reporting.
    ///
    /// # Examples
    ///
    /// ```
    /// use molwrap_directives::DirectiveSet;
    /// use molwrap_surface::ApiSurface;
    ///
    /// let surface = ApiSurface::from_json_str(
    ///     r#"{"classes": [{"name": "System", "methods": [{"name": "getNumParticles"}]}]}"#,
    /// )
    /// .unwrap();
    ///
    /// let good = DirectiveSet::builder().skip_method("System", "getNumParticles").build();
    /// assert!(good.validate_against(&surface).is_ok());
    ///
    /// let stale = DirectiveSet::builder().skip_method("System", "getNumAtoms").build();
    /// let err = stale.validate_against(&surface).unwrap_err();
    /// assert!(err.to_string().contains("System.getNumAtoms"));
    /// ```
    pub fn validate_against(&self, surface: &ApiSurface) -> Result<()> {
        let mut issues = Vec::new();
        self.check_base_overrides(surface, &mut issues);
        self.check_doc_strings(surface, &mut issues);
        self.check_skip_rules(surface, &mut issues);
        self.check_output_exceptions(surface, &mut issues);
        check_positions(
            surface,
            self.iter_ownership_transfers(),
            "ownership transfer",
            &mut issues,
        );
        check_positions(
            surface,
            self.iter_ordered_sets(),
            "ordered set requirement",
            &mut issues,
        );
        self.check_unit_annotations(surface, &mut issues);

        if issues.is_empty() {
            tracing::debug!(
                "directive table validated against {} classes",
                surface.class_count()
            );
            Ok(())
        } else {
            issues.sort();
            tracing::warn!(
                "directive table failed validation with {} issue(s)",
                issues.len()
            );
            Err(Error::Validation { issues })
        }
    }

    fn check_base_overrides(&self, surface: &ApiSurface, issues: &mut Vec<String>) {
        for (class, _base) in self.iter_missing_base_classes() {
            if !surface.contains_class(class) {
                issues.push(format!(
                    "base class override {class}: class not found in API surface"
                ));
            }
        }
    }

    fn check_doc_strings(&self, surface: &ApiSurface, issues: &mut Vec<String>) {
        for (class, method) in self.iter_doc_strings() {
            match surface.class(class) {
                None => issues.push(format!(
                    "doc string override {class}.{method}: class not found in API surface"
                )),
                Some(c) if !c.has_method(method) => issues.push(format!(
                    "doc string override {class}.{method}: method not found in API surface"
                )),
                Some(_) => {}
            }
        }
    }

    fn check_skip_rules(&self, surface: &ApiSurface, issues: &mut Vec<String>) {
        for class in self.iter_skip_classes() {
            if !surface.contains_class(class) {
                issues.push(format!("skip rule {class}: class not found in API surface"));
            }
        }

        for (class, method) in self.iter_skip_methods() {
            match surface.class(class) {
                None => issues.push(format!(
                    "skip rule {class}.{method}: class not found in API surface"
                )),
                Some(c) if !c.has_method(method) => issues.push(format!(
                    "skip rule {class}.{method}: method not found in API surface"
                )),
                Some(_) => {}
            }
        }

        for (class, method, arity) in self.iter_skip_overloads() {
            match surface.class(class) {
                None => issues.push(format!(
                    "skip rule {class}.{method}/{arity}: class not found in API surface"
                )),
                Some(c) if !c.has_method(method) => issues.push(format!(
                    "skip rule {class}.{method}/{arity}: method not found in API surface"
                )),
                Some(c) if !c.overloads(method).any(|m| m.arity() == *arity) => {
                    issues.push(format!(
                        "skip rule {class}.{method}/{arity}: no overload takes {arity} parameter(s)"
                    ));
                }
                Some(_) => {}
            }
        }
    }

    fn check_output_exceptions(&self, surface: &ApiSurface, issues: &mut Vec<String>) {
        for (class, method, parameter) in self.iter_no_output_args() {
            match surface.class(class) {
                None => issues.push(format!(
                    "output argument exception {class}.{method}({parameter}): class not found in API surface"
                )),
                Some(c) if !c.has_method(method) => issues.push(format!(
                    "output argument exception {class}.{method}({parameter}): method not found in API surface"
                )),
                Some(c) if !c.overloads(method).any(|m| m.has_parameter(parameter)) => {
                    issues.push(format!(
                        "output argument exception {class}.{method}({parameter}): no overload declares this parameter"
                    ));
                }
                Some(_) => {}
            }
        }
    }

    fn check_unit_annotations(&self, surface: &ApiSurface, issues: &mut Vec<String>) {
        for ((class, method), spec) in self.iter_class_units() {
            match surface.class(class) {
                None => issues.push(format!(
                    "unit annotation {class}.{method}: class not found in API surface"
                )),
                Some(c) if !c.has_method(method) => issues.push(format!(
                    "unit annotation {class}.{method}: method not found in API surface"
                )),
                Some(c) if !self.unit_slots_fit(c, method, spec) => issues.push(format!(
                    "unit annotation {class}.{method}: {} parameter slot(s) exceed the input arity of every overload",
                    spec.param_arity()
                )),
                Some(_) => {}
            }
        }

        for (method, spec) in self.iter_wildcard_units() {
            let mut declaring_classes = 0_usize;
            for class in &surface.classes {
                if !class.has_method(method) {
                    continue;
                }
                declaring_classes += 1;
                // An exact entry shadows the wildcard for this class, so
                // the wildcard's shape does not need to fit it.
                if self.class_unit_entry(class.name.as_str(), method).is_some() {
                    continue;
                }
                if !self.unit_slots_fit(class, method, spec) {
                    issues.push(format!(
                        "unit annotation *.{method}: {} parameter slot(s) exceed the input arity of every overload of {}",
                        spec.param_arity(),
                        class.name
                    ));
                }
            }
            if declaring_classes == 0 {
                issues.push(format!(
                    "unit annotation *.{method}: no class in the API surface declares this method"
                ));
            }
        }
    }

    fn unit_slots_fit(&self, class: &ClassDescription, method: &str, spec: &UnitSpec) -> bool {
        class
            .overloads(method)
            .any(|overload| spec.param_arity() <= self.input_arity(class.name.as_str(), overload))
    }
}

fn check_positions<'a>(
    surface: &ApiSurface,
    entries: impl Iterator<Item = (&'a (String, String), &'a Vec<usize>)>,
    what: &str,
    issues: &mut Vec<String>,
) {
    for ((class, method), positions) in entries {
        let Some(c) = surface.class(class) else {
            issues.push(format!(
                "{what} {class}.{method}: class not found in API surface"
            ));
            continue;
        };
        let Some(max_arity) = c.max_arity(method) else {
            issues.push(format!(
                "{what} {class}.{method}: method not found in API surface"
            ));
            continue;
        };
        for &position in positions {
            if position >= max_arity {
                issues.push(format!(
                    "{what} {class}.{method}: position {position} is outside every overload"
                ));
            }
        }
    }
}
