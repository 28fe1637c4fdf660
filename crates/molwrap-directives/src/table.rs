//! The compiled directive table and its query surface.
//!
//! A [`DirectiveSet`] is built once, before generation starts, and then
//! only read. Generation loops query it for every class, method overload,
//! and parameter of the API surface, so every lookup is a plain hash probe
//! with no locking and no lazy work.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use molwrap_core::{Error, Result, UnitExpr};
use molwrap_surface::MethodDescription;

use crate::schema::{
    self, DirectiveFile, DocStringEntry, NoOutputSection, PositionSection, RawPositionEntry,
    RawUnitEntry, SkipSection, UnitSection,
};

/// Class name that makes a unit annotation apply to every class declaring
/// the method, unless an exact entry shadows it.
pub const WILDCARD_CLASS: &str = "*";

/// Directive table for the MolCore public API, embedded at compile time.
const BUILTIN_TABLE: &str = include_str!("../data/molcore_directives.toml");

/// Which level of skip rule matched a method overload.
///
/// Levels are listed from most to least specific. [`DirectiveSet::skip_match`]
/// always reports the most specific rule that applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipMatch {
    /// A `[Class, method, arity]` rule matched this exact overload.
    Overload,
    /// A `[Class, method]` rule matched every overload of the method.
    Method,
    /// A class-wide rule excludes the whole class from wrapping.
    Class,
}

/// Unit annotations for one method: a slot for the return value and one
/// slot per input parameter.
///
/// `None` in a slot means the value is documented as unitless (a count, a
/// name, an index). A method with no [`UnitSpec`] at all has simply not
/// been annotated yet; the two cases are distinct on purpose, so coverage
/// tooling can tell "checked and unitless" from "never reviewed".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSpec {
    /// Unit of the wrapped return value.
    pub returns: Option<UnitExpr>,
    /// Unit of each input parameter, in declaration order.
    pub params: Vec<Option<UnitExpr>>,
}

impl UnitSpec {
    /// Creates a spec from a return slot and parameter slots.
    #[must_use]
    pub const fn new(returns: Option<UnitExpr>, params: Vec<Option<UnitExpr>>) -> Self {
        Self { returns, params }
    }

    /// Spec for a method reviewed and found to carry no units anywhere.
    #[must_use]
    pub const fn unitless() -> Self {
        Self {
            returns: None,
            params: Vec::new(),
        }
    }

    /// Number of parameter slots.
    #[must_use]
    pub fn param_arity(&self) -> usize {
        self.params.len()
    }

    /// Unit of the parameter at `position`, if annotated.
    #[must_use]
    pub fn param(&self, position: usize) -> Option<&UnitExpr> {
        self.params.get(position).and_then(Option::as_ref)
    }

    /// Returns `true` if no slot carries a unit.
    #[must_use]
    pub fn is_unitless(&self) -> bool {
        self.returns.is_none() && self.params.iter().all(Option::is_none)
    }
}

/// Static wrapping directives for one native library.
///
/// The table answers, per class, method, overload, or parameter, the
/// questions a generator cannot answer from the API surface alone: what to
/// skip, which reference parameters are real inputs, where ownership moves
/// across the boundary, which doc strings to replace, and which physical
/// units values carry.
///
/// Directive tables are loaded from TOML ([`DirectiveSet::builtin`],
/// [`DirectiveSet::from_file`]) or assembled in code
/// ([`DirectiveSet::builder`]). Once built, a table is immutable and can be
/// shared freely across generator threads.
///
/// # Examples
///
/// ```
/// use molwrap_directives::DirectiveSet;
///
/// let set = DirectiveSet::builtin().unwrap();
///
/// // Vec3 has handwritten wrappers, so the whole class is skipped.
/// assert!(set.should_skip("Vec3", "Vec3", 3));
///
/// // System::addForce takes its force on position 0 and keeps it.
/// assert_eq!(set.ownership_transfer_positions("System", "addForce"), &[0]);
///
/// // Every getTemperature in the API returns kelvin.
/// let spec = set.units_for("AndersenThermostat", "getTemperature").unwrap();
/// assert_eq!(spec.returns.as_ref().unwrap().as_str(), "unit.kelvin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveSet {
    version: String,
    missing_base_classes: HashMap<String, String>,
    doc_strings: HashMap<(String, String), String>,
    skip_classes: HashSet<String>,
    skip_methods: HashSet<(String, String)>,
    skip_overloads: HashSet<(String, String, usize)>,
    no_output_args: HashSet<(String, String, String)>,
    ownership_transfers: HashMap<(String, String), Vec<usize>>,
    ordered_sets: HashMap<(String, String), Vec<usize>>,
    class_units: HashMap<(String, String), UnitSpec>,
    wildcard_units: HashMap<String, UnitSpec>,
}

impl Default for DirectiveSet {
    fn default() -> Self {
        Self {
            version: schema::DEFAULT_VERSION.to_string(),
            missing_base_classes: HashMap::new(),
            doc_strings: HashMap::new(),
            skip_classes: HashSet::new(),
            skip_methods: HashSet::new(),
            skip_overloads: HashSet::new(),
            no_output_args: HashSet::new(),
            ownership_transfers: HashMap::new(),
            ordered_sets: HashMap::new(),
            class_units: HashMap::new(),
            wildcard_units: HashMap::new(),
        }
    }
}

impl DirectiveSet {
    /// Loads the built-in directive table for the MolCore public API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] or [`Error::MalformedDirective`] if the
    /// embedded table is invalid, which indicates a packaging defect.
    pub fn builtin() -> Result<Self> {
        let set = Self::from_toml_str(BUILTIN_TABLE)?;
        tracing::debug!("loaded built-in directive table v{}", set.version());
        Ok(set)
    }

    /// Parses and compiles a directive table from TOML text.
    ///
    /// Compilation is strict: duplicate entries, blank names, empty
    /// position lists, and whitespace-only unit expressions are all
    /// rejected with the offending key named in the error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the text is not valid TOML for the
    /// directive schema, and [`Error::MalformedDirective`] if an entry
    /// fails a structural check.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: DirectiveFile = toml::from_str(text).map_err(|e| Error::Parse {
            message: format!("invalid directive table TOML: {e}"),
            source: Some(Box::new(e)),
        })?;
        let set = Self::compile(file)?;
        tracing::debug!(
            "compiled directive table: {} skip rules, {} doc strings, {} unit annotations",
            set.skip_rule_count(),
            set.doc_string_count(),
            set.unit_rule_count()
        );
        Ok(set)
    }

    /// Reads and compiles a directive table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the file cannot be read, plus every
    /// error [`DirectiveSet::from_toml_str`] can produce.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_toml_str(&text)?;
        tracing::debug!("loaded directive table from {}", path.display());
        Ok(set)
    }

    /// Renders the table as TOML.
    ///
    /// Output is deterministic: entries are sorted by class, method, and
    /// overload arity, so two equal tables always render identically and
    /// saved files diff cleanly under version control.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if TOML rendering fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&self.decompile()).map_err(|e| Error::Serialize {
            message: format!("failed to render directive table as TOML: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Writes the table to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if rendering fails and [`Error::Write`]
    /// if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_toml_string()?;
        fs::write(path, text).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("saved directive table to {}", path.display());
        Ok(())
    }

    /// Starts building a table in code.
    ///
    /// Used by tests and by tooling that assembles directives from sources
    /// other than a TOML file.
    #[must_use]
    pub fn builder() -> DirectiveSetBuilder {
        DirectiveSetBuilder::default()
    }

    /// Table format version, `"1.0"` unless the source file says otherwise.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Reports the most specific skip rule covering this overload, if any.
    ///
    /// Overload rules match on exact parameter count, method rules on the
    /// class and method name, class rules on the class alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use molwrap_directives::{DirectiveSet, SkipMatch};
    ///
    /// let set = DirectiveSet::builder()
    ///     .skip_class("Vec3")
    ///     .skip_method("Context", "getIntegrator")
    ///     .skip_overload("LocalCoordinatesSite", "getOriginWeights", 0)
    ///     .build();
    ///
    /// assert_eq!(set.skip_match("Vec3", "get", 1), Some(SkipMatch::Class));
    /// assert_eq!(
    ///     set.skip_match("Context", "getIntegrator", 0),
    ///     Some(SkipMatch::Method)
    /// );
    /// assert_eq!(
    ///     set.skip_match("LocalCoordinatesSite", "getOriginWeights", 0),
    ///     Some(SkipMatch::Overload)
    /// );
    /// assert_eq!(set.skip_match("LocalCoordinatesSite", "getOriginWeights", 1), None);
    /// ```
    #[must_use]
    pub fn skip_match(&self, class: &str, method: &str, arity: usize) -> Option<SkipMatch> {
        if self
            .skip_overloads
            .contains(&(class.to_owned(), method.to_owned(), arity))
        {
            return Some(SkipMatch::Overload);
        }
        if self
            .skip_methods
            .contains(&(class.to_owned(), method.to_owned()))
        {
            return Some(SkipMatch::Method);
        }
        if self.skip_classes.contains(class) {
            return Some(SkipMatch::Class);
        }
        None
    }

    /// Returns `true` if any skip rule covers this overload.
    #[must_use]
    pub fn should_skip(&self, class: &str, method: &str, arity: usize) -> bool {
        self.skip_match(class, method, arity).is_some()
    }

    /// Replacement doc string for a wrapped method, if one is registered.
    ///
    /// Returns `None` for every method without an override; the generator
    /// then keeps the text extracted from the native documentation.
    #[must_use]
    pub fn doc_string(&self, class: &str, method: &str) -> Option<&str> {
        self.doc_strings
            .get(&method_key(class, method))
            .map(String::as_str)
    }

    /// Decides whether a parameter is an output argument.
    ///
    /// The generator's convention is that a non-const reference parameter
    /// is an output: it is dropped from the wrapper's input list and its
    /// final value is appended to the return tuple. Parameters registered
    /// here are exceptions that stay ordinary inputs, typically mutable
    /// handles like a `context` the native call updates in place.
    ///
    /// `is_non_const_reference` comes from the API surface; passing
    /// `false` always yields `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use molwrap_directives::DirectiveSet;
    ///
    /// let set = DirectiveSet::builder()
    ///     .no_output_arg("LocalEnergyMinimizer", "minimize", "context")
    ///     .build();
    ///
    /// // Registered exception: stays an input.
    /// assert!(!set.is_output_argument("LocalEnergyMinimizer", "minimize", "context", true));
    /// // Unregistered non-const reference: output by convention.
    /// assert!(set.is_output_argument("State", "getPeriodicBoxVectors", "a", true));
    /// // Not a non-const reference: never an output.
    /// assert!(!set.is_output_argument("System", "addParticle", "mass", false));
    /// ```
    #[must_use]
    pub fn is_output_argument(
        &self,
        class: &str,
        method: &str,
        parameter: &str,
        is_non_const_reference: bool,
    ) -> bool {
        is_non_const_reference
            && !self.no_output_args.contains(&(
                class.to_owned(),
                method.to_owned(),
                parameter.to_owned(),
            ))
    }

    /// Parameter positions whose arguments the native call takes ownership
    /// of, in the order they were declared in the table.
    ///
    /// The wrapper emitted for such a method must mark those arguments so
    /// the managed runtime stops deleting them. Methods without an entry
    /// return an empty slice.
    #[must_use]
    pub fn ownership_transfer_positions(&self, class: &str, method: &str) -> &[usize] {
        self.ownership_transfers
            .get(&method_key(class, method))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if the parameter at `position` must preserve caller
    /// iteration order when converted to a native set.
    ///
    /// # Examples
    ///
    /// ```
    /// use molwrap_directives::DirectiveSet;
    ///
    /// let set = DirectiveSet::builder()
    ///     .require_ordered_set("CustomNonbondedForce", "addInteractionGroup", [0, 1])
    ///     .build();
    ///
    /// assert!(set.requires_ordered_set("CustomNonbondedForce", "addInteractionGroup", 0));
    /// assert!(set.requires_ordered_set("CustomNonbondedForce", "addInteractionGroup", 1));
    /// assert!(!set.requires_ordered_set("CustomNonbondedForce", "addInteractionGroup", 2));
    /// assert!(!set.requires_ordered_set("CustomBondForce", "addBond", 0));
    /// ```
    #[must_use]
    pub fn requires_ordered_set(&self, class: &str, method: &str, position: usize) -> bool {
        self.ordered_sets
            .get(&method_key(class, method))
            .is_some_and(|positions| positions.contains(&position))
    }

    /// Unit annotations for a method, if any apply.
    ///
    /// An exact `(class, method)` entry wins; otherwise a `"*"` wildcard
    /// entry for the method name applies. An exact entry with no units
    /// deliberately shadows a wildcard, which is how unitless outliers of
    /// an otherwise uniform getter family are expressed.
    ///
    /// # Examples
    ///
    /// ```
    /// use molwrap_core::UnitExpr;
    /// use molwrap_directives::{DirectiveSet, UnitSpec};
    ///
    /// let kelvin = UnitSpec::new(Some(UnitExpr::new("unit.kelvin").unwrap()), vec![]);
    /// let set = DirectiveSet::builder()
    ///     .wildcard_units("getTemperature", kelvin)
    ///     .units("FakeReporter", "getTemperature", UnitSpec::unitless())
    ///     .build();
    ///
    /// // Wildcard applies to any class declaring the method.
    /// assert!(set.units_for("AndersenThermostat", "getTemperature").is_some());
    /// // The exact unitless entry shadows the wildcard.
    /// assert!(set.units_for("FakeReporter", "getTemperature").unwrap().is_unitless());
    /// // No annotation at all.
    /// assert!(set.units_for("AndersenThermostat", "getRandomNumberSeed").is_none());
    /// ```
    #[must_use]
    pub fn units_for(&self, class: &str, method: &str) -> Option<&UnitSpec> {
        self.class_units
            .get(&method_key(class, method))
            .or_else(|| self.wildcard_units.get(method))
    }

    /// Replacement base class for one the extractor could not resolve.
    ///
    /// Classes with roots outside the wrapped library (exception types,
    /// mostly) are registered here so the generated hierarchy still has a
    /// parent to hang them on.
    #[must_use]
    pub fn base_class_override(&self, class: &str) -> Option<&str> {
        self.missing_base_classes.get(class).map(String::as_str)
    }

    /// Number of input parameters an overload presents to wrapper callers,
    /// after output arguments are dropped.
    ///
    /// This is the arity a [`UnitSpec`]'s parameter slots line up with.
    ///
    /// # Examples
    ///
    /// ```
    /// use molwrap_directives::DirectiveSet;
    /// use molwrap_surface::{MethodDescription, ParameterDescription};
    ///
    /// let overload = MethodDescription {
    ///     name: "getPeriodicBoxVectors".into(),
    ///     return_type: "void".to_string(),
    ///     parameters: vec![ParameterDescription {
    ///         name: "a".to_string(),
    ///         type_name: "Vec3".to_string(),
    ///         is_reference: true,
    ///         is_const: false,
    ///     }],
    /// };
    ///
    /// let set = DirectiveSet::builder().build();
    /// // The lone non-const reference is an output, so no inputs remain.
    /// assert_eq!(set.input_arity("State", &overload), 0);
    /// ```
    #[must_use]
    pub fn input_arity(&self, class: &str, method: &MethodDescription) -> usize {
        method
            .parameters
            .iter()
            .filter(|p| {
                !self.is_output_argument(
                    class,
                    method.name.as_str(),
                    &p.name,
                    p.is_non_const_reference(),
                )
            })
            .count()
    }

    /// Total number of skip rules across all three levels.
    #[must_use]
    pub fn skip_rule_count(&self) -> usize {
        self.skip_classes.len() + self.skip_methods.len() + self.skip_overloads.len()
    }

    /// Number of doc string overrides.
    #[must_use]
    pub fn doc_string_count(&self) -> usize {
        self.doc_strings.len()
    }

    /// Number of unit annotations, wildcard rows included.
    #[must_use]
    pub fn unit_rule_count(&self) -> usize {
        self.class_units.len() + self.wildcard_units.len()
    }

    /// Returns `true` if the table holds no directives of any kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_base_classes.is_empty()
            && self.doc_strings.is_empty()
            && self.skip_classes.is_empty()
            && self.skip_methods.is_empty()
            && self.skip_overloads.is_empty()
            && self.no_output_args.is_empty()
            && self.ownership_transfers.is_empty()
            && self.ordered_sets.is_empty()
            && self.class_units.is_empty()
            && self.wildcard_units.is_empty()
    }

    pub(crate) fn class_unit_entry(&self, class: &str, method: &str) -> Option<&UnitSpec> {
        self.class_units.get(&method_key(class, method))
    }

    pub(crate) fn iter_missing_base_classes(&self) -> impl Iterator<Item = (&String, &String)> {
        self.missing_base_classes.iter()
    }

    pub(crate) fn iter_doc_strings(&self) -> impl Iterator<Item = &(String, String)> {
        self.doc_strings.keys()
    }

    pub(crate) fn iter_skip_classes(&self) -> impl Iterator<Item = &String> {
        self.skip_classes.iter()
    }

    pub(crate) fn iter_skip_methods(&self) -> impl Iterator<Item = &(String, String)> {
        self.skip_methods.iter()
    }

    pub(crate) fn iter_skip_overloads(&self) -> impl Iterator<Item = &(String, String, usize)> {
        self.skip_overloads.iter()
    }

    pub(crate) fn iter_no_output_args(&self) -> impl Iterator<Item = &(String, String, String)> {
        self.no_output_args.iter()
    }

    pub(crate) fn iter_ownership_transfers(
        &self,
    ) -> impl Iterator<Item = (&(String, String), &Vec<usize>)> {
        self.ownership_transfers.iter()
    }

    pub(crate) fn iter_ordered_sets(
        &self,
    ) -> impl Iterator<Item = (&(String, String), &Vec<usize>)> {
        self.ordered_sets.iter()
    }

    pub(crate) fn iter_class_units(
        &self,
    ) -> impl Iterator<Item = (&(String, String), &UnitSpec)> {
        self.class_units.iter()
    }

    pub(crate) fn iter_wildcard_units(&self) -> impl Iterator<Item = (&String, &UnitSpec)> {
        self.wildcard_units.iter()
    }

    fn compile(file: DirectiveFile) -> Result<Self> {
        let mut set = Self {
            version: file.version,
            ..Self::default()
        };

        for (class, base) in file.missing_base_classes {
            require_nonblank(&class, "class name", &class)?;
            reject_wildcard(&class, &class)?;
            require_nonblank(&class, "replacement base class", &base)?;
            set.missing_base_classes.insert(class, base);
        }

        for entry in file.doc_strings {
            let key = method_key_text(&entry.class, &entry.method);
            require_nonblank(&key, "class name", &entry.class)?;
            require_nonblank(&key, "method name", &entry.method)?;
            reject_wildcard(&key, &entry.class)?;
            reject_wildcard(&key, &entry.method)?;
            require_nonblank(&key, "replacement doc string", &entry.text)?;
            if set
                .doc_strings
                .insert((entry.class, entry.method), entry.text)
                .is_some()
            {
                return Err(duplicate(key, "doc string override"));
            }
        }

        for class in file.skip.classes {
            require_nonblank(&class, "class name", &class)?;
            reject_wildcard(&class, &class)?;
            if !set.skip_classes.insert(class.clone()) {
                return Err(duplicate(class, "class skip rule"));
            }
        }

        for (class, method) in file.skip.methods {
            let key = method_key_text(&class, &method);
            require_nonblank(&key, "class name", &class)?;
            require_nonblank(&key, "method name", &method)?;
            reject_wildcard(&key, &class)?;
            reject_wildcard(&key, &method)?;
            if !set.skip_methods.insert((class, method)) {
                return Err(duplicate(key, "method skip rule"));
            }
        }

        for (class, method, arity) in file.skip.overloads {
            let key = format!("{class}.{method}/{arity}");
            require_nonblank(&key, "class name", &class)?;
            require_nonblank(&key, "method name", &method)?;
            reject_wildcard(&key, &class)?;
            reject_wildcard(&key, &method)?;
            if !set.skip_overloads.insert((class, method, arity)) {
                return Err(duplicate(key, "overload skip rule"));
            }
        }

        for (class, method, parameter) in file.no_output_args.args {
            let key = format!("{class}.{method}({parameter})");
            require_nonblank(&key, "class name", &class)?;
            require_nonblank(&key, "method name", &method)?;
            require_nonblank(&key, "parameter name", &parameter)?;
            reject_wildcard(&key, &class)?;
            reject_wildcard(&key, &method)?;
            if !set.no_output_args.insert((class, method, parameter)) {
                return Err(duplicate(key, "output argument exception"));
            }
        }

        set.ownership_transfers =
            compile_positions(file.ownership_transfers.entries, "ownership transfer")?;
        set.ordered_sets = compile_positions(file.ordered_sets.entries, "ordered set requirement")?;

        for (class, method, returns, params) in file.units.entries {
            let key = method_key_text(&class, &method);
            require_nonblank(&key, "method name", &method)?;
            reject_wildcard(&key, &method)?;
            let spec = compile_unit_spec(&key, &returns, params)?;
            if class == WILDCARD_CLASS {
                if set.wildcard_units.insert(method, spec).is_some() {
                    return Err(duplicate(key, "unit annotation"));
                }
            } else {
                require_nonblank(&key, "class name", &class)?;
                if set.class_units.insert((class, method), spec).is_some() {
                    return Err(duplicate(key, "unit annotation"));
                }
            }
        }

        Ok(set)
    }

    fn decompile(&self) -> DirectiveFile {
        let missing_base_classes: BTreeMap<String, String> = self
            .missing_base_classes
            .iter()
            .map(|(class, base)| (class.clone(), base.clone()))
            .collect();

        let mut doc_strings: Vec<DocStringEntry> = self
            .doc_strings
            .iter()
            .map(|((class, method), text)| DocStringEntry {
                class: class.clone(),
                method: method.clone(),
                text: text.clone(),
            })
            .collect();
        doc_strings.sort_by(|a, b| (&a.class, &a.method).cmp(&(&b.class, &b.method)));

        let mut classes: Vec<String> = self.skip_classes.iter().cloned().collect();
        classes.sort();
        let mut methods: Vec<(String, String)> = self.skip_methods.iter().cloned().collect();
        methods.sort();
        let mut overloads: Vec<(String, String, usize)> =
            self.skip_overloads.iter().cloned().collect();
        overloads.sort();

        let mut args: Vec<(String, String, String)> =
            self.no_output_args.iter().cloned().collect();
        args.sort();

        let mut unit_entries: Vec<RawUnitEntry> = self
            .class_units
            .iter()
            .map(|((class, method), spec)| raw_unit_entry(class, method, spec))
            .chain(
                self.wildcard_units
                    .iter()
                    .map(|(method, spec)| raw_unit_entry(WILDCARD_CLASS, method, spec)),
            )
            .collect();
        unit_entries.sort();

        DirectiveFile {
            version: self.version.clone(),
            missing_base_classes,
            doc_strings,
            skip: SkipSection {
                classes,
                methods,
                overloads,
            },
            no_output_args: NoOutputSection { args },
            ownership_transfers: PositionSection {
                entries: sorted_positions(&self.ownership_transfers),
            },
            ordered_sets: PositionSection {
                entries: sorted_positions(&self.ordered_sets),
            },
            units: UnitSection {
                entries: unit_entries,
            },
        }
    }
}

/// Incrementally assembles a [`DirectiveSet`] in code.
///
/// Insertion order never matters. Re-registering a key replaces the
/// earlier entry for map-shaped directives and is a no-op for set-shaped
/// ones, so the last word wins.
///
/// Inserts are held to the same structural rules the textual form is
/// parsed under, so every built table survives
/// [`DirectiveSet::to_toml_string`] and a strict reload. An insert naming
/// a blank class, method, or parameter registers nothing, as does `"*"`
/// anywhere it is not the wildcard class of a unit annotation; position
/// lists drop repeated positions, keeping declaration order.
///
/// # Examples
///
/// ```
/// use molwrap_directives::DirectiveSet;
///
/// let set = DirectiveSet::builder()
///     .skip_class("Vec3")
///     .base_class_override("MolCoreException", "std::exception")
///     .doc_string("Context", "setPositions", "setPositions(self, positions)")
///     .build();
///
/// assert_eq!(set.base_class_override("MolCoreException"), Some("std::exception"));
/// assert_eq!(set.doc_string("Context", "setPositions"), Some("setPositions(self, positions)"));
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct DirectiveSetBuilder {
    set: DirectiveSet,
}

impl DirectiveSetBuilder {
    /// Excludes an entire class from wrapping.
    pub fn skip_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if is_usable_name(&class) {
            self.set.skip_classes.insert(class);
        }
        self
    }

    /// Excludes every overload of one method from wrapping.
    pub fn skip_method(mut self, class: impl Into<String>, method: impl Into<String>) -> Self {
        let (class, method) = (class.into(), method.into());
        if is_usable_name(&class) && is_usable_name(&method) {
            self.set.skip_methods.insert((class, method));
        }
        self
    }

    /// Excludes the overload with exactly `arity` parameters from wrapping.
    pub fn skip_overload(
        mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        arity: usize,
    ) -> Self {
        let (class, method) = (class.into(), method.into());
        if is_usable_name(&class) && is_usable_name(&method) {
            self.set.skip_overloads.insert((class, method, arity));
        }
        self
    }

    /// Replaces the doc string emitted for a wrapped method.
    ///
    /// Blank replacement text registers nothing.
    pub fn doc_string(
        mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let (class, method, text) = (class.into(), method.into(), text.into());
        if is_usable_name(&class) && is_usable_name(&method) && !text.trim().is_empty() {
            self.set.doc_strings.insert((class, method), text);
        }
        self
    }

    /// Registers a non-const reference parameter that must stay an input.
    pub fn no_output_arg(
        mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        let (class, method, parameter) = (class.into(), method.into(), parameter.into());
        if is_usable_name(&class) && is_usable_name(&method) && !parameter.trim().is_empty() {
            self.set.no_output_args.insert((class, method, parameter));
        }
        self
    }

    /// Marks parameter positions whose arguments the native call consumes.
    ///
    /// Repeated positions collapse to their first occurrence; an empty
    /// position list is equivalent to no rule and registers nothing.
    pub fn transfer_ownership(
        mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        positions: impl IntoIterator<Item = usize>,
    ) -> Self {
        let (class, method) = (class.into(), method.into());
        let positions = dedup_positions(positions);
        if is_usable_name(&class) && is_usable_name(&method) && !positions.is_empty() {
            self.set.ownership_transfers.insert((class, method), positions);
        }
        self
    }

    /// Marks parameter positions that must preserve caller iteration order
    /// when converted to native sets.
    ///
    /// Repeated positions collapse to their first occurrence; an empty
    /// position list is equivalent to no rule and registers nothing.
    pub fn require_ordered_set(
        mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        positions: impl IntoIterator<Item = usize>,
    ) -> Self {
        let (class, method) = (class.into(), method.into());
        let positions = dedup_positions(positions);
        if is_usable_name(&class) && is_usable_name(&method) && !positions.is_empty() {
            self.set.ordered_sets.insert((class, method), positions);
        }
        self
    }

    /// Attaches unit annotations to one method of one class.
    ///
    /// Passing [`WILDCARD_CLASS`] as the class registers a wildcard rule,
    /// exactly as a `"*"` row in the textual form does.
    pub fn units(
        mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        spec: UnitSpec,
    ) -> Self {
        let (class, method) = (class.into(), method.into());
        if is_usable_name(&method) {
            if class == WILDCARD_CLASS {
                self.set.wildcard_units.insert(method, spec);
            } else if !class.trim().is_empty() {
                self.set.class_units.insert((class, method), spec);
            }
        }
        self
    }

    /// Attaches unit annotations to every class declaring the method,
    /// unless an exact entry shadows the wildcard.
    pub fn wildcard_units(mut self, method: impl Into<String>, spec: UnitSpec) -> Self {
        let method = method.into();
        if is_usable_name(&method) {
            self.set.wildcard_units.insert(method, spec);
        }
        self
    }

    /// Maps a class whose base the extractor cannot see to a replacement
    /// base class.
    pub fn base_class_override(
        mut self,
        class: impl Into<String>,
        base: impl Into<String>,
    ) -> Self {
        let (class, base) = (class.into(), base.into());
        if is_usable_name(&class) && !base.trim().is_empty() {
            self.set.missing_base_classes.insert(class, base);
        }
        self
    }

    /// Finishes building and returns the immutable table.
    #[must_use]
    pub fn build(self) -> DirectiveSet {
        self.set
    }
}

fn method_key(class: &str, method: &str) -> (String, String) {
    (class.to_owned(), method.to_owned())
}

fn method_key_text(class: &str, method: &str) -> String {
    format!("{class}.{method}")
}

fn duplicate(key: String, what: &str) -> Error {
    Error::MalformedDirective {
        key,
        reason: format!("duplicate {what}"),
    }
}

fn require_nonblank(key: &str, what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::MalformedDirective {
            key: key.to_string(),
            reason: format!("{what} must not be blank"),
        });
    }
    Ok(())
}

fn reject_wildcard(key: &str, name: &str) -> Result<()> {
    if name == WILDCARD_CLASS {
        return Err(Error::MalformedDirective {
            key: key.to_string(),
            reason: "\"*\" is only valid as the class of a unit annotation".to_string(),
        });
    }
    Ok(())
}

// Lenient counterparts of the loader checks, used by the builder: a name the
// loader would reject registers nothing instead of erroring.
fn is_usable_name(name: &str) -> bool {
    !name.trim().is_empty() && name != WILDCARD_CLASS
}

fn dedup_positions(positions: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let mut seen = HashSet::new();
    positions
        .into_iter()
        .filter(|position| seen.insert(*position))
        .collect()
}

fn compile_positions(
    entries: Vec<RawPositionEntry>,
    what: &str,
) -> Result<HashMap<(String, String), Vec<usize>>> {
    let mut table = HashMap::with_capacity(entries.len());
    for (class, method, positions) in entries {
        let key = method_key_text(&class, &method);
        require_nonblank(&key, "class name", &class)?;
        require_nonblank(&key, "method name", &method)?;
        reject_wildcard(&key, &class)?;
        reject_wildcard(&key, &method)?;
        if positions.is_empty() {
            return Err(Error::MalformedDirective {
                key,
                reason: format!("{what} must list at least one parameter position"),
            });
        }
        if has_duplicate_positions(&positions) {
            return Err(Error::MalformedDirective {
                key,
                reason: format!("{what} repeats a parameter position"),
            });
        }
        if table.insert((class, method), positions).is_some() {
            return Err(duplicate(key, what));
        }
    }
    Ok(table)
}

fn has_duplicate_positions(positions: &[usize]) -> bool {
    let mut seen = HashSet::with_capacity(positions.len());
    positions.iter().any(|p| !seen.insert(*p))
}

fn compile_unit_spec(key: &str, returns: &str, params: Vec<String>) -> Result<UnitSpec> {
    let returns = compile_unit_slot(key, "the return value", returns)?;
    let mut slots = Vec::with_capacity(params.len());
    for (index, slot) in params.iter().enumerate() {
        slots.push(compile_unit_slot(key, &format!("parameter {index}"), slot)?);
    }
    Ok(UnitSpec::new(returns, slots))
}

fn compile_unit_slot(key: &str, what: &str, slot: &str) -> Result<Option<UnitExpr>> {
    if slot.is_empty() {
        return Ok(None);
    }
    UnitExpr::new(slot).map(Some).map_err(|_| Error::MalformedDirective {
        key: key.to_string(),
        reason: format!("blank unit expression for {what} (use \"\" for a unitless slot)"),
    })
}

fn raw_unit_entry(class: &str, method: &str, spec: &UnitSpec) -> RawUnitEntry {
    (
        class.to_owned(),
        method.to_owned(),
        raw_slot(spec.returns.as_ref()),
        spec.params.iter().map(|slot| raw_slot(slot.as_ref())).collect(),
    )
}

fn raw_slot(slot: Option<&UnitExpr>) -> String {
    slot.map_or_else(String::new, |unit| unit.as_str().to_string())
}

fn sorted_positions(table: &HashMap<(String, String), Vec<usize>>) -> Vec<RawPositionEntry> {
    let mut entries: Vec<RawPositionEntry> = table
        .iter()
        .map(|((class, method), positions)| (class.clone(), method.clone(), positions.clone()))
        .collect();
    entries.sort();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = "1.0"

[missing-base-classes]
MolCoreException = "std::exception"

[[doc-strings]]
class = "Context"
method = "setPositions"
text = "setPositions(self, positions)"

[skip]
classes = ["Vec3"]
methods = [["Context", "getIntegrator"]]
overloads = [["LocalCoordinatesSite", "getOriginWeights", 0]]

[no-output-args]
args = [["LocalEnergyMinimizer", "minimize", "context"]]

[ownership-transfers]
entries = [["System", "addForce", [0]], ["System", "setVirtualSite", [1]]]

[ordered-sets]
entries = [["CustomNonbondedForce", "addInteractionGroup", [0, 1]]]

[units]
entries = [
    ["*", "getTemperature", "unit.kelvin", []],
    ["Context", "getParameter", "", []],
    ["System", "addParticle", "", ["unit.amu"]],
]
"#;

    fn sample() -> DirectiveSet {
        DirectiveSet::from_toml_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_skip_precedence_reports_most_specific_level() {
        let set = sample();
        assert_eq!(
            set.skip_match("LocalCoordinatesSite", "getOriginWeights", 0),
            Some(SkipMatch::Overload)
        );
        assert_eq!(
            set.skip_match("LocalCoordinatesSite", "getOriginWeights", 1),
            None
        );
        assert_eq!(
            set.skip_match("Context", "getIntegrator", 0),
            Some(SkipMatch::Method)
        );
        assert_eq!(
            set.skip_match("Context", "getIntegrator", 4),
            Some(SkipMatch::Method)
        );
        assert_eq!(set.skip_match("Vec3", "Vec3", 3), Some(SkipMatch::Class));
    }

    #[test]
    fn test_unknown_keys_fall_back_to_defaults() {
        let set = sample();
        assert!(!set.should_skip("NonexistentClass", "method", 0));
        assert_eq!(set.doc_string("NonexistentClass", "method"), None);
        assert_eq!(
            set.ownership_transfer_positions("NonexistentClass", "method"),
            &[] as &[usize]
        );
        assert!(!set.requires_ordered_set("NonexistentClass", "method", 0));
        assert!(set.units_for("NonexistentClass", "method").is_none());
        assert_eq!(set.base_class_override("NonexistentClass"), None);
    }

    #[test]
    fn test_doc_string_lookup() {
        let set = sample();
        assert_eq!(
            set.doc_string("Context", "setPositions"),
            Some("setPositions(self, positions)")
        );
        assert_eq!(set.doc_string("Context", "setVelocities"), None);
    }

    #[test]
    fn test_output_argument_exception() {
        let set = sample();
        assert!(!set.is_output_argument("LocalEnergyMinimizer", "minimize", "context", true));
        assert!(set.is_output_argument("LocalEnergyMinimizer", "minimize", "other", true));
        assert!(!set.is_output_argument("LocalEnergyMinimizer", "minimize", "context", false));
    }

    #[test]
    fn test_ownership_positions_keep_declared_order() {
        let set = DirectiveSet::builder()
            .transfer_ownership("Widget", "adopt", [2, 0])
            .build();
        assert_eq!(set.ownership_transfer_positions("Widget", "adopt"), &[2, 0]);
    }

    #[test]
    fn test_exact_unit_entry_shadows_wildcard() {
        let set = sample();
        let wildcard = set.units_for("AndersenThermostat", "getTemperature").unwrap();
        assert_eq!(wildcard.returns.as_ref().unwrap().as_str(), "unit.kelvin");

        // Context.getParameter is explicitly unitless, distinct from absent.
        let exact = set.units_for("Context", "getParameter").unwrap();
        assert!(exact.is_unitless());
        assert!(set.units_for("Context", "getState").is_none());
    }

    #[test]
    fn test_unit_spec_param_slots() {
        let set = sample();
        let spec = set.units_for("System", "addParticle").unwrap();
        assert_eq!(spec.param_arity(), 1);
        assert!(spec.returns.is_none());
        assert_eq!(spec.param(0).unwrap().as_str(), "unit.amu");
        assert_eq!(spec.param(1), None);
        assert!(!spec.is_unitless());
    }

    #[test]
    fn test_counts_and_version() {
        let set = sample();
        assert_eq!(set.version(), "1.0");
        assert_eq!(set.skip_rule_count(), 3);
        assert_eq!(set.doc_string_count(), 1);
        assert_eq!(set.unit_rule_count(), 3);
        assert!(!set.is_empty());
        assert!(DirectiveSet::builder().build().is_empty());
    }

    #[test]
    fn test_version_defaults_when_missing() {
        let set = DirectiveSet::from_toml_str("[skip]\nclasses = [\"Vec3\"]\n").unwrap();
        assert_eq!(set.version(), "1.0");
    }

    #[test]
    fn test_rejects_duplicate_method_skip_rule() {
        let err = DirectiveSet::from_toml_str(
            "[skip]\nmethods = [[\"State\", \"getPositions\"], [\"State\", \"getPositions\"]]\n",
        )
        .unwrap_err();
        assert!(err.is_malformed_directive());
        assert!(err.to_string().contains("State.getPositions"));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_rejects_duplicate_unit_annotation() {
        let err = DirectiveSet::from_toml_str(
            "[units]\nentries = [\n[\"*\", \"getTemperature\", \"unit.kelvin\", []],\n[\"*\", \"getTemperature\", \"unit.kelvin\", []],\n]\n",
        )
        .unwrap_err();
        assert!(err.is_malformed_directive());
        assert!(err.to_string().contains("*.getTemperature"));
    }

    #[test]
    fn test_rejects_blank_unit_expression_slot() {
        let err = DirectiveSet::from_toml_str(
            "[units]\nentries = [[\"System\", \"addParticle\", \"\", [\" \"]]]\n",
        )
        .unwrap_err();
        assert!(err.is_malformed_directive());
        assert!(err.to_string().contains("parameter 0"));
    }

    #[test]
    fn test_rejects_empty_position_list() {
        let err = DirectiveSet::from_toml_str(
            "[ownership-transfers]\nentries = [[\"System\", \"addForce\", []]]\n",
        )
        .unwrap_err();
        assert!(err.is_malformed_directive());
        assert!(err.to_string().contains("at least one parameter position"));
    }

    #[test]
    fn test_rejects_repeated_position() {
        let err = DirectiveSet::from_toml_str(
            "[ordered-sets]\nentries = [[\"CustomNonbondedForce\", \"addInteractionGroup\", [0, 0]]]\n",
        )
        .unwrap_err();
        assert!(err.is_malformed_directive());
        assert!(err.to_string().contains("repeats"));
    }

    #[test]
    fn test_rejects_wildcard_outside_units() {
        let err =
            DirectiveSet::from_toml_str("[skip]\nclasses = [\"*\"]\n").unwrap_err();
        assert!(err.is_malformed_directive());
    }

    #[test]
    fn test_rejects_unknown_sections() {
        let err = DirectiveSet::from_toml_str("[bogus]\nentries = []\n").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_rejects_invalid_toml_text() {
        let err = DirectiveSet::from_toml_str("not toml at all [").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_render_is_deterministic_across_insertion_order() {
        let forward = DirectiveSet::builder()
            .skip_class("Alpha")
            .skip_class("Beta")
            .units("System", "addParticle", UnitSpec::unitless())
            .wildcard_units("getTemperature", UnitSpec::unitless())
            .build();
        let reverse = DirectiveSet::builder()
            .wildcard_units("getTemperature", UnitSpec::unitless())
            .units("System", "addParticle", UnitSpec::unitless())
            .skip_class("Beta")
            .skip_class("Alpha")
            .build();

        assert_eq!(forward, reverse);
        assert_eq!(
            forward.to_toml_string().unwrap(),
            reverse.to_toml_string().unwrap()
        );
    }

    #[test]
    fn test_toml_round_trip_preserves_table() {
        let set = sample();
        let text = set.to_toml_string().unwrap();
        let back = DirectiveSet::from_toml_str(&text).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_builder_last_entry_wins() {
        let set = DirectiveSet::builder()
            .doc_string("Context", "setPositions", "old")
            .doc_string("Context", "setPositions", "new")
            .transfer_ownership("System", "addForce", [1])
            .transfer_ownership("System", "addForce", [0])
            .build();
        assert_eq!(set.doc_string("Context", "setPositions"), Some("new"));
        assert_eq!(set.ownership_transfer_positions("System", "addForce"), &[0]);
    }

    #[test]
    fn test_builder_ignores_empty_position_lists() {
        let set = DirectiveSet::builder()
            .transfer_ownership("System", "addForce", [])
            .require_ordered_set("CustomNonbondedForce", "addInteractionGroup", [])
            .build();
        assert!(set.is_empty());
    }

    #[test]
    fn test_builder_drops_repeated_positions() {
        let set = DirectiveSet::builder()
            .transfer_ownership("System", "addForce", [0, 0])
            .transfer_ownership("System", "setVirtualSite", [1, 0, 1])
            .require_ordered_set("CustomNonbondedForce", "addInteractionGroup", [0, 1, 0])
            .build();

        assert_eq!(set.ownership_transfer_positions("System", "addForce"), &[0]);
        // first occurrence wins, declaration order kept
        assert_eq!(
            set.ownership_transfer_positions("System", "setVirtualSite"),
            &[1, 0]
        );
        assert!(set.requires_ordered_set("CustomNonbondedForce", "addInteractionGroup", 0));
        assert!(set.requires_ordered_set("CustomNonbondedForce", "addInteractionGroup", 1));
        assert!(!set.requires_ordered_set("CustomNonbondedForce", "addInteractionGroup", 2));

        // the strict loader accepts everything the builder produced
        let text = set.to_toml_string().unwrap();
        assert_eq!(DirectiveSet::from_toml_str(&text).unwrap(), set);
    }

    #[test]
    fn test_builder_ignores_blank_and_wildcard_names() {
        let set = DirectiveSet::builder()
            .skip_class("  ")
            .skip_class(WILDCARD_CLASS)
            .skip_method(WILDCARD_CLASS, "getTime")
            .skip_overload("", "getTime", 1)
            .doc_string("Context", "setPositions", "   ")
            .no_output_arg("LocalEnergyMinimizer", "", "context")
            .transfer_ownership(WILDCARD_CLASS, "addForce", [0])
            .require_ordered_set("CustomNonbondedForce", "  ", [0])
            .units("Context", "", UnitSpec::unitless())
            .wildcard_units(WILDCARD_CLASS, UnitSpec::unitless())
            .base_class_override(WILDCARD_CLASS, "std::exception")
            .base_class_override("MolCoreException", " ")
            .build();

        assert!(set.is_empty());
    }

    #[test]
    fn test_builder_wildcard_class_registers_wildcard_units() {
        let kelvin = UnitSpec::new(Some(UnitExpr::new("unit.kelvin").unwrap()), vec![]);
        let set = DirectiveSet::builder()
            .units(WILDCARD_CLASS, "getTemperature", kelvin.clone())
            .build();

        assert_eq!(
            set.units_for("AndersenThermostat", "getTemperature"),
            Some(&kelvin)
        );

        let text = set.to_toml_string().unwrap();
        assert_eq!(DirectiveSet::from_toml_str(&text).unwrap(), set);
    }

    #[test]
    fn test_directive_set_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DirectiveSet>();
    }
}
