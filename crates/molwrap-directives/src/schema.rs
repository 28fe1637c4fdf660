//! On-disk form of a directive table.
//!
//! Directive files are TOML. Bulky homogeneous sections (skip rules, unit
//! annotations) are stored as compact arrays, one entry per line; sparse
//! entries with free text (doc string overrides) are arrays of tables.
//! These types mirror the file verbatim and stay stringly typed; all
//! interpretation and checking happens when the file is compiled into a
//! [`DirectiveSet`](crate::DirectiveSet).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Table format version written when a file does not carry one.
pub(crate) const DEFAULT_VERSION: &str = "1.0";

/// `[Class, method]` pair.
pub(crate) type RawMethodKey = (String, String);

/// `[Class, method, arity]` triple naming one overload.
pub(crate) type RawOverloadKey = (String, String, usize);

/// `[Class, method, parameter]` triple naming one parameter.
pub(crate) type RawArgKey = (String, String, String);

/// `[Class, method, [positions...]]` entry.
pub(crate) type RawPositionEntry = (String, String, Vec<usize>);

/// `[Class, method, return-slot, [parameter-slots...]]` entry.
///
/// A slot holds a unit expression, or `""` for a slot documented as
/// unitless.
pub(crate) type RawUnitEntry = (String, String, String, Vec<String>);

/// Root of a directive file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct DirectiveFile {
    #[serde(default = "default_version")]
    pub(crate) version: String,

    /// Class name -> replacement base class.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) missing_base_classes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) doc_strings: Vec<DocStringEntry>,

    #[serde(default, skip_serializing_if = "SkipSection::is_empty")]
    pub(crate) skip: SkipSection,

    #[serde(default, skip_serializing_if = "NoOutputSection::is_empty")]
    pub(crate) no_output_args: NoOutputSection,

    #[serde(default, skip_serializing_if = "PositionSection::is_empty")]
    pub(crate) ownership_transfers: PositionSection,

    #[serde(default, skip_serializing_if = "PositionSection::is_empty")]
    pub(crate) ordered_sets: PositionSection,

    #[serde(default, skip_serializing_if = "UnitSection::is_empty")]
    pub(crate) units: UnitSection,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Replacement doc string for one wrapped method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DocStringEntry {
    pub(crate) class: String,
    pub(crate) method: String,
    pub(crate) text: String,
}

/// Declarations excluded from wrapping, from coarse to fine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SkipSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) methods: Vec<RawMethodKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) overloads: Vec<RawOverloadKey>,
}

impl SkipSection {
    pub(crate) fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.methods.is_empty() && self.overloads.is_empty()
    }
}

/// Non-const reference parameters that must stay inputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NoOutputSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) args: Vec<RawArgKey>,
}

impl NoOutputSection {
    pub(crate) fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Parameter-position lists keyed by method, shared by the ownership
/// transfer and ordered set sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PositionSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) entries: Vec<RawPositionEntry>,
}

impl PositionSection {
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Unit annotations, including `"*"` wildcard rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct UnitSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) entries: Vec<RawUnitEntry>,
}

impl UnitSection {
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
