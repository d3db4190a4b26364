//! Metadata for the variables written by the pipeline
//!
//! Every persisted variable is described by a [`StaticVariableDefinition`] declared with
//! [`define_output_variable!`](crate::define_output_variable) and collected at link time
//! through `inventory`. The dataset writer looks definitions up by name to attach
//! `units`, `long_name` and `_FillValue` attributes, so stage code only deals with
//! names and arrays.
//!
//! # Looking up variables
//!
//! ```rust
//! use rsphen_core::variable::{lookup, StorageType};
//!
//! let var = lookup("day_spring1").unwrap();
//! assert_eq!(var.unit, "day of year");
//! assert_eq!(var.storage, StorageType::Integer);
//! assert!(var.fill);
//! ```

use serde::{Deserialize, Serialize};

/// On-disk element type of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    /// 64-bit floating point, missing values are `NaN` in memory
    Float,
    /// 32-bit integer, missing values are the fill value in memory
    Integer,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::Float => write!(f, "f64"),
            StorageType::Integer => write!(f, "i32"),
        }
    }
}

/// Owned description of a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Name of the variable in persisted files (e.g. `sst_climatology`)
    pub name: String,
    /// Value of the `units` attribute
    pub unit: String,
    /// Value of the `long_name` attribute
    pub description: String,
    pub storage: StorageType,
    /// Whether missing values are persisted as [`FILL_VALUE`](crate::calendar::FILL_VALUE)
    pub fill: bool,
}

/// Variable definition built from `&'static str` so it can live in a static
#[derive(Debug, Clone, Copy)]
pub struct StaticVariableDefinition {
    pub name: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
    pub storage: StorageType,
    pub fill: bool,
}

impl StaticVariableDefinition {
    pub const fn new(
        name: &'static str,
        unit: &'static str,
        description: &'static str,
        storage: StorageType,
        fill: bool,
    ) -> Self {
        Self {
            name,
            unit,
            description,
            storage,
            fill,
        }
    }

    pub fn to_variable_definition(&self) -> VariableDefinition {
        VariableDefinition {
            name: self.name.to_string(),
            unit: self.unit.to_string(),
            description: self.description.to_string(),
            storage: self.storage,
            fill: self.fill,
        }
    }
}

inventory::collect!(StaticVariableDefinition);

/// Declare a persisted variable and register it for [`lookup`]
///
/// ```rust
/// use rsphen_core::define_output_variable;
/// use rsphen_core::variable::StorageType;
///
/// define_output_variable!(
///     VAR_EXAMPLE_COUNT,
///     name = "example_count",
///     unit = "1",
///     description = "Number of examples",
///     storage = StorageType::Integer,
///     fill = false,
/// );
///
/// assert_eq!(VAR_EXAMPLE_COUNT.name, "example_count");
/// ```
#[macro_export]
macro_rules! define_output_variable {
    (
        $var_name:ident,
        name = $name:expr,
        unit = $unit:expr,
        description = $desc:expr,
        storage = $storage:expr,
        fill = $fill:expr $(,)?
    ) => {
        #[doc = concat!("Variable definition for `", $name, "`")]
        pub static $var_name: $crate::variable::StaticVariableDefinition =
            $crate::variable::StaticVariableDefinition::new($name, $unit, $desc, $storage, $fill);

        ::inventory::submit! { $var_name }
    };
}

pub use crate::define_output_variable;

/// Find a registered variable by name
pub fn lookup(name: &str) -> Option<VariableDefinition> {
    inventory::iter::<StaticVariableDefinition>
        .into_iter()
        .find(|var| var.name == name)
        .map(StaticVariableDefinition::to_variable_definition)
}

/// All registered variables, sorted by name
pub fn list_all() -> Vec<VariableDefinition> {
    let mut result: Vec<VariableDefinition> = inventory::iter::<StaticVariableDefinition>
        .into_iter()
        .map(StaticVariableDefinition::to_variable_definition)
        .collect();
    result.sort_by(|a, b| a.name.cmp(&b.name));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    define_output_variable!(
        VAR_TEST_ONLY,
        name = "test_only_variable",
        unit = "kg",
        description = "Registered from a test module",
        storage = StorageType::Float,
        fill = false,
    );

    #[test]
    fn macro_registers_variable() {
        assert_eq!(VAR_TEST_ONLY.unit, "kg");
        let var = lookup("test_only_variable").unwrap();
        assert_eq!(var.description, "Registered from a test module");
        assert_eq!(var.storage, StorageType::Float);
        assert!(!var.fill);
    }

    #[test]
    fn unknown_variable() {
        assert!(lookup("not_a_variable").is_none());
    }

    #[test]
    fn list_is_sorted_and_unique() {
        let names: Vec<String> = list_all().into_iter().map(|v| v.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn storage_display() {
        assert_eq!(StorageType::Float.to_string(), "f64");
        assert_eq!(StorageType::Integer.to_string(), "i32");
    }
}
