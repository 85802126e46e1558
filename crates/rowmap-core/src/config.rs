use serde::Deserialize;

/// Engine-wide settings.
///
/// Every field has a default, so a partial document deserializes:
///
/// ```
/// let config: rowmap_core::Config =
///     serde_json::from_str(r#"{ "call_setters_on_nulls": true }"#).unwrap();
/// assert!(config.call_setters_on_nulls);
/// assert!(config.safe_row_bounds_enabled);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which rows get their unmapped columns bound automatically
    pub auto_mapping_behavior: AutoMappingBehavior,

    /// What happens when an automatically mapped column has no target
    pub auto_mapping_unknown_column_behavior: UnknownColumnBehavior,

    /// Lets `first_name` find a `firstName` property
    pub map_underscore_to_camel_case: bool,

    /// Invoke setters with null values for nullable properties
    pub call_setters_on_nulls: bool,

    /// Rows in which no column carried a value still produce an instance
    pub return_instance_for_empty_row: bool,

    /// Reject row windows when a result map has nested result maps
    pub safe_row_bounds_enabled: bool,

    /// Reject custom sinks when nested rows are not declared ordered
    pub safe_result_handler_enabled: bool,

    /// Nested queries that don't declare a fetch type load lazily
    pub lazy_loading_enabled: bool,

    /// Touching any property of a lazy object loads all of its properties
    pub aggressive_lazy_loading: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoMappingBehavior {
    /// Never map columns automatically
    None,

    /// Map columns automatically for rows without nested result maps
    #[default]
    Partial,

    /// Map columns automatically everywhere
    Full,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownColumnBehavior {
    /// Ignore the column
    #[default]
    None,

    /// Log a warning and ignore the column
    Warning,

    /// Fail with an unknown column error
    Failing,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            auto_mapping_behavior: AutoMappingBehavior::Partial,
            auto_mapping_unknown_column_behavior: UnknownColumnBehavior::None,
            map_underscore_to_camel_case: false,
            call_setters_on_nulls: false,
            return_instance_for_empty_row: false,
            safe_row_bounds_enabled: true,
            safe_result_handler_enabled: true,
            lazy_loading_enabled: false,
            aggressive_lazy_loading: false,
        }
    }
}
