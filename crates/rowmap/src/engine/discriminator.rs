use super::{row_source::prepend_prefix, Exec, RowSource};
use rowmap_core::{
    schema::mapping::{Discriminator, ResultMap},
    stmt::Value,
    Error, Result,
};

use std::collections::HashSet;

impl<'a> Exec<'a> {
    /// Follows discriminators from `result_map` to the result map describing
    /// the current row.
    ///
    /// The chain stops at an unknown case or when it would move to a result
    /// map it already moved to. A cycle therefore ends on the last result map
    /// before the cycle repeats.
    pub(super) fn resolve_discriminated_result_map(
        &self,
        rsw: &RowSource<'a>,
        result_map: &'a ResultMap,
        prefix: Option<&str>,
    ) -> Result<&'a ResultMap> {
        let schema = self.schema();

        let mut visited = HashSet::new();
        let mut result_map = result_map;
        let mut discriminator = result_map.discriminator.as_ref();

        while let Some(current) = discriminator {
            let value = self.discriminator_value(rsw, current, prefix)?;
            let case = value.to_key_string().unwrap_or_else(|| "null".to_string());

            let Some(next) = current
                .map_id_for(&case)
                .and_then(|id| schema.find_result_map(id))
            else {
                break;
            };

            log::trace!(
                "discriminator of `{}` selected `{}` for value {case:?}",
                result_map.id,
                next.id
            );

            result_map = next;
            discriminator = result_map.discriminator.as_ref();

            if !visited.insert(result_map.id.as_str()) {
                break;
            }
        }

        Ok(result_map)
    }

    fn discriminator_value(
        &self,
        rsw: &RowSource<'a>,
        discriminator: &Discriminator,
        prefix: Option<&str>,
    ) -> Result<Value> {
        let binding = &discriminator.binding;
        let Some(column) = &binding.column else {
            return Err(Error::invalid_mapping("discriminator has no column"));
        };

        rsw.get_for(binding, &prepend_prefix(column, prefix))
    }
}
