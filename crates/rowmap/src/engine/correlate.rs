use super::{exec::PendingRelation, Exec, RowSource};
use rowmap_core::{
    schema::mapping::Binding,
    stmt::{CacheKey, Object, Value},
    Error, Result,
};

impl<'a> Exec<'a> {
    /// Records that `binding` of `target` receives its value from rows of a
    /// later result set whose foreign columns match this row.
    pub(super) fn add_pending_child_relation(
        &mut self,
        rsw: &RowSource<'a>,
        target: &Object,
        binding: &'a Binding,
    ) -> Result<()> {
        let Some(link) = &binding.result_set else {
            return Ok(());
        };

        let key = self.key_for_multiple_results(rsw, binding, &link.columns, &link.columns)?;
        log::trace!(
            "`{}` of {} waits for result set `{}` under {key}",
            binding.property_name(),
            target.model(),
            link.name
        );

        self.pending_relations
            .entry(key)
            .or_default()
            .push(PendingRelation {
                target: target.clone(),
                binding,
            });

        let previous = self.next_result_maps.get(&link.name).copied();
        match previous {
            None => {
                self.next_result_maps.insert(link.name.clone(), binding);
            }
            Some(previous) if std::ptr::eq(previous, binding) || *previous == *binding => {}
            Some(previous) => {
                return Err(Error::conflicting_result_set_binding(
                    &link.name,
                    previous.property_name(),
                    binding.property_name(),
                ));
            }
        }

        Ok(())
    }

    /// Links `row_value`, read from a later result set, into every object
    /// waiting for it through `parent`.
    pub(super) fn link_to_parents(
        &mut self,
        rsw: &RowSource<'a>,
        parent: &'a Binding,
        row_value: Value,
    ) -> Result<()> {
        let Some(link) = &parent.result_set else {
            return Ok(());
        };

        if row_value.is_null() {
            return Ok(());
        }

        let key = self.key_for_multiple_results(rsw, parent, &link.columns, &link.foreign_columns)?;

        let Some(pending) = self.pending_relations.get(&key) else {
            log::trace!("no object waits for {key} of result set `{}`", link.name);
            return Ok(());
        };

        for relation in pending {
            self.link_objects(&relation.target, relation.binding, row_value.clone())?;
        }

        Ok(())
    }

    /// Key correlating rows across result sets: the binding, then each
    /// non-null value of `columns` under the matching entry of `names`.
    fn key_for_multiple_results(
        &self,
        rsw: &RowSource<'a>,
        binding: &Binding,
        names: &[String],
        columns: &[String],
    ) -> Result<CacheKey> {
        let mut key = CacheKey::new();

        if let Some(link) = &binding.result_set {
            key.update(&link.name);
        }
        key.update(binding.property_name());

        for (name, column) in names.iter().zip(columns) {
            if let Some(value) = rsw.get_string(column)? {
                key.update(name);
                key.update(value);
            }
        }

        Ok(key)
    }
}
