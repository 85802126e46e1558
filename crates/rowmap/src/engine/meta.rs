use super::Exec;
use rowmap_core::{
    property::PropertyPath,
    stmt::{Object, Type, Value},
    Error, Result,
};

/// Property access by dotted path.
///
/// Intermediate objects missing along the path are created through the
/// object factory, typed after the declaring model.
impl Exec<'_> {
    pub(super) fn get_property(&self, target: &Object, path: &str) -> Result<Value> {
        let path = PropertyPath::parse(path);

        let mut current = target.clone();
        for segment in path.parents() {
            match current.peek(segment) {
                Value::Object(next) => current = next,
                _ => return Ok(Value::Null),
            }
        }

        Ok(current.peek(path.leaf()))
    }

    pub(super) fn set_property(&self, target: &Object, path: &str, value: Value) -> Result<()> {
        let path = PropertyPath::parse(path);
        let owner = self.owner_of(target, &path, true)?;
        owner.set(path.leaf(), value);
        Ok(())
    }

    /// Appends `value` to the collection held by the property at `path`.
    pub(super) fn append_property(&self, target: &Object, path: &str, value: Value) -> Result<()> {
        let path = PropertyPath::parse(path);
        let owner = self.owner_of(target, &path, true)?;
        owner.append(path.leaf(), value)
    }

    /// Declared type of the property at `path`, when the models along the
    /// path declare it.
    pub(super) fn property_ty(&self, target: &Object, path: &str) -> Option<Type> {
        let path = PropertyPath::parse(path);
        let schema = self.schema();

        let mut model = schema.model(target.model())?;
        for segment in path.parents() {
            let ty = model.property_ty(segment)?;
            model = schema.model_for(ty)?;
        }

        model.property_ty(path.leaf()).cloned()
    }

    /// Returns `true` if the property at `path` cannot hold null.
    pub(super) fn is_primitive(&self, target: &Object, path: &str) -> bool {
        let path = PropertyPath::parse(path);
        let Ok(owner) = self.owner_of(target, &path, false) else {
            return false;
        };

        self.schema()
            .model(owner.model())
            .is_some_and(|model| !model.is_nullable(path.leaf()))
    }

    /// Object declaring the last segment of `path`.
    fn owner_of(&self, target: &Object, path: &PropertyPath, create: bool) -> Result<Object> {
        let mut current = target.clone();

        for segment in path.parents() {
            current = match current.peek(segment) {
                Value::Object(next) => next,
                Value::Null if create => {
                    let ty = self
                        .schema()
                        .model(current.model())
                        .and_then(|model| model.property_ty(segment))
                        .cloned()
                        .unwrap_or(Type::Map);

                    let Value::Object(next) = self.engine.factory.create(&ty)? else {
                        return Err(Error::invalid_mapping(format!(
                            "property `{segment}` of {} is not an object",
                            current.model()
                        )));
                    };

                    current.set(segment, next.clone());
                    next
                }
                other => {
                    return Err(Error::invalid_mapping(format!(
                        "cannot reach `{path}` through `{segment}` of {}, which holds {}",
                        current.model(),
                        other.type_name()
                    )))
                }
            };
        }

        Ok(current)
    }
}
