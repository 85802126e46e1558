use super::{LazyLoad, Type, Value};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::{cell::RefCell, fmt, rc::Rc};

/// A materialized application object.
///
/// `Object` is a handle: cloning it yields another reference to the same
/// instance, and equality is identity. Properties are set through a shared
/// reference so the same instance can be linked from several parents (or
/// from itself) while it is still being assembled.
///
/// An object may carry a table of pending lazy loads. Reading a property with
/// [`Object::get`] first runs the loader registered for it, if any, and
/// caches the result in the property.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

struct ObjectInner {
    /// Model name, or `Map` for open property bags
    model: String,

    map: bool,

    fields: RefCell<IndexMap<String, Value>>,

    /// Set once the object is made lazy
    lazy: RefCell<Option<LazyState>>,
}

struct LazyState {
    loaders: IndexMap<String, Box<dyn LazyLoad>>,

    /// Arguments the object was constructed with
    constructor_args: Vec<(Type, Value)>,

    /// Reading any property loads every pending property
    aggressive: bool,
}

impl Object {
    /// Creates an empty instance of the named model.
    pub fn new(model: impl Into<String>) -> Object {
        Object::build(model.into(), false, IndexMap::new())
    }

    /// Creates an empty open property bag.
    pub fn map() -> Object {
        Object::build("Map".to_string(), true, IndexMap::new())
    }

    /// Creates an instance of the named model with the given properties.
    pub fn with_fields<K, V>(model: impl Into<String>, fields: impl IntoIterator<Item = (K, V)>) -> Object
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Object::build(
            model.into(),
            false,
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    fn build(model: String, map: bool, fields: IndexMap<String, Value>) -> Object {
        Object {
            inner: Rc::new(ObjectInner {
                model,
                map,
                fields: RefCell::new(fields),
                lazy: RefCell::new(None),
            }),
        }
    }

    pub fn model(&self) -> &str {
        &self.inner.model
    }

    pub fn is_map(&self) -> bool {
        self.inner.map
    }

    /// Returns `true` if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of the instance, stable for its lifetime.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    /// Reads a property, running its pending lazy load first.
    pub fn get(&self, name: &str) -> Result<Value> {
        if self.is_aggressive() {
            self.load_all()?;
        } else {
            self.load(name)?;
        }

        Ok(self.peek(name))
    }

    /// Reads a property without triggering lazy loads. Missing properties
    /// read as null.
    pub fn peek(&self, name: &str) -> Value {
        self.inner
            .fields
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.fields.borrow().contains_key(name)
    }

    /// Sets a property. A pending lazy load for the property is discarded.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();

        if let Some(lazy) = self.inner.lazy.borrow_mut().as_mut() {
            lazy.loaders.shift_remove(&name);
        }

        self.inner.fields.borrow_mut().insert(name, value.into());
    }

    /// Appends `value` to the list held by property `name`.
    pub fn append(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let mut fields = self.inner.fields.borrow_mut();

        match fields.get_mut(name) {
            Some(Value::List(items)) => {
                items.push(value.into());
                Ok(())
            }
            Some(other) => Err(Error::type_conversion(other, "List")),
            None => Err(Error::invalid_mapping(format!(
                "property `{name}` of {} holds no collection",
                self.inner.model
            ))),
        }
    }

    /// Property names in insertion order.
    pub fn field_names(&self) -> Vec<String> {
        self.inner.fields.borrow().keys().cloned().collect()
    }

    /// Makes the object lazy: loads registered afterwards with
    /// [`Object::add_loader`] run on first access.
    pub fn make_lazy(&self, constructor_args: Vec<(Type, Value)>, aggressive: bool) {
        let mut lazy = self.inner.lazy.borrow_mut();

        if lazy.is_none() {
            *lazy = Some(LazyState {
                loaders: IndexMap::new(),
                constructor_args,
                aggressive,
            });
        }
    }

    pub fn is_lazy(&self) -> bool {
        self.inner.lazy.borrow().is_some()
    }

    /// Registers a loader for `property`.
    ///
    /// An object that was not made lazy loads eagerly instead: the loader runs
    /// immediately and the property is set.
    pub fn add_loader(&self, property: impl Into<String>, loader: Box<dyn LazyLoad>) -> Result<()> {
        let property = property.into();

        {
            let mut lazy = self.inner.lazy.borrow_mut();
            if let Some(lazy) = lazy.as_mut() {
                lazy.loaders.insert(property, loader);
                return Ok(());
            }
        }

        let value = loader.load()?;
        self.set(property, value);
        Ok(())
    }

    /// Number of properties still waiting for their lazy load.
    pub fn pending_loads(&self) -> usize {
        self.inner
            .lazy
            .borrow()
            .as_ref()
            .map(|lazy| lazy.loaders.len())
            .unwrap_or(0)
    }

    pub fn has_pending_load(&self, property: &str) -> bool {
        self.inner
            .lazy
            .borrow()
            .as_ref()
            .is_some_and(|lazy| lazy.loaders.contains_key(property))
    }

    /// Arguments the object was constructed with, kept so an equivalent
    /// instance can be rebuilt. Empty unless the object is lazy.
    pub fn constructor_args(&self) -> Vec<(Type, Value)> {
        self.inner
            .lazy
            .borrow()
            .as_ref()
            .map(|lazy| lazy.constructor_args.clone())
            .unwrap_or_default()
    }

    /// Runs every pending lazy load.
    pub fn load_all(&self) -> Result<()> {
        let pending: Vec<String> = match self.inner.lazy.borrow().as_ref() {
            Some(lazy) => lazy.loaders.keys().cloned().collect(),
            None => return Ok(()),
        };

        for property in pending {
            self.load(&property)?;
        }

        Ok(())
    }

    fn load(&self, property: &str) -> Result<()> {
        // The loader is taken out before running so that it may freely read
        // or write this object.
        let loader = match self.inner.lazy.borrow_mut().as_mut() {
            Some(lazy) => lazy.loaders.shift_remove(property),
            None => None,
        };

        let Some(loader) = loader else {
            return Ok(());
        };

        log::trace!("lazy loading `{}.{property}`", self.inner.model);

        match loader.load() {
            Ok(value) => {
                self.inner
                    .fields
                    .borrow_mut()
                    .insert(property.to_string(), value);
                Ok(())
            }
            Err(err) => {
                if let Some(lazy) = self.inner.lazy.borrow_mut().as_mut() {
                    lazy.loaders.insert(property.to_string(), loader);
                }
                Err(err.context(crate::err!(
                    "lazy loading `{}.{property}`",
                    self.inner.model
                )))
            }
        }
    }

    fn is_aggressive(&self) -> bool {
        self.inner
            .lazy
            .borrow()
            .as_ref()
            .is_some_and(|lazy| lazy.aggressive && !lazy.loaders.is_empty())
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Prints nested objects by model name only, so cyclic graphs terminate.
struct Shallow<'a>(&'a Value);

impl fmt::Debug for Shallow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Object(object) => write!(f, "{}@{:x}", object.model(), object.addr()),
            Value::List(items) => f
                .debug_list()
                .entries(items.iter().map(Shallow))
                .finish(),
            value => fmt::Debug::fmt(value, f),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.inner.fields.borrow();
        let mut s = f.debug_struct(&self.inner.model);

        for (name, value) in fields.iter() {
            s.field(name, &Shallow(value));
        }

        let pending = self.pending_loads();
        if pending > 0 {
            s.field("<pending loads>", &pending);
        }

        s.finish()
    }
}
