use crate::stmt::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The property name
    pub name: String,

    pub ty: Type,

    /// True if the property can hold null. Non-nullable properties are never
    /// assigned null; they keep their zero value instead.
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Field {
        Field {
            name: name.into(),
            ty,
            nullable: false,
        }
    }

    pub fn nullable(name: impl Into<String>, ty: Type) -> Field {
        Field {
            nullable: true,
            ..Field::new(name, ty)
        }
    }

    /// Value the property holds before anything is assigned.
    pub fn initial_value(&self) -> crate::stmt::Value {
        if self.nullable {
            crate::stmt::Value::Null
        } else {
            self.ty.zero()
        }
    }
}
