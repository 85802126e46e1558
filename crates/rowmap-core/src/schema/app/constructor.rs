use crate::stmt::Type;

/// A way to build a model instance from arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    pub params: Vec<Param>,

    /// Preferred when the constructor is inferred from the columns of a row
    pub auto_map: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Name of the property the argument initializes
    pub name: String,

    pub ty: Type,
}

impl Constructor {
    pub fn new<I, S>(params: I) -> Constructor
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        Constructor {
            params: params
                .into_iter()
                .map(|(name, ty)| Param {
                    name: name.into(),
                    ty,
                })
                .collect(),
            auto_map: false,
        }
    }

    pub fn auto_map(mut self) -> Constructor {
        self.auto_map = true;
        self
    }

    pub fn param_types(&self) -> impl Iterator<Item = &Type> + '_ {
        self.params.iter().map(|param| &param.ty)
    }

    /// Returns `true` if the constructor takes exactly `types`, in order.
    pub fn accepts(&self, types: &[Type]) -> bool {
        self.params.len() == types.len() && self.param_types().zip(types).all(|(a, b)| a == b)
    }
}
