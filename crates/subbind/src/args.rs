use indexmap::IndexMap;

use crate::{
    exception::{ExcType, SimpleException},
    object::Object,
};

/// Keyword arguments written in a subscript, already flattened.
///
/// Keys are unique and keep the order they were written in. That order only matters
/// for picking which unexpected keyword gets reported; binding itself is keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KwargsValues(IndexMap<String, Object>);

impl KwargsValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keyword, rejecting a name that was already written.
    pub fn insert(&mut self, name: impl Into<String>, value: Object) -> Result<(), SimpleException> {
        let name = name.into();
        if self.0.contains_key(&name) {
            return Err(ExcType::syntax_error_repeated_keyword(&name));
        }
        self.0.insert(name, value);
        Ok(())
    }

    /// Removes and returns the value for `name`, keeping the order of the remaining entries.
    pub fn remove(&mut self, name: &str) -> Option<Object> {
        self.0.shift_remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Object> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keyword names in the order they were written.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl TryFrom<Vec<(String, Object)>> for KwargsValues {
    type Error = SimpleException;

    fn try_from(pairs: Vec<(String, Object)>) -> Result<Self, Self::Error> {
        let mut kwargs = Self::new();
        for (name, value) in pairs {
            kwargs.insert(name, value)?;
        }
        Ok(kwargs)
    }
}

impl IntoIterator for KwargsValues {
    type Item = (String, Object);
    type IntoIter = indexmap::map::IntoIter<String, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The flattened arguments of one subscript expression: `obj[1, 2, kw1="a"]`.
///
/// `*seq` and `**map` spreads have already been expanded by the expression evaluator.
/// The assigned value of a write is never part of this struct; it reaches the
/// dispatcher through its own parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubscriptArgs {
    pub positional: Vec<Object>,
    pub keywords: KwargsValues,
}

impl SubscriptArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the positional index components, in the order they were written.
    #[must_use]
    pub fn positional(components: impl IntoIterator<Item = impl Into<Object>>) -> Self {
        Self {
            positional: components.into_iter().map(Into::into).collect(),
            keywords: KwargsValues::new(),
        }
    }

    /// Appends a keyword argument; fails if the name was already written.
    pub fn with_keyword(mut self, name: impl Into<String>, value: impl Into<Object>) -> Result<Self, SimpleException> {
        self.keywords.insert(name, value.into())?;
        Ok(self)
    }

    /// Splits into the positional components and the keyword mapping.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Object>, KwargsValues) {
        (self.positional, self.keywords)
    }
}
