//! Declared parameter lists.
//!
//! A [`Signature`] is built once, when a handler is registered, and lists the
//! parameters the resolver must supply on every call.

use std::any::Any;
use wirebind_core::{TypeTag, Value};

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    type_tag: Option<TypeTag>,
    default: Option<Value>,
    nullable: bool,
}

impl ParamSpec {
    /// An untyped parameter: only name-based sources can satisfy it.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: None,
            default: None,
            nullable: false,
        }
    }

    /// A parameter declared with type `T`, which also enables the
    /// extra-argument type scan.
    pub fn typed<T: Any>(name: impl Into<String>) -> Self {
        Self {
            type_tag: Some(TypeTag::of::<T>()),
            ..Self::named(name)
        }
    }

    /// Sets the default used when no source supplies a value.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Allows the parameter to resolve to null.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type, if any.
    #[must_use]
    pub const fn type_tag(&self) -> Option<TypeTag> {
        self.type_tag
    }

    /// Returns the default value, if any.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns `true` if the parameter accepts null.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// An ordered parameter list.
///
/// ```
/// use wirebind_core::{Request, Value};
/// use wirebind_resolver::{ParamSpec, Signature};
///
/// let signature = Signature::new()
///     .param(ParamSpec::typed::<Request>("request"))
///     .param(ParamSpec::named("page").with_default(Value::new(1_u32)))
///     .param(ParamSpec::named("filter").nullable());
///
/// assert_eq!(signature.len(), 3);
/// assert_eq!(signature.names(), vec!["request", "page", "filter"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<ParamSpec>,
}

impl Signature {
    /// An empty signature.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Appends an untyped parameter for each name.
    #[must_use]
    pub fn names_only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: names.into_iter().map(ParamSpec::named).collect(),
        }
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Returns the parameter names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(ParamSpec::name).collect()
    }

    /// Returns the number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl FromIterator<ParamSpec> for Signature {
    fn from_iter<I: IntoIterator<Item = ParamSpec>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_builders() {
        let param = ParamSpec::typed::<u64>("id")
            .with_default(Value::new(0_u64))
            .nullable();

        assert_eq!(param.name(), "id");
        assert_eq!(param.type_tag(), Some(TypeTag::of::<u64>()));
        assert!(param.default_value().is_some());
        assert!(param.is_nullable());

        let plain = ParamSpec::named("x");
        assert!(plain.type_tag().is_none());
        assert!(!plain.is_nullable());
    }

    #[test]
    fn test_names_only() {
        let signature = Signature::names_only(["request", "response", "args"]);
        assert_eq!(signature.names(), vec!["request", "response", "args"]);
        assert!(signature.params().iter().all(|p| p.type_tag().is_none()));
    }

    #[test]
    fn test_collect() {
        let signature: Signature = ["a", "b"].into_iter().map(ParamSpec::named).collect();
        assert_eq!(signature.len(), 2);
        assert!(!signature.is_empty());
        assert!(Signature::new().is_empty());
    }
}
