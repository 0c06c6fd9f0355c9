use crate::assertion::Assertion;

/// A minimal concrete assertion, standing in for the full type-system-backed
/// enum a real analyzer would supply: a production `Assertion` would carry a
/// resolved type per variant, but that type system is an external
/// collaborator this crate does not depend on. Covers truthiness and
/// named-type membership, keyed by an opaque string rather than a resolved
/// type, which is enough for this crate's own test suite and a simple
/// embedder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeAssertion {
    Any,
    Falsy,
    Truthy,
    IsType(String),
    IsNotType(String),
    IsEqual(String),
    IsNotEqual(String),
}

impl Assertion for TypeAssertion {
    fn render(&self) -> String {
        match self {
            TypeAssertion::Any => "any".to_string(),
            TypeAssertion::Falsy => "falsy".to_string(),
            TypeAssertion::Truthy => "truthy".to_string(),
            TypeAssertion::IsType(name) => name.clone(),
            TypeAssertion::IsNotType(name) => format!("!{name}"),
            TypeAssertion::IsEqual(name) => format!("={name}"),
            TypeAssertion::IsNotEqual(name) => format!("!={name}"),
        }
    }

    fn negate(&self) -> Self {
        match self {
            TypeAssertion::Any => TypeAssertion::Any,
            TypeAssertion::Falsy => TypeAssertion::Truthy,
            TypeAssertion::Truthy => TypeAssertion::Falsy,
            TypeAssertion::IsType(name) => TypeAssertion::IsNotType(name.clone()),
            TypeAssertion::IsNotType(name) => TypeAssertion::IsType(name.clone()),
            TypeAssertion::IsEqual(name) => TypeAssertion::IsNotEqual(name.clone()),
            TypeAssertion::IsNotEqual(name) => TypeAssertion::IsEqual(name.clone()),
        }
    }

    fn is_negation_of(&self, other: &Self) -> bool {
        match self {
            TypeAssertion::Any => false,
            TypeAssertion::Falsy => matches!(other, TypeAssertion::Truthy),
            TypeAssertion::Truthy => matches!(other, TypeAssertion::Falsy),
            TypeAssertion::IsType(name) => matches!(other, TypeAssertion::IsNotType(o) if o == name),
            TypeAssertion::IsNotType(name) => matches!(other, TypeAssertion::IsType(o) if o == name),
            TypeAssertion::IsEqual(name) => matches!(other, TypeAssertion::IsNotEqual(o) if o == name),
            TypeAssertion::IsNotEqual(name) => matches!(other, TypeAssertion::IsEqual(o) if o == name),
        }
    }

    fn is_negation(&self) -> bool {
        matches!(
            self,
            TypeAssertion::Falsy | TypeAssertion::IsNotType(_) | TypeAssertion::IsNotEqual(_)
        )
    }

    fn is_falsy(&self) -> bool {
        matches!(self, TypeAssertion::Falsy)
    }
}
