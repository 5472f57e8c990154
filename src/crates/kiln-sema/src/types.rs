// types.rs
//
// Resolved types and compile-time values.

use kiln_identity::{DeclId, PrimitiveType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Primitive(PrimitiveType),
    /// A struct, mix, opaque, choice, alias or variant declaration.
    Named(DeclId),
    Pointer(Box<Ty>),
    Array(Box<Ty>, u64),
}

impl Ty {
    /// Named declarations this type mentions, each with whether it is held
    /// by value. Anything behind a pointer is not.
    pub fn named_parts(&self) -> Vec<(DeclId, bool)> {
        let mut out = Vec::new();
        self.collect_named(true, &mut out);
        out
    }

    fn collect_named(&self, by_value: bool, out: &mut Vec<(DeclId, bool)>) {
        match self {
            Ty::Primitive(_) => {}
            Ty::Named(decl) => out.push((*decl, by_value)),
            Ty::Pointer(inner) => inner.collect_named(false, out),
            Ty::Array(elem, _) => elem.collect_named(by_value, out),
        }
    }
}

/// The type of a compile-time value parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Bool,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Bool => "bool",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Int(i64),
    Bool(bool),
}

impl ConstValue {
    pub fn value_type(self) -> ValueType {
        match self {
            ConstValue::Int(_) => ValueType::Int,
            ConstValue::Bool(_) => ValueType::Bool,
        }
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// A concrete argument bound to a generic parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericArg {
    Type(Ty),
    Value(ConstValue),
}

impl GenericArg {
    /// "type", "int" or "bool", for kind mismatch messages.
    pub fn describe(&self) -> &'static str {
        match self {
            GenericArg::Type(_) => "type",
            GenericArg::Value(v) => v.value_type().as_str(),
        }
    }
}

/// An argument list as it keys the variant cache.
pub type GenericArgs = Vec<GenericArg>;
