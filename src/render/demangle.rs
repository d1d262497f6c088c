//! Metrowerks (like cfront) gives constructors, destructors and operators short
//! reserved names. These are mapped back onto what the user wrote.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialName {
    Constructor,
    Destructor,
    Operator(&'static str),
}

const OPERATORS: &[(&str, &str)] = &[
    ("__nw", "operator new"),
    ("__dl", "operator delete"),
    ("__nwa", "operator new[]"),
    ("__dla", "operator delete[]"),
    ("__as", "operator="),
    ("__pl", "operator+"),
    ("__mi", "operator-"),
    ("__ml", "operator*"),
    ("__dv", "operator/"),
    ("__md", "operator%"),
    ("__er", "operator^"),
    ("__ad", "operator&"),
    ("__or", "operator|"),
    ("__co", "operator~"),
    ("__nt", "operator!"),
    ("__lt", "operator<"),
    ("__gt", "operator>"),
    ("__apl", "operator+="),
    ("__ami", "operator-="),
    ("__amu", "operator*="),
    ("__adv", "operator/="),
    ("__amd", "operator%="),
    ("__aer", "operator^="),
    ("__aad", "operator&="),
    ("__aor", "operator|="),
    ("__ls", "operator<<"),
    ("__rs", "operator>>"),
    ("__als", "operator<<="),
    ("__ars", "operator>>="),
    ("__eq", "operator=="),
    ("__ne", "operator!="),
    ("__le", "operator<="),
    ("__ge", "operator>="),
    ("__aa", "operator&&"),
    ("__oo", "operator||"),
    ("__pp", "operator++"),
    ("__mm", "operator--"),
    ("__cm", "operator,"),
    ("__rm", "operator->*"),
    ("__rf", "operator->"),
    ("__cl", "operator()"),
    ("__vc", "operator[]"),
];

pub fn special_name(name: &str) -> Option<SpecialName> {
    match name {
        "__ct" => Some(SpecialName::Constructor),
        "__dt" => Some(SpecialName::Destructor),
        _ => OPERATORS
            .iter()
            .find(|(raw, _)| *raw == name)
            .map(|(_, operator)| SpecialName::Operator(operator)),
    }
}

/// The name to display for a function, `class` is the name of the owning class.
pub fn demangle(name: &str, class: Option<&str>) -> String {
    match special_name(name) {
        Some(SpecialName::Constructor) => class.unwrap_or(name).to_string(),
        Some(SpecialName::Destructor) => match class {
            Some(class) => format!("~{class}"),
            None => name.to_string(),
        },
        Some(SpecialName::Operator(operator)) => operator.to_string(),
        None => name.to_string(),
    }
}
