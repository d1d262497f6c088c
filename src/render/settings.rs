use crate::debug::*;
use crate::utils::DiagnosticSettings;
use std::collections::HashMap;

/// How fundamental types are spelled. Users may override entries, e.g. to render
/// `int` as `s32`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundamentalNames {
    names: HashMap<u16, String>,
}

impl Default for FundamentalNames {
    fn default() -> Self {
        let names = [
            (FT_CHAR, "char"),
            (FT_SIGNED_CHAR, "signed char"),
            (FT_UNSIGNED_CHAR, "unsigned char"),
            (FT_SHORT, "short"),
            (FT_SIGNED_SHORT, "signed short"),
            (FT_UNSIGNED_SHORT, "unsigned short"),
            (FT_INTEGER, "int"),
            (FT_SIGNED_INTEGER, "signed int"),
            (FT_UNSIGNED_INTEGER, "unsigned int"),
            (FT_LONG, "long"),
            (FT_SIGNED_LONG, "signed long"),
            (FT_UNSIGNED_LONG, "unsigned long"),
            (FT_POINTER, "void*"),
            (FT_FLOAT, "float"),
            (FT_DBL_PREC_FLOAT, "double"),
            (FT_EXT_PREC_FLOAT, "long double"),
            (FT_VOID, "void"),
            (FT_BOOLEAN, "bool"),
            (FT_LONG_LONG, "long long"),
            (FT_UNSIGNED_LONG_LONG, "unsigned long long"),
        ];
        FundamentalNames {
            names: names.iter().map(|(ft, name)| (*ft, name.to_string())).collect(),
        }
    }
}

impl FundamentalNames {
    pub fn name(&self, ft: u16) -> String {
        match self.names.get(&ft) {
            Some(name) => name.clone(),
            None => format!("<unknown type 0x{ft:X}>"),
        }
    }

    pub fn set(&mut self, ft: u16, name: &str) {
        self.names.insert(ft, name.to_string());
    }
}

/// Everything that controls what the renderer emits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub classes: bool,
    pub enums: bool,
    pub arrays: bool,
    pub function_types: bool,
    pub pointer_to_member_types: bool,
    pub variables: bool,
    pub function_declarations: bool,
    pub function_definitions: bool,

    // trailing comments
    pub entry_offsets: bool,
    pub class_sizes: bool,
    pub member_offsets: bool,
    pub member_bit_offsets: bool,
    pub member_bit_sizes: bool,
    pub variable_addresses: bool,
    pub variable_mangled_names: bool,
    pub function_mangled_names: bool,
    pub function_addresses: bool,
    pub function_sizes: bool,
    pub variable_locations: bool,

    pub sort_types_alphabetically: bool,
    pub sort_functions_by_address: bool,

    /// Inline types whose names start with '@'. Metrowerks makes up names like that
    /// for anonymous types.
    pub inline_anonymous_types: bool,
    pub hexadecimal_enum_values: bool,
    pub force_explicit_enum_values: bool,

    /// Function definitions include their instructions and line numbers.
    pub disassembly: bool,

    pub diagnostics: DiagnosticSettings,
    pub fundamental_names: FundamentalNames,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            classes: true,
            enums: true,
            arrays: true,
            function_types: true,
            pointer_to_member_types: true,
            variables: true,
            function_declarations: true,
            function_definitions: true,
            entry_offsets: true,
            class_sizes: true,
            member_offsets: true,
            member_bit_offsets: true,
            member_bit_sizes: true,
            variable_addresses: true,
            variable_mangled_names: true,
            function_mangled_names: true,
            function_addresses: true,
            function_sizes: true,
            variable_locations: true,
            sort_types_alphabetically: false,
            sort_functions_by_address: false,
            inline_anonymous_types: true,
            hexadecimal_enum_values: false,
            force_explicit_enum_values: false,
            disassembly: false,
            diagnostics: DiagnosticSettings::default(),
            fundamental_names: FundamentalNames::default(),
        }
    }
}

impl RenderSettings {
    /// Turns off every trailing comment.
    pub fn without_comments(mut self) -> Self {
        self.entry_offsets = false;
        self.class_sizes = false;
        self.member_offsets = false;
        self.member_bit_offsets = false;
        self.member_bit_sizes = false;
        self.variable_addresses = false;
        self.variable_mangled_names = false;
        self.function_mangled_names = false;
        self.function_addresses = false;
        self.function_sizes = false;
        self.variable_locations = false;
        self
    }
}
