//! Support for the original (version 1) DWARF debug format as emitted by embedded
//! compilers such as Metrowerks CodeWarrior. Unlike later versions there are no
//! abbreviation tables: the ".debug" section is a flat list of length prefixed
//! records, each with a tag and a list of attributes. The tree structure is implicit:
//! a record's children immediately follow it and an optional sibling attribute points
//! past them. Line numbers live in a separate ".line" section with one table per
//! compile unit. The format is documented in "DWARF Debugging Information Format",
//! Unix International, 1993.
use std::fmt;

pub mod attributes;
pub mod entries;
pub mod line;

pub use attributes::*;
pub use entries::*;
pub use line::*;

pub const DEBUG_SECTION: &str = ".debug";
pub const LINE_SECTION: &str = ".line";

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    //                                  value
    DW_TAG_padding,                // 0x00
    DW_TAG_array_type,             // 0x01
    DW_TAG_class_type,             // 0x02
    DW_TAG_entry_point,            // 0x03
    DW_TAG_enumeration_type,       // 0x04
    DW_TAG_formal_parameter,       // 0x05
    DW_TAG_global_subroutine,      // 0x06
    DW_TAG_global_variable,        // 0x07
    DW_TAG_label,                  // 0x0a
    DW_TAG_lexical_block,          // 0x0b
    DW_TAG_local_variable,         // 0x0c
    DW_TAG_member,                 // 0x0d
    DW_TAG_pointer_type,           // 0x0f
    DW_TAG_reference_type,         // 0x10
    DW_TAG_compile_unit,           // 0x11
    DW_TAG_string_type,            // 0x12
    DW_TAG_structure_type,         // 0x13
    DW_TAG_subroutine,             // 0x14
    DW_TAG_subroutine_type,        // 0x15
    DW_TAG_typedef,                // 0x16
    DW_TAG_union_type,             // 0x17
    DW_TAG_unspecified_parameters, // 0x18
    DW_TAG_variant,                // 0x19
    DW_TAG_common_block,           // 0x1a
    DW_TAG_common_inclusion,       // 0x1b
    DW_TAG_inheritance,            // 0x1c
    DW_TAG_inlined_subroutine,     // 0x1d
    DW_TAG_module,                 // 0x1e
    DW_TAG_ptr_to_member_type,     // 0x1f
    DW_TAG_set_type,               // 0x20
    DW_TAG_subrange_type,          // 0x21
    DW_TAG_with_stmt,              // 0x22
    DW_TAG_user(u16),              // [0x4080, 0xffff]
    Unknown(u16),
}

impl Tag {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x00 => Tag::DW_TAG_padding,
            0x01 => Tag::DW_TAG_array_type,
            0x02 => Tag::DW_TAG_class_type,
            0x03 => Tag::DW_TAG_entry_point,
            0x04 => Tag::DW_TAG_enumeration_type,
            0x05 => Tag::DW_TAG_formal_parameter,
            0x06 => Tag::DW_TAG_global_subroutine,
            0x07 => Tag::DW_TAG_global_variable,
            0x0a => Tag::DW_TAG_label,
            0x0b => Tag::DW_TAG_lexical_block,
            0x0c => Tag::DW_TAG_local_variable,
            0x0d => Tag::DW_TAG_member,
            0x0f => Tag::DW_TAG_pointer_type,
            0x10 => Tag::DW_TAG_reference_type,
            0x11 => Tag::DW_TAG_compile_unit,
            0x12 => Tag::DW_TAG_string_type,
            0x13 => Tag::DW_TAG_structure_type,
            0x14 => Tag::DW_TAG_subroutine,
            0x15 => Tag::DW_TAG_subroutine_type,
            0x16 => Tag::DW_TAG_typedef,
            0x17 => Tag::DW_TAG_union_type,
            0x18 => Tag::DW_TAG_unspecified_parameters,
            0x19 => Tag::DW_TAG_variant,
            0x1a => Tag::DW_TAG_common_block,
            0x1b => Tag::DW_TAG_common_inclusion,
            0x1c => Tag::DW_TAG_inheritance,
            0x1d => Tag::DW_TAG_inlined_subroutine,
            0x1e => Tag::DW_TAG_module,
            0x1f => Tag::DW_TAG_ptr_to_member_type,
            0x20 => Tag::DW_TAG_set_type,
            0x21 => Tag::DW_TAG_subrange_type,
            0x22 => Tag::DW_TAG_with_stmt,
            0x4080.. => Tag::DW_TAG_user(value),
            _ => Tag::Unknown(value),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Tag::DW_TAG_user(value) => write!(f, "DW_TAG_user_{value:#x}"),
            Tag::Unknown(value) => write!(f, "DW_TAG_{value:#x}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// The low nibble of an attribute name, which determines how its payload is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Form {
    /// 4-byte address.
    Addr,

    /// 4-byte offset of another record in the debug section.
    Ref,

    /// Block with a 2-byte length prefix.
    Block2,

    /// Block with a 4-byte length prefix.
    Block4,
    Data2,
    Data4,
    Data8,

    /// Null terminated string.
    String,
}

impl Form {
    pub fn from_name(name: u16) -> Option<Self> {
        match name & 0xf {
            0x1 => Some(Form::Addr),
            0x2 => Some(Form::Ref),
            0x3 => Some(Form::Block2),
            0x4 => Some(Form::Block4),
            0x5 => Some(Form::Data2),
            0x6 => Some(Form::Data4),
            0x7 => Some(Form::Data8),
            0x8 => Some(Form::String),
            _ => None,
        }
    }
}

/// Attribute names include the form in their low nibble. A few attributes (e.g.
/// const_value) may appear with several forms so they're matched on just the high
/// bits.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeName {
    //                             value & form
    DW_AT_sibling,                 // 0x0012 ref
    DW_AT_location,                // 0x0023 block2
    DW_AT_name,                    // 0x0038 string
    DW_AT_fund_type,               // 0x0055 data2
    DW_AT_mod_fund_type,           // 0x0063 block2
    DW_AT_user_def_type,           // 0x0072 ref
    DW_AT_mod_u_d_type,            // 0x0083 block2
    DW_AT_ordering,                // 0x0095 data2
    DW_AT_subscr_data,             // 0x00a3 block2
    DW_AT_byte_size,               // 0x00b6 data4
    DW_AT_bit_offset,              // 0x00c5 data2
    DW_AT_bit_size,                // 0x00d6 data4
    DW_AT_element_list,            // 0x00f4 block4
    DW_AT_stmt_list,               // 0x0106 data4
    DW_AT_low_pc,                  // 0x0111 addr
    DW_AT_high_pc,                 // 0x0121 addr
    DW_AT_language,                // 0x0136 data4
    DW_AT_member,                  // 0x0142 ref
    DW_AT_discr,                   // 0x0152 ref
    DW_AT_discr_value,             // 0x0163 block2
    DW_AT_string_length,           // 0x0193 block2
    DW_AT_common_reference,        // 0x01a2 ref
    DW_AT_comp_dir,                // 0x01b8 string
    DW_AT_const_value,             // 0x01c0 string, data*, block*
    DW_AT_containing_type,         // 0x01d2 ref
    DW_AT_default_value,           // 0x01e0 addr, data*, string
    DW_AT_friends,                 // 0x01f3 block2
    DW_AT_inline,                  // 0x0208 string
    DW_AT_is_optional,             // 0x0218 string
    DW_AT_lower_bound,             // 0x0220 ref, data*
    DW_AT_program,                 // 0x0238 string
    DW_AT_private,                 // 0x0248 string
    DW_AT_producer,                // 0x0258 string
    DW_AT_protected,               // 0x0268 string
    DW_AT_prototyped,              // 0x0278 string
    DW_AT_public,                  // 0x0288 string
    DW_AT_pure_virtual,            // 0x0298 string
    DW_AT_return_addr,             // 0x02a3 block2
    DW_AT_specification,           // 0x02b2 ref
    DW_AT_start_scope,             // 0x02c6 data4
    DW_AT_stride_size,             // 0x02e6 data4
    DW_AT_upper_bound,             // 0x02f0 ref, data*
    DW_AT_virtual,                 // 0x0308 string
    DW_AT_MW_mangled,              // 0x2008 string
    DW_AT_MW_restore_SP,           // 0x2014 block4
    DW_AT_MW_global_ref,           // 0x2022 ref
    DW_AT_MW_global_ref_by_name,   // 0x2038 string
    DW_AT_user(u16),               // [0x2000, 0x3ff0]
    Unknown(u16),
}

impl AttributeName {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0012 => AttributeName::DW_AT_sibling,
            0x0023 => AttributeName::DW_AT_location,
            0x0038 => AttributeName::DW_AT_name,
            0x0055 => AttributeName::DW_AT_fund_type,
            0x0063 => AttributeName::DW_AT_mod_fund_type,
            0x0072 => AttributeName::DW_AT_user_def_type,
            0x0083 => AttributeName::DW_AT_mod_u_d_type,
            0x0095 => AttributeName::DW_AT_ordering,
            0x00a3 => AttributeName::DW_AT_subscr_data,
            0x00b6 => AttributeName::DW_AT_byte_size,
            0x00c5 => AttributeName::DW_AT_bit_offset,
            0x00d6 => AttributeName::DW_AT_bit_size,
            0x00f4 => AttributeName::DW_AT_element_list,
            0x0106 => AttributeName::DW_AT_stmt_list,
            0x0111 => AttributeName::DW_AT_low_pc,
            0x0121 => AttributeName::DW_AT_high_pc,
            0x0136 => AttributeName::DW_AT_language,
            0x0142 => AttributeName::DW_AT_member,
            0x0152 => AttributeName::DW_AT_discr,
            0x0163 => AttributeName::DW_AT_discr_value,
            0x0193 => AttributeName::DW_AT_string_length,
            0x01a2 => AttributeName::DW_AT_common_reference,
            0x01b8 => AttributeName::DW_AT_comp_dir,
            0x01d2 => AttributeName::DW_AT_containing_type,
            0x01f3 => AttributeName::DW_AT_friends,
            0x0208 => AttributeName::DW_AT_inline,
            0x0218 => AttributeName::DW_AT_is_optional,
            0x0238 => AttributeName::DW_AT_program,
            0x0248 => AttributeName::DW_AT_private,
            0x0258 => AttributeName::DW_AT_producer,
            0x0268 => AttributeName::DW_AT_protected,
            0x0278 => AttributeName::DW_AT_prototyped,
            0x0288 => AttributeName::DW_AT_public,
            0x0298 => AttributeName::DW_AT_pure_virtual,
            0x02a3 => AttributeName::DW_AT_return_addr,
            0x02b2 => AttributeName::DW_AT_specification,
            0x02c6 => AttributeName::DW_AT_start_scope,
            0x02e6 => AttributeName::DW_AT_stride_size,
            0x0308 => AttributeName::DW_AT_virtual,
            0x2008 => AttributeName::DW_AT_MW_mangled,
            0x2014 => AttributeName::DW_AT_MW_restore_SP,
            0x2022 => AttributeName::DW_AT_MW_global_ref,
            0x2038 => AttributeName::DW_AT_MW_global_ref_by_name,
            _ => match value & 0xfff0 {
                0x01c0 => AttributeName::DW_AT_const_value,
                0x01e0 => AttributeName::DW_AT_default_value,
                0x0220 => AttributeName::DW_AT_lower_bound,
                0x02f0 => AttributeName::DW_AT_upper_bound,
                0x2000..=0x3ff0 => AttributeName::DW_AT_user(value),
                _ => AttributeName::Unknown(value),
            },
        }
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeName::DW_AT_user(value) => write!(f, "DW_AT_user_{value:#x}"),
            AttributeName::Unknown(value) => write!(f, "DW_AT_{value:#x}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// Location expression operations.
pub const OP_REG: u8 = 0x01;
pub const OP_BASEREG: u8 = 0x02;
pub const OP_ADDR: u8 = 0x03;
pub const OP_CONST: u8 = 0x04;
pub const OP_DEREF2: u8 = 0x05;
pub const OP_DEREF: u8 = 0x06;
pub const OP_ADD: u8 = 0x07;

/// Type modifiers used by mod_fund_type and mod_u_d_type.
pub const MOD_POINTER_TO: u8 = 0x01;
pub const MOD_REFERENCE_TO: u8 = 0x02;
pub const MOD_CONST: u8 = 0x03;
pub const MOD_VOLATILE: u8 = 0x04;

/// Subscript data formats. The first two letters describe the index type, the next
/// two the low bound, and the last two the high bound: F(undamental), U(ser defined),
/// C(onstant), or X (location expression).
pub const FMT_FT_C_C: u8 = 0x0;
pub const FMT_FT_C_X: u8 = 0x1;
pub const FMT_FT_X_C: u8 = 0x2;
pub const FMT_FT_X_X: u8 = 0x3;
pub const FMT_UT_C_C: u8 = 0x4;
pub const FMT_UT_C_X: u8 = 0x5;
pub const FMT_UT_X_C: u8 = 0x6;
pub const FMT_UT_X_X: u8 = 0x7;
pub const FMT_ET: u8 = 0x8;

/// Fundamental types.
pub const FT_CHAR: u16 = 0x0001;
pub const FT_SIGNED_CHAR: u16 = 0x0002;
pub const FT_UNSIGNED_CHAR: u16 = 0x0003;
pub const FT_SHORT: u16 = 0x0004;
pub const FT_SIGNED_SHORT: u16 = 0x0005;
pub const FT_UNSIGNED_SHORT: u16 = 0x0006;
pub const FT_INTEGER: u16 = 0x0007;
pub const FT_SIGNED_INTEGER: u16 = 0x0008;
pub const FT_UNSIGNED_INTEGER: u16 = 0x0009;
pub const FT_LONG: u16 = 0x000a;
pub const FT_SIGNED_LONG: u16 = 0x000b;
pub const FT_UNSIGNED_LONG: u16 = 0x000c;
pub const FT_POINTER: u16 = 0x000d;
pub const FT_FLOAT: u16 = 0x000e;
pub const FT_DBL_PREC_FLOAT: u16 = 0x000f;
pub const FT_EXT_PREC_FLOAT: u16 = 0x0010;
pub const FT_COMPLEX: u16 = 0x0011;
pub const FT_DBL_PREC_COMPLEX: u16 = 0x0012;
pub const FT_VOID: u16 = 0x0014;
pub const FT_BOOLEAN: u16 = 0x0015;
pub const FT_EXT_PREC_COMPLEX: u16 = 0x0016;
pub const FT_LABEL: u16 = 0x0017;
pub const FT_LONG_LONG: u16 = 0x8008;
pub const FT_UNSIGNED_LONG_LONG: u16 = 0x8208;

pub fn language_name(value: u32) -> String {
    match value {
        0x1 => "C89".to_string(),
        0x2 => "C".to_string(),
        0x3 => "Ada 83".to_string(),
        0x4 => "C++".to_string(),
        0x5 => "Cobol 74".to_string(),
        0x6 => "Cobol 85".to_string(),
        0x7 => "Fortran 77".to_string(),
        0x8 => "Fortran 90".to_string(),
        0x9 => "Pascal 83".to_string(),
        0xa => "Modula 2".to_string(),
        _ => format!("language {value:#x}"),
    }
}
