//! A C++ level view of the debug records: compile units, classes, enums, functions
//! and variables. Built once from a decoded [`DebugInfo`] and read-only afterwards.
//! Entities are keyed by the offset of the record they came from so they can refer
//! to each other the same way the records do.
use crate::debug::{DebugInfo, LineEntry, Location, TypeRef};
use std::collections::HashMap;
use std::fmt;

mod builder;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Access::Public => write!(f, "public"),
            Access::Protected => write!(f, "protected"),
            Access::Private => write!(f, "private"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Struct,
    Union,
}

impl ClassKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Struct => "struct",
            ClassKind::Union => "union",
        }
    }

    /// Access of members and bases that aren't explicitly marked.
    pub fn default_access(self) -> Access {
        match self {
            ClassKind::Class => Access::Private,
            ClassKind::Struct | ClassKind::Union => Access::Public,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Member {
    pub offset: u32,
    pub name: String,
    pub ty: TypeRef,
    pub access: Access,

    /// Offset of the member within its class.
    pub byte_offset: u32,

    /// Set for bitfields.
    pub bit_offset: Option<u16>,
    pub bit_size: Option<u32>,
}

impl Member {
    pub fn is_bitfield(&self) -> bool {
        self.bit_offset.is_some() || self.bit_size.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Base {
    pub access: Access,
    pub is_virtual: bool,
    pub ty: TypeRef,
}

#[derive(Clone, Debug)]
pub struct Typedef {
    pub offset: u32,
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Clone, Debug)]
pub struct ClassType {
    pub offset: u32,
    pub kind: ClassKind,
    pub name: String,
    pub byte_size: u32,
    pub members: Vec<Member>,
    pub bases: Vec<Base>,
    pub typedefs: Vec<Typedef>,

    /// Offsets of member functions in declaration order. Filled in once every
    /// function has been built.
    pub functions: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enumerator {
    pub name: String,
    pub value: i64,
}

#[derive(Clone, Debug)]
pub struct EnumType {
    pub offset: u32,
    pub name: String,
    pub byte_size: Option<u32>,
    pub enumerators: Vec<Enumerator>,
}

#[derive(Clone, Debug)]
pub struct ArrayType {
    pub offset: u32,
    pub name: String,
    pub element: TypeRef,

    /// Outermost first. None if a bound isn't a constant.
    pub dimensions: Vec<Option<u32>>,
}

#[derive(Clone, Debug)]
pub struct Parameter {
    pub offset: u32,
    pub name: String,
    pub ty: TypeRef,
    pub location: Option<Location>,
}

#[derive(Clone, Debug)]
pub struct FunctionType {
    pub offset: u32,
    pub name: String,
    pub return_type: TypeRef,
    pub parameters: Vec<Parameter>,

    /// Ends with "...".
    pub variadic: bool,
}

#[derive(Clone, Debug)]
pub struct PointerToMemberType {
    pub offset: u32,
    pub name: String,

    /// Type of the member pointed to.
    pub ty: TypeRef,

    /// Offset of the class containing the member.
    pub containing: u32,
}

#[derive(Clone, Debug)]
pub enum UserType {
    Class(ClassType),
    Enum(EnumType),
    Array(ArrayType),
    Function(FunctionType),
    PointerToMember(PointerToMemberType),
}

impl UserType {
    pub fn name(&self) -> &str {
        match self {
            UserType::Class(c) => &c.name,
            UserType::Enum(e) => &e.name,
            UserType::Array(a) => &a.name,
            UserType::Function(f) => &f.name,
            UserType::PointerToMember(p) => &p.name,
        }
    }

    pub fn offset(&self) -> u32 {
        match self {
            UserType::Class(c) => c.offset,
            UserType::Enum(e) => e.offset,
            UserType::Array(a) => a.offset,
            UserType::Function(f) => f.offset,
            UserType::PointerToMember(p) => p.offset,
        }
    }
}

/// A local variable (including those in nested lexical blocks).
#[derive(Clone, Debug)]
pub struct LocalVariable {
    pub offset: u32,
    pub name: String,
    pub ty: TypeRef,
    pub location: Option<Location>,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub signature: FunctionType,
    pub is_global: bool,
    pub is_inline: bool,

    /// Address range [low_pc, high_pc).
    pub low_pc: u32,
    pub high_pc: u32,

    /// Offset of the owning class for member functions.
    pub member_of: Option<u32>,
    pub access: Access,
    pub mangled: Option<String>,
    pub variables: Vec<LocalVariable>,

    /// Line table entries whose address is within the function.
    pub lines: Vec<LineEntry>,
}

impl Function {
    pub fn offset(&self) -> u32 {
        self.signature.offset
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn size(&self) -> u32 {
        self.high_pc.saturating_sub(self.low_pc)
    }

    /// The implicit object parameter of non-static member functions.
    pub fn this(&self) -> Option<&Parameter> {
        self.signature.parameters.iter().find(|p| p.name == "this")
    }
}

#[derive(Clone, Debug)]
pub struct Variable {
    pub offset: u32,
    pub name: String,
    pub is_global: bool,
    pub ty: TypeRef,
    pub address: Option<u32>,
    pub mangled: Option<String>,
    pub location: Option<Location>,
}

/// A compile unit.
#[derive(Clone, Debug, Default)]
pub struct File {
    pub offset: u32,
    pub name: String,
    pub producer: Option<String>,
    pub language: Option<u32>,
    pub comp_dir: Option<String>,
    pub low_pc: Option<u32>,
    pub high_pc: Option<u32>,
    pub stmt_list: Option<u32>,

    /// Offsets of the types, functions and variables in declaration order.
    pub types: Vec<u32>,
    pub functions: Vec<u32>,
    pub variables: Vec<u32>,

    /// Offset of the line table attributed to this unit.
    pub line_table: Option<u32>,
}

pub struct Model<'a> {
    pub debug: &'a DebugInfo,
    pub files: Vec<File>,
    pub types: HashMap<u32, UserType>,
    pub functions: HashMap<u32, Function>,
    pub variables: HashMap<u32, Variable>,
    paths: HashMap<String, Vec<usize>>,
}

impl<'a> Model<'a> {
    pub fn file(&self, offset: u32) -> Option<&File> {
        self.files.iter().find(|f| f.offset == offset)
    }

    /// Several compile units may have the same path.
    pub fn files_with_path(&self, path: &str) -> Vec<&File> {
        self.paths
            .get(path)
            .map(|indexes| indexes.iter().map(|&i| &self.files[i]).collect())
            .unwrap_or_default()
    }

    pub fn class(&self, offset: u32) -> Option<&ClassType> {
        match self.types.get(&offset) {
            Some(UserType::Class(c)) => Some(c),
            _ => None,
        }
    }

    /// Name of the record at offset whether or not it was modeled.
    pub fn type_name(&self, offset: u32) -> &str {
        match self.types.get(&offset) {
            Some(t) => t.name(),
            None => {
                let index = self
                    .debug
                    .find(offset)
                    .unwrap_or_else(|| panic!("no debug record at offset {offset:#x}"));
                self.debug.name(index).unwrap_or_default()
            }
        }
    }

    /// Functions of a file in declaration order.
    pub fn file_functions<'b>(&'b self, file: &'b File) -> impl Iterator<Item = &'b Function> {
        file.functions.iter().filter_map(|o| self.functions.get(o))
    }

    pub fn file_variables<'b>(&'b self, file: &'b File) -> impl Iterator<Item = &'b Variable> {
        file.variables.iter().filter_map(|o| self.variables.get(o))
    }

    pub fn file_types<'b>(&'b self, file: &'b File) -> impl Iterator<Item = &'b UserType> {
        file.types.iter().filter_map(|o| self.types.get(o))
    }
}
