//! Decoders for attribute payloads that pack more than a single value: locations,
//! type descriptors, array subscripts and enumerator lists.
use super::entries::read_value;
use super::*;
use crate::elf::Stream;
use crate::error::{AttributeError, StreamError};
use std::fmt;

impl AttributeValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Address(_) => "address",
            AttributeValue::Ref(_) => "reference",
            AttributeValue::Block(_) => "block",
            AttributeValue::Data2(_) => "data2",
            AttributeValue::Data4(_) => "data4",
            AttributeValue::Data8(_) => "data8",
            AttributeValue::String(_) => "string",
        }
    }

    pub fn as_block(&self) -> Result<&[u8], AttributeError> {
        match self {
            AttributeValue::Block(block) => Ok(block),
            _ => Err(self.wrong_form("a block")),
        }
    }

    pub fn as_offset(&self) -> Result<u32, AttributeError> {
        match self {
            AttributeValue::Ref(offset) => Ok(*offset),
            _ => Err(self.wrong_form("a reference")),
        }
    }

    /// Addresses, references and 2 or 4 byte data.
    pub fn as_u32(&self) -> Result<u32, AttributeError> {
        match self {
            AttributeValue::Address(value) | AttributeValue::Ref(value) | AttributeValue::Data4(value) => Ok(*value),
            AttributeValue::Data2(value) => Ok(*value as u32),
            _ => Err(self.wrong_form("a number")),
        }
    }

    pub fn as_str(&self) -> Result<&str, AttributeError> {
        match self {
            AttributeValue::String(s) => Ok(s),
            _ => Err(self.wrong_form("a string")),
        }
    }

    fn wrong_form(&self, expected: &'static str) -> AttributeError {
        AttributeError::WrongForm {
            expected,
            found: self.kind(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeValue::Address(addr) => write!(f, "0x{addr:08x}"),
            AttributeValue::Ref(offset) => write!(f, "0x{offset:x}"),
            AttributeValue::Block(block) => {
                let bytes: Vec<String> = block.iter().map(|b| format!("{b:02x}")).collect();
                write!(f, "[{}]", bytes.join(" "))
            }
            AttributeValue::Data2(value) => write!(f, "{value}"),
            AttributeValue::Data4(value) => write!(f, "{value}"),
            AttributeValue::Data8(value) => write!(f, "{value}"),
            AttributeValue::String(s) => write!(f, "{s}"),
        }
    }
}

// ---- Locations -----------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationOp {
    Reg(u32),
    BaseReg(u32),
    Addr(u32),
    Const(u32),
    Deref2,
    Deref,
    Add,
    Unknown(u8),
}

impl fmt::Display for LocationOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LocationOp::Reg(n) => write!(f, "OP_REG({n})"),
            LocationOp::BaseReg(n) => write!(f, "OP_BASEREG({n})"),
            LocationOp::Addr(addr) => write!(f, "OP_ADDR(0x{addr:X})"),
            LocationOp::Const(n) => write!(f, "OP_CONST({n})"),
            LocationOp::Deref2 => write!(f, "OP_DEREF2"),
            LocationOp::Deref => write!(f, "OP_DEREF"),
            LocationOp::Add => write!(f, "OP_ADD"),
            LocationOp::Unknown(op) => write!(f, "OP_{op:#x}"),
        }
    }
}

/// Where a value lives. Only the op sequences compilers actually emit are folded,
/// anything else is kept as Unrecognized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Register(u32),
    Address(u32),
    Constant(u32),

    /// Offset from the value of a register, e.g. a local in a stack frame.
    BaseOffset { register: u32, offset: i32 },
    Unrecognized(Vec<LocationOp>),
}

impl Location {
    pub fn decode(block: &[u8], little_endian: bool) -> Result<Location, AttributeError> {
        let ops = decode_ops(block, little_endian)?;
        let location = match ops.as_slice() {
            [LocationOp::Reg(n)] => Location::Register(*n),
            [LocationOp::Addr(addr)] => Location::Address(*addr),
            [LocationOp::Const(n)] => Location::Constant(*n),
            [LocationOp::Const(n), LocationOp::Add] => Location::Constant(*n),
            [LocationOp::BaseReg(r), LocationOp::Const(n), LocationOp::Add] => Location::BaseOffset {
                register: *r,
                offset: *n as i32,
            },
            _ => Location::Unrecognized(ops),
        };
        Ok(location)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Location::Register(n) => write!(f, "r{n}"),
            Location::Address(addr) => write!(f, "0x{addr:X}"),
            Location::Constant(n) => write!(f, "{n}"),
            Location::BaseOffset { register, offset } => write!(f, "{offset}(r{register})"),
            Location::Unrecognized(ops) => {
                let ops: Vec<String> = ops.iter().map(|op| op.to_string()).collect();
                write!(f, "{}", ops.join(" "))
            }
        }
    }
}

fn decode_ops(block: &[u8], little_endian: bool) -> Result<Vec<LocationOp>, AttributeError> {
    let mut ops = Vec::new();
    let mut s = Stream::over(block, little_endian);
    while !s.at_end() {
        let op = match s.read_byte()? {
            OP_REG => LocationOp::Reg(s.read_word()?),
            OP_BASEREG => LocationOp::BaseReg(s.read_word()?),
            OP_ADDR => LocationOp::Addr(s.read_word()?),
            OP_CONST => LocationOp::Const(s.read_word()?),
            OP_DEREF2 => LocationOp::Deref2,
            OP_DEREF => LocationOp::Deref,
            OP_ADD => LocationOp::Add,
            other => {
                // operand size is unknown so nothing after this can be decoded
                ops.push(LocationOp::Unknown(other));
                break;
            }
        };
        ops.push(op);
    }
    Ok(ops)
}

// ---- Types ---------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseType {
    Fundamental(u16),

    /// Offset of a user defined type record.
    User(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierKind {
    Pointer,
    Reference,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub is_const: bool,
    pub is_volatile: bool,
}

/// A fundamental or user defined type plus the pointers and references applied to it.
/// Modifiers are stored innermost first so `const char* volatile*` has the volatile
/// pointer first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeRef {
    pub base: BaseType,
    pub is_const: bool,
    pub is_volatile: bool,
    pub modifiers: Vec<Modifier>,
}

impl TypeRef {
    pub fn fundamental(ft: u16) -> Self {
        TypeRef {
            base: BaseType::Fundamental(ft),
            is_const: false,
            is_volatile: false,
            modifiers: Vec::new(),
        }
    }

    pub fn user(offset: u32) -> Self {
        TypeRef {
            base: BaseType::User(offset),
            is_const: false,
            is_volatile: false,
            modifiers: Vec::new(),
        }
    }

    pub fn void() -> Self {
        TypeRef::fundamental(FT_VOID)
    }

    pub fn user_offset(&self) -> Option<u32> {
        match self.base {
            BaseType::User(offset) => Some(offset),
            BaseType::Fundamental(_) => None,
        }
    }

    pub fn is_type_attribute(name: AttributeName) -> bool {
        matches!(
            name,
            AttributeName::DW_AT_fund_type
                | AttributeName::DW_AT_user_def_type
                | AttributeName::DW_AT_mod_fund_type
                | AttributeName::DW_AT_mod_u_d_type
        )
    }

    pub fn decode(attribute: &Attribute, little_endian: bool) -> Result<TypeRef, AttributeError> {
        match attribute.name() {
            AttributeName::DW_AT_fund_type => Ok(TypeRef::fundamental(attribute.value.as_u32()? as u16)),
            AttributeName::DW_AT_user_def_type => Ok(TypeRef::user(attribute.value.as_offset()?)),
            AttributeName::DW_AT_mod_fund_type => {
                let block = attribute.value.as_block()?;
                let split = block.len().checked_sub(2).ok_or(AttributeError::Stream(
                    StreamError::OutOfBounds { offset: 0, size: 2 },
                ))?;
                let ft = Stream::over(&block[split..], little_endian).read_half()?;
                Ok(TypeRef::with_modifiers(BaseType::Fundamental(ft), &block[..split]))
            }
            AttributeName::DW_AT_mod_u_d_type => {
                let block = attribute.value.as_block()?;
                let split = block.len().checked_sub(4).ok_or(AttributeError::Stream(
                    StreamError::OutOfBounds { offset: 0, size: 4 },
                ))?;
                let offset = Stream::over(&block[split..], little_endian).read_word()?;
                Ok(TypeRef::with_modifiers(BaseType::User(offset), &block[..split]))
            }
            _ => Err(AttributeError::WrongForm {
                expected: "a type",
                found: attribute.value.kind(),
            }),
        }
    }

    /// Modifier bytes are outermost first. A trailing const or volatile applies to the
    /// base type, any other qualifier applies to the pointer or reference after it.
    fn with_modifiers(base: BaseType, bytes: &[u8]) -> Self {
        let mut result = TypeRef {
            base,
            is_const: false,
            is_volatile: false,
            modifiers: Vec::with_capacity(bytes.len()),
        };
        let mut is_const = false;
        let mut is_volatile = false;
        for (i, &byte) in bytes.iter().enumerate() {
            let last = i + 1 == bytes.len();
            match byte {
                MOD_POINTER_TO | MOD_REFERENCE_TO => {
                    result.modifiers.push(Modifier {
                        kind: if byte == MOD_POINTER_TO {
                            ModifierKind::Pointer
                        } else {
                            ModifierKind::Reference
                        },
                        is_const,
                        is_volatile,
                    });
                    is_const = false;
                    is_volatile = false;
                }
                MOD_CONST if last => result.is_const = true,
                MOD_VOLATILE if last => result.is_volatile = true,
                MOD_CONST => is_const = true,
                MOD_VOLATILE => is_volatile = true,
                _ => {}
            }
        }
        result.modifiers.reverse();
        result
    }
}

// ---- Subscripts ----------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    Constant(u32),
    Location(Location),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscript {
    pub index_type: TypeRef,
    pub low: Bound,
    pub high: Bound,
}

impl Subscript {
    /// Number of elements, None unless both bounds are constants.
    pub fn dimension(&self) -> Option<u32> {
        match (&self.low, &self.high) {
            (Bound::Constant(low), Bound::Constant(high)) => Some(high.wrapping_sub(*low).wrapping_add(1)),
            _ => None,
        }
    }
}

/// Decoded subscr_data. Subscripts are in encoding order which is outermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptData {
    pub element: Option<TypeRef>,
    pub subscripts: Vec<Subscript>,
}

impl SubscriptData {
    pub fn decode(block: &[u8], little_endian: bool) -> Result<SubscriptData, AttributeError> {
        let mut data = SubscriptData {
            element: None,
            subscripts: Vec::new(),
        };
        let mut s = Stream::over(block, little_endian);
        while !s.at_end() {
            let format = s.read_byte()?;
            match format {
                FMT_ET => {
                    let offset = s.offset as u32;
                    let raw_name = s.read_half()?;
                    let form = Form::from_name(raw_name).ok_or(AttributeError::UnknownForm(raw_name & 0xf))?;
                    let value = read_value(&mut s, form)?;
                    let attribute = Attribute {
                        offset,
                        raw_name,
                        value,
                    };
                    data.element = Some(TypeRef::decode(&attribute, little_endian)?);
                }
                FMT_FT_C_C..=FMT_UT_X_X => {
                    let index_type = if format & 0x4 != 0 {
                        TypeRef::user(s.read_word()?)
                    } else {
                        TypeRef::fundamental(s.read_half()?)
                    };
                    let low = read_bound(&mut s, format & 0x2 != 0, little_endian)?;
                    let high = read_bound(&mut s, format & 0x1 != 0, little_endian)?;
                    data.subscripts.push(Subscript { index_type, low, high });
                }
                _ => return Err(AttributeError::UnknownSubscriptFormat(format)),
            }
        }
        Ok(data)
    }
}

fn read_bound(s: &mut Stream, is_location: bool, little_endian: bool) -> Result<Bound, AttributeError> {
    if is_location {
        let len = s.read_half()? as usize;
        let block = s.read_block(len)?;
        Ok(Bound::Location(Location::decode(block, little_endian)?))
    } else {
        Ok(Bound::Constant(s.read_word()?))
    }
}

// ---- Enumerators ---------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub value: i64,
}

/// Decodes an element_list in declaration order.
pub fn decode_element_list(block: &[u8], little_endian: bool) -> Result<Vec<Element>, AttributeError> {
    let mut elements = Vec::new();
    let mut s = Stream::over(block, little_endian);
    while !s.at_end() {
        let value = s.read_int()? as i64;
        let name = s.read_string()?;
        elements.push(Element { name, value });
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_attr(name: u16, value: AttributeValue) -> Attribute {
        Attribute {
            offset: 0,
            raw_name: name,
            value,
        }
    }

    fn pointer(is_const: bool, is_volatile: bool) -> Modifier {
        Modifier {
            kind: ModifierKind::Pointer,
            is_const,
            is_volatile,
        }
    }

    #[test]
    fn locations() {
        let decode = |bytes: &[u8]| Location::decode(bytes, false).unwrap();
        assert_eq!(decode(&[1, 0, 0, 0, 3]), Location::Register(3));
        assert_eq!(decode(&[3, 0x80, 0, 0x10, 0]), Location::Address(0x8000_1000));
        assert_eq!(decode(&[4, 0, 0, 0, 8, 7]), Location::Constant(8));
        let frame = decode(&[2, 0, 0, 0, 1, 4, 0xff, 0xff, 0xff, 0xf8, 7]);
        assert_eq!(frame, Location::BaseOffset { register: 1, offset: -8 });
        assert_eq!(frame.to_string(), "-8(r1)");
        assert_eq!(decode(&[3, 0x80, 0, 0x10, 0]).to_string(), "0x80001000");
        assert_eq!(Location::decode(&[1, 3, 0, 0, 0], true).unwrap().to_string(), "r3");

        let odd = decode(&[2, 0, 0, 0, 1, 6]);
        assert_eq!(
            odd,
            Location::Unrecognized(vec![LocationOp::BaseReg(1), LocationOp::Deref])
        );
        assert_eq!(odd.to_string(), "OP_BASEREG(1) OP_DEREF");
        assert_eq!(decode(&[]), Location::Unrecognized(vec![]));
        assert_eq!(
            decode(&[0x42, 1, 2]),
            Location::Unrecognized(vec![LocationOp::Unknown(0x42)])
        );
        assert!(Location::decode(&[1, 0, 0], false).is_err());
    }

    #[test]
    fn fundamental_types() {
        let t = TypeRef::decode(&type_attr(0x55, AttributeValue::Data2(FT_INTEGER)), false).unwrap();
        assert_eq!(t, TypeRef::fundamental(FT_INTEGER));

        let t = TypeRef::decode(&type_attr(0x72, AttributeValue::Ref(0x40)), false).unwrap();
        assert_eq!(t.user_offset(), Some(0x40));

        let err = TypeRef::decode(&type_attr(0x38, AttributeValue::String("x".into())), false);
        assert!(matches!(err, Err(AttributeError::WrongForm { .. })));
    }

    #[test]
    fn modifiers() {
        let decode = |mods: &[u8]| {
            let mut block = mods.to_vec();
            block.extend_from_slice(&[0, FT_CHAR as u8]);
            TypeRef::decode(&type_attr(0x63, AttributeValue::Block(block)), false).unwrap()
        };

        // const char*
        let t = decode(&[MOD_POINTER_TO, MOD_CONST]);
        assert!(t.is_const);
        assert_eq!(t.modifiers, vec![pointer(false, false)]);

        // char* const
        let t = decode(&[MOD_CONST, MOD_POINTER_TO]);
        assert!(!t.is_const);
        assert_eq!(t.modifiers, vec![pointer(true, false)]);

        // char* volatile* (innermost first)
        let t = decode(&[MOD_POINTER_TO, MOD_VOLATILE, MOD_POINTER_TO]);
        assert_eq!(t.modifiers, vec![pointer(false, true), pointer(false, false)]);

        // const char&
        let t = decode(&[MOD_REFERENCE_TO, MOD_CONST]);
        assert!(t.is_const);
        assert_eq!(t.modifiers[0].kind, ModifierKind::Reference);

        // just volatile
        let t = decode(&[MOD_VOLATILE]);
        assert!(t.is_volatile);
        assert!(t.modifiers.is_empty());
    }

    #[test]
    fn user_modifiers() {
        let block = vec![MOD_POINTER_TO, MOD_CONST, 0x12, 0x34, 0, 0];
        let t = TypeRef::decode(&type_attr(0x83, AttributeValue::Block(block)), true).unwrap();
        assert_eq!(t.base, BaseType::User(0x3412));
        assert!(t.is_const);
        assert_eq!(t.modifiers, vec![pointer(false, false)]);

        let short = TypeRef::decode(&type_attr(0x83, AttributeValue::Block(vec![1, 2])), true);
        assert!(matches!(short, Err(AttributeError::Stream(_))));
    }

    #[test]
    fn subscripts() {
        // int[4][2] with constant bounds then the element type
        let block = vec![
            FMT_FT_C_C, 0, 7, 0, 0, 0, 0, 0, 0, 0, 3, //
            FMT_FT_C_C, 0, 7, 0, 0, 0, 0, 0, 0, 0, 1, //
            FMT_ET, 0, 0x55, 0, 7,
        ];
        let data = SubscriptData::decode(&block, false).unwrap();
        assert_eq!(data.element, Some(TypeRef::fundamental(FT_INTEGER)));
        let dims: Vec<Option<u32>> = data.subscripts.iter().map(|s| s.dimension()).collect();
        assert_eq!(dims, vec![Some(4), Some(2)]);

        // [1, n] where n is held in a register
        let block = vec![FMT_FT_C_X, 0, 7, 0, 0, 0, 1, 0, 5, 1, 0, 0, 0, 4];
        let data = SubscriptData::decode(&block, false).unwrap();
        assert_eq!(data.element, None);
        assert_eq!(data.subscripts[0].low, Bound::Constant(1));
        assert_eq!(data.subscripts[0].high, Bound::Location(Location::Register(4)));
        assert_eq!(data.subscripts[0].dimension(), None);

        assert_eq!(
            SubscriptData::decode(&[9], false),
            Err(AttributeError::UnknownSubscriptFormat(9))
        );
    }

    #[test]
    fn element_lists() {
        let mut block = vec![0, 0, 0, 0];
        block.extend_from_slice(b"RED\0");
        block.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);
        block.extend_from_slice(b"NONE\0");
        let elements = decode_element_list(&block, false).unwrap();
        assert_eq!(
            elements,
            vec![
                Element {
                    name: "RED".to_string(),
                    value: 0
                },
                Element {
                    name: "NONE".to_string(),
                    value: -1
                },
            ]
        );
    }
}
