//! Walks the record tree once to build the model and then makes a short pass to link
//! member functions to their classes and attribute line entries to functions.
use super::*;
use crate::debug::{
    Attribute, AttributeName, FT_INTEGER, SubscriptData, Tag, decode_element_list,
};
use crate::error::AttributeError;
use crate::utils::{DiagnosticKind, Diagnostics};
use rangemap::RangeMap;

impl<'a> Model<'a> {
    /// Unrecognized records and attributes are reported to diagnostics and skipped.
    pub fn build(debug: &'a DebugInfo, diagnostics: &mut Diagnostics) -> Model<'a> {
        let mut builder = Builder {
            debug,
            diagnostics,
            model: Model {
                debug,
                files: Vec::new(),
                types: HashMap::new(),
                functions: HashMap::new(),
                variables: HashMap::new(),
                paths: HashMap::new(),
            },
        };
        for index in debug.roots() {
            match debug.record(index).tag {
                Tag::DW_TAG_compile_unit => builder.compile_unit(index),
                _ => builder.unknown_entry(index, None),
            }
        }
        builder.link_member_functions();
        builder.assign_lines();
        builder.model
    }
}

struct Builder<'a, 'd> {
    debug: &'a DebugInfo,
    diagnostics: &'d mut Diagnostics,
    model: Model<'a>,
}

/// Helper for the attribute loops: the type attribute is the last one seen.
struct Typed {
    ty: Option<TypeRef>,
}

impl Typed {
    fn or(self, default: u16) -> TypeRef {
        self.ty.unwrap_or_else(|| TypeRef::fundamental(default))
    }
}

impl<'a, 'd> Builder<'a, 'd> {
    fn compile_unit(&mut self, index: usize) {
        let offset = self.debug.record(index).offset;
        let mut file = File {
            offset,
            ..Default::default()
        };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => file.name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_producer => file.producer = self.string(index, attr),
                AttributeName::DW_AT_comp_dir => file.comp_dir = self.string(index, attr),
                AttributeName::DW_AT_language => file.language = self.number(index, attr),
                AttributeName::DW_AT_low_pc => file.low_pc = self.number(index, attr),
                AttributeName::DW_AT_high_pc => file.high_pc = self.number(index, attr),
                AttributeName::DW_AT_stmt_list => file.stmt_list = self.number(index, attr),
                _ => self.unknown_attribute(index, attr),
            }
        }

        for child in self.debug.children(index) {
            let record = self.debug.record(child);
            if record.is_padding() {
                continue;
            }
            match record.tag {
                Tag::DW_TAG_class_type | Tag::DW_TAG_structure_type | Tag::DW_TAG_union_type => {
                    self.class_type(child, &mut file)
                }
                Tag::DW_TAG_enumeration_type => self.enum_type(child, &mut file),
                Tag::DW_TAG_array_type => self.array_type(child, &mut file),
                Tag::DW_TAG_subroutine_type => self.subroutine_type(child, &mut file),
                Tag::DW_TAG_ptr_to_member_type => self.ptr_to_member_type(child, &mut file),
                Tag::DW_TAG_subroutine | Tag::DW_TAG_global_subroutine | Tag::DW_TAG_inlined_subroutine => {
                    self.subroutine(child, &mut file)
                }
                Tag::DW_TAG_global_variable | Tag::DW_TAG_local_variable => self.variable(child, &mut file),
                _ => self.unknown_entry(child, Some(index)),
            }
        }

        let position = self.model.files.len();
        self.model
            .paths
            .entry(file.name.clone())
            .or_default()
            .push(position);
        self.model.files.push(file);
    }

    fn class_type(&mut self, index: usize, file: &mut File) {
        let offset = self.debug.record(index).offset;
        let kind = match self.debug.record(index).tag {
            Tag::DW_TAG_class_type => ClassKind::Class,
            Tag::DW_TAG_union_type => ClassKind::Union,
            _ => ClassKind::Struct,
        };
        let mut class = ClassType {
            offset,
            kind,
            name: String::new(),
            byte_size: 0,
            members: Vec::new(),
            bases: Vec::new(),
            typedefs: Vec::new(),
            functions: Vec::new(),
        };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => class.name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_byte_size => class.byte_size = self.number(index, attr).unwrap_or(0),
                _ => self.unknown_attribute(index, attr),
            }
        }

        for child in self.debug.children(index) {
            let record = self.debug.record(child);
            if record.is_padding() {
                continue;
            }
            match record.tag {
                Tag::DW_TAG_member => {
                    let member = self.member(child, kind);
                    class.members.push(member);
                }
                Tag::DW_TAG_inheritance => {
                    let base = self.inheritance(child, kind);
                    class.bases.push(base);
                }
                Tag::DW_TAG_typedef => {
                    let typedef = self.typedef(child);
                    class.typedefs.push(typedef);
                }
                _ => self.unknown_entry(child, Some(index)),
            }
        }

        file.types.push(offset);
        self.model.types.insert(offset, UserType::Class(class));
    }

    fn member(&mut self, index: usize, kind: ClassKind) -> Member {
        let mut member = Member {
            offset: self.debug.record(index).offset,
            name: String::new(),
            ty: TypeRef::fundamental(FT_INTEGER),
            access: kind.default_access(),
            byte_offset: 0,
            bit_offset: None,
            bit_size: None,
        };
        let mut typed = Typed { ty: None };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => member.name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_public => member.access = Access::Public,
                AttributeName::DW_AT_protected => member.access = Access::Protected,
                AttributeName::DW_AT_private => member.access = Access::Private,
                AttributeName::DW_AT_location => {
                    // data member locations are "offset + base address"
                    member.byte_offset = match self.location(index, attr) {
                        Some(Location::Constant(n)) => n,
                        _ => 0,
                    };
                }
                AttributeName::DW_AT_bit_offset => member.bit_offset = self.number(index, attr).map(|n| n as u16),
                AttributeName::DW_AT_bit_size => member.bit_size = self.number(index, attr),
                AttributeName::DW_AT_byte_size => {}
                name if TypeRef::is_type_attribute(name) => typed.ty = self.type_ref(index, attr),
                _ => self.unknown_attribute(index, attr),
            }
        }
        member.ty = typed.or(FT_INTEGER);
        member
    }

    fn inheritance(&mut self, index: usize, kind: ClassKind) -> Base {
        let mut base = Base {
            access: kind.default_access(),
            is_virtual: false,
            ty: TypeRef::fundamental(FT_INTEGER),
        };
        let mut typed = Typed { ty: None };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_public => base.access = Access::Public,
                AttributeName::DW_AT_protected => base.access = Access::Protected,
                AttributeName::DW_AT_private => base.access = Access::Private,
                AttributeName::DW_AT_virtual => base.is_virtual = true,
                AttributeName::DW_AT_name | AttributeName::DW_AT_location => {}
                name if TypeRef::is_type_attribute(name) => typed.ty = self.type_ref(index, attr),
                _ => self.unknown_attribute(index, attr),
            }
        }
        base.ty = typed.or(FT_INTEGER);
        base
    }

    fn typedef(&mut self, index: usize) -> Typedef {
        let mut name = String::new();
        let mut typed = Typed { ty: None };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => name = self.string(index, attr).unwrap_or_default(),
                n if TypeRef::is_type_attribute(n) => typed.ty = self.type_ref(index, attr),
                _ => self.unknown_attribute(index, attr),
            }
        }
        Typedef {
            offset: self.debug.record(index).offset,
            name,
            ty: typed.or(FT_INTEGER),
        }
    }

    fn enum_type(&mut self, index: usize, file: &mut File) {
        let offset = self.debug.record(index).offset;
        let mut e = EnumType {
            offset,
            name: String::new(),
            byte_size: None,
            enumerators: Vec::new(),
        };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => e.name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_byte_size => e.byte_size = self.number(index, attr),
                AttributeName::DW_AT_element_list => {
                    let elements = attr
                        .value
                        .as_block()
                        .and_then(|block| decode_element_list(block, self.debug.little_endian));
                    if let Some(elements) = self.decoded(index, attr, elements) {
                        e.enumerators = elements
                            .into_iter()
                            .map(|el| Enumerator {
                                name: el.name,
                                value: el.value,
                            })
                            .collect();
                    }
                }
                _ => self.unknown_attribute(index, attr),
            }
        }
        file.types.push(offset);
        self.model.types.insert(offset, UserType::Enum(e));
    }

    fn array_type(&mut self, index: usize, file: &mut File) {
        let offset = self.debug.record(index).offset;
        let mut array = ArrayType {
            offset,
            name: String::new(),
            element: TypeRef::fundamental(FT_INTEGER),
            dimensions: Vec::new(),
        };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => array.name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_ordering | AttributeName::DW_AT_byte_size => {}
                AttributeName::DW_AT_subscr_data => {
                    let data = attr
                        .value
                        .as_block()
                        .and_then(|block| SubscriptData::decode(block, self.debug.little_endian));
                    if let Some(data) = self.decoded(index, attr, data) {
                        if let Some(element) = data.element {
                            array.element = element;
                        }
                        array.dimensions = data.subscripts.iter().map(|s| s.dimension()).collect();
                    }
                }
                _ => self.unknown_attribute(index, attr),
            }
        }
        file.types.push(offset);
        self.model.types.insert(offset, UserType::Array(array));
    }

    fn subroutine_type(&mut self, index: usize, file: &mut File) {
        let offset = self.debug.record(index).offset;
        let mut ft = FunctionType {
            offset,
            name: String::new(),
            return_type: TypeRef::void(),
            parameters: Vec::new(),
            variadic: false,
        };
        let mut typed = Typed { ty: None };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => ft.name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_prototyped => {}
                name if TypeRef::is_type_attribute(name) => typed.ty = self.type_ref(index, attr),
                _ => self.unknown_attribute(index, attr),
            }
        }
        if let Some(ty) = typed.ty {
            ft.return_type = ty;
        }

        for child in self.debug.children(index) {
            let record = self.debug.record(child);
            if record.is_padding() {
                continue;
            }
            match record.tag {
                Tag::DW_TAG_formal_parameter => {
                    let param = self.parameter(child);
                    ft.parameters.push(param);
                }
                Tag::DW_TAG_unspecified_parameters => ft.variadic = true,
                _ => self.unknown_entry(child, Some(index)),
            }
        }
        file.types.push(offset);
        self.model.types.insert(offset, UserType::Function(ft));
    }

    fn ptr_to_member_type(&mut self, index: usize, file: &mut File) {
        let offset = self.debug.record(index).offset;
        let mut p = PointerToMemberType {
            offset,
            name: String::new(),
            ty: TypeRef::fundamental(FT_INTEGER),
            containing: 0,
        };
        let mut typed = Typed { ty: None };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => p.name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_containing_type => {
                    let containing = attr.value.as_offset();
                    p.containing = self.decoded(index, attr, containing).unwrap_or(0);
                }
                name if TypeRef::is_type_attribute(name) => typed.ty = self.type_ref(index, attr),
                _ => self.unknown_attribute(index, attr),
            }
        }
        p.ty = typed.or(FT_INTEGER);
        file.types.push(offset);
        self.model.types.insert(offset, UserType::PointerToMember(p));
    }

    fn subroutine(&mut self, index: usize, file: &mut File) {
        let record = self.debug.record(index);
        let offset = record.offset;
        let mut f = Function {
            signature: FunctionType {
                offset,
                name: String::new(),
                return_type: TypeRef::void(),
                parameters: Vec::new(),
                variadic: false,
            },
            is_global: record.tag == Tag::DW_TAG_global_subroutine,
            is_inline: record.tag == Tag::DW_TAG_inlined_subroutine,
            low_pc: 0,
            high_pc: 0,
            member_of: None,
            access: Access::Public,
            mangled: None,
            variables: Vec::new(),
            lines: Vec::new(),
        };
        let mut typed = Typed { ty: None };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => f.signature.name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_low_pc => f.low_pc = self.number(index, attr).unwrap_or(0),
                AttributeName::DW_AT_high_pc => f.high_pc = self.number(index, attr).unwrap_or(0),
                AttributeName::DW_AT_inline => f.is_inline = true,
                AttributeName::DW_AT_member => {
                    let class = attr.value.as_offset();
                    f.member_of = self.decoded(index, attr, class);
                }
                AttributeName::DW_AT_public => f.access = Access::Public,
                AttributeName::DW_AT_protected => f.access = Access::Protected,
                AttributeName::DW_AT_private => f.access = Access::Private,
                AttributeName::DW_AT_MW_mangled => f.mangled = self.string(index, attr),
                AttributeName::DW_AT_MW_global_ref
                | AttributeName::DW_AT_MW_global_ref_by_name
                | AttributeName::DW_AT_MW_restore_SP
                | AttributeName::DW_AT_return_addr
                | AttributeName::DW_AT_prototyped => {}
                name if TypeRef::is_type_attribute(name) => typed.ty = self.type_ref(index, attr),
                _ => self.unknown_attribute(index, attr),
            }
        }
        if let Some(ty) = typed.ty {
            f.signature.return_type = ty;
        }

        for child in self.debug.children(index) {
            let record = self.debug.record(child);
            if record.is_padding() {
                continue;
            }
            match record.tag {
                Tag::DW_TAG_formal_parameter => {
                    let param = self.parameter(child);
                    f.signature.parameters.push(param);
                }
                Tag::DW_TAG_unspecified_parameters => f.signature.variadic = true,
                Tag::DW_TAG_local_variable => {
                    let local = self.local_variable(child);
                    f.variables.push(local);
                }
                Tag::DW_TAG_lexical_block => self.lexical_block(child, &mut f.variables),
                _ => self.unknown_entry(child, Some(index)),
            }
        }
        file.functions.push(offset);
        self.model.functions.insert(offset, f);
    }

    /// Blocks don't introduce anything we render so their locals are hoisted into the
    /// enclosing function.
    fn lexical_block(&mut self, index: usize, variables: &mut Vec<LocalVariable>) {
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_low_pc | AttributeName::DW_AT_high_pc | AttributeName::DW_AT_name => {}
                _ => self.unknown_attribute(index, attr),
            }
        }
        for child in self.debug.children(index) {
            let record = self.debug.record(child);
            if record.is_padding() {
                continue;
            }
            match record.tag {
                Tag::DW_TAG_local_variable => {
                    let local = self.local_variable(child);
                    variables.push(local);
                }
                Tag::DW_TAG_lexical_block => self.lexical_block(child, variables),
                _ => self.unknown_entry(child, Some(index)),
            }
        }
    }

    fn parameter(&mut self, index: usize) -> Parameter {
        let (name, ty, location) = self.local(index);
        Parameter {
            offset: self.debug.record(index).offset,
            name,
            ty,
            location,
        }
    }

    fn local_variable(&mut self, index: usize) -> LocalVariable {
        let (name, ty, location) = self.local(index);
        LocalVariable {
            offset: self.debug.record(index).offset,
            name,
            ty,
            location,
        }
    }

    /// Parameters and locals have the same attributes.
    fn local(&mut self, index: usize) -> (String, TypeRef, Option<Location>) {
        let mut name = String::new();
        let mut location = None;
        let mut typed = Typed { ty: None };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_location => location = self.location(index, attr),
                AttributeName::DW_AT_user(_) => {}
                n if TypeRef::is_type_attribute(n) => typed.ty = self.type_ref(index, attr),
                _ => self.unknown_attribute(index, attr),
            }
        }
        (name, typed.or(FT_INTEGER), location)
    }

    fn variable(&mut self, index: usize, file: &mut File) {
        let record = self.debug.record(index);
        let offset = record.offset;
        let mut v = Variable {
            offset,
            name: String::new(),
            is_global: record.tag == Tag::DW_TAG_global_variable,
            ty: TypeRef::fundamental(FT_INTEGER),
            address: None,
            mangled: None,
            location: None,
        };
        let mut typed = Typed { ty: None };
        for attr in self.debug.attributes(index) {
            match attr.name() {
                AttributeName::DW_AT_name => v.name = self.string(index, attr).unwrap_or_default(),
                AttributeName::DW_AT_location => {
                    v.location = self.location(index, attr);
                    if let Some(Location::Address(addr)) = v.location {
                        v.address = Some(addr);
                    }
                }
                AttributeName::DW_AT_MW_mangled => v.mangled = self.string(index, attr),
                AttributeName::DW_AT_MW_global_ref | AttributeName::DW_AT_MW_global_ref_by_name => {}
                name if TypeRef::is_type_attribute(name) => typed.ty = self.type_ref(index, attr),
                _ => self.unknown_attribute(index, attr),
            }
        }
        v.ty = typed.or(FT_INTEGER);
        file.variables.push(offset);
        self.model.variables.insert(offset, v);
    }

    /// A class doesn't know its member functions until every function has been seen.
    fn link_member_functions(&mut self) {
        let mut links = Vec::new();
        for file in &self.model.files {
            for offset in &file.functions {
                if let Some(class) = self.model.functions.get(offset).and_then(|f| f.member_of) {
                    links.push((*offset, class));
                }
            }
        }

        for (function, class) in links {
            match self.model.types.get_mut(&class) {
                Some(UserType::Class(c)) => c.functions.push(function),
                _ => self.diagnostics.report(
                    DiagnosticKind::UnknownAttribute,
                    function,
                    format!(
                        "Member function at offset 0x{function:X} refers to 0x{class:X} which isn't a class"
                    ),
                ),
            }
        }
    }

    /// Several units may use stmt_list 0 to mean "no line table". Only the first such
    /// unit is given the table at offset 0.
    fn assign_lines(&mut self) {
        let mut claimed_zero = false;
        for file in self.model.files.iter_mut() {
            let Some(stmt_list) = file.stmt_list else {
                continue;
            };
            if stmt_list == 0 {
                if claimed_zero {
                    continue;
                }
                claimed_zero = true;
            }
            let Some(table) = self.debug.line_table(stmt_list) else {
                continue;
            };
            file.line_table = Some(stmt_list);

            let mut ranges = RangeMap::new();
            for offset in &file.functions {
                if let Some(f) = self.model.functions.get(offset) {
                    if f.low_pc < f.high_pc {
                        ranges.insert(f.low_pc..f.high_pc, *offset);
                    }
                }
            }
            for entry in &table.entries {
                match ranges.get(&entry.address) {
                    Some(offset) => {
                        if let Some(f) = self.model.functions.get_mut(offset) {
                            f.lines.push(*entry);
                        }
                    }
                    None => self.diagnostics.report(
                        DiagnosticKind::UnrecognizedLine,
                        entry.address,
                        format!(
                            "Unrecognized line entry: line {} at address 0x{:X} in {}",
                            entry.line, entry.address, file.name
                        ),
                    ),
                }
            }
        }
    }

    fn unknown_entry(&mut self, child: usize, parent: Option<usize>) {
        let record = self.debug.record(child);
        if record.is_padding() {
            return;
        }
        let parent = match parent {
            Some(parent) => self.debug.describe(parent),
            None => "(root)".to_string(),
        };
        self.diagnostics.report(
            DiagnosticKind::UnknownEntry,
            record.offset,
            format!(
                "Unknown child entry {} at offset 0x{:X} in parent entry {}",
                self.debug.describe(child),
                record.offset,
                parent
            ),
        );
    }

    fn unknown_attribute(&mut self, index: usize, attr: &Attribute) {
        if attr.name() == AttributeName::DW_AT_sibling {
            return;
        }
        self.diagnostics.report(
            DiagnosticKind::UnknownAttribute,
            attr.offset,
            format!(
                "Unknown attribute {} at offset 0x{:X} in entry {}",
                attr.name(),
                attr.offset,
                self.debug.describe(index)
            ),
        );
    }

    /// Reports payloads that couldn't be interpreted.
    fn decoded<T>(&mut self, index: usize, attr: &Attribute, result: Result<T, AttributeError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.diagnostics.report(
                    DiagnosticKind::UnknownAttribute,
                    attr.offset,
                    format!(
                        "Couldn't decode {} at offset 0x{:X} in entry {}: {err}",
                        attr.name(),
                        attr.offset,
                        self.debug.describe(index)
                    ),
                );
                None
            }
        }
    }

    fn string(&mut self, index: usize, attr: &Attribute) -> Option<String> {
        let s = attr.value.as_str().map(|s| s.to_string());
        self.decoded(index, attr, s)
    }

    fn number(&mut self, index: usize, attr: &Attribute) -> Option<u32> {
        let n = attr.value.as_u32();
        self.decoded(index, attr, n)
    }

    fn type_ref(&mut self, index: usize, attr: &Attribute) -> Option<TypeRef> {
        let ty = TypeRef::decode(attr, self.debug.little_endian);
        let ty = self.decoded(index, attr, ty)?;
        if let Some(offset) = ty.user_offset() {
            if self.debug.find(offset).is_none() {
                panic!(
                    "no debug record at offset {offset:#x} for {} in entry {}",
                    attr.name(),
                    self.debug.describe(index)
                );
            }
        }
        Some(ty)
    }

    fn location(&mut self, index: usize, attr: &Attribute) -> Option<Location> {
        let location = attr
            .value
            .as_block()
            .and_then(|block| Location::decode(block, self.debug.little_endian));
        let location = self.decoded(index, attr, location)?;
        if let Location::Unrecognized(_) = location {
            self.diagnostics.report(
                DiagnosticKind::UnrecognizedLocation,
                attr.offset,
                format!(
                    "Unrecognized location {location} at offset 0x{:X} in entry {}",
                    attr.offset,
                    self.debug.describe(index)
                ),
            );
        }
        Some(location)
    }
}
