use super::{Code, RenderSettings, SpecialName, TokenKind, demangle, special_name};
use crate::debug::{BaseType, Modifier, ModifierKind, TypeRef};
use crate::disasm::Disassembler;
use crate::elf::ElfFile;
use crate::model::*;

/// Writes C++ for files or individual entities. The only state kept between the
/// pieces of one render is the indent level.
pub struct Renderer<'a> {
    model: &'a Model<'a>,
    settings: &'a RenderSettings,
    disassembly: Option<(&'a ElfFile, &'a dyn Disassembler)>,
    indent: usize,
    code: Code,
}

impl<'a> Renderer<'a> {
    pub fn new(model: &'a Model<'a>, settings: &'a RenderSettings) -> Self {
        Renderer {
            model,
            settings,
            disassembly: None,
            indent: 0,
            code: Code::new(),
        }
    }

    /// Used when the disassembly setting is on.
    pub fn with_disassembly(mut self, image: &'a ElfFile, disassembler: &'a dyn Disassembler) -> Self {
        self.disassembly = Some((image, disassembler));
        self
    }

    pub fn render_all(&mut self) -> Code {
        let model = self.model;
        let files: Vec<&File> = model.files.iter().collect();
        self.render_files(&files)
    }

    /// Renders every compile unit with the path. Empty if there are none.
    pub fn render_path(&mut self, path: &str) -> Code {
        let model = self.model;
        let files = model.files_with_path(path);
        self.render_files(&files)
    }

    pub fn render_files(&mut self, files: &[&File]) -> Code {
        self.reset();
        self.files(files);
        std::mem::take(&mut self.code)
    }

    /// Renders the file, type, variable or function whose record is at offset.
    pub fn render_entry(&mut self, offset: u32) -> Code {
        self.reset();
        let model = self.model;
        if let Some(file) = model.file(offset) {
            self.files(&[file]);
        } else if let Some(t) = model.types.get(&offset) {
            self.user_type(t);
        } else if let Some(v) = model.variables.get(&offset) {
            self.variable(v);
        } else if let Some(f) = model.functions.get(&offset) {
            self.function_definition(f);
        }
        std::mem::take(&mut self.code)
    }

    fn reset(&mut self) {
        self.indent = 0;
        self.code = Code::new();
    }

    // ---- Files -----------------------------------------------------------------

    fn files(&mut self, files: &[&File]) {
        let model = self.model;
        if self.settings.entry_offsets {
            for file in files {
                self.comment(&format!("DWARF: 0x{:X}", file.offset));
                self.newline();
                self.newline();
            }
        }

        for file in files {
            let mut types: Vec<&UserType> = model
                .file_types(file)
                .filter(|t| !self.can_inline(t.name()) && self.wanted(t))
                .collect();
            if self.settings.sort_types_alphabetically {
                types.sort_by_key(|t| t.name().to_lowercase());
            }
            for t in types {
                self.user_type(t);
                self.newline();
                self.newline();
            }
        }

        if self.settings.variables {
            let variables: Vec<&Variable> = files.iter().flat_map(|f| model.file_variables(f)).collect();
            for v in &variables {
                self.variable(v);
                self.newline();
            }
            if !variables.is_empty() {
                self.newline();
            }
        }

        let mut functions: Vec<&Function> = files.iter().flat_map(|f| model.file_functions(f)).collect();
        if self.settings.sort_functions_by_address {
            functions.sort_by_key(|f| f.low_pc);
        }
        if self.settings.function_declarations && !functions.is_empty() {
            for f in &functions {
                self.function_declaration(f, false);
                self.newline();
            }
            self.newline();
        }
        if self.settings.function_definitions {
            for f in &functions {
                self.function_definition(f);
                self.newline();
                self.newline();
            }
        }
    }

    fn wanted(&self, t: &UserType) -> bool {
        match t {
            UserType::Class(_) => self.settings.classes,
            UserType::Enum(_) => self.settings.enums,
            UserType::Array(_) => self.settings.arrays,
            UserType::Function(_) => self.settings.function_types,
            UserType::PointerToMember(_) => self.settings.pointer_to_member_types,
        }
    }

    /// Anonymous types are written where they're used instead of being referenced by
    /// name.
    fn can_inline(&self, name: &str) -> bool {
        name.is_empty() || (self.settings.inline_anonymous_types && name.starts_with('@'))
    }

    // ---- Types -----------------------------------------------------------------

    fn user_type(&mut self, t: &UserType) {
        match t {
            UserType::Class(c) => self.class(c, false),
            UserType::Enum(e) => self.enumeration(e, false),
            UserType::Array(a) => self.array_typedef(a),
            UserType::Function(f) => self.function_typedef(f),
            UserType::PointerToMember(p) => self.pointer_to_member_typedef(p),
        }
    }

    fn entry_comment(&mut self, mut comment: Vec<String>, offset: u32) {
        if self.settings.entry_offsets {
            comment.push(format!("DWARF: 0x{offset:X}"));
        }
        if !comment.is_empty() {
            self.comment(&comment.join(", "));
            self.newline();
        }
    }

    fn class(&mut self, c: &ClassType, inline: bool) {
        let mut comment = Vec::new();
        if self.settings.class_sizes {
            comment.push(format!("Size: 0x{:X}", c.byte_size));
        }
        self.entry_comment(comment, c.offset);

        self.keyword(c.kind.keyword());
        if !inline && !c.name.is_empty() {
            self.space();
            self.identifier(&c.name);
        }
        for (i, base) in c.bases.iter().enumerate() {
            self.punctuation(if i == 0 { " : " } else { ", " });
            if base.is_virtual {
                self.keyword("virtual");
                self.space();
            }
            if base.access != c.kind.default_access() {
                self.keyword(&base.access.to_string());
                self.space();
            }
            self.type_name(&base.ty);
        }
        self.newline();
        self.punctuation("{");

        let model = self.model;
        let mut empty = true;
        if !c.typedefs.is_empty() {
            self.indent += 1;
            for t in &c.typedefs {
                self.newline();
                self.typedef(t);
            }
            self.indent -= 1;
            self.newline();
            empty = false;
        }

        // one access run spans the members and then the member functions
        let mut previous = c.kind.default_access();
        if !c.members.is_empty() {
            self.indent += 1;
            for (i, m) in c.members.iter().enumerate() {
                self.access_label(m.access, &mut previous, i == 0);
                self.newline();
                self.member(m);
            }
            self.indent -= 1;
            self.newline();
            empty = false;
        }

        let functions: Vec<&Function> = c.functions.iter().filter_map(|o| model.functions.get(o)).collect();
        if !functions.is_empty() {
            self.indent += 1;
            for (i, f) in functions.iter().enumerate() {
                self.access_label(f.access, &mut previous, i == 0);
                self.newline();
                self.function_declaration(f, true);
            }
            self.indent -= 1;
            self.newline();
            empty = false;
        }

        if empty {
            self.newline();
        }
        self.punctuation("}");
        if !inline {
            self.punctuation(";");
        }
    }

    /// Labels are unindented and separated from the previous run by a blank line.
    fn access_label(&mut self, access: Access, previous: &mut Access, first: bool) {
        if access != *previous {
            self.line_break();
            if !first {
                self.line_break();
            }
            self.keyword(&access.to_string());
            self.punctuation(":");
            *previous = access;
        }
    }

    fn member(&mut self, m: &Member) {
        self.declaration(&m.ty, &m.name);
        if let Some(bit_size) = m.bit_size {
            self.punctuation(" : ");
            self.literal(&bit_size.to_string());
        }
        self.punctuation(";");

        let mut comment = Vec::new();
        if self.settings.member_offsets {
            comment.push(format!("Offset: 0x{:X}", m.byte_offset));
        }
        if self.settings.entry_offsets {
            comment.push(format!("DWARF: 0x{:X}", m.offset));
        }
        if m.is_bitfield() {
            if let (true, Some(bit_offset)) = (self.settings.member_bit_offsets, m.bit_offset) {
                comment.push(format!("Bit Offset: {bit_offset}"));
            }
            if let (true, Some(bit_size)) = (self.settings.member_bit_sizes, m.bit_size) {
                comment.push(format!("Bit Size: {bit_size}"));
            }
        }
        self.trailing_comment(&comment);
    }

    fn typedef(&mut self, t: &Typedef) {
        self.keyword("typedef");
        self.space();
        self.declaration(&t.ty, &t.name);
        self.punctuation(";");
    }

    /// Values are only written when they don't follow from the previous enumerator.
    fn enumeration(&mut self, e: &EnumType, inline: bool) {
        self.entry_comment(Vec::new(), e.offset);
        self.keyword("enum");
        if !inline && !e.name.is_empty() {
            self.space();
            self.identifier(&e.name);
        }
        self.newline();
        self.punctuation("{");

        self.indent += 1;
        let mut previous = -1;
        for (i, el) in e.enumerators.iter().enumerate() {
            self.newline();
            self.identifier(&el.name);
            if el.value != previous + 1 || self.settings.force_explicit_enum_values {
                self.punctuation(" = ");
                let value = if !self.settings.hexadecimal_enum_values {
                    el.value.to_string()
                } else if el.value < 0 {
                    format!("-0x{:X}", el.value.unsigned_abs())
                } else {
                    format!("0x{:X}", el.value)
                };
                self.literal(&value);
            }
            if i + 1 < e.enumerators.len() {
                self.punctuation(",");
            }
            previous = el.value;
        }
        self.indent -= 1;

        self.newline();
        self.punctuation("}");
        if !inline {
            self.punctuation(";");
        }
    }

    fn array_typedef(&mut self, a: &ArrayType) {
        self.entry_comment(Vec::new(), a.offset);
        self.keyword("typedef");
        self.space();
        let tight = self.type_prefix(&a.element);
        if !a.name.is_empty() {
            if !tight {
                self.space();
            }
            self.identifier(&a.name);
        }
        self.dimensions(a);
        self.type_postfix(&a.element);
        self.punctuation(";");
    }

    fn function_typedef(&mut self, f: &FunctionType) {
        self.entry_comment(Vec::new(), f.offset);
        self.keyword("typedef");
        self.space();
        self.type_prefix(&f.return_type);
        self.punctuation(" (");
        self.identifier(&f.name);
        self.punctuation(")");
        self.parameters(f, false);
        self.type_postfix(&f.return_type);
        self.punctuation(";");
    }

    fn pointer_to_member_typedef(&mut self, p: &PointerToMemberType) {
        self.entry_comment(Vec::new(), p.offset);
        self.keyword("typedef");
        self.space();
        self.pointer_to_member_prefix(p, &[]);
        self.identifier(&p.name);
        self.type_postfix(&p.ty);
        self.punctuation(";");
    }

    // ---- Declarators -----------------------------------------------------------

    /// `int* p`, `void (*f)(int)`, `char s[8]`, etc.
    fn declaration(&mut self, ty: &TypeRef, name: &str) {
        let tight = self.type_prefix(ty);
        if !name.is_empty() {
            if !tight {
                self.space();
            }
            self.identifier(name);
        }
        self.type_postfix(ty);
    }

    /// A type without a declared name, e.g. a return type or base class.
    fn type_name(&mut self, ty: &TypeRef) {
        self.type_prefix(ty);
        self.type_postfix(ty);
    }

    /// The user type is written in full when it's anonymous.
    fn inlined(&self, offset: u32) -> Option<&'a UserType> {
        let model = self.model;
        if self.can_inline(model.type_name(offset)) {
            model.types.get(&offset)
        } else {
            None
        }
    }

    /// Writes everything that goes before the declared name. Returns true if the name
    /// should follow without a space, e.g. after the "(*" of a function pointer.
    fn type_prefix(&mut self, ty: &TypeRef) -> bool {
        if ty.is_const || ty.is_volatile {
            self.const_volatile(ty.is_const, ty.is_volatile);
            self.space();
        }
        match ty.base {
            BaseType::Fundamental(ft) => {
                let name = self.settings.fundamental_names.name(ft);
                self.keyword(&name);
                self.modifiers(&ty.modifiers);
                false
            }
            BaseType::User(offset) => match self.inlined(offset) {
                Some(t) => self.inline_prefix(t, &ty.modifiers),
                None => {
                    let model = self.model;
                    let name = model.type_name(offset);
                    self.identifier(name);
                    self.modifiers(&ty.modifiers);
                    false
                }
            },
        }
    }

    /// Writes everything that goes after the declared name.
    fn type_postfix(&mut self, ty: &TypeRef) {
        if let BaseType::User(offset) = ty.base {
            if let Some(t) = self.inlined(offset) {
                self.inline_postfix(t, &ty.modifiers);
            }
        }
    }

    /// Arrays and functions bind tighter than pointers so pointers to them need
    /// parentheses.
    fn inline_prefix(&mut self, t: &UserType, modifiers: &[Modifier]) -> bool {
        match t {
            UserType::Class(c) => {
                self.class(c, true);
                self.modifiers(modifiers);
                false
            }
            UserType::Enum(e) => {
                self.enumeration(e, true);
                self.modifiers(modifiers);
                false
            }
            UserType::Array(a) => {
                let tight = self.type_prefix(&a.element);
                if modifiers.is_empty() {
                    tight
                } else {
                    self.punctuation(if tight { "(" } else { " (" });
                    self.modifiers(modifiers);
                    true
                }
            }
            UserType::Function(f) => {
                self.type_prefix(&f.return_type);
                self.punctuation(" (");
                self.modifiers(modifiers);
                true
            }
            UserType::PointerToMember(p) => {
                self.pointer_to_member_prefix(p, modifiers);
                true
            }
        }
    }

    fn inline_postfix(&mut self, t: &UserType, modifiers: &[Modifier]) {
        match t {
            UserType::Class(_) | UserType::Enum(_) => {}
            UserType::Array(a) => {
                if !modifiers.is_empty() {
                    self.punctuation(")");
                }
                self.dimensions(a);
                self.type_postfix(&a.element);
            }
            UserType::Function(f) => {
                self.punctuation(")");
                self.parameters(f, false);
                self.type_postfix(&f.return_type);
            }
            UserType::PointerToMember(p) => self.type_postfix(&p.ty),
        }
    }

    /// `int C::*` or, for member functions, `void (C::*`.
    fn pointer_to_member_prefix(&mut self, p: &PointerToMemberType, modifiers: &[Modifier]) {
        let tight = self.type_prefix(&p.ty);
        if !tight {
            self.space();
        }
        let model = self.model;
        let class = model.type_name(p.containing);
        self.identifier(class);
        self.punctuation("::*");
        self.modifiers(modifiers);
    }

    fn dimensions(&mut self, a: &ArrayType) {
        for dimension in &a.dimensions {
            self.punctuation("[");
            if let Some(n) = dimension {
                self.literal(&n.to_string());
            }
            self.punctuation("]");
        }
    }

    fn modifiers(&mut self, modifiers: &[Modifier]) {
        for (i, m) in modifiers.iter().enumerate() {
            self.punctuation(match m.kind {
                ModifierKind::Pointer => "*",
                ModifierKind::Reference => "&",
            });
            if m.is_const || m.is_volatile {
                self.space();
                self.const_volatile(m.is_const, m.is_volatile);
                if i + 1 < modifiers.len() {
                    self.space();
                }
            }
        }
    }

    fn const_volatile(&mut self, is_const: bool, is_volatile: bool) {
        if is_const {
            self.keyword("const");
        }
        if is_const && is_volatile {
            self.space();
        }
        if is_volatile {
            self.keyword("volatile");
        }
    }

    // ---- Variables and functions -----------------------------------------------

    fn variable(&mut self, v: &Variable) {
        if !v.is_global {
            self.keyword("static");
            self.space();
        }
        self.declaration(&v.ty, &v.name);
        self.punctuation(";");

        let mut comment = Vec::new();
        if let (true, Some(mangled)) = (self.settings.variable_mangled_names, &v.mangled) {
            comment.push(mangled.clone());
        }
        if let (true, Some(address)) = (self.settings.variable_addresses, v.address) {
            comment.push(format!("Address: 0x{address:X}"));
        }
        if self.settings.entry_offsets {
            comment.push(format!("DWARF: 0x{:X}", v.offset));
        }
        self.trailing_comment(&comment);
    }

    fn function_declaration(&mut self, f: &Function, inside_class: bool) {
        self.signature(f, false, inside_class);
        self.punctuation(";");
    }

    fn function_definition(&mut self, f: &Function) {
        if let (true, Some(mangled)) = (self.settings.function_mangled_names, &f.mangled) {
            self.comment(mangled);
            self.newline();
        }
        if self.settings.function_addresses {
            self.comment(&format!("Address: 0x{:X}", f.low_pc));
            self.newline();
        }
        if self.settings.function_sizes {
            self.comment(&format!("Size: 0x{:X}", f.size()));
            self.newline();
        }
        self.entry_comment(Vec::new(), f.offset());

        self.signature(f, true, false);
        self.newline();
        self.punctuation("{");
        self.indent += 1;
        for v in &f.variables {
            self.newline();
            self.declaration(&v.ty, &v.name);
            self.punctuation(";");
            if let (true, Some(location)) = (self.settings.variable_locations, &v.location) {
                self.space();
                self.comment(&location.to_string());
            }
        }
        if self.settings.disassembly {
            self.instructions(f);
        }
        self.indent -= 1;
        self.newline();
        self.punctuation("}");
    }

    /// Non-static member functions have an explicit `this` parameter which is used to
    /// decide on static and const but isn't itself written.
    fn signature(&mut self, f: &Function, definition: bool, inside_class: bool) {
        let this = f.this();
        let is_member = f.member_of.is_some();
        let is_static = (!is_member && !f.is_global) || (is_member && this.is_none() && inside_class);
        if is_static {
            self.keyword("static");
            self.space();
        }
        if f.is_inline {
            self.keyword("inline");
            self.space();
        }

        let special = special_name(f.name());
        if !matches!(special, Some(SpecialName::Constructor) | Some(SpecialName::Destructor)) {
            self.type_name(&f.signature.return_type);
            self.space();
        }

        let model = self.model;
        let class = f.member_of.map(move |offset| model.type_name(offset));
        if let (Some(class), false) = (class, inside_class) {
            self.identifier(class);
            self.punctuation("::");
        }
        self.identifier(&demangle(f.name(), class));
        self.parameters(&f.signature, definition);
        if this.is_some_and(|p| p.ty.is_const) {
            self.space();
            self.keyword("const");
        }
    }

    fn parameters(&mut self, f: &FunctionType, definition: bool) {
        self.punctuation("(");
        let mut first = true;
        for p in f.parameters.iter().filter(|p| p.name != "this") {
            if !first {
                self.punctuation(", ");
            }
            first = false;
            self.declaration(&p.ty, &p.name);
            if definition && self.settings.variable_locations {
                if let Some(location) = &p.location {
                    self.space();
                    self.code.push(TokenKind::Comment, &format!("/* {location} */"));
                }
            }
        }
        if f.variadic {
            if !first {
                self.punctuation(", ");
            }
            self.punctuation("...");
        }
        self.punctuation(")");
    }

    /// One comment per instruction with a line number comment after the instruction
    /// at the start of each line. Nothing is written if the code can't be
    /// disassembled.
    fn instructions(&mut self, f: &Function) {
        let Some((image, disassembler)) = self.disassembly else {
            return;
        };
        if f.low_pc >= f.high_pc {
            return;
        }
        let Ok(instructions) = disassembler.disassemble(image, f.low_pc, f.high_pc) else {
            return;
        };

        let mut lines = f.lines.clone();
        lines.sort_by_key(|l| l.address);
        let mut lines = lines.iter().peekable();
        if !f.variables.is_empty() {
            self.line_break();
        }
        for inst in &instructions {
            self.newline();
            let text = format!("{:08X}  {:<8} {}", inst.address, inst.mnemonic, inst.operands);
            self.comment(text.trim_end());
            while let Some(line) = lines.peek() {
                if line.address < inst.address {
                    lines.next();
                } else if line.address == inst.address {
                    self.newline();
                    self.comment(&format!("Line {}", line.line));
                    lines.next();
                } else {
                    break;
                }
            }
        }
    }

    // ---- Tokens ----------------------------------------------------------------

    fn keyword(&mut self, text: &str) {
        self.code.push(TokenKind::Keyword, text);
    }

    fn identifier(&mut self, text: &str) {
        self.code.push(TokenKind::Identifier, text);
    }

    fn literal(&mut self, text: &str) {
        self.code.push(TokenKind::Literal, text);
    }

    fn punctuation(&mut self, text: &str) {
        self.code.push(TokenKind::Punctuation, text);
    }

    fn comment(&mut self, text: &str) {
        self.code.push(TokenKind::Comment, &format!("// {text}"));
    }

    fn trailing_comment(&mut self, parts: &[String]) {
        if !parts.is_empty() {
            self.space();
            self.comment(&parts.join(", "));
        }
    }

    fn space(&mut self) {
        self.punctuation(" ");
    }

    fn newline(&mut self) {
        self.punctuation("\n");
        for _ in 0..self.indent {
            self.punctuation("    ");
        }
    }

    /// A newline without indentation.
    fn line_break(&mut self) {
        self.punctuation("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{DebugInfo, FT_CHAR, FT_INTEGER, FT_VOID, FMT_ET, FMT_FT_C_C};
    use crate::disasm::PowerPc;
    use crate::testing::{LineTable, Node, Piece, Value, addr_location, debug_image, encode_debug, encode_lines};
    use crate::utils::{DiagnosticSettings, Diagnostics};

    const TAG_ARRAY: u16 = 0x01;
    const TAG_CLASS: u16 = 0x02;
    const TAG_ENUM: u16 = 0x04;
    const TAG_PARAM: u16 = 0x05;
    const TAG_GLOBAL_FUNC: u16 = 0x06;
    const TAG_GLOBAL_VAR: u16 = 0x07;
    const TAG_LOCAL: u16 = 0x0c;
    const TAG_MEMBER: u16 = 0x0d;
    const TAG_CU: u16 = 0x11;
    const TAG_STRUCT: u16 = 0x13;
    const TAG_FUNC: u16 = 0x14;
    const TAG_FUNC_TYPE: u16 = 0x15;
    const TAG_VARARGS: u16 = 0x18;
    const TAG_PTR_TO_MEMBER: u16 = 0x1f;

    const AT_SUBSCR_DATA: u16 = 0x00a3;
    const AT_ELEMENT_LIST: u16 = 0x00f4;
    const AT_STMT_LIST: u16 = 0x0106;
    const AT_MEMBER: u16 = 0x0142;
    const AT_CONTAINING_TYPE: u16 = 0x01d2;
    const AT_PRIVATE: u16 = 0x0248;
    const AT_PROTECTED: u16 = 0x0268;
    const AT_PUBLIC: u16 = 0x0288;

    fn render_with(roots: &[Node], settings: &RenderSettings) -> String {
        let bytes = encode_debug(roots, false);
        let debug = DebugInfo::decode(&bytes, None, false).unwrap();
        let mut d = Diagnostics::new(DiagnosticSettings::default());
        let model = Model::build(&debug, &mut d);
        let code = Renderer::new(&model, settings).render_all();
        code.to_plain_text().trim_end().to_string()
    }

    fn render(roots: &[Node]) -> String {
        render_with(roots, &RenderSettings::default().without_comments())
    }

    fn unit(children: Vec<Node>) -> Node {
        Node::new(TAG_CU).name("a.cpp").children(children)
    }

    fn flag(node: Node, name: u16) -> Node {
        node.attr(name, Value::Str(String::new()))
    }

    fn member(name: &str) -> Node {
        Node::new(TAG_MEMBER).name(name).fund_type(FT_INTEGER)
    }

    fn method(name: &str, class: &str) -> Node {
        Node::new(TAG_GLOBAL_FUNC)
            .name(name)
            .attr(AT_MEMBER, Value::Ref(class.to_string()))
    }

    fn this(modifiers: &[u8], class: &str) -> Node {
        Node::new(TAG_PARAM).name("this").mod_user_type(modifiers, class)
    }

    fn enumerators(values: &[(i32, &str)]) -> Value {
        let mut pieces = Vec::new();
        for (value, name) in values {
            pieces.push(Piece::Word(*value as u32));
            pieces.push(Piece::Str(name.to_string()));
        }
        Value::Block4(pieces)
    }

    fn subscripts(dimensions: &[u32], element: u16) -> Value {
        let mut pieces = Vec::new();
        for n in dimensions {
            pieces.extend([
                Piece::Byte(FMT_FT_C_C),
                Piece::Half(FT_INTEGER),
                Piece::Word(0),
                Piece::Word(n - 1),
            ]);
        }
        pieces.extend([Piece::Byte(FMT_ET), Piece::Half(0x0055), Piece::Half(element)]);
        Value::Block2(pieces)
    }

    #[test]
    fn file() {
        let roots = vec![unit(vec![
            Node::new(TAG_STRUCT)
                .name("S")
                .children(vec![member("x"), flag(member("y"), AT_PRIVATE)]),
            Node::new(TAG_GLOBAL_VAR)
                .name("g")
                .fund_type(FT_INTEGER)
                .location(addr_location(0x8000_1000)),
        ])];
        let mut settings = RenderSettings::default().without_comments();
        settings.variable_addresses = true;
        assert_eq!(
            render_with(&roots, &settings),
            "struct S\n{\n    int x;\n\nprivate:\n    int y;\n};\n\nint g; // Address: 0x80001000"
        );
    }

    #[test]
    fn access_labels() {
        let roots = vec![unit(vec![
            Node::new(TAG_CLASS).name("C").children(vec![
                flag(member("a"), AT_PUBLIC),
                flag(member("b"), AT_PROTECTED),
                flag(member("c"), AT_PROTECTED),
            ]),
            Node::new(TAG_STRUCT).name("T").children(vec![member("a"), member("b")]),
        ])];
        insta::assert_snapshot!(render(&roots), @r"
        class C
        {
        public:
            int a;

        protected:
            int b;
            int c;
        };

        struct T
        {
            int a;
            int b;
        };
        ");
    }

    #[test]
    fn access_runs() {
        let mut settings = RenderSettings::default().without_comments();
        settings.function_declarations = false;
        settings.function_definitions = false;

        let roots = vec![unit(vec![Node::new(TAG_STRUCT).name("S").children(vec![
            member("x"),
            flag(member("y"), AT_PRIVATE),
            member("z"),
        ])])];
        let text = render_with(&roots, &settings);
        assert_eq!(text.matches("private:").count(), 1, "{text}");
        assert_eq!(text.matches("public:").count(), 1, "{text}");
        insta::assert_snapshot!(text, @r"
        struct S
        {
            int x;

        private:
            int y;

        public:
            int z;
        };
        ");

        // the run of member functions continues from the last member
        let roots = vec![unit(vec![
            Node::new(TAG_STRUCT)
                .label("S")
                .name("S")
                .children(vec![member("x"), flag(member("y"), AT_PRIVATE)]),
            method("get", "S").fund_type(FT_INTEGER),
        ])];
        let text = render_with(&roots, &settings);
        assert_eq!(text.matches("private:").count(), 1, "{text}");
        assert_eq!(text.matches("public:").count(), 1, "{text}");
        insta::assert_snapshot!(text, @r"
        struct S
        {
            int x;

        private:
            int y;

        public:
            static int get();
        };
        ");
    }

    #[test]
    fn enums() {
        let roots = vec![unit(vec![Node::new(TAG_ENUM).name("E").attr(
            AT_ELEMENT_LIST,
            enumerators(&[(0, "A"), (1, "B"), (5, "C"), (6, "D"), (-1, "E")]),
        )])];
        insta::assert_snapshot!(render(&roots), @r"
        enum E
        {
            A,
            B,
            C = 5,
            D,
            E = -1
        };
        ");

        let mut settings = RenderSettings::default().without_comments();
        settings.hexadecimal_enum_values = true;
        settings.force_explicit_enum_values = true;
        insta::assert_snapshot!(render_with(&roots, &settings), @r"
        enum E
        {
            A = 0x0,
            B = 0x1,
            C = 0x5,
            D = 0x6,
            E = -0x1
        };
        ");
    }

    #[test]
    fn member_functions() {
        let roots = vec![unit(vec![
            Node::new(TAG_CLASS).label("C").name("C").child(member("x")),
            method("get", "C")
                .fund_type(FT_INTEGER)
                .child(this(&[1, 3], "C")),
            method("set", "C").children(vec![
                this(&[1], "C"),
                Node::new(TAG_PARAM).name("v").fund_type(FT_INTEGER),
            ]),
            method("create", "C").mod_user_type(&[1], "C"),
        ])];
        insta::assert_snapshot!(render(&roots), @r"
        class C
        {
            int x;

        public:
            int get() const;
            void set(int v);
            static C* create();
        };

        int C::get() const;
        void C::set(int v);
        C* C::create();

        int C::get() const
        {
        }

        void C::set(int v)
        {
        }

        C* C::create()
        {
        }
        ");
    }

    #[test]
    fn special_members() {
        let roots = vec![unit(vec![
            Node::new(TAG_STRUCT).label("C").name("C"),
            method("__ct", "C").child(this(&[1], "C")),
            method("__dt", "C").child(this(&[1], "C")),
            method("__as", "C").mod_user_type(&[2], "C").children(vec![
                this(&[1], "C"),
                Node::new(TAG_PARAM).name("other").mod_user_type(&[2, 3], "C"),
            ]),
        ])];
        let mut settings = RenderSettings::default().without_comments();
        settings.function_definitions = false;
        insta::assert_snapshot!(render_with(&roots, &settings), @r"
        struct C
        {
            C();
            ~C();
            C& operator=(const C& other);
        };

        C::C();
        C::~C();
        C& C::operator=(const C& other);
        ");
    }

    #[test]
    fn arrays() {
        let roots = vec![unit(vec![
            Node::new(TAG_ARRAY)
                .label("grid_t")
                .attr(AT_SUBSCR_DATA, subscripts(&[4, 2], FT_INTEGER)),
            Node::new(TAG_ARRAY)
                .name("Row")
                .attr(AT_SUBSCR_DATA, subscripts(&[8], FT_CHAR)),
            Node::new(TAG_GLOBAL_VAR).name("grid").user_type("grid_t"),
            Node::new(TAG_GLOBAL_VAR).name("p").mod_user_type(&[1], "grid_t"),
        ])];
        insta::assert_snapshot!(render(&roots), @r"
        typedef char Row[8];

        int grid[4][2];
        int (*p)[4][2];
        ");
    }

    #[test]
    fn function_types() {
        let roots = vec![unit(vec![
            Node::new(TAG_FUNC_TYPE)
                .label("callback_t")
                .fund_type(FT_VOID)
                .child(Node::new(TAG_PARAM).fund_type(FT_INTEGER)),
            Node::new(TAG_FUNC_TYPE)
                .name("Handler")
                .fund_type(FT_INTEGER)
                .child(Node::new(TAG_PARAM).name("code").fund_type(FT_INTEGER)),
            Node::new(TAG_STRUCT).label("C").name("C").child(
                Node::new(TAG_MEMBER)
                    .name("callback")
                    .mod_user_type(&[1], "callback_t"),
            ),
            Node::new(TAG_PTR_TO_MEMBER)
                .name("PM")
                .fund_type(FT_INTEGER)
                .attr(AT_CONTAINING_TYPE, Value::Ref("C".to_string())),
        ])];
        insta::assert_snapshot!(render(&roots), @r"
        typedef int (Handler)(int code);

        struct C
        {
            void (*callback)(int);
        };

        typedef int C::*PM;
        ");
    }

    #[test]
    fn statics_and_varargs() {
        let roots = vec![unit(vec![
            Node::new(TAG_LOCAL).name("counter").fund_type(FT_INTEGER),
            Node::new(TAG_FUNC).name("helper"),
            Node::new(TAG_GLOBAL_FUNC).name("printf").fund_type(FT_INTEGER).children(vec![
                Node::new(TAG_PARAM).name("format").mod_fund_type(&[1, 3], FT_CHAR),
                Node::new(TAG_VARARGS),
            ]),
            Node::new(TAG_GLOBAL_FUNC)
                .name("log")
                .child(Node::new(TAG_VARARGS)),
        ])];
        let mut settings = RenderSettings::default().without_comments();
        settings.function_definitions = false;
        insta::assert_snapshot!(render_with(&roots, &settings), @r"
        static int counter;

        static void helper();
        int printf(const char* format, ...);
        void log(...);
        ");
    }

    #[test]
    fn entries() {
        let roots = vec![unit(vec![
            Node::new(TAG_STRUCT).label("S").name("S").child(member("x")),
            Node::new(TAG_GLOBAL_VAR).label("g").name("g").user_type("S"),
        ])];
        let bytes = encode_debug(&roots, false);
        let debug = DebugInfo::decode(&bytes, None, false).unwrap();
        let mut d = Diagnostics::new(DiagnosticSettings::default());
        let model = Model::build(&debug, &mut d);
        let settings = RenderSettings::default().without_comments();
        let mut renderer = Renderer::new(&model, &settings);

        let g = model.files[0].variables[0];
        assert_eq!(renderer.render_entry(g).to_plain_text(), "S g;");
        let s = model.files[0].types[0];
        assert_eq!(renderer.render_entry(s).to_plain_text(), "struct S\n{\n    int x;\n};");
        assert!(renderer.render_entry(0xdead).is_empty());
        assert!(renderer.render_path("b.cpp").is_empty());
        assert!(!renderer.render_path("a.cpp").is_empty());
    }

    #[test]
    fn disassembly() {
        let code = vec![0x38, 0x60, 0x00, 0x01, 0x4e, 0x80, 0x00, 0x20];
        let (lines, _) = encode_lines(
            &[LineTable {
                start: 0x1000,
                entries: vec![(10, 0xffff, 0), (11, 0xffff, 4)],
            }],
            false,
        );
        let roots = vec![unit(vec![Node::new(TAG_GLOBAL_FUNC)
            .name("one")
            .fund_type(FT_INTEGER)
            .low_pc(0x1000)
            .high_pc(0x1008)])
        .attr(AT_STMT_LIST, Value::Data4(0))];
        let image = debug_image(false, &roots, Some(lines), Some((0x1000, code)));
        let debug = DebugInfo::load(&image).unwrap();
        let mut d = Diagnostics::new(DiagnosticSettings::default());
        let model = Model::build(&debug, &mut d);

        let mut settings = RenderSettings::default().without_comments();
        settings.function_declarations = false;
        settings.disassembly = true;
        let code = Renderer::new(&model, &settings)
            .with_disassembly(&image, &PowerPc)
            .render_all();
        insta::assert_snapshot!(code.to_plain_text().trim_end(), @r"
        int one()
        {
            // 00001000  li       r3, 1
            // Line 10
            // 00001004  blr
            // Line 11
        }
        ");

        // without a disassembler the body is empty
        let code = Renderer::new(&model, &settings).render_all();
        assert_eq!(code.to_plain_text().trim_end(), "int one()\n{\n}");
    }
}
