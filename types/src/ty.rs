use alloc::format;
use bumpalo::Bump;
use core::{fmt, hash, ptr};

use crate::error::{Error, Result};
use crate::flags::TyFlags;
use crate::kind::{Kind, Language, Qualifiers};
use crate::lazy::LazyType;
use crate::program::{Program, ProgramId};

/// Handle to an arena-allocated type descriptor.
///
/// Descriptors are immutable and owned by the [`Program`] that created them.
/// Two handles are equal if and only if they point to the same descriptor;
/// structurally identical primitive types share a descriptor through the
/// program's dedup cache, so identity comparison is reliable for them too.
#[derive(Clone, Copy)]
pub struct Ty<'p>(&'p TyNode<'p>);

static_assertions::assert_eq_size!(Ty<'static>, usize);

impl PartialEq for Ty<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.0, other.0)
    }
}

impl Eq for Ty<'_> {}

impl hash::Hash for Ty<'_> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        ptr::hash(self.0, state)
    }
}

impl<'p> Ty<'p> {
    pub(crate) fn alloc(arena: &'p Bump, node: TyNode<'p>) -> Self {
        Self(arena.alloc(node))
    }

    pub fn node(self) -> &'p TyNode<'p> {
        self.0
    }

    pub fn data(self) -> &'p TyKind<'p> {
        &self.0.data
    }

    pub fn kind(self) -> Kind {
        self.data().kind()
    }

    pub fn program(self) -> ProgramId {
        self.0.program
    }

    pub fn language(self) -> Language {
        self.0.language
    }

    pub fn flags(self) -> TyFlags {
        self.0.flags
    }

    /// Name of a primitive or typedef, or tag of a compound or enumerated type.
    pub fn name(self) -> Option<&'p str> {
        match self.data() {
            TyKind::Int { name, .. }
            | TyKind::Bool { name, .. }
            | TyKind::Float { name, .. }
            | TyKind::Complex { name, .. }
            | TyKind::Typedef { name, .. } => Some(*name),
            TyKind::Struct(compound) | TyKind::Union(compound) | TyKind::Class(compound) => {
                compound.tag
            }
            TyKind::Enum(enumerated) => enumerated.tag,
            TyKind::Void | TyKind::Pointer { .. } | TyKind::Array { .. } | TyKind::Function(_) => {
                None
            }
        }
    }

    /// Size in bytes for kinds that carry one. Incomplete types report 0.
    pub fn size(self) -> Option<u64> {
        match self.data() {
            TyKind::Int { size, .. }
            | TyKind::Bool { size, .. }
            | TyKind::Float { size, .. }
            | TyKind::Complex { size, .. }
            | TyKind::Pointer { size, .. } => Some(*size),
            TyKind::Struct(compound) | TyKind::Union(compound) | TyKind::Class(compound) => {
                Some(compound.size)
            }
            TyKind::Enum(enumerated) => Some(
                enumerated
                    .compatible
                    .and_then(|compatible| compatible.size())
                    .unwrap_or(0),
            ),
            TyKind::Void | TyKind::Typedef { .. } | TyKind::Array { .. } | TyKind::Function(_) => {
                None
            }
        }
    }

    pub fn is_complete(self) -> bool {
        self.flags().contains(TyFlags::IS_COMPLETE)
    }

    pub fn is_signed(self) -> bool {
        self.flags().contains(TyFlags::IS_SIGNED)
    }

    /// Integer, boolean and enumerated types, and typedefs of them.
    pub fn is_integer(self) -> bool {
        self.flags().contains(TyFlags::IS_INTEGER)
    }

    /// Integer and floating-point types, and typedefs of them.
    pub fn is_arithmetic(self) -> bool {
        self.flags().contains(TyFlags::IS_ARITHMETIC)
    }

    /// Arithmetic and pointer types, and typedefs of them.
    pub fn is_scalar(self) -> bool {
        self.flags().contains(TyFlags::IS_SCALAR)
    }

    pub fn is_anonymous(self) -> bool {
        self.kind().can_be_anonymous() && self.name().is_none()
    }

    /// Structure, union and class types, and typedefs of them.
    pub fn has_members(self) -> bool {
        self.flags().contains(TyFlags::HAS_MEMBERS)
    }

    pub fn members(self) -> &'p [Member<'p>] {
        match self.data() {
            TyKind::Struct(compound) | TyKind::Union(compound) | TyKind::Class(compound) => {
                compound.members
            }
            _ => &[],
        }
    }

    pub fn enumerators(self) -> &'p [Enumerator<'p>] {
        match self.data() {
            TyKind::Enum(enumerated) => enumerated.enumerators,
            _ => &[],
        }
    }

    pub fn parameters(self) -> &'p [Parameter<'p>] {
        match self.data() {
            TyKind::Function(function) => function.params,
            _ => &[],
        }
    }

    pub fn template_parameters(self) -> &'p [TemplateParameter<'p>] {
        match self.data() {
            TyKind::Struct(compound) | TyKind::Union(compound) | TyKind::Class(compound) => {
                compound.templates
            }
            TyKind::Function(function) => function.templates,
            _ => &[],
        }
    }

    pub fn is_variadic(self) -> bool {
        matches!(self.data(), TyKind::Function(function) if function.is_variadic)
    }

    /// The type wrapped by a typedef (aliased), pointer (referenced), array
    /// (element) or function (return) type.
    pub fn wrapped_type(self) -> Option<QualifiedType<'p>> {
        match self.data() {
            TyKind::Typedef { aliased, .. } => Some(*aliased),
            TyKind::Pointer { referenced, .. } => Some(*referenced),
            TyKind::Array { element, .. } => Some(*element),
            TyKind::Function(function) => Some(function.ret),
            _ => None,
        }
    }

    pub fn aliased_type(self) -> Option<QualifiedType<'p>> {
        match self.data() {
            TyKind::Typedef { aliased, .. } => Some(*aliased),
            _ => None,
        }
    }

    pub fn referenced_type(self) -> Option<QualifiedType<'p>> {
        match self.data() {
            TyKind::Pointer { referenced, .. } => Some(*referenced),
            _ => None,
        }
    }

    pub fn element_type(self) -> Option<QualifiedType<'p>> {
        match self.data() {
            TyKind::Array { element, .. } => Some(*element),
            _ => None,
        }
    }

    pub fn return_type(self) -> Option<QualifiedType<'p>> {
        match self.data() {
            TyKind::Function(function) => Some(function.ret),
            _ => None,
        }
    }

    /// Integer type compatible with a complete enumerated type.
    pub fn compatible_type(self) -> Option<Ty<'p>> {
        match self.data() {
            TyKind::Enum(enumerated) => enumerated.compatible,
            _ => None,
        }
    }

    pub fn real_type(self) -> Option<Ty<'p>> {
        match self.data() {
            TyKind::Complex { real, .. } => Some(*real),
            _ => None,
        }
    }

    /// Number of elements of an array type; 0 if incomplete or not an array.
    pub fn length(self) -> u64 {
        match self.data() {
            TyKind::Array { length, .. } => length.unwrap_or(0),
            _ => 0,
        }
    }

    /// Strip all typedefs.
    ///
    /// Typedef chains are acyclic since the aliased type must exist before the
    /// typedef is created, so this terminates after as many steps as there
    /// are typedefs in the chain.
    pub fn underlying_type(self) -> Ty<'p> {
        let mut ty = self;
        while let TyKind::Typedef { aliased, .. } = ty.data() {
            ty = aliased.ty;
        }
        ty
    }

    pub fn enum_is_signed(self) -> Result<bool> {
        match self.compatible_type() {
            Some(compatible) => Ok(compatible.is_signed()),
            None => Err(Error::invalid_argument(format!(
                "'{self}' is not a complete enumerated type"
            ))),
        }
    }

    /// Size of the type in bytes, looking through typedefs.
    pub fn sizeof(self) -> Result<u64> {
        let mut ty = self.underlying_type();
        let mut count: u64 = 1;
        loop {
            match ty.data() {
                TyKind::Void => return Err(Error::invalid_argument("cannot get size of void type")),
                TyKind::Function(_) => {
                    return Err(Error::invalid_argument("cannot get size of function type"));
                }
                TyKind::Array { element, length } => {
                    let length = length.ok_or_else(|| {
                        Error::invalid_argument(format!("cannot get size of incomplete '{ty}'"))
                    })?;
                    count = count
                        .checked_mul(length)
                        .ok_or_else(|| Error::overflow(format!("size of '{self}' is too large")))?;
                    ty = element.ty.underlying_type();
                }
                _ if !ty.is_complete() => {
                    return Err(Error::invalid_argument(format!(
                        "cannot get size of incomplete '{ty}'"
                    )));
                }
                _ => {
                    let size = ty.size().unwrap_or(0);
                    return size
                        .checked_mul(count)
                        .ok_or_else(|| Error::overflow(format!("size of '{self}' is too large")));
                }
            }
        }
    }

    /// Size of the type in bits. Reports `Overflow` instead of wrapping.
    pub fn bit_size(self) -> Result<u64> {
        self.sizeof()?
            .checked_mul(8)
            .ok_or_else(|| Error::overflow(format!("bit size of '{self}' is too large")))
    }

    /// Lazy types owned by this descriptor (members, parameters and template
    /// parameters).
    pub(crate) fn lazy_types(self) -> impl Iterator<Item = &'p LazyType<'p>> {
        let members = self.members().iter().map(|member| &member.ty);
        let params = self.parameters().iter().map(|param| &param.ty);
        let templates = self.template_parameters().iter().map(|param| &param.ty);
        members.chain(params).chain(templates)
    }
}

impl fmt::Debug for Ty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ty({self})")
    }
}

/// Renders a short, human-readable description used in error messages.
///
/// Lazy member and parameter types are never evaluated here.
impl fmt::Display for Ty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data() {
            TyKind::Void => f.write_str("void"),
            TyKind::Int { name, .. }
            | TyKind::Bool { name, .. }
            | TyKind::Float { name, .. }
            | TyKind::Complex { name, .. }
            | TyKind::Typedef { name, .. } => f.write_str(name),
            TyKind::Struct(_) | TyKind::Union(_) | TyKind::Class(_) | TyKind::Enum(_) => {
                match self.name() {
                    Some(tag) => write!(f, "{} {}", self.kind(), tag),
                    None => write!(f, "anonymous {}", self.kind()),
                }
            }
            TyKind::Pointer { referenced, .. } => write!(f, "{referenced} *"),
            TyKind::Array {
                element,
                length: Some(length),
            } => write!(f, "{element} [{length}]"),
            TyKind::Array { element, length: None } => write!(f, "{element} []"),
            TyKind::Function(function) => write!(f, "function returning {}", function.ret),
        }
    }
}

/// A type paired with its qualifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QualifiedType<'p> {
    pub ty: Ty<'p>,
    pub qualifiers: Qualifiers,
}

impl<'p> QualifiedType<'p> {
    pub fn new(ty: Ty<'p>, qualifiers: Qualifiers) -> Self {
        Self { ty, qualifiers }
    }
}

impl<'p> From<Ty<'p>> for QualifiedType<'p> {
    fn from(ty: Ty<'p>) -> Self {
        Self::new(ty, Qualifiers::empty())
    }
}

impl fmt::Display for QualifiedType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for spelling in self.qualifiers.spellings() {
            write!(f, "{spelling} ")?;
        }
        fmt::Display::fmt(&self.ty, f)
    }
}

/// The descriptor behind a [`Ty`] handle.
#[derive(Debug)]
pub struct TyNode<'p> {
    program: ProgramId,
    language: Language,
    flags: TyFlags,
    data: TyKind<'p>,
}

impl<'p> TyNode<'p> {
    pub(crate) fn new(program: ProgramId, language: Language, data: TyKind<'p>) -> Self {
        let flags = data.compute_flags();
        Self {
            program,
            language,
            flags,
            data,
        }
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn flags(&self) -> TyFlags {
        self.flags
    }

    pub fn data(&self) -> &TyKind<'p> {
        &self.data
    }

    /// Whether the descriptor has any variable-length lists.
    pub(crate) fn has_entries(&self) -> bool {
        match &self.data {
            TyKind::Struct(compound) | TyKind::Union(compound) | TyKind::Class(compound) => {
                !compound.members.is_empty() || !compound.templates.is_empty()
            }
            TyKind::Enum(enumerated) => !enumerated.enumerators.is_empty(),
            TyKind::Function(function) => {
                !function.params.is_empty() || !function.templates.is_empty()
            }
            _ => false,
        }
    }
}

/// Kind-specific payload of a type descriptor.
#[derive(Debug)]
pub enum TyKind<'p> {
    Void,

    Int {
        name: &'p str,
        size: u64,
        is_signed: bool,
    },

    Bool {
        name: &'p str,
        size: u64,
    },

    Float {
        name: &'p str,
        size: u64,
    },

    /// Complex type whose real type is an integer or floating-point type.
    Complex {
        name: &'p str,
        size: u64,
        real: Ty<'p>,
    },

    Struct(Compound<'p>),
    Union(Compound<'p>),
    Class(Compound<'p>),

    Enum(Enumerated<'p>),

    Typedef {
        name: &'p str,
        aliased: QualifiedType<'p>,
    },

    Pointer {
        size: u64,
        referenced: QualifiedType<'p>,
    },

    /// Array type. `length` is `None` for incomplete arrays (`int []`).
    Array {
        element: QualifiedType<'p>,
        length: Option<u64>,
    },

    Function(Function<'p>),
}

impl<'p> TyKind<'p> {
    pub fn kind(&self) -> Kind {
        match self {
            TyKind::Void => Kind::Void,
            TyKind::Int { .. } => Kind::Int,
            TyKind::Bool { .. } => Kind::Bool,
            TyKind::Float { .. } => Kind::Float,
            TyKind::Complex { .. } => Kind::Complex,
            TyKind::Struct(_) => Kind::Struct,
            TyKind::Union(_) => Kind::Union,
            TyKind::Class(_) => Kind::Class,
            TyKind::Enum(_) => Kind::Enum,
            TyKind::Typedef { .. } => Kind::Typedef,
            TyKind::Pointer { .. } => Kind::Pointer,
            TyKind::Array { .. } => Kind::Array,
            TyKind::Function(_) => Kind::Function,
        }
    }

    pub fn compute_flags(&self) -> TyFlags {
        let integer = TyFlags::IS_COMPLETE
            | TyFlags::IS_INTEGER
            | TyFlags::IS_ARITHMETIC
            | TyFlags::IS_SCALAR;
        match self {
            TyKind::Void => TyFlags::empty(),
            TyKind::Int { is_signed, .. } => {
                if *is_signed {
                    integer | TyFlags::IS_SIGNED
                } else {
                    integer
                }
            }
            TyKind::Bool { .. } => integer,
            TyKind::Float { .. } => {
                TyFlags::IS_COMPLETE | TyFlags::IS_ARITHMETIC | TyFlags::IS_SCALAR
            }
            TyKind::Complex { .. } => TyFlags::IS_COMPLETE,
            TyKind::Struct(compound) | TyKind::Union(compound) | TyKind::Class(compound) => {
                if compound.is_complete {
                    TyFlags::IS_COMPLETE | TyFlags::HAS_MEMBERS
                } else {
                    TyFlags::HAS_MEMBERS
                }
            }
            TyKind::Enum(enumerated) => match enumerated.compatible {
                Some(compatible) => integer | (compatible.flags() & TyFlags::IS_SIGNED),
                None => integer - TyFlags::IS_COMPLETE,
            },
            TyKind::Typedef { aliased, .. } => aliased.ty.flags(),
            TyKind::Pointer { .. } => TyFlags::IS_COMPLETE | TyFlags::IS_SCALAR,
            TyKind::Array { length, .. } => {
                if length.is_some() {
                    TyFlags::IS_COMPLETE
                } else {
                    TyFlags::empty()
                }
            }
            TyKind::Function(_) => TyFlags::IS_COMPLETE,
        }
    }
}

/// Payload of structure, union and class types.
#[derive(Debug)]
pub struct Compound<'p> {
    pub(crate) tag: Option<&'p str>,
    pub(crate) size: u64,
    pub(crate) members: &'p [Member<'p>],
    pub(crate) templates: &'p [TemplateParameter<'p>],
    pub(crate) is_complete: bool,
}

impl<'p> Compound<'p> {
    pub fn tag(&self) -> Option<&'p str> {
        self.tag
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn members(&self) -> &'p [Member<'p>] {
        self.members
    }

    pub fn template_parameters(&self) -> &'p [TemplateParameter<'p>] {
        self.templates
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }
}

/// Payload of enumerated types. Complete exactly when `compatible` is set.
#[derive(Debug)]
pub struct Enumerated<'p> {
    pub(crate) tag: Option<&'p str>,
    pub(crate) compatible: Option<Ty<'p>>,
    pub(crate) enumerators: &'p [Enumerator<'p>],
}

impl<'p> Enumerated<'p> {
    pub fn tag(&self) -> Option<&'p str> {
        self.tag
    }

    pub fn compatible_type(&self) -> Option<Ty<'p>> {
        self.compatible
    }

    pub fn enumerators(&self) -> &'p [Enumerator<'p>] {
        self.enumerators
    }
}

/// Payload of function types.
#[derive(Debug)]
pub struct Function<'p> {
    pub(crate) ret: QualifiedType<'p>,
    pub(crate) params: &'p [Parameter<'p>],
    pub(crate) templates: &'p [TemplateParameter<'p>],
    pub(crate) is_variadic: bool,
}

impl<'p> Function<'p> {
    pub fn return_type(&self) -> QualifiedType<'p> {
        self.ret
    }

    pub fn parameters(&self) -> &'p [Parameter<'p>] {
        self.params
    }

    pub fn template_parameters(&self) -> &'p [TemplateParameter<'p>] {
        self.templates
    }

    pub fn is_variadic(&self) -> bool {
        self.is_variadic
    }
}

/// Member of a structure, union or class type.
#[derive(Debug)]
pub struct Member<'p> {
    pub(crate) name: Option<&'p str>,
    pub(crate) ty: LazyType<'p>,
    pub(crate) bit_offset: u64,
    pub(crate) bit_field_size: u64,
}

impl<'p> Member<'p> {
    /// `None` for unnamed members, whose own members are promoted into the
    /// enclosing type by [`Program::find_member`].
    pub fn name(&self) -> Option<&'p str> {
        self.name
    }

    pub fn lazy_type(&self) -> &LazyType<'p> {
        &self.ty
    }

    pub fn qualified_type(&self, prog: &Program<'p>) -> Result<QualifiedType<'p>> {
        self.ty.evaluate(prog)
    }

    pub fn bit_offset(&self) -> u64 {
        self.bit_offset
    }

    /// 0 if the member is not a bit field.
    pub fn bit_field_size(&self) -> u64 {
        self.bit_field_size
    }

    pub fn is_bit_field(&self) -> bool {
        self.bit_field_size != 0
    }
}

/// Value of an enumerator, stored with the signedness it was added with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnumeratorValue {
    Signed(i64),
    Unsigned(u64),
}

impl EnumeratorValue {
    pub fn as_i64(self) -> i64 {
        match self {
            EnumeratorValue::Signed(value) => value,
            EnumeratorValue::Unsigned(value) => value as i64,
        }
    }

    pub fn as_u64(self) -> u64 {
        match self {
            EnumeratorValue::Signed(value) => value as u64,
            EnumeratorValue::Unsigned(value) => value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Enumerator<'p> {
    pub(crate) name: &'p str,
    pub(crate) value: EnumeratorValue,
}

impl<'p> Enumerator<'p> {
    pub fn name(&self) -> &'p str {
        self.name
    }

    pub fn value(&self) -> EnumeratorValue {
        self.value
    }
}

/// Parameter of a function type.
#[derive(Debug)]
pub struct Parameter<'p> {
    pub(crate) name: Option<&'p str>,
    pub(crate) ty: LazyType<'p>,
}

impl<'p> Parameter<'p> {
    pub fn name(&self) -> Option<&'p str> {
        self.name
    }

    pub fn lazy_type(&self) -> &LazyType<'p> {
        &self.ty
    }

    pub fn qualified_type(&self, prog: &Program<'p>) -> Result<QualifiedType<'p>> {
        self.ty.evaluate(prog)
    }
}

/// Template parameter of a compound or function type.
#[derive(Debug)]
pub struct TemplateParameter<'p> {
    pub(crate) name: Option<&'p str>,
    pub(crate) ty: LazyType<'p>,
}

impl<'p> TemplateParameter<'p> {
    pub fn name(&self) -> Option<&'p str> {
        self.name
    }

    pub fn lazy_type(&self) -> &LazyType<'p> {
        &self.ty
    }

    pub fn qualified_type(&self, prog: &Program<'p>) -> Result<QualifiedType<'p>> {
        self.ty.evaluate(prog)
    }
}
