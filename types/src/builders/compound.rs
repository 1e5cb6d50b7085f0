use alloc::{format, vec::Vec};

use crate::error::{BuildError, Error, Result};
use crate::kind::{Kind, Language};
use crate::lazy::LazyType;
use crate::program::Program;
use crate::ty::{Compound, Member, TemplateParameter, Ty, TyKind};

/// Builder for members of a structure, union, or class type.
///
/// # Example
///
/// ```
/// use bumpalo::Bump;
/// use typegraph_types::{CompoundTypeBuilder, Kind, LazyType, Program};
///
/// let arena = Bump::new();
/// let prog = Program::new(&arena);
/// let int = prog.int_type("int", 4, true, None);
///
/// let mut builder = CompoundTypeBuilder::new(&prog, Kind::Struct).unwrap();
/// builder.add_member(LazyType::evaluated(int), Some("x"), 0, 0).unwrap();
/// builder.add_member(LazyType::evaluated(int), Some("y"), 32, 0).unwrap();
/// let point = builder.create(Some("point"), 8, true, None).unwrap();
///
/// assert_eq!(point.members().len(), 2);
/// assert_eq!(point.size(), Some(8));
/// ```
pub struct CompoundTypeBuilder<'a, 'p> {
    prog: &'a Program<'p>,
    kind: Kind,
    members: Vec<Member<'p>>,
    templates: Vec<TemplateParameter<'p>>,
}

impl<'a, 'p> CompoundTypeBuilder<'a, 'p> {
    /// `kind` must be [`Kind::Struct`], [`Kind::Union`] or [`Kind::Class`].
    pub fn new(prog: &'a Program<'p>, kind: Kind) -> Result<Self> {
        if !kind.is_compound() {
            return Err(Error::invalid_argument(format!(
                "cannot build {kind} type with members"
            )));
        }
        Ok(Self {
            prog,
            kind,
            members: Vec::new(),
            templates: Vec::new(),
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn members(&self) -> &[Member<'p>] {
        &self.members
    }

    pub fn template_parameters(&self) -> &[TemplateParameter<'p>] {
        &self.templates
    }

    /// Append a member. A bit field size of 0 means the member is not a bit
    /// field; an unnamed member's own members are looked up as if they were
    /// members of this type.
    pub fn add_member(
        &mut self,
        ty: LazyType<'p>,
        name: Option<&str>,
        bit_offset: u64,
        bit_field_size: u64,
    ) -> Result<()> {
        self.prog.check_lazy(&ty)?;
        self.members.push(Member {
            name: name.map(|name| self.prog.intern(name)),
            ty,
            bit_offset,
            bit_field_size,
        });
        Ok(())
    }

    pub fn add_template_parameter(&mut self, ty: LazyType<'p>, name: Option<&str>) -> Result<()> {
        super::push_template_parameter(self.prog, &mut self.templates, ty, name)
    }

    /// Create the type. `size` is ignored for incomplete types, which must
    /// not have members.
    pub fn create(
        self,
        tag: Option<&str>,
        size: u64,
        is_complete: bool,
        lang: Option<Language>,
    ) -> Result<Ty<'p>, BuildError<Self>> {
        if !is_complete && !self.members.is_empty() {
            let error =
                Error::invalid_argument(format!("incomplete {} type must not have members", self.kind));
            return Err(BuildError::new(self, error));
        }

        let Self {
            prog,
            kind,
            members,
            templates,
        } = self;
        let compound = Compound {
            tag: tag.map(|tag| prog.intern(tag)),
            size: if is_complete { size } else { 0 },
            members: prog.arena().alloc_slice_fill_iter(members),
            templates: prog.arena().alloc_slice_fill_iter(templates),
            is_complete,
        };
        let data = match kind {
            Kind::Union => TyKind::Union(compound),
            Kind::Class => TyKind::Class(compound),
            _ => TyKind::Struct(compound),
        };
        Ok(prog.create_type(data, lang))
    }
}
