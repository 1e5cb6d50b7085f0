//! The program: owner of every type descriptor and of the caches that make
//! type identity meaningful.
//!
//! A [`Program`] borrows a [`Bump`] arena for its whole lifetime. Descriptors,
//! member slices and interned names are allocated there and handed out as
//! `'p` references, so [`Ty`] handles stay valid for as long as the arena
//! does. Creating a program is `init_types`; dropping it is `deinit_types`,
//! which releases the thunks of every lazy type that was never evaluated.

use alloc::{rc::Rc, vec::Vec};
use bumpalo::Bump;
use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::{DefaultHashBuilder, HashSet};

use crate::builders::EnumTypeBuilder;
use crate::dedup::DedupCache;
use crate::error::{Error, Result};
use crate::finder::TypeFinder;
use crate::kind::{Kind, Language};
use crate::lazy::LazyType;
use crate::members::MemberCache;
use crate::primitive::PrimitiveType;
use crate::ty::{QualifiedType, Ty, TyKind, TyNode};

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the program that created a descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u64);

impl ProgramId {
    fn next() -> Self {
        Self(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Program-wide settings consulted when a caller doesn't say otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramOptions {
    /// Language of types created with `lang: None`.
    pub default_language: Language,
    /// Size in bytes of pointers and of the default `long`.
    pub pointer_size: u64,
    /// Signedness of the default plain `char`.
    pub char_is_signed: bool,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            default_language: Language::C,
            pointer_size: 8,
            char_is_signed: true,
        }
    }
}

type StringSet<'p> = HashSet<&'p str, DefaultHashBuilder, &'p Bump>;

/// Owner of the types of one target program.
///
/// # Example
///
/// ```
/// use bumpalo::Bump;
/// use typegraph_types::{Program, ProgramOptions};
///
/// let arena = Bump::new();
/// let prog = Program::with_options(
///     &arena,
///     ProgramOptions { pointer_size: 4, ..Default::default() },
/// );
///
/// let int = prog.int_type("int", 4, true, None);
/// let ptr = prog.pointer_type(int, prog.pointer_size(), None).unwrap();
/// assert_eq!(ptr.to_string(), "int *");
/// assert_eq!(ptr, prog.pointer_type(int, 4, None).unwrap());
/// ```
pub struct Program<'p> {
    arena: &'p Bump,
    id: ProgramId,
    options: ProgramOptions,
    interned_strs: &'p RefCell<StringSet<'p>>,
    void_types: [Ty<'p>; Language::ALL.len()],
    dedup: RefCell<DedupCache<'p>>,
    /// Descriptors holding lazy types, released on drop.
    lazy_owners: RefCell<Vec<Ty<'p>>>,
    pub(crate) members: MemberCache<'p>,
    pub(crate) finders: RefCell<Vec<Rc<dyn TypeFinder<'p> + 'p>>>,
    pub(crate) primitives: RefCell<[Option<Ty<'p>>; PrimitiveType::COUNT]>,
}

impl<'p> Program<'p> {
    pub fn new(arena: &'p Bump) -> Self {
        Self::with_options(arena, ProgramOptions::default())
    }

    pub fn with_options(arena: &'p Bump, options: ProgramOptions) -> Self {
        let id = ProgramId::next();
        let interned_strs = arena.alloc(RefCell::new(HashSet::with_capacity_in(256, arena)));
        let void_types =
            Language::ALL.map(|lang| Ty::alloc(arena, TyNode::new(id, lang, TyKind::Void)));
        tracing::debug!(program = %id, ?options, "initialized program types");
        Self {
            arena,
            id,
            options,
            interned_strs,
            void_types,
            dedup: RefCell::new(DedupCache::new()),
            lazy_owners: RefCell::new(Vec::new()),
            members: MemberCache::default(),
            finders: RefCell::new(Vec::new()),
            primitives: RefCell::new([None; PrimitiveType::COUNT]),
        }
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn options(&self) -> &ProgramOptions {
        &self.options
    }

    pub fn default_language(&self) -> Language {
        self.options.default_language
    }

    pub fn pointer_size(&self) -> u64 {
        self.options.pointer_size
    }

    /// Number of distinct descriptors in the dedup cache.
    pub fn deduplicated_type_count(&self) -> usize {
        self.dedup.borrow().len()
    }

    pub fn void_type(&self, lang: Option<Language>) -> Ty<'p> {
        self.void_types[self.language_or_default(lang).index()]
    }

    pub fn int_type(&self, name: &str, size: u64, is_signed: bool, lang: Option<Language>) -> Ty<'p> {
        let name = self.intern(name);
        self.create_type(
            TyKind::Int {
                name,
                size,
                is_signed,
            },
            lang,
        )
    }

    pub fn bool_type(&self, name: &str, size: u64, lang: Option<Language>) -> Ty<'p> {
        let name = self.intern(name);
        self.create_type(TyKind::Bool { name, size }, lang)
    }

    pub fn float_type(&self, name: &str, size: u64, lang: Option<Language>) -> Ty<'p> {
        let name = self.intern(name);
        self.create_type(TyKind::Float { name, size }, lang)
    }

    /// `real` must be an integer or floating-point type.
    pub fn complex_type(
        &self,
        name: &str,
        size: u64,
        real: Ty<'p>,
        lang: Option<Language>,
    ) -> Result<Ty<'p>> {
        self.check_owns(real)?;
        if !matches!(real.kind(), Kind::Int | Kind::Float) {
            return Err(Error::invalid_argument(
                "real type of complex type must be floating-point or integer type",
            ));
        }
        let name = self.intern(name);
        Ok(self.create_type(TyKind::Complex { name, size, real }, lang))
    }

    pub fn typedef_type(
        &self,
        name: &str,
        aliased: impl Into<QualifiedType<'p>>,
        lang: Option<Language>,
    ) -> Result<Ty<'p>> {
        let aliased = aliased.into();
        self.check_owns(aliased.ty)?;
        let name = self.intern(name);
        Ok(self.create_type(TyKind::Typedef { name, aliased }, lang))
    }

    pub fn pointer_type(
        &self,
        referenced: impl Into<QualifiedType<'p>>,
        size: u64,
        lang: Option<Language>,
    ) -> Result<Ty<'p>> {
        let referenced = referenced.into();
        self.check_owns(referenced.ty)?;
        Ok(self.create_type(TyKind::Pointer { size, referenced }, lang))
    }

    pub fn array_type(
        &self,
        element: impl Into<QualifiedType<'p>>,
        length: u64,
        lang: Option<Language>,
    ) -> Result<Ty<'p>> {
        let element = element.into();
        self.check_owns(element.ty)?;
        Ok(self.create_type(
            TyKind::Array {
                element,
                length: Some(length),
            },
            lang,
        ))
    }

    pub fn incomplete_array_type(
        &self,
        element: impl Into<QualifiedType<'p>>,
        lang: Option<Language>,
    ) -> Result<Ty<'p>> {
        let element = element.into();
        self.check_owns(element.ty)?;
        Ok(self.create_type(
            TyKind::Array {
                element,
                length: None,
            },
            lang,
        ))
    }

    /// Forward declaration of an enumerated type.
    pub fn incomplete_enum_type(&self, tag: Option<&str>, lang: Option<Language>) -> Result<Ty<'p>> {
        Ok(EnumTypeBuilder::new(self).create(tag, None, false, lang)?)
    }

    pub(crate) fn arena(&self) -> &'p Bump {
        self.arena
    }

    pub(crate) fn intern(&self, s: &str) -> &'p str {
        let mut set = self.interned_strs.borrow_mut();
        if let Some(&interned) = set.get(s) {
            return interned;
        }
        let allocated = self.arena.alloc_str(s);
        set.insert(allocated);
        allocated
    }

    pub(crate) fn language_or_default(&self, lang: Option<Language>) -> Language {
        lang.unwrap_or(self.options.default_language)
    }

    pub(crate) fn check_owns(&self, ty: Ty<'p>) -> Result<()> {
        if ty.program() == self.id {
            Ok(())
        } else {
            Err(Error::invalid_argument("type is from different program"))
        }
    }

    /// Lazy types must not be bound to another program, and once evaluated
    /// must hold one of this program's types. Binds the cell to this program.
    pub(crate) fn check_lazy(&self, lazy: &LazyType<'p>) -> Result<()> {
        if let Some(qualified) = lazy.peek() {
            self.check_owns(qualified.ty)?;
        }
        lazy.bind(self.id)
    }

    /// Allocate a descriptor, or return the existing one with the same
    /// structure if it has no variable-length entries.
    pub(crate) fn create_type(&self, data: TyKind<'p>, lang: Option<Language>) -> Ty<'p> {
        let node = TyNode::new(self.id, self.language_or_default(lang), data);
        if !node.has_entries() {
            return self.dedup.borrow_mut().find_or_insert(self.arena, node);
        }

        let ty = Ty::alloc(self.arena, node);
        if ty.lazy_types().next().is_some() {
            self.lazy_owners.borrow_mut().push(ty);
        }
        ty
    }
}

impl fmt::Debug for Program<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("id", &self.id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Drop for Program<'_> {
    fn drop(&mut self) {
        let mut released = 0usize;
        for ty in self.lazy_owners.get_mut().drain(..) {
            released += ty.lazy_types().filter(|lazy| lazy.release()).count();
        }
        tracing::debug!(program = %self.id, released, "deinitialized program types");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use crate::{CompoundTypeBuilder, FunctionTypeBuilder, Qualifiers};
    use alloc::string::ToString;
    use core::cell::Cell;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_program_ids_are_unique() {
        let arena = Bump::new();
        let a = Program::new(&arena);
        let b = Program::new(&arena);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_options() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        assert_eq!(*prog.options(), ProgramOptions::default());
        assert_eq!(prog.default_language(), Language::C);
        assert_eq!(prog.pointer_size(), 8);

        let prog = Program::with_options(
            &arena,
            ProgramOptions {
                default_language: Language::Cpp,
                ..Default::default()
            },
        );
        assert_eq!(prog.int_type("int", 4, true, None).language(), Language::Cpp);
        assert_eq!(prog.int_type("int", 4, true, Some(Language::C)).language(), Language::C);
    }

    #[test]
    fn test_void_per_language() {
        let arena = Bump::new();
        let prog = Program::new(&arena);

        let c = prog.void_type(Some(Language::C));
        let cpp = prog.void_type(Some(Language::Cpp));
        assert_eq!(prog.void_type(None), c);
        assert_ne!(c, cpp);
        assert_eq!(cpp.language(), Language::Cpp);
        assert_eq!(c.kind(), Kind::Void);
    }

    #[test]
    fn test_intern_shares_allocation() {
        let arena = Bump::new();
        let prog = Program::new(&arena);

        let a = prog.intern("foo");
        let b = prog.intern(&"foo".to_string());
        assert!(core::ptr::eq(a, b));
        assert!(!core::ptr::eq(a, prog.intern("bar")));
    }

    #[test]
    fn test_complex_type() {
        let arena = Bump::new();
        let prog = Program::new(&arena);

        let double = prog.float_type("double", 8, None);
        let complex = prog.complex_type("double _Complex", 16, double, None).unwrap();
        assert_eq!(complex.real_type(), Some(double));
        assert!(complex.is_complete());
        assert!(!complex.is_arithmetic());

        let ptr = prog.pointer_type(double, 8, None).unwrap();
        assert!(matches!(
            prog.complex_type("bad", 16, ptr, None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_factories_reject_foreign_types() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let other = Program::new(&arena);
        let foreign = other.int_type("int", 4, true, None);

        assert!(prog.typedef_type("t", foreign, None).is_err());
        assert!(prog.pointer_type(foreign, 8, None).is_err());
        assert!(prog.array_type(foreign, 2, None).is_err());
        assert!(prog.incomplete_array_type(foreign, None).is_err());
        let err = prog.complex_type("c", 8, foreign, None).unwrap_err();
        assert_eq!(err.to_string(), "type is from different program");
    }

    #[test]
    fn test_qualifiers_are_part_of_identity() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let int = prog.int_type("int", 4, true, None);

        let p1 = prog.pointer_type(int, 8, None).unwrap();
        let p2 = prog.pointer_type(QualifiedType::new(int, Qualifiers::CONST), 8, None).unwrap();
        let p3 = prog.pointer_type(QualifiedType::new(int, Qualifiers::CONST), 8, None).unwrap();
        assert_ne!(p1, p2);
        assert_eq!(p2, p3);
    }

    #[test]
    fn test_drop_releases_unevaluated_thunks() {
        init_test_logging();
        let arena = Bump::new();
        let releases = Rc::new(Cell::new(0));

        struct Tracked(Rc<Cell<usize>>);
        impl<'p> crate::TypeThunk<'p> for Tracked {
            fn evaluate(&mut self, prog: &Program<'p>) -> Result<QualifiedType<'p>> {
                Ok(prog.int_type("int", 4, true, None).into())
            }

            fn release(self: alloc::boxed::Box<Self>) {
                self.0.set(self.0.get() + 1);
            }
        }

        {
            let prog = Program::new(&arena);
            let mut builder = CompoundTypeBuilder::new(&prog, Kind::Struct).unwrap();
            builder
                .add_member(LazyType::from_thunk(Tracked(releases.clone())), Some("a"), 0, 0)
                .unwrap();
            builder
                .add_member(LazyType::from_thunk(Tracked(releases.clone())), Some("b"), 32, 0)
                .unwrap();
            let ty = builder.create(Some("s"), 8, true, None).unwrap();

            let mut builder = FunctionTypeBuilder::new(&prog);
            builder
                .add_parameter(LazyType::from_thunk(Tracked(releases.clone())), None)
                .unwrap();
            builder.create(prog.void_type(None), false, None).unwrap();

            // Evaluating releases the thunk immediately.
            ty.members()[0].qualified_type(&prog).unwrap();
            assert_eq!(releases.get(), 1);
        }
        assert_eq!(releases.get(), 3);
    }
}
