//! Structural deduplication of descriptors.
//!
//! Every descriptor without variable-length entries is hash-consed: asking
//! twice for `int *` yields the same [`Ty`]. Descriptors with members,
//! enumerators, parameters or template parameters are never deduplicated,
//! since their lazy types can't be compared without evaluating them.

use bumpalo::Bump;
use core::hash::BuildHasher;
use hashbrown::{DefaultHashBuilder, HashTable};

use crate::flags::TyFlags;
use crate::kind::{Kind, Language};
use crate::ty::{QualifiedType, Ty, TyKind, TyNode};

/// The fields that determine the identity of an entry-less descriptor.
#[derive(PartialEq, Eq, Hash)]
struct DedupKey<'p> {
    kind: Kind,
    language: Language,
    name: Option<&'p str>,
    size: Option<u64>,
    is_signed: bool,
    is_complete: bool,
    is_variadic: bool,
    length: Option<u64>,
    /// Aliased, referenced, element or return type.
    wrapped: Option<QualifiedType<'p>>,
    /// Real type of a complex type or compatible type of an enum.
    related: Option<Ty<'p>>,
}

impl<'p> DedupKey<'p> {
    fn of(node: &TyNode<'p>) -> Self {
        let mut key = DedupKey {
            kind: node.data().kind(),
            language: node.language(),
            name: None,
            size: None,
            is_signed: false,
            is_complete: node.flags().contains(TyFlags::IS_COMPLETE),
            is_variadic: false,
            length: None,
            wrapped: None,
            related: None,
        };
        match node.data() {
            TyKind::Void => {}
            TyKind::Int {
                name,
                size,
                is_signed,
            } => {
                key.name = Some(*name);
                key.size = Some(*size);
                key.is_signed = *is_signed;
            }
            TyKind::Bool { name, size } | TyKind::Float { name, size } => {
                key.name = Some(*name);
                key.size = Some(*size);
            }
            TyKind::Complex { name, size, real } => {
                key.name = Some(*name);
                key.size = Some(*size);
                key.related = Some(*real);
            }
            TyKind::Struct(compound) | TyKind::Union(compound) | TyKind::Class(compound) => {
                key.name = compound.tag;
                key.size = Some(compound.size);
            }
            TyKind::Enum(enumerated) => {
                key.name = enumerated.tag;
                key.related = enumerated.compatible;
            }
            TyKind::Typedef { name, aliased } => {
                key.name = Some(*name);
                key.wrapped = Some(*aliased);
            }
            TyKind::Pointer { size, referenced } => {
                key.size = Some(*size);
                key.wrapped = Some(*referenced);
            }
            TyKind::Array { element, length } => {
                key.wrapped = Some(*element);
                key.length = *length;
            }
            TyKind::Function(function) => {
                key.wrapped = Some(function.ret);
                key.is_variadic = function.is_variadic;
            }
        }
        key
    }
}

pub(crate) struct DedupCache<'p> {
    table: HashTable<Ty<'p>>,
    hash_builder: DefaultHashBuilder,
}

impl<'p> DedupCache<'p> {
    pub(crate) fn new() -> Self {
        Self {
            table: HashTable::new(),
            hash_builder: DefaultHashBuilder::default(),
        }
    }

    /// Return the cached descriptor structurally equal to `node`, or
    /// allocate `node` in `arena` and cache it.
    pub(crate) fn find_or_insert(&mut self, arena: &'p Bump, node: TyNode<'p>) -> Ty<'p> {
        debug_assert!(!node.has_entries());
        let key = DedupKey::of(&node);
        let hash = self.hash_builder.hash_one(&key);
        if let Some(&ty) = self.table.find(hash, |ty| DedupKey::of(ty.node()) == key) {
            tracing::trace!(%ty, "dedup hit");
            return ty;
        }

        let ty = Ty::alloc(arena, node);
        let hash_builder = &self.hash_builder;
        self.table.insert_unique(hash, ty, |ty| {
            hash_builder.hash_one(DedupKey::of(ty.node()))
        });
        ty
    }

    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::{CompoundTypeBuilder, EnumTypeBuilder, Kind, Language, LazyType, Program};
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_same_shape_same_identity() {
        let arena = Bump::new();
        let prog = Program::new(&arena);

        let before = prog.deduplicated_type_count();
        let a = prog.int_type("int", 4, true, None);
        let b = prog.int_type("int", 4, true, None);
        assert_eq!(a, b);
        assert_eq!(prog.deduplicated_type_count(), before + 1);

        let pa = prog.pointer_type(a, 8, None).unwrap();
        let pb = prog.pointer_type(b, 8, None).unwrap();
        assert_eq!(pa, pb);
        assert_eq!(prog.deduplicated_type_count(), before + 2);
    }

    #[test]
    fn test_any_field_difference_is_a_new_type() {
        let arena = Bump::new();
        let prog = Program::new(&arena);

        let int = prog.int_type("int", 4, true, None);
        assert_ne!(int, prog.int_type("int", 8, true, None));
        assert_ne!(int, prog.int_type("int", 4, false, None));
        assert_ne!(int, prog.int_type("long", 4, true, None));
        assert_ne!(int, prog.int_type("int", 4, true, Some(Language::Cpp)));

        let array = prog.array_type(int, 0, None).unwrap();
        let incomplete = prog.incomplete_array_type(int, None).unwrap();
        assert_ne!(array, incomplete);
        assert_eq!(incomplete, prog.incomplete_array_type(int, None).unwrap());

        let pointer4 = prog.pointer_type(int, 4, None).unwrap();
        assert_ne!(pointer4, prog.pointer_type(int, 8, None).unwrap());
    }

    #[test]
    fn test_empty_compound_is_deduplicated() {
        let arena = Bump::new();
        let prog = Program::new(&arena);

        let make = |tag| {
            CompoundTypeBuilder::new(&prog, Kind::Struct)
                .unwrap()
                .create(tag, 0, false, None)
                .unwrap()
        };
        assert_eq!(make(Some("opaque")), make(Some("opaque")));
        assert_ne!(make(Some("opaque")), make(Some("other")));
    }

    #[test]
    fn test_types_with_entries_are_never_deduplicated() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let int = prog.int_type("int", 4, true, None);

        let make_struct = || {
            let mut builder = CompoundTypeBuilder::new(&prog, Kind::Struct).unwrap();
            builder.add_member(LazyType::evaluated(int), Some("x"), 0, 0).unwrap();
            builder.create(Some("point"), 4, true, None).unwrap()
        };
        let before = prog.deduplicated_type_count();
        assert_ne!(make_struct(), make_struct());
        assert_eq!(prog.deduplicated_type_count(), before);

        let make_enum = || {
            let mut builder = EnumTypeBuilder::new(&prog);
            builder.add_signed("A", 0).unwrap();
            builder.create(Some("e"), Some(int), true, None).unwrap()
        };
        assert_ne!(make_enum(), make_enum());
    }
}
