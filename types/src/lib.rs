//! Type model for program introspection.
//!
//! Every type observed in a target program (primitives, structures, unions,
//! classes, enumerations, typedefs, pointers, arrays and functions) is an
//! immutable descriptor owned by a [`Program`] and referred to through a
//! copyable [`Ty`] handle. Descriptors without variable-length entries are
//! deduplicated, so handle equality is type identity.
//!
//! Member, parameter and template parameter types are [`LazyType`]s, which
//! lets cyclic type graphs be built one descriptor at a time.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use typegraph_types::{CompoundTypeBuilder, Kind, LazyType, Program};
//!
//! let arena = Bump::new();
//! let prog = Program::new(&arena);
//! let int = prog.int_type("int", 4, true, None);
//!
//! // struct node { int value; struct node *next; };
//! let mut builder = CompoundTypeBuilder::new(&prog, Kind::Struct).unwrap();
//! builder.add_member(LazyType::evaluated(int), Some("value"), 0, 0).unwrap();
//! builder
//!     .add_member(
//!         LazyType::thunk(|prog: &Program<'_>| {
//!             let node = prog.find_type(Kind::Struct, "node", None)?;
//!             Ok(prog.pointer_type(node, 8, None)?.into())
//!         }),
//!         Some("next"),
//!         64,
//!         0,
//!     )
//!     .unwrap();
//! let node = builder.create(Some("node"), 16, true, None).unwrap();
//! prog.add_type_finder_fn(move |_prog, _kind, name, _filename| match name {
//!     "node" => Ok(node.into()),
//!     _ => Err(typegraph_types::Error::not_found(name)),
//! });
//!
//! let next = prog.find_member(node, "next").unwrap();
//! let next_ty = next.qualified_type(&prog).unwrap().ty;
//! assert_eq!(next_ty.to_string(), "struct node *");
//! assert_eq!(next_ty.referenced_type().unwrap().ty, node);
//! ```

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

pub mod builders;
mod dedup;
mod error;
mod finder;
mod flags;
mod kind;
mod lazy;
mod members;
mod primitive;
mod program;
mod ty;

pub use builders::{CompoundTypeBuilder, EnumTypeBuilder, FunctionTypeBuilder};
pub use error::{BuildError, Error, Result};
pub use finder::{FnFinder, TypeFinder};
pub use flags::TyFlags;
pub use kind::{Kind, Language, Qualifiers};
pub use lazy::{FnThunk, LazyType, TypeThunk};
pub use members::MemberValue;
pub use primitive::{PrimitiveType, parse_specifier_list};
pub use program::{Program, ProgramId, ProgramOptions};
pub use ty::{
    Compound, Enumerated, Enumerator, EnumeratorValue, Function, Member, Parameter,
    QualifiedType, TemplateParameter, Ty, TyKind, TyNode,
};
