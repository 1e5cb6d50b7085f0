//! typegraph - the type model of a program-introspection tool
//!
//! # Overview
//!
//! A debugger needs to know the types of the program it is looking at: the
//! layout of every structure, the values of every enumeration, what a
//! typedef really stands for. typegraph keeps those types as immutable,
//! deduplicated descriptors owned by a [`Program`], and resolves references
//! between them lazily so that self-referential and mutually-referential
//! types can be described without infinite recursion.
//!
//! How types are discovered (usually by reading debug information) is up to
//! the host application, which plugs in through [`TypeFinder`] and
//! [`TypeThunk`].
//!
//! # Quick Start
//!
//! ```
//! use bumpalo::Bump;
//! use typegraph::{Error, Kind, PrimitiveType, Program, parse_specifier_list};
//!
//! // Create an arena for type data
//! let arena = Bump::new();
//! let prog = Program::new(&arena);
//!
//! // Teach the program about a typedef
//! prog.add_type_finder_fn(|prog, kind, name, _filename| match (kind, name) {
//!     (Kind::Typedef, "pid_t") => {
//!         let int = prog.find_primitive_type(PrimitiveType::Int)?;
//!         Ok(prog.typedef_type("pid_t", int, None)?.into())
//!     }
//!     _ => Err(Error::not_found(name)),
//! });
//!
//! let pid_t = prog.find_type(Kind::Typedef, "pid_t", None).unwrap().ty;
//! assert_eq!(pid_t.sizeof().unwrap(), 4);
//! assert!(pid_t.is_signed());
//!
//! // C specifier lists resolve to the same descriptors
//! let long = parse_specifier_list("long int").unwrap();
//! let ty = prog.find_primitive_type(long).unwrap();
//! assert_eq!(ty.size(), Some(prog.pointer_size()));
//! ```

pub use typegraph_types::*;

// Re-export the arena so callers don't need to pin a matching bumpalo.
pub use bumpalo::Bump;
