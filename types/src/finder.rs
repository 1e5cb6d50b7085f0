//! Pluggable lookup of named types.
//!
//! The core never decides how a type is discovered. Debug-info readers
//! register [`TypeFinder`]s with a program, and [`Program::find_type`] asks
//! them in turn.

use alloc::{format, rc::Rc, string::String, vec::Vec};

use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::program::Program;
use crate::ty::QualifiedType;

/// Locates a named type of a given kind.
///
/// Return [`Error::NotFound`] to let the next finder try; any other error
/// stops the search and is returned to the caller. A finder may call back
/// into the program, including [`Program::find_type`].
pub trait TypeFinder<'p> {
    fn find(
        &self,
        prog: &Program<'p>,
        kind: Kind,
        name: &str,
        filename: Option<&str>,
    ) -> Result<QualifiedType<'p>>;
}

/// Adapts a closure to [`TypeFinder`]. See [`Program::add_type_finder_fn`].
pub struct FnFinder<F>(F);

impl<'p, F> TypeFinder<'p> for FnFinder<F>
where
    F: Fn(&Program<'p>, Kind, &str, Option<&str>) -> Result<QualifiedType<'p>>,
{
    fn find(
        &self,
        prog: &Program<'p>,
        kind: Kind,
        name: &str,
        filename: Option<&str>,
    ) -> Result<QualifiedType<'p>> {
        (self.0)(prog, kind, name, filename)
    }
}

impl<'p> Program<'p> {
    /// Register a finder. Finders are consulted in registration order.
    pub fn add_type_finder(&self, finder: impl TypeFinder<'p> + 'p) {
        self.finders.borrow_mut().push(Rc::new(finder));
    }

    /// Register a closure as a finder.
    ///
    /// ```
    /// use bumpalo::Bump;
    /// use typegraph_types::{Error, Kind, Program};
    ///
    /// let arena = Bump::new();
    /// let prog = Program::new(&arena);
    /// prog.add_type_finder_fn(|prog, kind, name, _filename| match (kind, name) {
    ///     (Kind::Typedef, "u8") => {
    ///         let uchar = prog.int_type("unsigned char", 1, false, None);
    ///         Ok(prog.typedef_type("u8", uchar, None)?.into())
    ///     }
    ///     _ => Err(Error::not_found("not mine")),
    /// });
    ///
    /// let u8_ty = prog.find_type(Kind::Typedef, "u8", None).unwrap().ty;
    /// assert_eq!(u8_ty.sizeof().unwrap(), 1);
    /// assert!(prog.find_type(Kind::Struct, "u8", None).unwrap_err().is_not_found());
    /// ```
    pub fn add_type_finder_fn<F>(&self, f: F)
    where
        F: Fn(&Program<'p>, Kind, &str, Option<&str>) -> Result<QualifiedType<'p>> + 'p,
    {
        self.add_type_finder(FnFinder(f));
    }

    /// Find a type by kind and name, optionally restricted to the
    /// compilation unit `filename`.
    pub fn find_type(
        &self,
        kind: Kind,
        name: &str,
        filename: Option<&str>,
    ) -> Result<QualifiedType<'p>> {
        if !kind.is_findable() {
            return Err(Error::invalid_argument(format!("cannot look up {kind} types by name")));
        }

        // Snapshot so finders can register more finders or recurse.
        let finders: Vec<_> = self.finders.borrow().clone();
        for (index, finder) in finders.iter().enumerate() {
            match finder.find(self, kind, name, filename) {
                Ok(found) => {
                    if found.ty.kind() != kind {
                        return Err(Error::invalid_argument(
                            "type find callback returned wrong kind of type",
                        ));
                    }
                    self.check_owns(found.ty)?;
                    tracing::trace!(%kind, name, finder = index, "type found");
                    return Ok(found);
                }
                Err(err) if err.is_not_found() => {
                    tracing::trace!(%kind, name, finder = index, "finder missed");
                }
                Err(err) => return Err(err),
            }
        }

        tracing::debug!(%kind, name, ?filename, "type not found");
        Err(Error::not_found(not_found_message(kind, name, filename)))
    }
}

fn not_found_message(kind: Kind, name: &str, filename: Option<&str>) -> String {
    let spelled = if kind.can_be_anonymous() {
        format!("{kind} {name}")
    } else {
        String::from(name)
    };
    match filename {
        Some(filename) => format!("could not find '{spelled}' in '{filename}'"),
        None => format!("could not find '{spelled}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use crate::{CompoundTypeBuilder, Qualifiers};
    use alloc::string::ToString;
    use alloc::vec;
    use bumpalo::Bump;
    use core::cell::RefCell;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_finders() {
        let arena = Bump::new();
        let prog = Program::new(&arena);

        let err = prog.find_type(Kind::Struct, "foo", None).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "could not find 'struct foo'");

        let err = prog.find_type(Kind::Typedef, "foo_t", Some("foo.c")).unwrap_err();
        assert_eq!(err.to_string(), "could not find 'foo_t' in 'foo.c'");
    }

    #[test]
    fn test_registration_order_and_not_found_continues() {
        init_test_logging();
        let calls = RefCell::new(Vec::new());
        let arena = Bump::new();
        let prog = Program::new(&arena);

        prog.add_type_finder_fn(|_prog, _kind, _name, _filename| {
            calls.borrow_mut().push("first");
            Err(Error::not_found("first"))
        });
        prog.add_type_finder_fn(|prog, kind, name, _filename| {
            calls.borrow_mut().push("second");
            let ty = CompoundTypeBuilder::new(prog, kind)?.create(Some(name), 0, false, None)?;
            Ok(QualifiedType::new(ty, Qualifiers::VOLATILE))
        });
        prog.add_type_finder_fn(|_prog, _kind, _name, _filename| {
            calls.borrow_mut().push("third");
            Err(Error::not_found("third"))
        });

        let found = prog.find_type(Kind::Union, "u", None).unwrap();
        assert_eq!(found.ty.to_string(), "union u");
        assert_eq!(found.qualifiers, Qualifiers::VOLATILE);
        assert_eq!(*calls.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_hard_error_stops_search() {
        let reached = core::cell::Cell::new(false);
        let arena = Bump::new();
        let prog = Program::new(&arena);

        prog.add_type_finder_fn(|_prog, _kind, _name, _filename| {
            Err(Error::external(std::io::Error::other("debug info is corrupt")))
        });
        prog.add_type_finder_fn(|prog, _kind, _name, _filename| {
            reached.set(true);
            Ok(prog.int_type("int", 4, true, None).into())
        });

        let err = prog.find_type(Kind::Int, "int", None).unwrap_err();
        assert!(matches!(err, Error::External(_)));
        assert_eq!(err.to_string(), "debug info is corrupt");
        assert!(!reached.get());
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        prog.add_type_finder_fn(|prog, _kind, _name, _filename| {
            Ok(prog.int_type("int", 4, true, None).into())
        });

        let err = prog.find_type(Kind::Struct, "int", None).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_foreign_result_is_rejected() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let other = Program::new(&arena);
        let foreign = other.int_type("int", 4, true, None);
        prog.add_type_finder_fn(move |_prog, _kind, _name, _filename| Ok(foreign.into()));

        let err = prog.find_type(Kind::Int, "int", None).unwrap_err();
        assert_eq!(err.to_string(), "type is from different program");
    }

    #[test]
    fn test_unsearchable_kind() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        assert!(matches!(
            prog.find_type(Kind::Pointer, "p", None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_finder_may_recurse() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        prog.add_type_finder_fn(|prog, kind, name, filename| match (kind, name) {
            (Kind::Typedef, "word") => {
                let aliased = prog.find_type(Kind::Int, "unsigned long", filename)?;
                Ok(prog.typedef_type("word", aliased, None)?.into())
            }
            (Kind::Int, "unsigned long") => Ok(prog.int_type(name, 8, false, None).into()),
            _ => Err(Error::not_found(name)),
        });

        let word = prog.find_type(Kind::Typedef, "word", None).unwrap().ty;
        assert_eq!(word.underlying_type().name(), Some("unsigned long"));
    }
}
