use alloc::{format, vec::Vec};

use crate::error::{BuildError, Error, Result};
use crate::kind::{Kind, Language};
use crate::program::Program;
use crate::ty::{Enumerated, Enumerator, EnumeratorValue, Ty, TyKind};

/// Builder for enumerators of an enumerated type.
pub struct EnumTypeBuilder<'a, 'p> {
    prog: &'a Program<'p>,
    enumerators: Vec<Enumerator<'p>>,
}

impl<'a, 'p> EnumTypeBuilder<'a, 'p> {
    pub fn new(prog: &'a Program<'p>) -> Self {
        Self {
            prog,
            enumerators: Vec::new(),
        }
    }

    pub fn enumerators(&self) -> &[Enumerator<'p>] {
        &self.enumerators
    }

    pub fn add_signed(&mut self, name: &str, value: i64) -> Result<()> {
        self.push(name, EnumeratorValue::Signed(value))
    }

    pub fn add_unsigned(&mut self, name: &str, value: u64) -> Result<()> {
        self.push(name, EnumeratorValue::Unsigned(value))
    }

    fn push(&mut self, name: &str, value: EnumeratorValue) -> Result<()> {
        if self.enumerators.iter().any(|enumerator| enumerator.name == name) {
            return Err(Error::invalid_argument(format!(
                "duplicate enumerator '{name}'"
            )));
        }
        self.enumerators.push(Enumerator {
            name: self.prog.intern(name),
            value,
        });
        Ok(())
    }

    /// Create the type.
    ///
    /// A complete type needs an integer `compatible` type; an incomplete one
    /// must have neither a compatible type nor enumerators.
    pub fn create(
        self,
        tag: Option<&str>,
        compatible: Option<Ty<'p>>,
        is_complete: bool,
        lang: Option<Language>,
    ) -> Result<Ty<'p>, BuildError<Self>> {
        if let Err(error) = self.validate(compatible, is_complete) {
            return Err(BuildError::new(self, error));
        }

        let Self { prog, enumerators } = self;
        let enumerated = Enumerated {
            tag: tag.map(|tag| prog.intern(tag)),
            compatible,
            enumerators: prog.arena().alloc_slice_fill_iter(enumerators),
        };
        Ok(prog.create_type(TyKind::Enum(enumerated), lang))
    }

    fn validate(&self, compatible: Option<Ty<'p>>, is_complete: bool) -> Result<()> {
        match (is_complete, compatible) {
            (true, Some(compatible)) => {
                self.prog.check_owns(compatible)?;
                if compatible.kind() != Kind::Int {
                    return Err(Error::invalid_argument(
                        "compatible type of enum type must be integer type",
                    ));
                }
                Ok(())
            }
            (true, None) => Err(Error::invalid_argument(
                "complete enum type requires a compatible type",
            )),
            (false, Some(_)) => Err(Error::invalid_argument(
                "incomplete enum type must not have a compatible type",
            )),
            (false, None) if !self.enumerators.is_empty() => Err(Error::invalid_argument(
                "incomplete enum type must not have enumerators",
            )),
            (false, None) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_complete_enum() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let uint = prog.int_type("unsigned int", 4, false, None);

        let mut builder = EnumTypeBuilder::new(&prog);
        builder.add_unsigned("RED", 0).unwrap();
        builder.add_unsigned("GREEN", 1).unwrap();
        builder.add_unsigned("BLUE", 2).unwrap();
        let color = builder.create(Some("color"), Some(uint), true, None).unwrap();

        assert!(color.is_complete());
        assert!(color.is_integer());
        assert!(!color.is_signed());
        assert_eq!(color.compatible_type(), Some(uint));
        assert_eq!(color.size(), Some(4));
        let names: Vec<_> = color.enumerators().iter().map(|e| e.name()).collect();
        assert_eq!(names, ["RED", "GREEN", "BLUE"]);
        assert_eq!(color.enumerators()[2].value(), EnumeratorValue::Unsigned(2));
        assert_eq!(color.enum_is_signed().unwrap(), false);
    }

    #[test]
    fn test_signed_enumerators() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let int = prog.int_type("int", 4, true, None);

        let mut builder = EnumTypeBuilder::new(&prog);
        builder.add_signed("NEGATIVE", -1).unwrap();
        let ty = builder.create(None, Some(int), true, None).unwrap();
        assert!(ty.is_anonymous());
        assert!(ty.is_signed());
        assert_eq!(ty.enumerators()[0].value().as_i64(), -1);
    }

    #[test]
    fn test_duplicate_enumerator_rejected() {
        let arena = Bump::new();
        let prog = Program::new(&arena);

        let mut builder = EnumTypeBuilder::new(&prog);
        builder.add_signed("A", 0).unwrap();
        assert!(matches!(builder.add_signed("A", 1), Err(Error::InvalidArgument(_))));
        assert_eq!(builder.enumerators().len(), 1);
    }

    #[test]
    fn test_compatible_type_must_be_integer() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let float = prog.float_type("float", 4, None);
        let boolean = prog.bool_type("_Bool", 1, None);

        let mut builder = EnumTypeBuilder::new(&prog);
        builder.add_signed("A", 0).unwrap();
        let err = builder.create(Some("e"), Some(float), true, None).unwrap_err();
        assert_eq!(err.to_string(), "compatible type of enum type must be integer type");

        let err = err.into_builder().create(Some("e"), Some(boolean), true, None).unwrap_err();
        assert_eq!(err.builder().enumerators().len(), 1);

        let err = err.into_builder().create(Some("e"), None, true, None).unwrap_err();
        assert!(matches!(err.error(), Error::InvalidArgument(_)));
    }

    #[test]
    fn test_incomplete_enum() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let int = prog.int_type("int", 4, true, None);

        let ty = prog.incomplete_enum_type(Some("later"), None).unwrap();
        assert!(!ty.is_complete());
        assert!(ty.is_integer());
        assert_eq!(ty.compatible_type(), None);
        assert!(ty.enumerators().is_empty());
        assert_eq!(ty.size(), Some(0));
        assert!(ty.enum_is_signed().is_err());

        let err = EnumTypeBuilder::new(&prog)
            .create(Some("later"), Some(int), false, None)
            .unwrap_err();
        assert!(matches!(err.error(), Error::InvalidArgument(_)));

        let mut builder = EnumTypeBuilder::new(&prog);
        builder.add_signed("A", 0).unwrap();
        let err = builder.create(Some("later"), None, false, None).unwrap_err();
        assert_eq!(err.to_string(), "incomplete enum type must not have enumerators");
    }

    #[test]
    fn test_incomplete_enum_is_deduplicated() {
        let arena = Bump::new();
        let prog = Program::new(&arena);

        let a = prog.incomplete_enum_type(Some("e"), None).unwrap();
        let b = prog.incomplete_enum_type(Some("e"), None).unwrap();
        let c = prog.incomplete_enum_type(None, None).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
