use alloc::vec::Vec;

use crate::error::{BuildError, Result};
use crate::kind::Language;
use crate::lazy::LazyType;
use crate::program::Program;
use crate::ty::{Function, Parameter, QualifiedType, TemplateParameter, Ty, TyKind};

/// Builder for parameters of a function type.
pub struct FunctionTypeBuilder<'a, 'p> {
    prog: &'a Program<'p>,
    params: Vec<Parameter<'p>>,
    templates: Vec<TemplateParameter<'p>>,
}

impl<'a, 'p> FunctionTypeBuilder<'a, 'p> {
    pub fn new(prog: &'a Program<'p>) -> Self {
        Self {
            prog,
            params: Vec::new(),
            templates: Vec::new(),
        }
    }

    pub fn parameters(&self) -> &[Parameter<'p>] {
        &self.params
    }

    pub fn template_parameters(&self) -> &[TemplateParameter<'p>] {
        &self.templates
    }

    pub fn add_parameter(&mut self, ty: LazyType<'p>, name: Option<&str>) -> Result<()> {
        self.prog.check_lazy(&ty)?;
        self.params.push(Parameter {
            name: name.map(|name| self.prog.intern(name)),
            ty,
        });
        Ok(())
    }

    pub fn add_template_parameter(&mut self, ty: LazyType<'p>, name: Option<&str>) -> Result<()> {
        super::push_template_parameter(self.prog, &mut self.templates, ty, name)
    }

    pub fn create(
        self,
        ret: impl Into<QualifiedType<'p>>,
        is_variadic: bool,
        lang: Option<Language>,
    ) -> Result<Ty<'p>, BuildError<Self>> {
        let ret = ret.into();
        if let Err(error) = self.prog.check_owns(ret.ty) {
            return Err(BuildError::new(self, error));
        }

        let Self {
            prog,
            params,
            templates,
        } = self;
        let function = Function {
            ret,
            params: prog.arena().alloc_slice_fill_iter(params),
            templates: prog.arena().alloc_slice_fill_iter(templates),
            is_variadic,
        };
        Ok(prog.create_type(TyKind::Function(function), lang))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Kind};
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parameter_order() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let int = prog.int_type("int", 4, true, None);
        let char_ty = prog.int_type("char", 1, true, None);
        let ptr = prog.pointer_type(char_ty, 8, None).unwrap();

        let mut builder = FunctionTypeBuilder::new(&prog);
        builder.add_parameter(LazyType::evaluated(int), Some("a")).unwrap();
        builder.add_parameter(LazyType::evaluated(ptr), Some("b")).unwrap();
        builder.add_parameter(LazyType::evaluated(int), Some("c")).unwrap();
        let func = builder.create(int, true, None).unwrap();

        let names: Vec<_> = func.parameters().iter().map(|p| p.name()).collect();
        assert_eq!(names, [Some("a"), Some("b"), Some("c")]);
        assert_eq!(func.parameters()[1].qualified_type(&prog).unwrap().ty, ptr);
        assert!(func.is_variadic());
        assert_eq!(func.wrapped_type().map(|ret| ret.ty), Some(int));
        assert_eq!(func.kind(), Kind::Function);
    }

    #[test]
    fn test_functions_with_parameters_are_distinct() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let int = prog.int_type("int", 4, true, None);

        let make = || {
            let mut builder = FunctionTypeBuilder::new(&prog);
            builder.add_parameter(LazyType::evaluated(int), None).unwrap();
            builder.create(int, false, None).unwrap()
        };
        assert_ne!(make(), make());

        let void = prog.void_type(None);
        let a = FunctionTypeBuilder::new(&prog).create(void, false, None).unwrap();
        let b = FunctionTypeBuilder::new(&prog).create(void, false, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_return_type_from_other_program() {
        let arena = Bump::new();
        let prog = Program::new(&arena);
        let other = Program::new(&arena);
        let int = prog.int_type("int", 4, true, None);
        let foreign = other.int_type("int", 4, true, None);

        let mut builder = FunctionTypeBuilder::new(&prog);
        builder.add_parameter(LazyType::evaluated(int), Some("x")).unwrap();
        let err = builder.create(foreign, false, None).unwrap_err();
        assert!(matches!(err.error(), Error::InvalidArgument(_)));
        assert_eq!(err.builder().parameters().len(), 1);
    }
}
