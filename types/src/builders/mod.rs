//! Builders for the type kinds with variable-length fields.
//!
//! - [`CompoundTypeBuilder`]: members and template parameters of structure,
//!   union and class types
//! - [`EnumTypeBuilder`]: enumerators of enumerated types
//! - [`FunctionTypeBuilder`]: parameters and template parameters of function
//!   types
//!
//! Entries keep insertion order. `create` consumes the builder; on failure
//! the builder comes back inside a [`BuildError`](crate::BuildError) with all
//! of its entries.

mod compound;
mod enumerated;
mod function;

pub use compound::CompoundTypeBuilder;
pub use enumerated::EnumTypeBuilder;
pub use function::FunctionTypeBuilder;

use alloc::vec::Vec;

use crate::error::Result;
use crate::lazy::LazyType;
use crate::program::Program;
use crate::ty::TemplateParameter;

/// Shared by the compound and function builders.
pub(crate) fn push_template_parameter<'p>(
    prog: &Program<'p>,
    templates: &mut Vec<TemplateParameter<'p>>,
    ty: LazyType<'p>,
    name: Option<&str>,
) -> Result<()> {
    prog.check_lazy(&ty)?;
    templates.push(TemplateParameter {
        name: name.map(|name| prog.intern(name)),
        ty,
    });
    Ok(())
}
