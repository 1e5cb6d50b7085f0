//! Lazily-evaluated types.
//!
//! The graph of types in a program can be very deep and is often cyclic (a
//! list node pointing to itself, two structures pointing to each other), so
//! member, parameter and template parameter types are stored as [`LazyType`]
//! cells. A cell starts out holding a [`TypeThunk`] and is only resolved when
//! somebody asks for the type, by which point the types it refers to have
//! usually been registered.

use alloc::{boxed::Box, format};
use core::cell::{Cell, RefCell};
use core::{fmt, mem};

use crate::error::{Error, Result};
use crate::program::{Program, ProgramId};
use crate::ty::QualifiedType;

/// A deferred computation of a [`QualifiedType`].
///
/// `evaluate` may be called again after it fails. `release` is called exactly
/// once: right after the first successful evaluation, or when the owning cell
/// is discarded without having been evaluated.
pub trait TypeThunk<'p> {
    fn evaluate(&mut self, prog: &Program<'p>) -> Result<QualifiedType<'p>>;

    fn release(self: Box<Self>) {}
}

/// Adapts a closure to [`TypeThunk`]. See [`LazyType::thunk`].
pub struct FnThunk<F>(F);

impl<'p, F> TypeThunk<'p> for FnThunk<F>
where
    F: FnMut(&Program<'p>) -> Result<QualifiedType<'p>>,
{
    fn evaluate(&mut self, prog: &Program<'p>) -> Result<QualifiedType<'p>> {
        (self.0)(prog)
    }
}

enum LazyState<'p> {
    Evaluated(QualifiedType<'p>),
    Unevaluated(Box<dyn TypeThunk<'p> + 'p>),
    /// The thunk is running; seeing this again means it depends on itself.
    Evaluating,
    /// The owning program was deinitialized before evaluation.
    Released,
}

/// A type reference that is either already evaluated or backed by a thunk.
///
/// Transitions are one way: once evaluation succeeds the result is cached
/// and the thunk released. A failed evaluation leaves the thunk in place so
/// it can be retried.
///
/// A cell belongs to the first program that accepts it into a descriptor or
/// evaluates it, and can only be evaluated through that program afterwards.
pub struct LazyType<'p> {
    state: RefCell<LazyState<'p>>,
    owner: Cell<Option<ProgramId>>,
}

impl<'p> LazyType<'p> {
    pub fn evaluated(ty: impl Into<QualifiedType<'p>>) -> Self {
        Self {
            state: RefCell::new(LazyState::Evaluated(ty.into())),
            owner: Cell::new(None),
        }
    }

    pub fn from_thunk(thunk: impl TypeThunk<'p> + 'p) -> Self {
        Self::from_boxed_thunk(Box::new(thunk))
    }

    pub fn from_boxed_thunk(thunk: Box<dyn TypeThunk<'p> + 'p>) -> Self {
        Self {
            state: RefCell::new(LazyState::Unevaluated(thunk)),
            owner: Cell::new(None),
        }
    }

    /// Wrap a closure as the thunk.
    ///
    /// ```
    /// use bumpalo::Bump;
    /// use typegraph_types::{LazyType, Program};
    ///
    /// let arena = Bump::new();
    /// let prog = Program::new(&arena);
    /// let lazy = LazyType::thunk(|prog: &Program<'_>| Ok(prog.int_type("int", 4, true, None).into()));
    /// assert!(!lazy.is_evaluated());
    /// assert_eq!(lazy.evaluate(&prog).unwrap().ty.name(), Some("int"));
    /// assert!(lazy.is_evaluated());
    /// ```
    pub fn thunk<F>(f: F) -> Self
    where
        F: FnMut(&Program<'p>) -> Result<QualifiedType<'p>> + 'p,
    {
        Self::from_thunk(FnThunk(f))
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(&*self.state.borrow(), LazyState::Evaluated(_))
    }

    /// The program this cell is bound to, if any.
    pub fn owner(&self) -> Option<ProgramId> {
        self.owner.get()
    }

    /// Bind the cell to `id`. Binding again to the same program is a no-op.
    pub(crate) fn bind(&self, id: ProgramId) -> Result<()> {
        match self.owner.get() {
            Some(owner) if owner != id => Err(Error::invalid_argument(format!(
                "lazy type belongs to program {owner}, not {id}"
            ))),
            _ => {
                self.owner.set(Some(id));
                Ok(())
            }
        }
    }

    /// The cached value, without evaluating.
    pub fn peek(&self) -> Option<QualifiedType<'p>> {
        match &*self.state.borrow() {
            LazyState::Evaluated(ty) => Some(*ty),
            _ => None,
        }
    }

    /// Evaluate to a [`QualifiedType`].
    ///
    /// After the first success this returns the cached result without calling
    /// the thunk again. On failure the cell stays unevaluated with the same
    /// thunk. Evaluating through a program other than the one the cell is
    /// bound to is an [`Error::InvalidArgument`].
    pub fn evaluate(&self, prog: &Program<'p>) -> Result<QualifiedType<'p>> {
        self.bind(prog.id())?;
        if let Some(ty) = self.peek() {
            return Ok(ty);
        }

        // The state borrow must not be held while the thunk runs: the thunk
        // may look up members of the type that owns this cell.
        let mut thunk = match self.state.replace(LazyState::Evaluating) {
            LazyState::Unevaluated(thunk) => thunk,
            LazyState::Evaluating => {
                return Err(Error::invalid_argument(
                    "lazy type evaluation depends on itself",
                ));
            }
            LazyState::Released => {
                self.state.replace(LazyState::Released);
                return Err(Error::invalid_argument(
                    "lazy type was released with its program",
                ));
            }
            LazyState::Evaluated(ty) => {
                self.state.replace(LazyState::Evaluated(ty));
                return Ok(ty);
            }
        };

        let result = thunk
            .evaluate(prog)
            .and_then(|ty| prog.check_owns(ty.ty).map(|()| ty));
        match result {
            Ok(ty) => {
                self.state.replace(LazyState::Evaluated(ty));
                thunk.release();
                Ok(ty)
            }
            Err(err) => {
                tracing::trace!(error = %err, "lazy type evaluation failed");
                self.state.replace(LazyState::Unevaluated(thunk));
                Err(err)
            }
        }
    }

    /// Release the thunk of an unevaluated cell. Returns whether there was one.
    pub(crate) fn release(&self) -> bool {
        let mut state = self.state.borrow_mut();
        match mem::replace(&mut *state, LazyState::Released) {
            LazyState::Unevaluated(thunk) => {
                drop(state);
                thunk.release();
                true
            }
            previous => {
                *state = previous;
                false
            }
        }
    }
}

impl Drop for LazyType<'_> {
    fn drop(&mut self) {
        if let LazyState::Unevaluated(thunk) =
            mem::replace(self.state.get_mut(), LazyState::Released)
        {
            thunk.release();
        }
    }
}

impl fmt::Debug for LazyType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow().as_deref() {
            Ok(LazyState::Evaluated(ty)) => write!(f, "LazyType({ty})"),
            Ok(LazyState::Unevaluated(_)) => f.write_str("LazyType(<unevaluated>)"),
            Ok(LazyState::Released) => f.write_str("LazyType(<released>)"),
            Ok(LazyState::Evaluating) | Err(_) => f.write_str("LazyType(<evaluating>)"),
        }
    }
}
