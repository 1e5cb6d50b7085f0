//! Member lookup by name, including members of anonymous structures and
//! unions, which are promoted into the enclosing type.

use alloc::{format, vec::Vec};
use core::cell::RefCell;
use core::slice;
use hashbrown::{Equivalent, HashMap, HashSet};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::lazy::LazyType;
use crate::program::Program;
use crate::ty::{Member, QualifiedType, Ty};

/// A member found by [`Program::find_member`].
///
/// `bit_offset` is relative to the start of the type that was searched, so
/// members of anonymous members have their container's offset added.
#[derive(Clone, Copy, Debug)]
pub struct MemberValue<'p> {
    ty: &'p LazyType<'p>,
    bit_offset: u64,
    bit_field_size: u64,
}

impl<'p> MemberValue<'p> {
    pub fn lazy_type(&self) -> &'p LazyType<'p> {
        self.ty
    }

    pub fn qualified_type(&self, prog: &Program<'p>) -> Result<QualifiedType<'p>> {
        self.ty.evaluate(prog)
    }

    pub fn bit_offset(&self) -> u64 {
        self.bit_offset
    }

    pub fn bit_field_size(&self) -> u64 {
        self.bit_field_size
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct MemberKey<'p> {
    ty: Ty<'p>,
    name: &'p str,
}

/// Borrowed form of [`MemberKey`] for lookups. Must hash identically.
#[derive(Hash)]
struct MemberQuery<'a, 'p> {
    ty: Ty<'p>,
    name: &'a str,
}

impl<'p> Equivalent<MemberKey<'p>> for MemberQuery<'_, 'p> {
    fn equivalent(&self, key: &MemberKey<'p>) -> bool {
        self.ty == key.ty && self.name == key.name
    }
}

#[derive(Default)]
pub(crate) struct MemberCache<'p> {
    members: RefCell<HashMap<MemberKey<'p>, MemberValue<'p>>>,
    /// Types whose members have all been flattened into `members`.
    populated: RefCell<HashSet<Ty<'p>>>,
}

impl<'p> MemberCache<'p> {
    fn get(&self, ty: Ty<'p>, name: &str) -> Option<MemberValue<'p>> {
        self.members.borrow().get(&MemberQuery { ty, name }).copied()
    }

    fn is_populated(&self, ty: Ty<'p>) -> bool {
        self.populated.borrow().contains(&ty)
    }

    /// The first entry for a name wins.
    fn commit(&self, ty: Ty<'p>, flattened: Vec<(&'p str, MemberValue<'p>)>) {
        let count = flattened.len();
        let mut members = self.members.borrow_mut();
        for (name, value) in flattened {
            members.entry(MemberKey { ty, name }).or_insert(value);
        }
        self.populated.borrow_mut().insert(ty);
        tracing::debug!(%ty, members = count, "populated member cache");
    }
}

type OpenMembers<'p> = (slice::Iter<'p, Member<'p>>, u64, Ty<'p>);

impl<'p> Program<'p> {
    /// Find a member of a structure, union or class type by name, looking
    /// through typedefs and into anonymous members.
    ///
    /// The first lookup on a type walks all of its members (evaluating the
    /// types of unnamed members); later lookups are a single hash probe.
    ///
    /// ```
    /// use bumpalo::Bump;
    /// use typegraph_types::{CompoundTypeBuilder, Kind, LazyType, Program};
    ///
    /// let arena = Bump::new();
    /// let prog = Program::new(&arena);
    /// let int = prog.int_type("int", 4, true, None);
    ///
    /// let mut inner = CompoundTypeBuilder::new(&prog, Kind::Union).unwrap();
    /// inner.add_member(LazyType::evaluated(int), Some("b"), 0, 0).unwrap();
    /// let inner = inner.create(None, 4, true, None).unwrap();
    ///
    /// let mut outer = CompoundTypeBuilder::new(&prog, Kind::Struct).unwrap();
    /// outer.add_member(LazyType::evaluated(int), Some("a"), 0, 0).unwrap();
    /// outer.add_member(LazyType::evaluated(inner), None, 32, 0).unwrap();
    /// let outer = outer.create(Some("outer"), 8, true, None).unwrap();
    ///
    /// assert_eq!(prog.find_member(outer, "b").unwrap().bit_offset(), 32);
    /// assert!(prog.find_member(outer, "c").unwrap_err().is_not_found());
    /// ```
    pub fn find_member(&self, ty: Ty<'p>, name: &str) -> Result<MemberValue<'p>> {
        self.lookup_member(ty, name)?
            .ok_or_else(|| Error::not_found(format!("'{ty}' has no member '{name}'")))
    }

    /// Like [`find_member`](Self::find_member), but a missing member is
    /// `Ok(false)`.
    ///
    /// Errors from resolving the types of unnamed members are returned as-is,
    /// including [`Error::NotFound`] from a thunk: the member may exist in a
    /// part of the type that could not be loaded yet.
    pub fn has_member(&self, ty: Ty<'p>, name: &str) -> Result<bool> {
        Ok(self.lookup_member(ty, name)?.is_some())
    }

    fn lookup_member(&self, ty: Ty<'p>, name: &str) -> Result<Option<MemberValue<'p>>> {
        self.check_owns(ty)?;
        let compound = ty.underlying_type();
        if !compound.has_members() {
            return Err(Error::invalid_argument(format!(
                "'{ty}' is not a structure, union, or class"
            )));
        }

        if let Some(value) = self.members.get(compound, name) {
            return Ok(Some(value));
        }
        if !self.members.is_populated(compound) {
            let flattened = self.flatten_members(compound)?;
            self.members.commit(compound, flattened);
            return Ok(self.members.get(compound, name));
        }
        Ok(None)
    }

    /// Collect every reachable named member of `ty` in declaration order,
    /// depth first. Unnamed members are descended into instead of recorded.
    ///
    /// Uses an explicit stack; a type already being walked is not entered
    /// again.
    fn flatten_members(&self, ty: Ty<'p>) -> Result<Vec<(&'p str, MemberValue<'p>)>> {
        let mut flattened = Vec::new();
        let mut stack: SmallVec<[OpenMembers<'p>; 4]> = SmallVec::new();
        stack.push((ty.members().iter(), 0, ty));

        while let Some((members, base, _)) = stack.last_mut() {
            let base = *base;
            let Some(member) = members.next() else {
                stack.pop();
                continue;
            };
            let bit_offset = base.checked_add(member.bit_offset).ok_or_else(|| {
                Error::overflow(format!("member offset in '{ty}' is too large"))
            })?;

            match member.name {
                Some(name) => flattened.push((
                    name,
                    MemberValue {
                        ty: &member.ty,
                        bit_offset,
                        bit_field_size: member.bit_field_size,
                    },
                )),
                None => {
                    let nested = member.ty.evaluate(self)?.ty.underlying_type();
                    if nested.has_members() && !stack.iter().any(|(_, _, open)| *open == nested) {
                        stack.push((nested.members().iter(), bit_offset, nested));
                    }
                }
            }
        }
        Ok(flattened)
    }
}
