//! The standard C types and how their names are spelled.

use alloc::format;

use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::program::Program;
use crate::ty::Ty;

/// A standard C type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Void,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Bool,
    Float,
    Double,
    LongDouble,
    SizeT,
    PtrdiffT,
}

impl PrimitiveType {
    pub const COUNT: usize = 18;

    pub const ALL: [PrimitiveType; Self::COUNT] = [
        PrimitiveType::Void,
        PrimitiveType::Char,
        PrimitiveType::SignedChar,
        PrimitiveType::UnsignedChar,
        PrimitiveType::Short,
        PrimitiveType::UnsignedShort,
        PrimitiveType::Int,
        PrimitiveType::UnsignedInt,
        PrimitiveType::Long,
        PrimitiveType::UnsignedLong,
        PrimitiveType::LongLong,
        PrimitiveType::UnsignedLongLong,
        PrimitiveType::Bool,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::LongDouble,
        PrimitiveType::SizeT,
        PrimitiveType::PtrdiffT,
    ];

    /// The canonical spelling.
    pub const fn spelling(self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Char => "char",
            PrimitiveType::SignedChar => "signed char",
            PrimitiveType::UnsignedChar => "unsigned char",
            PrimitiveType::Short => "short",
            PrimitiveType::UnsignedShort => "unsigned short",
            PrimitiveType::Int => "int",
            PrimitiveType::UnsignedInt => "unsigned int",
            PrimitiveType::Long => "long",
            PrimitiveType::UnsignedLong => "unsigned long",
            PrimitiveType::LongLong => "long long",
            PrimitiveType::UnsignedLongLong => "unsigned long long",
            PrimitiveType::Bool => "_Bool",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::LongDouble => "long double",
            PrimitiveType::SizeT => "size_t",
            PrimitiveType::PtrdiffT => "ptrdiff_t",
        }
    }

    /// Kind of the descriptor for this type.
    pub const fn kind(self) -> Kind {
        match self {
            PrimitiveType::Void => Kind::Void,
            PrimitiveType::Bool => Kind::Bool,
            PrimitiveType::Float | PrimitiveType::Double | PrimitiveType::LongDouble => {
                Kind::Float
            }
            PrimitiveType::SizeT | PrimitiveType::PtrdiffT => Kind::Typedef,
            _ => Kind::Int,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl core::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.spelling())
    }
}

#[derive(Copy, Clone)]
enum Specifier {
    Void,
    Char,
    Signed,
    Unsigned,
    Short,
    Int,
    Long,
    Bool,
    Float,
    Double,
}

impl Specifier {
    const COUNT: usize = 10;

    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "void" => Specifier::Void,
            "char" => Specifier::Char,
            "signed" => Specifier::Signed,
            "unsigned" => Specifier::Unsigned,
            "short" => Specifier::Short,
            "int" => Specifier::Int,
            "long" => Specifier::Long,
            "_Bool" => Specifier::Bool,
            "float" => Specifier::Float,
            "double" => Specifier::Double,
            _ => return None,
        })
    }

    /// `long` may appear twice; everything else at most once.
    fn max_count(self) -> u8 {
        match self {
            Specifier::Long => 2,
            _ => 1,
        }
    }
}

/// Map a whitespace-separated list of C type specifiers, in any order, to
/// the standard type it denotes.
///
/// ```
/// use typegraph_types::{parse_specifier_list, PrimitiveType};
///
/// assert_eq!(parse_specifier_list("long unsigned int"), Some(PrimitiveType::UnsignedLong));
/// assert_eq!(parse_specifier_list("int long long"), Some(PrimitiveType::LongLong));
/// assert_eq!(parse_specifier_list("signed"), Some(PrimitiveType::Int));
/// assert_eq!(parse_specifier_list("size_t"), Some(PrimitiveType::SizeT));
/// assert_eq!(parse_specifier_list("short long"), None);
/// ```
pub fn parse_specifier_list(s: &str) -> Option<PrimitiveType> {
    match s.trim() {
        "size_t" => return Some(PrimitiveType::SizeT),
        "ptrdiff_t" => return Some(PrimitiveType::PtrdiffT),
        _ => {}
    }

    let mut counts = [0u8; Specifier::COUNT];
    let mut total = 0u8;
    for token in s.split_whitespace() {
        let specifier = Specifier::from_token(token)?;
        let count = &mut counts[specifier as usize];
        if *count == specifier.max_count() {
            return None;
        }
        *count += 1;
        total += 1;
    }
    let count = |specifier: Specifier| counts[specifier as usize];

    let signed = count(Specifier::Signed) > 0;
    let unsigned = count(Specifier::Unsigned) > 0;
    if total == 0 || (signed && unsigned) {
        return None;
    }
    let sign_tokens = u8::from(signed) + u8::from(unsigned);
    let long = count(Specifier::Long);

    // Types that take no other specifiers, or only `long`.
    let alone = |primitive| (total == 1).then_some(primitive);
    if count(Specifier::Void) > 0 {
        return alone(PrimitiveType::Void);
    }
    if count(Specifier::Bool) > 0 {
        return alone(PrimitiveType::Bool);
    }
    if count(Specifier::Float) > 0 {
        return alone(PrimitiveType::Float);
    }
    if count(Specifier::Double) > 0 {
        return match (long, total) {
            (0, 1) => Some(PrimitiveType::Double),
            (1, 2) => Some(PrimitiveType::LongDouble),
            _ => None,
        };
    }

    if count(Specifier::Char) > 0 {
        if total != 1 + sign_tokens {
            return None;
        }
        return Some(if signed {
            PrimitiveType::SignedChar
        } else if unsigned {
            PrimitiveType::UnsignedChar
        } else {
            PrimitiveType::Char
        });
    }

    // Only sign, `short`, `int` and `long` remain; `int` is implied.
    let primitive = match (count(Specifier::Short), long, unsigned) {
        (1, 0, false) => PrimitiveType::Short,
        (1, 0, true) => PrimitiveType::UnsignedShort,
        (0, 0, false) => PrimitiveType::Int,
        (0, 0, true) => PrimitiveType::UnsignedInt,
        (0, 1, false) => PrimitiveType::Long,
        (0, 1, true) => PrimitiveType::UnsignedLong,
        (0, 2, false) => PrimitiveType::LongLong,
        (0, 2, true) => PrimitiveType::UnsignedLongLong,
        _ => return None,
    };
    Some(primitive)
}

impl<'p> Program<'p> {
    /// Get the descriptor for a standard C type.
    ///
    /// Registered type finders are asked first; if none knows the type, a
    /// default sized from [`ProgramOptions`](crate::ProgramOptions) is used.
    /// The result is cached for the lifetime of the program.
    pub fn find_primitive_type(&self, primitive: PrimitiveType) -> Result<Ty<'p>> {
        let cached = self.primitives.borrow()[primitive.index()];
        if let Some(ty) = cached {
            return Ok(ty);
        }

        let ty = match primitive {
            PrimitiveType::Void => self.void_type(None),
            _ => match self.find_type(primitive.kind(), primitive.spelling(), None) {
                Ok(found) => found.ty,
                Err(err) if err.is_not_found() => self.default_primitive_type(primitive)?,
                Err(err) => return Err(err),
            },
        };
        self.primitives.borrow_mut()[primitive.index()] = Some(ty);
        Ok(ty)
    }

    fn default_primitive_type(&self, primitive: PrimitiveType) -> Result<Ty<'p>> {
        use PrimitiveType::*;

        let spelling = primitive.spelling();
        let pointer_size = self.pointer_size();
        let ty = match primitive {
            Void => self.void_type(None),
            Char => self.int_type(spelling, 1, self.options().char_is_signed, None),
            SignedChar => self.int_type(spelling, 1, true, None),
            UnsignedChar => self.int_type(spelling, 1, false, None),
            Short => self.int_type(spelling, 2, true, None),
            UnsignedShort => self.int_type(spelling, 2, false, None),
            Int => self.int_type(spelling, 4, true, None),
            UnsignedInt => self.int_type(spelling, 4, false, None),
            Long => self.int_type(spelling, pointer_size, true, None),
            UnsignedLong => self.int_type(spelling, pointer_size, false, None),
            LongLong => self.int_type(spelling, 8, true, None),
            UnsignedLongLong => self.int_type(spelling, 8, false, None),
            Bool => self.bool_type(spelling, 1, None),
            Float => self.float_type(spelling, 4, None),
            Double => self.float_type(spelling, 8, None),
            LongDouble => self.float_type(spelling, 16, None),
            SizeT | PtrdiffT => {
                let candidates = if primitive == SizeT {
                    [UnsignedLong, UnsignedLongLong, UnsignedInt]
                } else {
                    [Long, LongLong, Int]
                };
                let mut aliased = None;
                for candidate in candidates {
                    let ty = self.find_primitive_type(candidate)?;
                    if ty.size() == Some(pointer_size) {
                        aliased = Some(ty);
                        break;
                    }
                }
                let aliased = aliased.ok_or_else(|| {
                    Error::invalid_argument(format!(
                        "no {pointer_size}-byte integer type to define {spelling}"
                    ))
                })?;
                self.typedef_type(spelling, aliased, None)?
            }
        };
        Ok(ty)
    }
}
