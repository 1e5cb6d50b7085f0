use bitflags::bitflags;
use core::fmt;

/// The kind of a type descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// `void`
    Void,
    /// Integer types (`int`, `unsigned long`, ...)
    Int,
    /// Boolean type (`_Bool`)
    Bool,
    /// Floating-point types (`float`, `double`, ...)
    Float,
    /// Complex types, paired with a real integer or floating-point type
    Complex,
    /// Structure types
    Struct,
    /// Union types
    Union,
    /// Class types
    Class,
    /// Enumerated types
    Enum,
    /// Typedefs
    Typedef,
    /// Pointer types
    Pointer,
    /// Array types
    Array,
    /// Function types
    Function,
}

impl Kind {
    pub const fn spelling(self) -> &'static str {
        match self {
            Kind::Void => "void",
            Kind::Int => "int",
            Kind::Bool => "bool",
            Kind::Float => "float",
            Kind::Complex => "complex",
            Kind::Struct => "struct",
            Kind::Union => "union",
            Kind::Class => "class",
            Kind::Enum => "enum",
            Kind::Typedef => "typedef",
            Kind::Pointer => "pointer",
            Kind::Array => "array",
            Kind::Function => "function",
        }
    }

    /// Structure, union or class.
    pub const fn is_compound(self) -> bool {
        matches!(self, Kind::Struct | Kind::Union | Kind::Class)
    }

    /// Only compound and enumerated types may lack a tag.
    pub const fn can_be_anonymous(self) -> bool {
        self.is_compound() || matches!(self, Kind::Enum)
    }

    /// Kinds that a type finder can be asked to locate by name.
    pub const fn is_findable(self) -> bool {
        matches!(
            self,
            Kind::Int
                | Kind::Bool
                | Kind::Float
                | Kind::Struct
                | Kind::Union
                | Kind::Class
                | Kind::Enum
                | Kind::Typedef
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

/// Source language a type was defined in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    C,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::C, Language::Cpp];

    pub const fn name(self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cpp => "C++",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Type qualifiers.
    ///
    /// Qualifiers are orthogonal to type identity: a `const int` is the `int`
    /// descriptor paired with [`Qualifiers::CONST`].
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct Qualifiers: u8 {
        const CONST = 1;
        const VOLATILE = 1 << 1;
        const RESTRICT = 1 << 2;
        const ATOMIC = 1 << 3;
    }
}

impl Qualifiers {
    pub(crate) fn spellings(self) -> impl Iterator<Item = &'static str> {
        self.iter_names().map(|(name, _)| match name {
            "CONST" => "const",
            "VOLATILE" => "volatile",
            "RESTRICT" => "restrict",
            _ => "_Atomic",
        })
    }
}
