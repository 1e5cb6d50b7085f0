use bitflags::bitflags;

bitflags! {
    /// Flags indicating various properties of a type.
    ///
    /// These flags are computed once when a descriptor is created and cached
    /// for efficient queries. A typedef carries the flags of the type it
    /// aliases, so classification never has to walk typedef chains.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct TyFlags: u8 {
        const IS_COMPLETE = 1;
        const IS_SIGNED = 1 << 1;
        const IS_INTEGER = 1 << 2;
        const IS_ARITHMETIC = 1 << 3;
        const IS_SCALAR = 1 << 4;
        const HAS_MEMBERS = 1 << 5;
    }
}
