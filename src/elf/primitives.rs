use std::ops::Add;

/// Index into the section table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SectionIndex(pub u32);

/// Index into a string table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct StringIndex(pub u32);

/// An index into a byte within an ELF file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Offset(pub u32);

/// The address of a byte once the image is loaded. These are normally associated with
/// one of the load segments.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct VirtualAddr(pub u32);

/// A range of bytes that can be addressed using either offsets into an ELF file or
/// virtual addresses.
#[derive(Copy, Clone, Debug)]
pub struct Bytes<A>
where
    A: Add<u32, Output = A> + Copy + Ord,
{
    pub start: A,
    pub size: u32,
}

impl Bytes<Offset> {
    pub fn from_raw(start: u32, size: u32) -> Self {
        Bytes {
            start: Offset(start),
            size,
        }
    }
}

impl Bytes<VirtualAddr> {
    pub fn from_raw(start: u32, size: u32) -> Self {
        Bytes {
            start: VirtualAddr(start),
            size,
        }
    }
}

impl<A: Add<u32, Output = A> + Copy + Ord> Bytes<A> {
    pub fn contains(&self, addr: A) -> bool {
        addr >= self.start && addr < self.end()
    }

    pub fn end(&self) -> A {
        self.start + self.size
    }
}

// Addresses near the top of the 32-bit space wrap rather than panic.
impl Add<u32> for VirtualAddr {
    type Output = VirtualAddr;

    fn add(self, rhs: u32) -> Self::Output {
        VirtualAddr(self.0.wrapping_add(rhs))
    }
}

impl Add<u32> for Offset {
    type Output = Offset;

    fn add(self, rhs: u32) -> Self::Output {
        Offset(self.0.wrapping_add(rhs))
    }
}
