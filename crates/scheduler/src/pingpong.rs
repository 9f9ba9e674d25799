use std::fmt;
use std::ops::Index;

/// Which of the two alternating bind-group pairs a pass uses.
///
/// Slot `A` reads accumulation buffer 0 and writes buffer 1; slot `B` reads 1
/// and writes 0. The display group of a slot reads that slot's write target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub const BOTH: [Slot; 2] = [Slot::A, Slot::B];

    /// Pass `i` uses slot `i % 2`.
    pub fn for_pass(pass: u32) -> Self {
        if pass % 2 == 0 {
            Slot::A
        } else {
            Slot::B
        }
    }

    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

/// One value per [`Slot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingPong<T> {
    a: T,
    b: T,
}

impl<T> PingPong<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn try_from_fn<E>(mut build: impl FnMut(Slot) -> Result<T, E>) -> Result<Self, E> {
        let a = build(Slot::A)?;
        let b = build(Slot::B)?;
        Ok(Self { a, b })
    }

    pub fn get(&self, slot: Slot) -> &T {
        match slot {
            Slot::A => &self.a,
            Slot::B => &self.b,
        }
    }

    /// Accumulation buffer a compute pass in `slot` reads from.
    pub fn source(&self, slot: Slot) -> &T {
        self.get(slot)
    }

    /// Accumulation buffer a compute pass in `slot` writes, and the display
    /// pass in the same slot reads.
    pub fn target(&self, slot: Slot) -> &T {
        self.get(slot.other())
    }
}

impl<T> Index<Slot> for PingPong<T> {
    type Output = T;

    fn index(&self, slot: Slot) -> &T {
        self.get(slot)
    }
}
