/// Index of one of the two state buffers.
///
/// Only `First` and `Second` exist, so "the other buffer" is always defined
/// and never equal to `self`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferIndex {
    First,
    Second,
}

impl BufferIndex {
    pub const BOTH: [BufferIndex; 2] = [BufferIndex::First, BufferIndex::Second];

    pub const fn other(self) -> Self {
        match self {
            BufferIndex::First => BufferIndex::Second,
            BufferIndex::Second => BufferIndex::First,
        }
    }

    /// `0` or `1`, for array indexing.
    pub const fn as_usize(self) -> usize {
        match self {
            BufferIndex::First => 0,
            BufferIndex::Second => 1,
        }
    }
}

/// Buffer roles for one render cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Step {
    /// Holds the last completed state; sampled by the simulation pass.
    pub current: BufferIndex,
    /// Receives the next state; sampled afterwards by the display pass.
    pub target: BufferIndex,
}

/// Which buffer holds the current state.
#[derive(Debug, Clone)]
pub struct PingPong {
    current: BufferIndex,
    flips: u64,
}

impl PingPong {
    pub fn new() -> Self {
        Self {
            current: BufferIndex::First,
            flips: 0,
        }
    }

    pub fn current(&self) -> BufferIndex {
        self.current
    }

    /// Completed steps since start.
    pub fn flips(&self) -> u64 {
        self.flips
    }

    pub fn step(&self) -> Step {
        Step {
            current: self.current,
            target: self.current.other(),
        }
    }

    /// Makes the freshly written target the new current buffer.
    pub fn flip(&mut self) {
        self.current = self.current.other();
        self.flips += 1;
    }
}

impl Default for PingPong {
    fn default() -> Self {
        Self::new()
    }
}
