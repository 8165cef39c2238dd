//! The fixed-depth return address stack used by `2NNN` and `00EE`.

use crate::error::Chip8Error;

/// The number of return addresses the stack can hold.
pub const STACK_DEPTH: usize = 16;

/// A return address stack with room for [`STACK_DEPTH`] entries.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Stack {
    entries: [u16; STACK_DEPTH],
    depth: usize,
}

impl Stack {
    /// Creates an empty [`Stack`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [0; STACK_DEPTH],
            depth: 0,
        }
    }

    /// Pushes a return address.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::StackOverflow`] if the stack is full. Nothing is
    /// written in that case.
    pub fn push(&mut self, address: u16) -> Result<(), Chip8Error> {
        let slot = self
            .entries
            .get_mut(self.depth)
            .ok_or(Chip8Error::StackOverflow { depth: STACK_DEPTH })?;
        *slot = address;
        self.depth += 1;
        Ok(())
    }

    /// Pops the most recently pushed return address.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::StackUnderflow`] if the stack is empty, or
    /// [`Chip8Error::StackOverflow`] if its depth is past capacity.
    pub fn pop(&mut self) -> Result<u16, Chip8Error> {
        let top = self.depth.checked_sub(1).ok_or(Chip8Error::StackUnderflow)?;
        let address = *self.entries.get(top).ok_or(Chip8Error::StackOverflow {
            depth: STACK_DEPTH,
        })?;
        self.depth = top;
        Ok(address)
    }

    /// The number of addresses currently on the stack.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Whether there is no return address to pop.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Checks that the depth fits the stack, as it always does unless the
    /// stack was restored from outside.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::InvalidState`] if the depth exceeds [`STACK_DEPTH`].
    pub fn validate(&self) -> Result<(), Chip8Error> {
        if self.depth > STACK_DEPTH {
            return Err(Chip8Error::InvalidState {
                reason: "stack depth exceeds 16",
            });
        }
        Ok(())
    }
}
