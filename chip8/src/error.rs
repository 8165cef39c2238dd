//! Errors raised by the Chip8 virtual machine.

/// The error type for all fallible [`super::Chip8`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Chip8Error {
    /// A `2NNN` call was executed with all 16 stack slots in use.
    #[error("stack overflow: subroutine calls nested deeper than {depth} levels")]
    StackOverflow {
        /// The maximum depth of the call stack.
        depth: usize,
    },

    /// A `00EE` return was executed with an empty call stack.
    #[error("stack underflow: returned from a subroutine with an empty call stack")]
    StackUnderflow,

    /// The opcode does not match any instruction in the base Chip8 set.
    #[error("invalid opcode {opcode:#06X}")]
    InvalidOpcode {
        /// The 16-bit instruction word that failed to decode.
        opcode: u16,
    },

    /// The ROM does not fit in the program area of memory.
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge {
        /// The size of the rejected ROM.
        size: usize,
        /// The number of bytes available from the program start address.
        max_size: usize,
    },

    /// A restored machine state holds a value the machine itself can never
    /// produce.
    #[error("invalid machine state: {reason}")]
    InvalidState {
        /// Which part of the state is out of range.
        reason: &'static str,
    },
}
