//! The `memory` module provides a struct and some associated functions to
//! represent the memory of a Chip8 system. The memory is represented as an
//! array of 8-bit unsigned integers ([`u8`]), with a size of 4096 bytes.
//!
//! Every address handed to [`Memory`] is masked to 12 bits first, so no
//! instruction can read or write outside the fixed memory bound.

use std::ops::{Index, IndexMut};

use crate::error::Chip8Error;

/// The total size of the Chip8 memory.
pub const MEMORY_SIZE: usize = 4096;

/// Mask applied to every address, keeping it within `0x000..=0xFFF`.
pub const ADDRESS_MASK: u16 = 0x0FFF;

/// The address where programs are loaded and execution starts. Everything
/// below it is reserved for the interpreter.
pub const PROGRAM_START: u16 = 0x200;

/// The address of the first built-in font glyph.
pub const FONT_ADDRESS: u16 = 0x000;

/// The number of bytes in a single font glyph.
pub const FONT_GLYPH_SIZE: u16 = 5;

/// Built-in Chip8 font data. This is stored in the interpreter's memory.
const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Returns the address of the font glyph for the low nibble of `digit`.
#[must_use]
pub const fn font_glyph_address(digit: u8) -> u16 {
    FONT_ADDRESS + FONT_GLYPH_SIZE * (digit & 0x0F) as u16
}

/// The [`Memory`] struct represents the memory of a Chip8 system. It contains
/// a fixed-size array of [`u8`] values that can be accessed using the [`Index`]
/// and [`IndexMut`] traits with a 16-bit address.
#[derive(Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Memory {
    #[cfg_attr(feature = "persistence", serde(with = "serde_big_array::BigArray"))]
    memory: [u8; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        let font_start = usize::from(FONT_ADDRESS);
        memory[font_start..font_start + FONT.len()].copy_from_slice(&FONT);
        Self { memory }
    }
}

impl Index<u16> for Memory {
    type Output = u8;

    fn index(&self, address: u16) -> &Self::Output {
        &self.memory[usize::from(address & ADDRESS_MASK)]
    }
}

impl IndexMut<u16> for Memory {
    fn index_mut(&mut self, address: u16) -> &mut Self::Output {
        &mut self.memory[usize::from(address & ADDRESS_MASK)]
    }
}

impl Memory {
    /// The number of bytes available to a ROM.
    pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

    /// Creates a new [`Memory`] object with the font loaded and everything
    /// else zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the ROM bytes from `data` starting at [`PROGRAM_START`]. If this
    /// is smaller than the program area, the remaining memory is filled with
    /// zeroes.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::RomTooLarge`] if `data` does not fit, in which
    /// case memory is left unchanged.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), Chip8Error> {
        if data.len() > Self::MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: data.len(),
                max_size: Self::MAX_ROM_SIZE,
            });
        }

        let program = &mut self.memory[usize::from(PROGRAM_START)..];
        program.fill(0);
        program[..data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Reads the big-endian 16-bit word at `address`. The second byte wraps
    /// back to `0x000` when `address` is the last byte of memory.
    #[must_use]
    pub fn read_word(&self, address: u16) -> u16 {
        u16::from_be_bytes([self[address], self[address.wrapping_add(1)]])
    }

    /// Returns a copy of `len` bytes starting at `address`, wrapping at the
    /// end of memory.
    #[must_use]
    pub fn read_bytes(&self, address: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|offset| self[address.wrapping_add(offset as u16)])
            .collect()
    }
}
