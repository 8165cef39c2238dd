//! This module contains the implementation of the Chip8 central processing
//! unit (CPU). The CPU executes the instructions stored in the memory of the
//! Chip8 computer.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    error::Chip8Error,
    graphics,
    memory::{self, ADDRESS_MASK, PROGRAM_START},
    stack::Stack,
};

use super::Bus;

/// The index of the flag register, `VF`.
const FLAG: usize = 0xF;

/// Describes how the program counter should be updated after
/// executing an instruction. The program counter already points at the
/// following instruction when an opcode executes.
#[derive(Debug, PartialEq, Eq)]
enum ProgramCounterUpdate {
    /// Go directly to the next instruction.
    Next,

    /// Skip the next instruction (pc + 2).
    SkipNext,

    /// Jump to the given address.
    Jump(u16),
}

/// Behavioural variations between Chip8 interpreters. The defaults follow
/// the most common modern behaviour.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Quirks {
    /// `8XY6` and `8XYE` copy `VY` into `VX` before shifting, as the
    /// original COSMAC VIP interpreter did. When disabled `VX` is shifted in
    /// place.
    pub shift_uses_vy: bool,

    /// `FX55` and `FX65` leave `I` pointing past the last register copied.
    /// When disabled `I` is left unchanged.
    pub load_store_increments_i: bool,
}

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

/// This struct represents the central processing unit of a computer.
#[derive(Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Cpu {
    /// An array of 16 unsigned 8-bit integers representing the Vx registers.
    pub v: [u8; 16],

    /// The index register. Only the low 12 bits are significant.
    pub i: u16,

    /// The program counter.
    pub pc: u16,

    /// Return addresses for `2NNN` calls.
    pub stack: Stack,

    /// Interpreter variations this CPU emulates.
    pub quirks: Quirks,

    /// Source of random bytes for `CXNN`.
    #[cfg_attr(feature = "persistence", serde(skip, default = "entropy_rng"))]
    rng: StdRng,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Create a new [`Cpu`] instance with zeroed registers, an empty stack and
    /// the program counter at [`PROGRAM_START`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(entropy_rng())
    }

    /// Checks the registers a restored [`Cpu`] carries: `PC` and `I` within
    /// 12 bits and a stack no deeper than it can be.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::InvalidState`] naming the first value out of range.
    pub fn validate(&self) -> Result<(), Chip8Error> {
        if self.pc > ADDRESS_MASK {
            return Err(Chip8Error::InvalidState {
                reason: "program counter past 0xFFF",
            });
        }
        if self.i > ADDRESS_MASK {
            return Err(Chip8Error::InvalidState {
                reason: "index register past 0xFFF",
            });
        }
        self.stack.validate()
    }

    /// Create a new [`Cpu`] whose `CXNN` results are determined by `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            stack: Stack::new(),
            quirks: Quirks::default(),
            rng,
        }
    }

    /// Execute one processor cycle. This will fetch, decode, and execute the next
    /// opcode from memory. Note that if the processor is currently waiting on
    /// input from the user, no instructions will be executed.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::StackOverflow`] or [`Chip8Error::StackUnderflow`]
    /// on unbalanced calls and returns. Invalid opcodes are logged and
    /// skipped instead.
    pub fn cycle(&mut self, bus: &mut Bus) -> Result<(), Chip8Error> {
        if bus.input.waiting() {
            return Ok(());
        } else if let Some(request) = bus.input.request_response() {
            if let Some(register) = self.v.get_mut(request.register) {
                *register = request.key_code;
            }
        }

        let opcode = bus.memory.read_word(self.pc);
        log::trace!("{:#05X}: {opcode:04X}", self.pc);
        self.pc = self.pc.wrapping_add(2) & ADDRESS_MASK;

        match self.process_opcode(opcode, bus)? {
            ProgramCounterUpdate::Next => {}
            ProgramCounterUpdate::SkipNext => self.pc = self.pc.wrapping_add(2) & ADDRESS_MASK,
            ProgramCounterUpdate::Jump(addr) => self.pc = addr & ADDRESS_MASK,
        }
        Ok(())
    }

    /// Process a single opcode. This will apply any state changing effects of the
    /// instructions onto the given [`Bus`].
    fn process_opcode(
        &mut self,
        opcode: u16,
        bus: &mut Bus,
    ) -> Result<ProgramCounterUpdate, Chip8Error> {
        // define some commonly used variables
        let x = usize::from((opcode & 0x0F00) >> 8);
        let y = usize::from((opcode & 0x00F0) >> 4);
        let n = usize::from(opcode & 0x000F);
        let nn = opcode.to_be_bytes()[1];
        let nnn = opcode & 0x0FFF;

        let update = match (opcode & 0xF000) >> 12 {
            0x0 => match opcode {
                0x00E0 => Self::op_00e0(bus),
                0x00EE => self.op_00ee()?,
                _ => Self::invalid(opcode),
            },
            0x1 => Self::op_1nnn(nnn),
            0x2 => self.op_2nnn(nnn)?,
            0x3 => self.op_3xnn(x, nn),
            0x4 => self.op_4xnn(x, nn),
            0x5 if n == 0 => self.op_5xy0(x, y),
            0x6 => self.op_6xnn(x, nn),
            0x7 => self.op_7xnn(x, nn),
            0x8 => match n {
                0x0 => self.op_8xy0(x, y),
                0x1 => self.op_8xy1(x, y),
                0x2 => self.op_8xy2(x, y),
                0x3 => self.op_8xy3(x, y),
                0x4 => self.op_8xy4(x, y),
                0x5 => self.op_8xy5(x, y),
                0x6 => self.op_8xy6(x, y),
                0x7 => self.op_8xy7(x, y),
                0xE => self.op_8xye(x, y),
                _ => Self::invalid(opcode),
            },
            0x9 if n == 0 => self.op_9xy0(x, y),
            0xA => self.op_annn(nnn),
            0xB => self.op_bnnn(nnn),
            0xC => self.op_cxnn(x, nn),
            0xD => self.op_dxyn(bus, x, y, n),
            0xE => match nn {
                0x9E => self.op_ex9e(bus, x),
                0xA1 => self.op_exa1(bus, x),
                _ => Self::invalid(opcode),
            },
            0xF => match nn {
                0x07 => self.op_fx07(bus, x),
                0x0A => Self::op_fx0a(bus, x),
                0x15 => self.op_fx15(bus, x),
                0x18 => self.op_fx18(bus, x),
                0x1E => self.op_fx1e(x),
                0x29 => self.op_fx29(x),
                0x33 => self.op_fx33(bus, x),
                0x55 => self.op_fx55(bus, x),
                0x65 => self.op_fx65(bus, x),
                _ => Self::invalid(opcode),
            },
            _ => Self::invalid(opcode),
        };
        Ok(update)
    }

    fn invalid(opcode: u16) -> ProgramCounterUpdate {
        log::warn!("Skipping {}", Chip8Error::InvalidOpcode { opcode });
        ProgramCounterUpdate::Next
    }

    fn op_00e0(bus: &mut Bus) -> ProgramCounterUpdate {
        bus.graphics.clear();
        ProgramCounterUpdate::Next
    }

    fn op_00ee(&mut self) -> Result<ProgramCounterUpdate, Chip8Error> {
        let addr = self.stack.pop()?;
        Ok(ProgramCounterUpdate::Jump(addr))
    }

    fn op_1nnn(nnn: u16) -> ProgramCounterUpdate {
        ProgramCounterUpdate::Jump(nnn)
    }

    fn op_2nnn(&mut self, nnn: u16) -> Result<ProgramCounterUpdate, Chip8Error> {
        self.stack.push(self.pc)?;
        Ok(ProgramCounterUpdate::Jump(nnn))
    }

    fn op_3xnn(&mut self, x: usize, nn: u8) -> ProgramCounterUpdate {
        Self::skip_if(self.v[x] == nn)
    }

    fn op_4xnn(&mut self, x: usize, nn: u8) -> ProgramCounterUpdate {
        Self::skip_if(self.v[x] != nn)
    }

    fn op_5xy0(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        Self::skip_if(self.v[x] == self.v[y])
    }

    fn op_6xnn(&mut self, x: usize, nn: u8) -> ProgramCounterUpdate {
        self.v[x] = nn;
        ProgramCounterUpdate::Next
    }

    fn op_7xnn(&mut self, x: usize, nn: u8) -> ProgramCounterUpdate {
        self.v[x] = self.v[x].wrapping_add(nn);
        ProgramCounterUpdate::Next
    }

    fn op_8xy0(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        self.v[x] = self.v[y];
        ProgramCounterUpdate::Next
    }

    fn op_8xy1(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        self.v[x] |= self.v[y];
        ProgramCounterUpdate::Next
    }

    fn op_8xy2(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        self.v[x] &= self.v[y];
        ProgramCounterUpdate::Next
    }

    fn op_8xy3(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        self.v[x] ^= self.v[y];
        ProgramCounterUpdate::Next
    }

    // The flag is always written last so that `X == F` ends up holding it.

    fn op_8xy4(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        let (result, overflow) = self.v[x].overflowing_add(self.v[y]);
        self.v[x] = result;
        self.v[FLAG] = u8::from(overflow);
        ProgramCounterUpdate::Next
    }

    fn op_8xy5(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        let (result, borrow) = self.v[x].overflowing_sub(self.v[y]);
        self.v[x] = result;
        self.v[FLAG] = u8::from(!borrow);
        ProgramCounterUpdate::Next
    }

    fn op_8xy6(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        if self.quirks.shift_uses_vy {
            self.v[x] = self.v[y];
        }
        let shifted_out = self.v[x] & 0x01;
        self.v[x] >>= 1;
        self.v[FLAG] = shifted_out;
        ProgramCounterUpdate::Next
    }

    fn op_8xy7(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        let (result, borrow) = self.v[y].overflowing_sub(self.v[x]);
        self.v[x] = result;
        self.v[FLAG] = u8::from(!borrow);
        ProgramCounterUpdate::Next
    }

    fn op_8xye(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        if self.quirks.shift_uses_vy {
            self.v[x] = self.v[y];
        }
        let shifted_out = (self.v[x] & 0x80) >> 7;
        self.v[x] <<= 1;
        self.v[FLAG] = shifted_out;
        ProgramCounterUpdate::Next
    }

    fn op_9xy0(&mut self, x: usize, y: usize) -> ProgramCounterUpdate {
        Self::skip_if(self.v[x] != self.v[y])
    }

    fn op_annn(&mut self, nnn: u16) -> ProgramCounterUpdate {
        self.i = nnn;
        ProgramCounterUpdate::Next
    }

    fn op_bnnn(&mut self, nnn: u16) -> ProgramCounterUpdate {
        ProgramCounterUpdate::Jump(nnn + u16::from(self.v[0]))
    }

    fn op_cxnn(&mut self, x: usize, nn: u8) -> ProgramCounterUpdate {
        self.v[x] = self.rng.gen::<u8>() & nn;
        ProgramCounterUpdate::Next
    }

    fn op_dxyn(&mut self, bus: &mut Bus, x: usize, y: usize, n: usize) -> ProgramCounterUpdate {
        let x = usize::from(self.v[x]) % graphics::WIDTH;
        let y = usize::from(self.v[y]) % graphics::HEIGHT;
        let sprite = bus.memory.read_bytes(self.i, n);
        let collision = bus.graphics.draw_sprite(x, y, &sprite);
        self.v[FLAG] = u8::from(collision);
        ProgramCounterUpdate::Next
    }

    fn op_ex9e(&mut self, bus: &mut Bus, x: usize) -> ProgramCounterUpdate {
        match bus.input.is_key_pressed(self.v[x]) {
            Some(pressed) => Self::skip_if(pressed),
            None => Self::bad_key(self.v[x]),
        }
    }

    fn op_exa1(&mut self, bus: &mut Bus, x: usize) -> ProgramCounterUpdate {
        match bus.input.is_key_pressed(self.v[x]) {
            Some(pressed) => Self::skip_if(!pressed),
            None => Self::bad_key(self.v[x]),
        }
    }

    fn bad_key(key_code: u8) -> ProgramCounterUpdate {
        log::warn!("Key code {key_code:#X} is not on the keypad, not skipping");
        ProgramCounterUpdate::Next
    }

    fn op_fx07(&mut self, bus: &mut Bus, x: usize) -> ProgramCounterUpdate {
        self.v[x] = bus.clock.delay_timer;
        ProgramCounterUpdate::Next
    }

    fn op_fx0a(bus: &mut Bus, x: usize) -> ProgramCounterUpdate {
        bus.input.request_key_press(x);
        ProgramCounterUpdate::Next
    }

    fn op_fx15(&mut self, bus: &mut Bus, x: usize) -> ProgramCounterUpdate {
        bus.clock.delay_timer = self.v[x];
        ProgramCounterUpdate::Next
    }

    fn op_fx18(&mut self, bus: &mut Bus, x: usize) -> ProgramCounterUpdate {
        bus.clock.sound_timer = self.v[x];
        ProgramCounterUpdate::Next
    }

    fn op_fx1e(&mut self, x: usize) -> ProgramCounterUpdate {
        self.i = self.i.wrapping_add(u16::from(self.v[x])) & ADDRESS_MASK;
        ProgramCounterUpdate::Next
    }

    fn op_fx29(&mut self, x: usize) -> ProgramCounterUpdate {
        self.i = memory::font_glyph_address(self.v[x]);
        ProgramCounterUpdate::Next
    }

    fn op_fx33(&mut self, bus: &mut Bus, x: usize) -> ProgramCounterUpdate {
        let value = self.v[x];
        bus.memory[self.i] = value / 100;
        bus.memory[self.i.wrapping_add(1)] = (value / 10) % 10;
        bus.memory[self.i.wrapping_add(2)] = value % 10;
        ProgramCounterUpdate::Next
    }

    fn op_fx55(&mut self, bus: &mut Bus, x: usize) -> ProgramCounterUpdate {
        for (offset, &value) in (0u16..).zip(&self.v[..=x]) {
            bus.memory[self.i.wrapping_add(offset)] = value;
        }
        self.advance_i_after_load_store(x);
        ProgramCounterUpdate::Next
    }

    fn op_fx65(&mut self, bus: &mut Bus, x: usize) -> ProgramCounterUpdate {
        for (offset, register) in (0u16..).zip(&mut self.v[..=x]) {
            *register = bus.memory[self.i.wrapping_add(offset)];
        }
        self.advance_i_after_load_store(x);
        ProgramCounterUpdate::Next
    }

    fn advance_i_after_load_store(&mut self, x: usize) {
        if self.quirks.load_store_increments_i {
            // x is a nibble, so x + 1 always fits
            self.i = self.i.wrapping_add(x as u16 + 1) & ADDRESS_MASK;
        }
    }

    fn skip_if(condition: bool) -> ProgramCounterUpdate {
        if condition {
            ProgramCounterUpdate::SkipNext
        } else {
            ProgramCounterUpdate::Next
        }
    }
}
