use chip8::{graphics, memory, Chip8, Chip8Error};

const GLYPH_ZERO: [u8; 5] = [0xF0, 0x90, 0x90, 0x90, 0xF0];

fn lit_pixels(chip8: &Chip8) -> Vec<(usize, usize)> {
    chip8
        .bus
        .graphics
        .pixels()
        .filter(|&(_, _, on)| on)
        .map(|(x, y, _)| (x, y))
        .collect()
}

/// Sets I, V0 and V1, draws a sprite and loops back to the draw forever.
fn draw_loop_rom() -> Vec<u8> {
    let mut rom = vec![0xA2, 0x1C, 0x60, 0x0A, 0x61, 0x00, 0xD0, 0x15, 0x12, 0x04];
    rom.resize(0x1C, 0);
    rom.extend_from_slice(&GLYPH_ZERO);
    rom
}

#[test]
fn draw_loop_draws_then_erases() {
    let mut chip8 = Chip8::new();
    chip8.load_rom(&draw_loop_rom()).unwrap();

    chip8.step().unwrap();
    assert_eq!(chip8.processor.i, 0x21C);

    for _ in 0..3 {
        chip8.step().unwrap();
    }
    assert_eq!(chip8.processor.v[0xF], 0);
    assert_eq!(chip8.processor.pc, 0x208);

    // the glyph's outline, drawn at (V0, V1) = (10, 0)
    let drawn = lit_pixels(&chip8);
    assert_eq!(drawn.len(), 14);
    assert!(drawn.contains(&(10, 0)));
    assert!(drawn.contains(&(13, 0)));
    assert!(drawn.contains(&(10, 2)));
    assert!(!drawn.contains(&(11, 2)));
    assert!(drawn.contains(&(13, 4)));

    // jump back, reset V1 and draw the same sprite again
    chip8.step().unwrap();
    assert_eq!(chip8.processor.pc, 0x204);
    chip8.step().unwrap();
    chip8.step().unwrap();
    assert_eq!(chip8.processor.v[0xF], 1);
    assert!(lit_pixels(&chip8).is_empty());
}

#[test]
fn subroutine_writes_score_digits() {
    let rom = [
        0x6A, 0xCD, // VA := 205
        0xA3, 0x00, // I := 0x300
        0x22, 0x0A, // call 0x20A
        0x6B, 0x01, // VB := 1
        0x12, 0x08, // loop
        0xFA, 0x33, // BCD of VA at I
        0xF2, 0x65, // V0..V2 := memory[I..=I+2]
        0x00, 0xEE, // return
    ];
    let mut chip8 = Chip8::new();
    chip8.load_rom(&rom).unwrap();
    for _ in 0..7 {
        chip8.step().unwrap();
    }

    assert_eq!(chip8.bus.memory.read_bytes(0x300, 3), vec![2, 0, 5]);
    assert_eq!(chip8.processor.v[..3], [2, 0, 5]);
    assert_eq!(chip8.processor.v[0xB], 1);
    assert!(chip8.processor.stack.is_empty());
}

#[test]
fn font_digit_is_drawn_at_wrapped_position() {
    let rom = [
        0x60, 0x00, // V0 := 0
        0xF0, 0x29, // I := glyph for V0
        0x61, 0x3E, // V1 := 62
        0x62, 0x1E, // V2 := 30
        0xD1, 0x25, // draw 5 rows at (62, 30)
    ];
    let mut chip8 = Chip8::new();
    chip8.load_rom(&rom).unwrap();
    for _ in 0..5 {
        chip8.step().unwrap();
    }

    assert_eq!(chip8.processor.i, memory::font_glyph_address(0));
    let graphics = &chip8.bus.graphics;
    assert!(graphics.pixel_at(62, 30));
    assert!(graphics.pixel_at(1, 30));
    assert!(graphics.pixel_at(62, 2));
    assert!(graphics.pixel_at(1, 2));
    assert!(!graphics.pixel_at(63, 31));
    assert!(!graphics.pixel_at(graphics::WIDTH - 1, 1));
}

#[test]
fn wait_for_key_blocks_until_pressed() {
    let rom = [
        0xF5, 0x0A, // V5 := next key
        0x66, 0x01, // V6 := 1
    ];
    let mut chip8 = Chip8::new();
    chip8.load_rom(&rom).unwrap();
    chip8.update_key_state(0x4, true);

    chip8.step().unwrap();
    assert!(chip8.is_waiting_for_key());
    for _ in 0..100 {
        chip8.step().unwrap();
    }
    assert_eq!(chip8.processor.v[6], 0);

    chip8.update_key_state(0x4, false);
    chip8.update_key_state(0x9, true);
    assert!(!chip8.is_waiting_for_key());
    chip8.step().unwrap();
    assert_eq!(chip8.processor.v[5], 0x9);
    assert_eq!(chip8.processor.v[6], 1);
}

#[test]
fn delay_timer_counts_down_with_ticks() {
    let rom = [
        0x60, 0x05, // V0 := 5
        0xF0, 0x15, // delay := V0
        0xF1, 0x07, // V1 := delay
    ];
    let mut chip8 = Chip8::new();
    chip8.load_rom(&rom).unwrap();
    chip8.step().unwrap();
    chip8.step().unwrap();
    for _ in 0..3 {
        chip8.tick_timers();
    }
    chip8.step().unwrap();
    assert_eq!(chip8.processor.v[1], 2);
}

#[test]
fn runaway_recursion_overflows_stack() {
    let mut chip8 = Chip8::new();
    chip8.load_rom(&[0x22, 0x00]).unwrap();
    let result = (0..17).try_for_each(|_| chip8.step());
    assert_eq!(result, Err(Chip8Error::StackOverflow { depth: 16 }));
}

#[test]
fn oversized_rom_is_rejected() {
    let mut chip8 = Chip8::new();
    let rom = vec![0; memory::Memory::MAX_ROM_SIZE + 10];
    assert!(matches!(
        chip8.load_rom(&rom),
        Err(Chip8Error::RomTooLarge { .. })
    ));
}
