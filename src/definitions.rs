// see Definitions.java in the official implementation
pub const MEM_SIZE: usize = 24577;
pub const SCREEN_START: usize = 16384;
pub const SCREEN_END: usize = 24575;
pub const KBD: usize = 24576;

pub const SCREEN_WIDTH: usize = 512;
pub const SCREEN_HEIGHT: usize = 256;
pub const BITS_PER_WORD: usize = 16;
pub const SCREEN_WIDTH_IN_WORDS: usize = SCREEN_WIDTH / BITS_PER_WORD;
pub const SCREEN_SIZE: usize = SCREEN_END - SCREEN_START + 1;

// an address in the simulated RAM
pub type Address = usize;
// a register/memory-cell value in the hack architecture
pub type Word = i16;

pub const NEWLINE_KEY: Word = 128;
pub const BACKSPACE_KEY: Word = 129;
pub const LEFT_KEY: Word = 130;
pub const UP_KEY: Word = 131;
pub const RIGHT_KEY: Word = 132;
pub const DOWN_KEY: Word = 133;
