use crate::definitions::{Address, Word, KBD, MEM_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};
use wasm_bindgen::prelude::*;

pub mod config;
pub mod definitions;
pub mod image;
pub mod keyboard;
pub mod memory;
pub mod programs;
pub mod scheduler;
pub mod screen;

use image::DumpFormat;
use keyboard::KeyMap;
use memory::{Region, WordMemory};
use programs::Fill;
use scheduler::Step;
use screen::{Bitmap, ScreenCodec};

use std::fmt;
use wasm_bindgen::Clamped;
use web_sys::ImageData;

fn js_error(e: impl fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn dump_format(word_packed: bool) -> DumpFormat {
    if word_packed {
        DumpFormat::WordPacked
    } else {
        DumpFormat::BytePacked
    }
}

/// Raw key code for a key name as reported by the browser (`KeyboardEvent.key`).
#[wasm_bindgen]
pub fn get_key_code(key: &str) -> Option<u16> {
    keyboard::raw_key_code(key)
}

/// The browser frontend. Javascript drives the steps from its animation frames, so there is
/// no execution thread here.
#[wasm_bindgen]
pub struct App {
    memory: WordMemory,
    program: Fill,
    keymap: KeyMap,
    codec: ScreenCodec,
    bitmap: Bitmap,
    // set whenever the screen may have changed behind our back
    dirty: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl App {
    pub fn new() -> Self {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let codec = ScreenCodec::default();
        Self {
            memory: WordMemory::new(MEM_SIZE),
            program: Fill::new(),
            keymap: KeyMap::default(),
            bitmap: Bitmap::new(codec.width(), SCREEN_HEIGHT),
            codec,
            dirty: true,
        }
    }

    pub fn step_times(&mut self, times: u32) -> Result<(), JsValue> {
        self.dirty = true;
        for _ in 0..times {
            self.program.step(&mut self.memory).map_err(js_error)?;
        }
        Ok(())
    }

    pub fn step(&mut self) -> Result<(), JsValue> {
        self.step_times(1)
    }

    pub fn set_input_key(&mut self, raw: u16) -> Result<(), JsValue> {
        let code = self.keymap.translate(raw);
        self.memory.write(KBD, code).map_err(js_error)
    }

    pub fn release_key(&mut self) -> Result<(), JsValue> {
        self.memory.write(KBD, 0).map_err(js_error)
    }

    pub fn peek(&self, address: Address) -> Result<Word, JsValue> {
        self.memory.read(address).map_err(js_error)
    }

    /// Writes a single word, only redrawing the affected pixels if it lies on the screen.
    pub fn poke(&mut self, address: Address, value: Word) -> Result<(), JsValue> {
        self.memory.write(address, value).map_err(js_error)?;
        if Region::SCREEN.contains(address) {
            self.codec
                .decode_one(&mut self.bitmap, address - Region::SCREEN.start, value)
                .map_err(js_error)?;
        }
        Ok(())
    }

    pub fn load_ram(&mut self, bytes: &[u8], word_packed: bool) -> Result<(), JsValue> {
        let words = image::decode(bytes, dump_format(word_packed), self.memory.capacity());
        self.memory.bulk_replace(words).map_err(js_error)?;
        self.dirty = true;
        Ok(())
    }

    pub fn save_ram(&self, word_packed: bool) -> Vec<u8> {
        image::save(self.memory.words(), dump_format(word_packed))
    }

    pub fn data_buffer_size() -> usize {
        const BYTES_PER_PIXEL: usize = 4; // rgba
        BYTES_PER_PIXEL * SCREEN_WIDTH * SCREEN_HEIGHT
    }

    pub fn display_data(&mut self) -> Result<ImageData, JsValue> {
        if self.dirty {
            let screen = self.memory.slice(Region::SCREEN).map_err(js_error)?;
            self.codec
                .decode_into(screen, &mut self.bitmap)
                .map_err(js_error)?;
            self.dirty = false;
        }

        let data = self.bitmap.to_rgba();
        ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(data.as_slice()),
            self.bitmap.width() as u32,
            self.bitmap.height() as u32,
        )
    }
}
