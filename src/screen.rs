use crate::definitions::{Word, BITS_PER_WORD, SCREEN_WIDTH_IN_WORDS};
use std::error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenError {
    MalformedRegion { len: usize, words_per_row: usize },
    IllegalWordIndex(usize),
}

impl fmt::Display for ScreenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MalformedRegion { len, words_per_row } => write!(
                f,
                "Screen region of {} words cannot be split into rows of {} words",
                len, words_per_row
            ),
            Self::IllegalWordIndex(i) => write!(f, "Screen word index out of bounds: {}", i),
        }
    }
}

impl error::Error for ScreenError {}

pub type ScreenResult<T = ()> = Result<T, ScreenError>;

/// A monochrome image, one bool per pixel, `true` meaning the pixel is on (black).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    pub fn count_on(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, on: bool) {
        self.pixels[y * self.width + x] = on;
    }

    fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, false);
    }

    /// Writes `channels` bytes per pixel, on pixels are black and off pixels are white.
    /// A fourth channel is treated as fully opaque alpha.
    pub fn write_pixels(&self, buffer: &mut Vec<u8>, channels: usize) {
        buffer.clear();
        buffer.reserve(self.pixels.len() * channels);
        for on in self.pixels.iter() {
            let color = if *on { 0 } else { 255 };
            for channel in 0..channels {
                buffer.push(if channel == 3 { 255 } else { color });
            }
        }
    }

    pub fn to_rgba(&self) -> Vec<u8> {
        let mut data = Vec::new();
        self.write_pixels(&mut data, 4);
        data
    }
}

/// Translates between the words of the screen memory map and pixels.
///
/// Every word holds 16 horizontally adjacent pixels, the least significant bit being the
/// leftmost one. Rows are `words_per_row` words wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenCodec {
    words_per_row: usize,
}

impl Default for ScreenCodec {
    fn default() -> Self {
        Self::new(SCREEN_WIDTH_IN_WORDS)
    }
}

impl ScreenCodec {
    pub const fn new(words_per_row: usize) -> Self {
        Self { words_per_row }
    }

    pub fn words_per_row(&self) -> usize {
        self.words_per_row
    }

    pub fn width(&self) -> usize {
        self.words_per_row * BITS_PER_WORD
    }

    fn check_geometry(&self, len: usize) -> ScreenResult<usize> {
        if self.words_per_row == 0 || len % self.words_per_row != 0 {
            return Err(ScreenError::MalformedRegion {
                len,
                words_per_row: self.words_per_row,
            });
        }
        Ok(len / self.words_per_row)
    }

    pub fn decode(&self, words: &[Word]) -> ScreenResult<Bitmap> {
        let mut bitmap = Bitmap::new(0, 0);
        self.decode_into(words, &mut bitmap)?;
        Ok(bitmap)
    }

    /// Same as `decode`, but reuses the allocation of an existing bitmap.
    pub fn decode_into(&self, words: &[Word], bitmap: &mut Bitmap) -> ScreenResult {
        let height = self.check_geometry(words.len())?;
        bitmap.resize(self.width(), height);
        for (index, word) in words.iter().enumerate() {
            self.paint(bitmap, index, *word);
        }
        Ok(())
    }

    /// Updates only the 16 pixels that belong to the word at `index` (relative to the start
    /// of the screen region).
    pub fn decode_one(&self, bitmap: &mut Bitmap, index: usize, value: Word) -> ScreenResult {
        if self.words_per_row == 0 || bitmap.width() != self.width() {
            return Err(ScreenError::MalformedRegion {
                len: bitmap.width() / BITS_PER_WORD * bitmap.height(),
                words_per_row: self.words_per_row,
            });
        }
        if index / self.words_per_row >= bitmap.height() {
            return Err(ScreenError::IllegalWordIndex(index));
        }
        self.paint(bitmap, index, value);
        Ok(())
    }

    #[inline]
    fn paint(&self, bitmap: &mut Bitmap, index: usize, value: Word) {
        let y = index / self.words_per_row;
        let x = (index % self.words_per_row) * BITS_PER_WORD;
        let value = value as u16;
        for bit in 0..BITS_PER_WORD {
            bitmap.set(x + bit, y, (value >> bit) & 1 == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{SCREEN_HEIGHT, SCREEN_SIZE, SCREEN_WIDTH};

    #[test]
    fn test_lowest_bit_is_leftmost_pixel() {
        let codec = ScreenCodec::new(2);
        let mut words: Vec<Word> = vec![0; 2 * 16];
        words[0] = 0x0001;

        let bitmap = codec.decode(&words).unwrap();
        assert_eq!(32, bitmap.width());
        assert_eq!(16, bitmap.height());
        assert_eq!(Some(true), bitmap.get(0, 0));
        for x in 1..16 {
            assert_eq!(Some(false), bitmap.get(x, 0));
        }
        assert_eq!(1, bitmap.count_on());
    }

    #[test]
    fn test_word_position() {
        let codec = ScreenCodec::new(2);
        let mut words: Vec<Word> = vec![0; 4];
        // second row, second word, highest bit
        words[3] = i16::MIN;

        let bitmap = codec.decode(&words).unwrap();
        assert_eq!(Some(true), bitmap.get(31, 1));
        assert_eq!(1, bitmap.count_on());
    }

    #[test]
    fn test_full_hack_screen() {
        let codec = ScreenCodec::default();
        let words: Vec<Word> = vec![-1; SCREEN_SIZE];
        let bitmap = codec.decode(&words).unwrap();
        assert_eq!(SCREEN_WIDTH, bitmap.width());
        assert_eq!(SCREEN_HEIGHT, bitmap.height());
        assert_eq!(SCREEN_WIDTH * SCREEN_HEIGHT, bitmap.count_on());
    }

    #[test]
    fn test_malformed_region() {
        let codec = ScreenCodec::new(2);
        assert_eq!(
            Err(ScreenError::MalformedRegion {
                len: 5,
                words_per_row: 2
            }),
            codec.decode(&[0; 5])
        );
        assert!(ScreenCodec::new(0).decode(&[0; 4]).is_err());
    }

    #[test]
    fn test_incremental_decode_matches_full_decode() {
        let codec = ScreenCodec::new(2);
        let mut words: Vec<Word> = vec![0x00F0, 0x0F00, 0x7001, -1, 0x5555, 0];
        let mut bitmap = codec.decode(&words).unwrap();

        for (index, value) in [(0, 0x0101), (3, 0), (5, i16::MIN), (4, -21846)] {
            words[index] = value;
            codec.decode_one(&mut bitmap, index, value).unwrap();
            assert_eq!(codec.decode(&words).unwrap(), bitmap);
        }
    }

    #[test]
    fn test_incremental_decode_out_of_bounds() {
        let codec = ScreenCodec::new(2);
        let mut bitmap = codec.decode(&[0; 4]).unwrap();
        assert_eq!(
            Err(ScreenError::IllegalWordIndex(4)),
            codec.decode_one(&mut bitmap, 4, 1)
        );
    }

    #[test]
    fn test_rgba_colors() {
        let bitmap = ScreenCodec::new(1).decode(&[0x0001]).unwrap();
        let data = bitmap.to_rgba();
        assert_eq!(16 * 4, data.len());
        assert_eq!(&[0, 0, 0, 255], &data[0..4]);
        assert_eq!(&[255, 255, 255, 255], &data[4..8]);
    }
}
