use crate::definitions::Word;
use std::error;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ImageError {
    Io(io::Error),
    UnknownFormat(PathBuf),
}

impl From<io::Error> for ImageError {
    fn from(e: io::Error) -> Self {
        ImageError::Io(e)
    }
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Could not access memory image: {}", e),
            Self::UnknownFormat(path) => write!(
                f,
                "Unknown memory image format '{}', expected a .16b or .8b file",
                path.display()
            ),
        }
    }
}

impl error::Error for ImageError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::UnknownFormat(_) => None,
        }
    }
}

pub type ImageResult<T = ()> = Result<T, ImageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    /// `.16b`: two bytes per word, big endian
    WordPacked,
    /// `.8b`: one byte per word, only the lower half of every word (e.g. for ASCII text)
    BytePacked,
}

impl DumpFormat {
    pub fn from_path(path: &Path) -> ImageResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("16b") => Ok(DumpFormat::WordPacked),
            Some("8b") => Ok(DumpFormat::BytePacked),
            _ => Err(ImageError::UnknownFormat(path.to_owned())),
        }
    }
}

/// Turns the raw bytes of an image into exactly `capacity` words.
///
/// Missing words are zero, bytes that don't fit into the memory are ignored.
pub fn decode(bytes: &[u8], format: DumpFormat, capacity: usize) -> Vec<Word> {
    let mut words = vec![0; capacity];

    match format {
        DumpFormat::WordPacked => {
            // an odd trailing byte becomes the high byte of the last word
            for (word, pair) in words.iter_mut().zip(bytes.chunks(2)) {
                let high = pair[0];
                let low = pair.get(1).copied().unwrap_or(0);
                *word = Word::from_be_bytes([high, low]);
            }
        }
        DumpFormat::BytePacked => {
            for (word, byte) in words.iter_mut().zip(bytes.iter()) {
                *word = *byte as Word;
            }
        }
    }

    words
}

pub fn load(mut reader: impl Read, format: DumpFormat, capacity: usize) -> ImageResult<Vec<Word>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(decode(&bytes, format, capacity))
}

/// Number of words that end up in an image: everything up to the last nonzero word, but
/// at least one.
pub fn saved_len(words: &[Word]) -> usize {
    words.iter().rposition(|w| *w != 0).map_or(1, |last| last + 1)
}

pub fn save(words: &[Word], format: DumpFormat) -> Vec<u8> {
    let len = saved_len(words);
    let word_at = |i: usize| words.get(i).copied().unwrap_or(0);

    match format {
        DumpFormat::WordPacked => (0..len).flat_map(|i| word_at(i).to_be_bytes()).collect(),
        DumpFormat::BytePacked => (0..len).map(|i| (word_at(i) & 0x00FF) as u8).collect(),
    }
}

pub fn load_file(path: &Path, capacity: usize) -> ImageResult<Vec<Word>> {
    let format = DumpFormat::from_path(path)?;
    let file = fs::File::open(path)?;
    load(io::BufReader::new(file), format, capacity)
}

pub fn save_file(path: &Path, words: &[Word]) -> ImageResult {
    let format = DumpFormat::from_path(path)?;
    fs::write(path, save(words, format))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_truncates_trailing_zeros() {
        let words = [0, 0, 5, 0, 0, 0, 0, 0];
        assert_eq!(
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x05],
            save(&words, DumpFormat::WordPacked)
        );
        assert_eq!(vec![0, 0, 5], save(&words, DumpFormat::BytePacked));
    }

    #[test]
    fn test_save_writes_at_least_one_word() {
        assert_eq!(vec![0, 0], save(&[0; 8], DumpFormat::WordPacked));
        assert_eq!(vec![0], save(&[0; 8], DumpFormat::BytePacked));
        assert_eq!(vec![0, 0], save(&[], DumpFormat::WordPacked));
    }

    #[test]
    fn test_word_packed_is_big_endian() {
        assert_eq!(vec![0x12, 0x34, 0xFF, 0xFF], save(&[0x1234, -1], DumpFormat::WordPacked));
        assert_eq!(
            vec![0x1234, -1, 0, 0],
            decode(&[0x12, 0x34, 0xFF, 0xFF], DumpFormat::WordPacked, 4)
        );
    }

    #[test]
    fn test_byte_packed_drops_high_bits() {
        let bytes = save(&[0x1234], DumpFormat::BytePacked);
        assert_eq!(vec![0x34], bytes);
        assert_eq!(vec![0x0034, 0], decode(&bytes, DumpFormat::BytePacked, 2));
    }

    #[test]
    fn test_byte_packed_does_not_sign_extend() {
        assert_eq!(vec![0x00FF], decode(&[0xFF], DumpFormat::BytePacked, 1));
    }

    #[test]
    fn test_odd_length_word_packed() {
        let words = decode(&[0x00, 0x01, 0x02, 0x03, 0xAB], DumpFormat::WordPacked, 8);
        assert_eq!(vec![0x0001, 0x0203, 0xAB00u16 as Word, 0, 0, 0, 0, 0], words);
    }

    #[test]
    fn test_oversized_image_is_cut_off() {
        let words = decode(&[1, 2, 3, 4, 5, 6], DumpFormat::WordPacked, 2);
        assert_eq!(vec![0x0102, 0x0304], words);
        let words = decode(&[1, 2, 3], DumpFormat::BytePacked, 2);
        assert_eq!(vec![1, 2], words);
    }

    #[test]
    fn test_round_trip_up_to_trailing_zeros() {
        let mut memory: Vec<Word> = vec![0; 64];
        memory[0] = -32768;
        memory[7] = 0x7FFF;
        memory[40] = 42;

        let bytes = save(&memory, DumpFormat::WordPacked);
        assert_eq!(41 * 2, bytes.len());
        let loaded = load(&bytes[..], DumpFormat::WordPacked, memory.len()).unwrap();
        assert_eq!(memory, loaded);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DumpFormat::WordPacked,
            DumpFormat::from_path(Path::new("ram.16b")).unwrap()
        );
        assert_eq!(
            DumpFormat::BytePacked,
            DumpFormat::from_path(Path::new("dir/text.8b")).unwrap()
        );
        assert!(matches!(
            DumpFormat::from_path(Path::new("ram.bin")),
            Err(ImageError::UnknownFormat(_))
        ));
        assert!(DumpFormat::from_path(Path::new("ram")).is_err());
    }

    #[test]
    fn test_load_reports_read_failures() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            }
        }

        assert!(matches!(
            load(Broken, DumpFormat::WordPacked, 4),
            Err(ImageError::Io(_))
        ));
    }

    #[test]
    fn test_files() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("hack-console-{}.16b", std::process::id()));

        save_file(&path, &[1, 2, 0, 0]).unwrap();
        assert_eq!(vec![0, 1, 0, 2], fs::read(&path).unwrap());
        assert_eq!(vec![1, 2, 0, 0, 0], load_file(&path, 5).unwrap());

        fs::remove_file(&path).unwrap();
        assert!(matches!(load_file(&path, 5), Err(ImageError::Io(_))));
    }
}
