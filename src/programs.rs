use crate::definitions::{Address, KBD, SCREEN_SIZE, SCREEN_START};
use crate::memory::WordMemory;
use crate::scheduler::{Step, StepResult};

/// Blackens the screen one word per step while any key is held down and clears it again
/// once all keys are released, like the Fill program of the course.
#[derive(Debug, Default, Clone)]
pub struct Fill {
    cursor: Address,
}

impl Fill {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Step for Fill {
    fn step(&mut self, memory: &mut WordMemory) -> StepResult {
        let color = if memory.read(KBD)? == 0 { 0 } else { -1 };
        memory.write(SCREEN_START + self.cursor, color)?;
        self.cursor = (self.cursor + 1) % SCREEN_SIZE;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Region;

    #[test]
    fn test_fill_follows_keyboard() {
        let mut memory = WordMemory::default();
        let mut fill = Fill::new();

        memory.write(KBD, 65).unwrap();
        for _ in 0..SCREEN_SIZE {
            fill.step(&mut memory).unwrap();
        }
        let screen = memory.slice(Region::SCREEN).unwrap();
        assert!(screen.iter().all(|w| *w == -1));

        memory.write(KBD, 0).unwrap();
        for _ in 0..10 {
            fill.step(&mut memory).unwrap();
        }
        let screen = memory.slice(Region::SCREEN).unwrap();
        assert!(screen[..10].iter().all(|w| *w == 0));
        assert!(screen[10..].iter().all(|w| *w == -1));
    }

    #[test]
    fn test_fill_needs_the_memory_map() {
        let mut memory = WordMemory::new(16);
        assert!(Fill::new().step(&mut memory).is_err());
    }
}
