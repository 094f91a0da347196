use crate::definitions::Word;
use crate::keyboard::KeyMap;
use crate::scheduler::render::RenderConfig;
use crate::scheduler::SchedulerConfig;

use lazy_static::lazy_static;
use regex::Regex;
use std::error;
use std::fmt;
use std::time::Duration;

lazy_static! {
    static ref REMAP: Regex = Regex::new(r"^\s*(\d+)\s*=\s*(\d+)\s*$").unwrap();
}

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_YIELD_INTERVAL: Duration = Duration::from_millis(1);
// the clock intervals of the screen
pub const DEFAULT_STATIC_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_ANIMATION_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MalformedRemap(String),
    KeyCodeTooLarge(String),
    ZeroBatchSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MalformedRemap(s) => {
                write!(f, "Expected a key remapping like '37=130', got '{}'", s)
            }
            Self::KeyCodeTooLarge(s) => write!(f, "Key code does not fit into a word: {}", s),
            Self::ZeroBatchSize => write!(f, "At least one step has to run between yields"),
        }
    }
}

impl error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// steps executed before the execution thread yields
    pub batch_size: usize,
    pub yield_interval: Duration,
    /// render interval while the machine is idle
    pub static_interval: Duration,
    /// render interval while the machine is running
    pub animation_interval: Duration,
    pub keymap: KeyMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            yield_interval: DEFAULT_YIELD_INTERVAL,
            static_interval: DEFAULT_STATIC_INTERVAL,
            animation_interval: DEFAULT_ANIMATION_INTERVAL,
            keymap: KeyMap::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    /// Adds remappings written as `RAW=CODE` on top of the current key map.
    pub fn apply_remaps<'a>(
        &mut self,
        remaps: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ConfigError> {
        for remap in remaps {
            let (raw, code) = parse_remap(remap)?;
            self.keymap.insert(raw, code);
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            batch_size: self.batch_size,
            yield_interval: self.yield_interval,
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            static_interval: self.static_interval,
            animation_interval: self.animation_interval,
        }
    }
}

pub fn parse_remap(s: &str) -> Result<(u16, Word), ConfigError> {
    let captures = REMAP
        .captures(s)
        .ok_or_else(|| ConfigError::MalformedRemap(s.to_owned()))?;

    let raw = captures[1]
        .parse::<u16>()
        .map_err(|_| ConfigError::KeyCodeTooLarge(captures[1].to_owned()))?;
    let code = captures[2]
        .parse::<Word>()
        .map_err(|_| ConfigError::KeyCodeTooLarge(captures[2].to_owned()))?;

    Ok((raw, code))
}
