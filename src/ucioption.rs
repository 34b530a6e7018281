// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::OptionError;

use log::debug;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    Check { default: bool, value: bool },
    Spin { default: i64, min: i64, max: i64, value: i64 },
    Button,
}

#[derive(Debug, Clone)]
pub struct UciOption {
    name: &'static str,
    kind: OptionKind,
}

impl UciOption {
    fn check(name: &'static str, default: bool) -> UciOption {
        UciOption {
            name,
            kind: OptionKind::Check {
                default,
                value: default,
            },
        }
    }

    fn spin(name: &'static str, default: i64, min: i64, max: i64) -> UciOption {
        UciOption {
            name,
            kind: OptionKind::Spin {
                default,
                min,
                max,
                value: default,
            },
        }
    }

    fn button(name: &'static str) -> UciOption {
        UciOption {
            name,
            kind: OptionKind::Button,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }
}

impl fmt::Display for UciOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "option name {} type ", self.name)?;
        match &self.kind {
            OptionKind::Check { default, .. } => write!(f, "check default {}", default),
            OptionKind::Spin {
                default, min, max, ..
            } => write!(f, "spin default {} min {} max {}", default, min, max),
            OptionKind::Button => write!(f, "button"),
        }
    }
}

// Names of the evaluation weights, in percent of the built-in value.
pub const EVAL_WEIGHTS: [&str; 9] = [
    "Mobility (Middle Game)",
    "Mobility (Endgame)",
    "Pawn Structure (Middle Game)",
    "Pawn Structure (Endgame)",
    "Passed Pawns (Middle Game)",
    "Passed Pawns (Endgame)",
    "Space",
    "Aggressiveness",
    "Cowardice",
];

// OptionsMap holds the engine options in declaration order. Names are
// matched case-insensitively, as the UCI protocol requires.
#[derive(Debug, Clone)]
pub struct OptionsMap {
    options: Vec<UciOption>,
}

impl OptionsMap {
    pub fn new() -> OptionsMap {
        let mut options = vec![
            UciOption::spin("Hash", 16, 1, 65536),
            UciOption::button("Clear Hash"),
            UciOption::check("Ponder", false),
            UciOption::check("OwnBook", false),
            UciOption::spin("Book Max Ply", 16, 0, 200),
            UciOption::spin("Contempt", 0, -100, 100),
            UciOption::spin("Minimum Thinking Time", 20, 0, 5000),
            UciOption::spin("Move Overhead", 30, 0, 5000),
            UciOption::spin("Slow Mover", 89, 10, 1000),
        ];
        options.extend(EVAL_WEIGHTS.iter().map(|&name| UciOption::spin(name, 100, 0, 200)));

        OptionsMap { options }
    }

    fn find(&self, name: &str) -> Option<&UciOption> {
        self.options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UciOption> {
        self.options.iter()
    }

    // set() validates and stores a new value. Buttons accept anything. The
    // caller applies side effects such as resizing the hash table.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        let opt = self
            .options
            .iter_mut()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| OptionError::Unknown(name.to_string()))?;

        let invalid = || OptionError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };

        match &mut opt.kind {
            OptionKind::Check { value: v, .. } => {
                *v = match value.to_ascii_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => return Err(invalid()),
                };
            }
            OptionKind::Spin {
                min, max, value: v, ..
            } => {
                let n: i64 = value.trim().parse().map_err(|_| invalid())?;
                if n < *min || n > *max {
                    return Err(OptionError::OutOfRange {
                        name: opt.name.to_string(),
                        value: n,
                        min: *min,
                        max: *max,
                    });
                }
                *v = n;
            }
            OptionKind::Button => {}
        }

        debug!("option {} set to '{}'", opt.name, value);
        Ok(())
    }

    // Typed getters. Unknown names and mismatched kinds read as the zero
    // value of the requested type.
    pub fn check(&self, name: &str) -> bool {
        matches!(
            self.find(name).map(|o| &o.kind),
            Some(OptionKind::Check { value: true, .. })
        )
    }

    pub fn spin(&self, name: &str) -> i64 {
        match self.find(name).map(|o| &o.kind) {
            Some(OptionKind::Spin { value, .. }) => *value,
            _ => 0,
        }
    }
}

impl Default for OptionsMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OptionsMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for opt in &self.options {
            writeln!(f, "{}", opt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let o = OptionsMap::new();
        assert_eq!(o.spin("Hash"), 16);
        assert!(!o.check("Ponder"));
        assert_eq!(o.spin("Contempt"), 0);
        assert_eq!(o.spin("Minimum Thinking Time"), 20);
        for name in EVAL_WEIGHTS {
            assert_eq!(o.spin(name), 100);
        }
    }

    #[test]
    fn test_case_insensitive_set() {
        let mut o = OptionsMap::new();
        o.set("hash", "128").unwrap();
        assert_eq!(o.spin("Hash"), 128);
        o.set("PONDER", "true").unwrap();
        assert!(o.check("ponder"));
        o.set("clear hash", "").unwrap();
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut o = OptionsMap::new();
        assert_eq!(
            o.set("Hash", "0"),
            Err(OptionError::OutOfRange {
                name: "Hash".to_string(),
                value: 0,
                min: 1,
                max: 65536
            })
        );
        assert_eq!(
            o.set("Space", "201"),
            Err(OptionError::OutOfRange {
                name: "Space".to_string(),
                value: 201,
                min: 0,
                max: 200
            })
        );
        assert!(matches!(
            o.set("Ponder", "maybe"),
            Err(OptionError::InvalidValue { .. })
        ));
        assert!(matches!(o.set("Hash", "lots"), Err(OptionError::InvalidValue { .. })));
        assert_eq!(
            o.set("Threads", "4"),
            Err(OptionError::Unknown("Threads".to_string()))
        );
        assert_eq!(o.spin("Hash"), 16);
    }

    #[test]
    fn test_display() {
        let o = OptionsMap::new();
        let text = o.to_string();
        assert!(text.starts_with("option name Hash type spin default 16 min 1 max 65536\n"));
        assert!(text.contains("option name Clear Hash type button\n"));
        assert!(text.contains("option name Ponder type check default false\n"));
    }
}
