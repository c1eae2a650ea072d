//! Interpreter-wide settings that do not belong to any one run.

/// What the tape cell under the cursor becomes when an input hook reports
/// end-of-input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndOfInputPolicy {
    /// Write zero into the cell.
    #[default]
    StoreZero,
    /// Write `-1` (the conventional EOF byte) into the cell.
    StoreEof,
    /// Leave the cell unchanged.
    DoNothing,
}

/// Settings that shape how [`crate::loader::load`] and
/// [`crate::interpreter::Interpreter`] behave, independent of any one
/// program or run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    on_end_of_input: EndOfInputPolicy,
    debug_enabled: bool,
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration {
            on_end_of_input: EndOfInputPolicy::default(),
            debug_enabled: false,
        }
    }
}

impl Configuration {
    /// Builds a configuration with an explicit end-of-input policy and
    /// debug-instruction setting.
    pub fn new(on_end_of_input: EndOfInputPolicy, debug_enabled: bool) -> Configuration {
        Configuration {
            on_end_of_input,
            debug_enabled,
        }
    }

    /// The policy applied when an input hook reports end-of-input.
    pub fn on_end_of_input(&self) -> EndOfInputPolicy {
        self.on_end_of_input
    }

    /// Whether `#` bytes are parsed into debug instructions.
    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_store_zero_and_debug_off() {
        let config = Configuration::default();
        assert_eq!(config.on_end_of_input(), EndOfInputPolicy::StoreZero);
        assert!(!config.debug_enabled());
    }

    #[test]
    fn new_sets_both_fields() {
        let config = Configuration::new(EndOfInputPolicy::StoreEof, true);
        assert_eq!(config.on_end_of_input(), EndOfInputPolicy::StoreEof);
        assert!(config.debug_enabled());
    }
}
