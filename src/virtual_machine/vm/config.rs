use crate::virtual_machine::errors::ConfigError;
use crate::virtual_machine::memory::{BankKind, BankLayout, PAGE_SIZE};

/// Machine construction parameters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VmConfig {
    pub code_pages: usize,
    pub data_pages: usize,
    /// Each live lane claims one stack page, so this also caps spawning.
    pub stack_pages: usize,
    pub io_pages: usize,
    /// Value stack depth limit per lane, at most 255.
    pub stack_depth: usize,
    /// Pipe capacity per lane, at most 255 so POLL fits in A.
    pub pipe_capacity: usize,
    /// Maximum number of call frames per lane.
    pub call_depth: usize,
    /// Maximum number of live lanes.
    pub max_lanes: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            code_pages: 4,
            data_pages: 4,
            stack_pages: 64,
            io_pages: 1,
            stack_depth: 255,
            pipe_capacity: 255,
            call_depth: 64,
            max_lanes: 64,
        }
    }
}

impl VmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (bank, pages) in [
            (BankKind::Code, self.code_pages),
            (BankKind::Data, self.data_pages),
            (BankKind::Stack, self.stack_pages),
            (BankKind::Io, self.io_pages),
        ] {
            if pages == 0 || pages > PAGE_SIZE {
                return Err(ConfigError::BankPages { bank, pages });
            }
        }
        if self.stack_depth == 0 || self.stack_depth > u8::MAX as usize {
            return Err(ConfigError::StackDepth {
                depth: self.stack_depth,
            });
        }
        if self.pipe_capacity == 0 || self.pipe_capacity > u8::MAX as usize {
            return Err(ConfigError::PipeCapacity {
                capacity: self.pipe_capacity,
            });
        }
        if self.call_depth == 0 {
            return Err(ConfigError::CallDepth);
        }
        if self.max_lanes == 0 {
            return Err(ConfigError::LaneLimit);
        }
        Ok(())
    }

    pub fn layout(&self) -> BankLayout {
        BankLayout {
            code_pages: self.code_pages,
            data_pages: self.data_pages,
            stack_pages: self.stack_pages,
            io_pages: self.io_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(VmConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let config = VmConfig {
            stack_depth: 256,
            ..VmConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StackDepth { depth: 256 }));

        let config = VmConfig {
            io_pages: 0,
            ..VmConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BankPages {
                bank: BankKind::Io,
                pages: 0
            })
        );

        let config = VmConfig {
            pipe_capacity: 300,
            ..VmConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PipeCapacity { capacity: 300 }));

        let config = VmConfig {
            max_lanes: 0,
            ..VmConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::LaneLimit));
    }
}
