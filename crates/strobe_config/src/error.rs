//! Error types for configuration loading and validation.

use strobe_plan::PlanError;

/// Errors that can occur when loading a `strobe.toml` or building its test plans.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Two test cases share a module and test name.
    #[error("module '{module}' already has a test named '{test}'")]
    DuplicateTest {
        /// The module name.
        module: String,
        /// The repeated test name.
        test: String,
    },

    /// A test definition was rejected while building its plan.
    #[error("test '{test}': {source}")]
    Plan {
        /// The test case name.
        test: String,
        /// The underlying plan error.
        #[source]
        source: PlanError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_duplicate_test() {
        let err = ConfigError::DuplicateTest {
            module: "adder".to_string(),
            test: "t1".to_string(),
        };
        assert_eq!(format!("{err}"), "module 'adder' already has a test named 't1'");
    }

    #[test]
    fn display_plan_error() {
        let err = ConfigError::Plan {
            test: "t1".to_string(),
            source: PlanError::UnknownPort("q".to_string()),
        };
        assert_eq!(format!("{err}"), "test 't1': port 'q' is not defined");
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::from(io_err);
        assert!(format!("{err}").contains("failed to read configuration"));
    }
}
