//! Plugin name resolution
//!
//! The operator names a plugin as the first argument after the program name.
//! The resolver maps it onto `<namespace>.<segment>.<name>.parser`.

use crate::hot_reload::LoadError;

/// Argument position holding the plugin name
pub const PLUGIN_ARG_INDEX: usize = 1;

/// Requested argument position is past the end of the argument list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("argument index {index} out of range for {len} arguments")]
pub struct ArgumentIndexError {
    pub index: usize,
    pub len: usize,
}

/// Plugin resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("You forgot to enter the parser name!")]
    MissingArgument(#[source] ArgumentIndexError),

    #[error("Non-existent parser name passed!")]
    UnknownPlugin {
        name: String,
        #[source]
        source: LoadError,
    },

    #[error(transparent)]
    Load(LoadError),
}

impl ResolveError {
    /// Operator-facing hints for fixing the invocation
    pub fn remediation(&self) -> Vec<String> {
        match self {
            Self::MissingArgument(_) => vec!["Usage: parsekit run <parser_name>".to_string()],
            Self::UnknownPlugin { .. } => vec![
                "Enter correct parser name".to_string(),
                "Or create new: parsekit new <parser_name>".to_string(),
            ],
            Self::Load(_) => Vec::new(),
        }
    }
}

/// Plugin name at [`PLUGIN_ARG_INDEX`]
pub fn plugin_name(argv: &[String]) -> Result<&str, ResolveError> {
    argv.get(PLUGIN_ARG_INDEX)
        .map(String::as_str)
        .ok_or(ResolveError::MissingArgument(ArgumentIndexError {
            index: PLUGIN_ARG_INDEX,
            len: argv.len(),
        }))
}

/// Dotted name of the parser unit of plugin `name` under `plugin_root`
pub fn parser_unit_name(plugin_root: &str, name: &str) -> String {
    format!("{plugin_root}.{name}.parser")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plugin_name() {
        assert_eq!(plugin_name(&args(&["prog", "demo"])).unwrap(), "demo");
        assert_eq!(plugin_name(&args(&["prog", "demo", "extra"])).unwrap(), "demo");
    }

    #[test]
    fn test_missing_argument_keeps_index_error() {
        for argv in [args(&[]), args(&["prog"])] {
            let err = plugin_name(&argv).unwrap_err();
            assert_eq!(err.to_string(), "You forgot to enter the parser name!");

            let source = err.source().unwrap();
            let index_error = source.downcast_ref::<ArgumentIndexError>().unwrap();
            assert_eq!(index_error.index, 1);
            assert_eq!(index_error.len, argv.len());
        }
    }

    #[test]
    fn test_parser_unit_name() {
        assert_eq!(
            parser_unit_name("parsers.user_parsers", "demo"),
            "parsers.user_parsers.demo.parser"
        );
    }

    #[test]
    fn test_remediation() {
        let err = plugin_name(&[]).unwrap_err();
        assert_eq!(err.remediation(), vec!["Usage: parsekit run <parser_name>"]);

        let err = ResolveError::UnknownPlugin {
            name: "nope".to_string(),
            source: LoadError::ModuleNotFound("parsers.user_parsers.nope".to_string()),
        };
        assert_eq!(err.remediation().len(), 2);
        assert!(err.source().unwrap().to_string().contains("No module named"));
    }
}
