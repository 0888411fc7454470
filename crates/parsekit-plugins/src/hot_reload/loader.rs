//! Script unit loader
//!
//! Maps dotted unit names onto script files, executes them and captures the
//! state they leave behind.

use super::registry::{BodyState, Unit, UnitKind, UnitRegistry, owner_package_of};
use crate::config::{ConfigResult, HostConfig, PluginNamespace, ScriptLimits};
use crate::error::ParserError;
use rhai::module_resolvers::FileModuleResolver;
use rhai::{AST, CallFnOptions, Dynamic, Engine, EvalAltResult, Position, Scope};
use std::path::PathBuf;
use tracing::{debug, info};

/// Script target of `print` and `debug` statements
pub const SCRIPT_LOG_TARGET: &str = "parsekit::script";

/// Unit load error types
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("No module named '{0}'")]
    ModuleNotFound(String),

    #[error("Invalid unit name: '{0}'")]
    InvalidName(String),

    #[error("Failed to read unit '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compile unit '{name}': {source}")]
    Compile {
        name: String,
        #[source]
        source: rhai::ParseError,
    },

    #[error("Unit '{name}' failed: {error}")]
    Execution {
        name: String,
        #[source]
        error: Box<EvalAltResult>,
    },

    #[error("Unit '{name}' has no function '{function}'")]
    MissingEntry { name: String, function: String },
}

impl LoadError {
    /// Whether the unit could not be found at all
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound(_) | Self::InvalidName(_))
    }

    /// Domain error raised by the failing script, if any
    pub fn parser_error(&self) -> Option<ParserError> {
        match self {
            Self::Execution { error, .. } => script_payload(error).and_then(ParserError::from_script_value),
            _ => None,
        }
    }
}

/// Value thrown by a script, looking through nested call frames
fn script_payload(error: &EvalAltResult) -> Option<&Dynamic> {
    match error {
        EvalAltResult::ErrorRuntime(value, _) => Some(value),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => script_payload(inner),
        EvalAltResult::ErrorInModule(_, inner, _) => script_payload(inner),
        _ => None,
    }
}

/// Where a unit lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSource {
    /// Dotted unit name
    pub name: String,
    /// Backing kind
    pub kind: UnitKind,
    /// Script file, absent for namespace packages
    pub path: Option<PathBuf>,
}

/// Loads and executes script units
pub struct ScriptLoader {
    engine: Engine,
    config: HostConfig,
    namespace: PluginNamespace,
}

impl ScriptLoader {
    /// Create a loader for `config`
    pub fn new(config: HostConfig) -> ConfigResult<Self> {
        let namespace = config.plugin_namespace()?;
        let engine = Self::build_engine(&config);

        Ok(Self {
            engine,
            config,
            namespace,
        })
    }

    fn build_engine(config: &HostConfig) -> Engine {
        let mut engine = Engine::new();
        Self::apply_limits(&mut engine, &config.limits);

        let mut resolver = FileModuleResolver::new_with_path_and_extension(
            config.source_root.clone(),
            config.script_extension.as_str(),
        );
        resolver.enable_cache(false);
        engine.set_module_resolver(resolver);

        engine.on_print(|text| info!(target: SCRIPT_LOG_TARGET, "{}", text));
        engine.on_debug(|text, source, pos| match source {
            Some(source) => debug!(target: SCRIPT_LOG_TARGET, "{} @ {:?} | {}", source, pos, text),
            None => debug!(target: SCRIPT_LOG_TARGET, "{:?} | {}", pos, text),
        });

        engine.register_fn("raise_notfound", |tag: &str| -> Result<(), Box<EvalAltResult>> {
            let kind = crate::error::not_found_factory(tag);
            Err(EvalAltResult::ErrorRuntime(Dynamic::from_map(kind.to_script_payload()), Position::NONE).into())
        });

        engine
    }

    fn apply_limits(engine: &mut Engine, limits: &ScriptLimits) {
        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
    }

    /// Configuration this loader was built from
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Plugin namespace rules
    pub fn namespace(&self) -> &PluginNamespace {
        &self.namespace
    }

    /// Find the script backing `name`
    ///
    /// A directory with a package entry script wins over a module file of the
    /// same name; a bare directory is a namespace package.
    pub fn locate(&self, name: &str) -> Result<UnitSource, LoadError> {
        let segments = validate_name(name)?;

        let mut dir = self.config.source_root.clone();
        dir.extend(segments.iter());

        let entry = dir
            .join(&self.config.package_entry)
            .with_extension(&self.config.script_extension);
        if entry.is_file() {
            return Ok(UnitSource {
                name: name.to_string(),
                kind: UnitKind::Package,
                path: Some(entry),
            });
        }

        let module = dir.with_extension(&self.config.script_extension);
        if module.is_file() {
            return Ok(UnitSource {
                name: name.to_string(),
                kind: UnitKind::Module,
                path: Some(module),
            });
        }

        if dir.is_dir() {
            return Ok(UnitSource {
                name: name.to_string(),
                kind: UnitKind::NamespacePackage,
                path: None,
            });
        }

        Err(LoadError::ModuleNotFound(name.to_string()))
    }

    /// Load `name` and its ancestor packages into `registry`
    ///
    /// Units already in the registry are not executed again. Ancestors are
    /// registered first, so a failing child leaves its parents loaded.
    pub fn load<'r>(&self, registry: &'r mut UnitRegistry, name: &str) -> Result<&'r Unit, LoadError> {
        let segments = validate_name(name)?;

        for depth in 1..=segments.len() {
            let current = segments[..depth].join(".");
            if registry.contains(&current) {
                continue;
            }

            let source = self.locate(&current)?;
            let (ast, body_state) = self.execute(&source)?;

            let mut unit = Unit::new(&current, source.kind)
                .with_base_unit(self.namespace.is_base_unit(&current));
            if let Some(path) = &source.path {
                unit = unit.with_path(path);
            }
            unit.replace_state(ast, body_state);
            unit.mark_loaded();

            if let Err(reason) = registry.register(unit) {
                debug!("{}", reason);
                continue;
            }
            info!("Loaded unit: {}", current);
        }

        registry
            .get(name)
            .ok_or_else(|| LoadError::ModuleNotFound(name.to_string()))
    }

    /// Execute `unit` again, replacing its code and state
    ///
    /// The unit is located afresh, so a deleted script fails with
    /// [`LoadError::ModuleNotFound`] and the unit keeps its previous state.
    pub fn reexecute(&self, unit: &mut Unit) -> Result<(), LoadError> {
        let source = self.locate(&unit.name)?;
        let (ast, body_state) = self.execute(&source)?;

        unit.kind = source.kind;
        unit.owner_package = owner_package_of(&unit.name, unit.kind);
        unit.path = source.path;
        unit.replace_state(ast, body_state);
        unit.mark_reloaded();

        debug!("Re-executed unit: {}", unit.name);
        Ok(())
    }

    /// Run the script behind `source` in a fresh scope
    pub fn execute(&self, source: &UnitSource) -> Result<(Option<AST>, BodyState), LoadError> {
        let Some(path) = &source.path else {
            return Ok((None, BodyState::new()));
        };

        let script = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            name: source.name.clone(),
            source: e,
        })?;

        let ast = self.engine.compile(&script).map_err(|e| LoadError::Compile {
            name: source.name.clone(),
            source: e,
        })?;

        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| LoadError::Execution {
                name: source.name.clone(),
                error: e,
            })?;

        let body_state = scope
            .iter()
            .map(|(name, _is_const, value)| (name.to_string(), value))
            .collect();

        Ok((Some(ast), body_state))
    }

    /// Call `function` defined by `unit`
    ///
    /// Top-level statements are not run again; the function sees a fresh
    /// scope.
    pub fn call_entry(&self, unit: &Unit, function: &str) -> Result<Dynamic, LoadError> {
        let missing = || LoadError::MissingEntry {
            name: unit.name.clone(),
            function: function.to_string(),
        };

        let ast = unit.ast().ok_or_else(missing)?;
        if !ast.iter_functions().any(|f| f.name == function) {
            return Err(missing());
        }

        let options = CallFnOptions::new().eval_ast(false);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut Scope::new(), ast, function, ())
            .map_err(|e| LoadError::Execution {
                name: unit.name.clone(),
                error: e,
            })
    }
}

/// Split a dotted name into path-safe segments
fn validate_name(name: &str) -> Result<Vec<&str>, LoadError> {
    let segments: Vec<&str> = name.split('.').collect();
    let valid = segments
        .iter()
        .all(|s| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_'));

    if valid {
        Ok(segments)
    } else {
        Err(LoadError::InvalidName(name.to_string()))
    }
}
