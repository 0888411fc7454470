//! `parsekit new` command implementation

use crate::CliError;
use colored::Colorize;
use parsekit_plugins::config::HostConfig;
use std::path::{Path, PathBuf};

/// Execute the `parsekit new` command
pub fn run(config: &HostConfig, name: &str) -> Result<PathBuf, CliError> {
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(format!("Invalid parser name '{}': use letters, digits and '_'", name).into());
    }

    let plugin_dir = config
        .source_root
        .join(&config.namespace)
        .join(&config.plugin_segment);
    let package_dir = plugin_dir.join(name);
    if package_dir.exists() {
        return Err(format!("Parser '{}' already exists at {}", name, package_dir.display()).into());
    }

    println!("{} Creating new parser: {}", "→".green(), name.cyan());
    println!("  Directory: {}", package_dir.display());

    std::fs::create_dir_all(&package_dir)?;
    generate_package(config, name, &package_dir)?;

    println!("{} Parser created successfully!", "✓".green());
    println!();
    println!("Next steps:");
    println!("  parsekit run {} --interactive", name);

    Ok(package_dir)
}

fn generate_package(config: &HostConfig, name: &str, package_dir: &Path) -> Result<(), CliError> {
    let ext = &config.script_extension;
    let core_import = format!("{}/{}/{}/core", config.namespace, config.plugin_segment, name);

    let mod_script = format!(
        r#"// {name} parser package
let name = "{name}";
"#
    );
    std::fs::write(package_dir.join(format!("{}.{ext}", config.package_entry)), mod_script)?;

    let parser_script = format!(
        r#"// Entry unit of the {name} parser
let reinit = false;
let info = "{name} parser\n\nUsage:\n    >>> run\n    >>> reload {name}\n";

fn main() {{
    import "{core_import}" as parser_core;
    parser_core::parse()
}}
"#
    );
    std::fs::write(package_dir.join(format!("parser.{ext}")), parser_script)?;

    let core_script = format!(
        r#"// Extraction logic of the {name} parser
let reinit = false;

fn parse() {{
    let items = [];
    if items.len() == 0 {{
        raise_notfound("item");
    }}
    #{{ parser: "{name}", items: items }}
}}
"#
    );
    std::fs::write(package_dir.join(format!("core.{ext}")), core_script)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsekit_plugins::host::UnitHost;

    #[test]
    fn test_scaffold_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("parsers")).unwrap();
        let config = HostConfig::new().with_source_root(dir.path());

        let package_dir = run(&config, "shop").unwrap();
        assert!(package_dir.join("mod.rhai").is_file());
        assert!(package_dir.join("parser.rhai").is_file());
        assert!(package_dir.join("core.rhai").is_file());

        let mut host = UnitHost::new(config.clone()).unwrap();
        let argv = vec!["parsekit".to_string(), "shop".to_string()];
        let parser = host.select_parser(&argv).unwrap().name.clone();
        assert_eq!(parser, "parsers.user_parsers.shop.parser");
        assert!(host.repl_snippets(&parser).unwrap().contains(">>> reload shop"));

        let err = host.run_entry(&parser, "main").unwrap_err();
        assert_eq!(err.to_string(), "Parsed object has no tag 'item'");
    }

    #[test]
    fn test_rejects_existing_and_invalid_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig::new().with_source_root(dir.path());

        run(&config, "shop").unwrap();
        assert!(run(&config, "shop").is_err());
        assert!(run(&config, "../escape").is_err());
        assert!(run(&config, "").is_err());
    }
}
