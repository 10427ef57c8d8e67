//! Configuration file (`config.toml`)
//!
//! ```toml
//! language = "ru"
//!
//! [render]
//! use_equation_numbers = false
//! default_digits_count = 4
//!
//! [phrases]
//! where = "where"
//! ```
//!
//! Every key is optional. `language` picks the built-in wording; entries of
//! `[phrases]` override single phrases on top of it.

use calctex_engine::render::{Phrases, RenderOptions};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    language: Option<String>,
    render: Option<RenderFile>,
    phrases: Option<PhrasesFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RenderFile {
    use_equation_numbers: Option<bool>,
    allow_symbolic_and_numeric_equation: Option<bool>,
    always_write_where: Option<bool>,
    use_units: Option<bool>,
    default_digits_count: Option<i32>,
    honor_known_flag: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PhrasesFile {
    by_formula: Option<String>,
    calculated_by_formula: Option<String>,
    calculated: Option<String>,
    #[serde(rename = "where")]
    where_: Option<String>,
    dash: Option<String>,
}

/// Settings resolved from the config file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub render: RenderOptions,
    /// The file the settings came from, if one was read.
    pub path: Option<PathBuf>,
}

/// Load the config from `config_file`, or from the user config directory.
///
/// Never fails: problems are returned as warnings and the defaults are used
/// for whatever could not be read.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = Config::default();

    let Some(path) = config_file.map(Path::to_path_buf).or_else(user_config_path) else {
        return (config, warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (config, warnings);
    }

    match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match parse_config(&content) {
                Ok((render, parse_warnings)) => {
                    warnings.extend(
                        parse_warnings
                            .into_iter()
                            .map(|w| format!("{}: {}", path.display(), w)),
                    );
                    config.render = render;
                    config.path = Some(path);
                }
                Err(err) => warnings.push(format!("Failed to parse {}: {}", path.display(), err)),
            },
            Err(err) => warnings.push(format!("Failed to read {}: {}", path.display(), err)),
        },
        Err(err) => warnings.push(format!(
            "Failed to read metadata for {}: {}",
            path.display(),
            err
        )),
    }

    (config, warnings)
}

/// Resolve render options from the text of a config file.
pub fn parse_config(content: &str) -> Result<(RenderOptions, Vec<String>), toml::de::Error> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut warnings = Vec::new();
    let mut options = RenderOptions::default();

    if let Some(language) = file.language.as_deref() {
        match phrases_for(language) {
            Some(phrases) => options.phrases = phrases,
            None => warnings.push(format!(
                "Unknown language '{}'; using English phrases",
                language
            )),
        }
    }

    if let Some(render) = file.render {
        let defaults = RenderOptions::default();
        options.use_equation_numbers = render
            .use_equation_numbers
            .unwrap_or(defaults.use_equation_numbers);
        options.allow_symbolic_and_numeric_equation = render
            .allow_symbolic_and_numeric_equation
            .unwrap_or(defaults.allow_symbolic_and_numeric_equation);
        options.always_write_where = render
            .always_write_where
            .unwrap_or(defaults.always_write_where);
        options.use_units = render.use_units.unwrap_or(defaults.use_units);
        options.honor_known_flag = render.honor_known_flag.unwrap_or(defaults.honor_known_flag);
        match render.default_digits_count {
            Some(n) if n >= 1 => options.default_digits_count = n,
            Some(n) => warnings.push(format!(
                "default_digits_count must be at least 1, got {}; using {}",
                n, defaults.default_digits_count
            )),
            None => {}
        }
    }

    if let Some(phrases) = file.phrases {
        let target = &mut options.phrases;
        if let Some(v) = phrases.by_formula {
            target.by_formula = v;
        }
        if let Some(v) = phrases.calculated_by_formula {
            target.calculated_by_formula = v;
        }
        if let Some(v) = phrases.calculated {
            target.calculated = v;
        }
        if let Some(v) = phrases.where_ {
            target.where_ = v;
        }
        if let Some(v) = phrases.dash {
            target.dash = v;
        }
    }

    Ok((options, warnings))
}

fn phrases_for(language: &str) -> Option<Phrases> {
    match language.trim().to_ascii_lowercase().as_str() {
        "en" | "english" => Some(Phrases::default()),
        "ru" | "russian" => Some(Phrases::russian()),
        _ => None,
    }
}

/// `config.toml` in the platform config directory of calctex.
pub fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "calctex")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
