//! Configuration loading
//!
//! Configuration is built in layers: the type's `Default`, then a TOML, JSON
//! or YAML file, then `PREFIX_SECTION__KEY=value` environment variables.
//! Later layers override earlier ones key by key.

use ::config::{Config, Environment, File, FileFormat, Map};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Pick the file format from the extension (TOML, JSON or YAML)
pub fn file_format(path: &Path) -> crate::Result<FileFormat> {
    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "yml" | "yaml" => Ok(FileFormat::Yaml),
        _ => Err(crate::UtilError::Config(
            format!("Unsupported config format: {extension}")
        )),
    }
}

/// Environment source for `PREFIX_SECTION__KEY=value` variables.
///
/// Values are parsed as booleans or numbers where possible. Keys named in
/// `list_keys` (dotted, lowercase) are split on commas.
fn environment(prefix: &str, list_keys: &[&str]) -> Environment {
    list_keys.iter().fold(
        Environment::with_prefix(prefix.trim_end_matches('_'))
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .try_parsing(true),
        |env, key| env.with_list_parse_key(key),
    )
}

/// Build a configuration from `T::default()`, an optional file and the given
/// environment variables.
pub fn load_layered_with_env<T, I>(
    path: Option<&Path>,
    env_prefix: &str,
    list_keys: &[&str],
    vars: I,
) -> crate::Result<T>
where
    T: Default + Serialize + DeserializeOwned,
    I: IntoIterator<Item = (String, String)>,
{
    let defaults = Config::try_from(&T::default())
        .map_err(|e| crate::UtilError::Serialization(format!("Default serialization error: {e}")))?;

    let mut builder = Config::builder().add_source(defaults);
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(file_format(path)?));
    }

    let vars: Map<String, String> = vars.into_iter().collect();
    builder
        .add_source(environment(env_prefix, list_keys).source(Some(vars)))
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|e| crate::UtilError::Config(format!("Invalid configuration: {e}")))
}

/// Deserialize either a single string or a list of strings into a `Vec`
pub fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(item) => vec![item],
        OneOrMany::Many(items) => items,
    })
}
