use std::fs;

use sb_core::{Bindings, SbValue};

use crate::{map_cli_bindings_invalid, map_cli_bindings_read, map_cli_script_read, CliError};

#[derive(Debug)]
pub(crate) struct LoadedScript {
    pub(crate) code: String,
    pub(crate) label: Option<String>,
}

pub(crate) fn load_script(
    file: Option<&str>,
    inline: Option<&str>,
    filename: Option<&str>,
) -> Result<LoadedScript, CliError> {
    match (file, inline) {
        (Some(path), _) => Ok(LoadedScript {
            code: fs::read_to_string(path).map_err(map_cli_script_read)?,
            label: Some(filename.unwrap_or(path).to_string()),
        }),
        (None, Some(code)) => Ok(LoadedScript {
            code: code.to_string(),
            label: filename.map(str::to_string),
        }),
        (None, None) => Err(CliError::new(
            "CLI_SCRIPT_MISSING",
            "Either --file or --code is required.",
        )),
    }
}

/// Reads a JSON object of bindings.
pub(crate) fn load_bindings_file(path: &str) -> Result<Bindings, CliError> {
    let raw = fs::read_to_string(path).map_err(map_cli_bindings_read)?;
    parse_bindings_object(&raw)
}

pub(crate) fn parse_bindings_object(raw: &str) -> Result<Bindings, CliError> {
    match serde_json::from_str::<SbValue>(raw).map_err(map_cli_bindings_invalid)? {
        SbValue::Map(entries) => Ok(entries),
        other => Err(CliError::new(
            "CLI_BINDINGS_INVALID",
            format!("Bindings must be a JSON object, got {}.", other.type_name()),
        )),
    }
}

/// Parses one `key=<json>` pair from `--bind`.
pub(crate) fn parse_binding(raw: &str) -> Result<(String, SbValue), CliError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(CliError::new(
            "CLI_BIND_INVALID",
            format!("Binding \"{}\" must look like key=<json>.", raw),
        ));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::new(
            "CLI_BIND_INVALID",
            format!("Binding \"{}\" has an empty name.", raw),
        ));
    }
    let value = serde_json::from_str::<SbValue>(value).map_err(|error| {
        CliError::new(
            "CLI_BIND_INVALID",
            format!("Binding \"{}\" is not valid JSON: {}", key, error),
        )
    })?;
    Ok((key.to_string(), value))
}

/// File bindings first, then `--bind` pairs in order; later names win.
pub(crate) fn collect_bindings(
    bindings_file: Option<&str>,
    pairs: &[String],
) -> Result<Bindings, CliError> {
    let mut bindings = match bindings_file {
        Some(path) => load_bindings_file(path)?,
        None => Bindings::new(),
    };
    for pair in pairs {
        let (key, value) = parse_binding(pair)?;
        bindings.insert(key, value);
    }
    Ok(bindings)
}
