//! Command-line argument formatting.
//!
//! `validate` accepts neither variables nor backend settings, so only
//! `init` receives them.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::options::TerraformOptions;

/// Arguments for `terraform init`.
pub fn init_args(options: &TerraformOptions) -> Vec<String> {
    let mut args = vec![
        "init".to_string(),
        "-input=false".to_string(),
        format!("-upgrade={}", options.upgrade),
    ];
    args.extend(format_backend_config_as_args(&options.backend_config));
    args.extend(format_vars_as_args(&options.vars));
    args.extend(format_var_files_as_args(&options.var_files));
    if options.no_color {
        args.push("-no-color".to_string());
    }
    args
}

/// Arguments for `terraform validate`.
pub fn validate_args(options: &TerraformOptions) -> Vec<String> {
    let mut args = vec!["validate".to_string()];
    if options.no_color {
        args.push("-no-color".to_string());
    }
    args
}

/// `-var name=value` pairs, in name order.
pub fn format_vars_as_args(vars: &BTreeMap<String, Value>) -> Vec<String> {
    vars.iter()
        .flat_map(|(name, value)| ["-var".to_string(), format!("{}={}", name, hcl_value(value))])
        .collect()
}

pub fn format_var_files_as_args(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|file| format!("-var-file={}", file.display()))
        .collect()
}

pub fn format_backend_config_as_args(config: &BTreeMap<String, String>) -> Vec<String> {
    config
        .iter()
        .map(|(key, value)| format!("-backend-config={}={}", key, value))
        .collect()
}

/// Render a variable value the way terraform parses `-var` values.
///
/// Top-level strings are passed raw; strings nested in lists or maps are
/// quoted.
pub fn hcl_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => hcl_nested(other),
    }
}

fn hcl_nested(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(hcl_nested).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{} = {}", hcl_key(key), hcl_nested(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

fn hcl_key(key: &str) -> String {
    let mut chars = key.chars();
    let bare = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        quote(key)
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}
