//! Variable interpolation for task file templates
//!
//! Template strings use the `${name}` syntax. Names resolve against:
//! - `args.<name>` - runtime arguments of the invocation
//! - fields resolved earlier, e.g. `configuration_name`
//! - map entries of earlier fields, e.g. `backend_config.bucket`
//! - environment variables, when nothing else matches

use crate::error::{InterpolationError, InterpolationResult};
use crate::runner::{ResolvedFields, RuntimeArgs};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

/// Whether a string contains at least one `${...}` placeholder
pub fn is_template(s: &str) -> bool {
    placeholder().is_match(s)
}

/// Build the variable table a template sees for one invocation
pub fn template_vars(args: &RuntimeArgs, resolved: &ResolvedFields) -> HashMap<String, String> {
    let mut vars: HashMap<String, String> = resolved.flatten().into_iter().collect();
    for (name, value) in args.iter() {
        vars.insert(format!("args.{}", name), value.to_string());
    }
    vars
}

/// Replace `${name}` placeholders, leaving unknown names in place
///
/// Substituted text is inserted as-is and never scanned again, so argument
/// values containing `${...}` come through unchanged.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> String {
    expand(s, vars, &mut Vec::new())
}

/// Like [`interpolate`], but a placeholder left unfilled is an error
pub fn interpolate_strict(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let mut undefined = Vec::new();
    let result = expand(s, vars, &mut undefined);

    match undefined.into_iter().next() {
        Some(name) => Err(InterpolationError::UndefinedVariable(name)),
        None => Ok(result),
    }
}

/// One pass over the template text
fn expand(s: &str, vars: &HashMap<String, String>, undefined: &mut Vec<String>) -> String {
    placeholder()
        .replace_all(s, |caps: &Captures| {
            let var_name = &caps[1];

            if let Some(value) = vars.get(var_name) {
                return value.clone();
            }

            if let Ok(value) = env::var(var_name) {
                return value;
            }

            undefined.push(var_name.to_string());
            caps[0].to_string()
        })
        .into_owned()
}
