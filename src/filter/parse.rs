//! Parser for textual filter chain descriptions such as `scale=80:40,format=gray`.

use super::GraphBuildError;

/// One argument of a filter: positional (`80`) or named (`w=80`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    pub key: Option<String>,
    pub value: String,
}

/// A single parsed filter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: String,
    pub args: Vec<FilterArg>,
}

impl FilterSpec {
    /// Look up an argument by name, falling back to its position.
    pub fn arg(&self, key: &str, position: usize) -> Option<&str> {
        self.args
            .iter()
            .find(|a| a.key.as_deref() == Some(key))
            .or_else(|| self.args.iter().filter(|a| a.key.is_none()).nth(position))
            .map(|a| a.value.as_str())
    }
}

/// Parse a comma-separated chain of `name[=arg[:arg...]]` filters.
pub fn parse_description(description: &str) -> Result<Vec<FilterSpec>, GraphBuildError> {
    let parse_err = |reason: String| GraphBuildError::Parse {
        description: description.to_string(),
        reason,
    };

    if description.trim().is_empty() {
        return Err(parse_err("description is empty".to_string()));
    }

    let mut chain = Vec::new();
    for (i, segment) in description.split(',').enumerate() {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(parse_err(format!("filter #{} is empty", i + 1)));
        }

        let (name, rest) = match segment.split_once('=') {
            Some((name, rest)) => (name.trim(), Some(rest)),
            None => (segment, None),
        };
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(parse_err(format!("invalid filter name '{}'", name)));
        }

        let mut args = Vec::new();
        if let Some(rest) = rest {
            for raw in rest.split(':') {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Err(parse_err(format!("empty argument for '{}'", name)));
                }
                let arg = match raw.split_once('=') {
                    Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
                        FilterArg {
                            key: Some(key.trim().to_string()),
                            value: value.trim().to_string(),
                        }
                    }
                    Some(_) => {
                        return Err(parse_err(format!(
                            "malformed argument '{}' for '{}'",
                            raw, name
                        )))
                    }
                    None => FilterArg {
                        key: None,
                        value: raw.to_string(),
                    },
                };
                args.push(arg);
            }
        }

        chain.push(FilterSpec {
            name: name.to_string(),
            args,
        });
    }

    Ok(chain)
}
