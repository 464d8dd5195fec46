use std::borrow::Cow;

use serde_json::Value;
use thiserror::Error;

use super::path::{resolve_segments, ResolveError};
use super::value::render;
use crate::process::AdditionalInput;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("unmatched `{{` in `{template}`")]
    Unclosed { template: String },
    #[error("single `}}` encountered in `{template}`")]
    StrayClose { template: String },
    #[error("unmatched `[` in `{template}`")]
    UnclosedBracket { template: String },
    #[error("empty placeholder in `{template}`")]
    EmptyPlaceholder { template: String },
    #[error("unknown name `{name}` in `{template}`")]
    UnknownName { template: String, name: String },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Names a path template may refer to.
#[derive(Clone, Copy)]
pub struct TemplateContext<'a> {
    pub config: &'a Value,
    pub state: &'a Value,
    pub parameters: &'a Value,
    pub external_state: &'a Value,
    pub additional: &'a [AdditionalInput],
}

impl<'a> TemplateContext<'a> {
    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        match name {
            "config" => Some(self.config),
            "state" => Some(self.state),
            "parameters" => Some(self.parameters),
            "external_state" | "e_state" => Some(self.external_state),
            _ => self
                .additional
                .iter()
                .rev()
                .find(|input| input.as_.as_deref() == Some(name))
                .map(|input| &input.value),
        }
    }
}

fn parse_segments(expression: &str, template: &str) -> Result<Vec<String>, TemplateError> {
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut chars = expression.char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '.' => {
                if !buffer.is_empty() {
                    segments.push(std::mem::take(&mut buffer));
                }
            }
            '[' => {
                if !buffer.is_empty() {
                    segments.push(std::mem::take(&mut buffer));
                }
                let close = expression[i + 1..].find(']').ok_or_else(|| {
                    TemplateError::UnclosedBracket {
                        template: template.to_string(),
                    }
                })? + i
                    + 1;
                let token = expression[i + 1..close].trim();
                if token.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder {
                        template: template.to_string(),
                    });
                }
                segments.push(token.to_string());
                for (j, _) in chars.by_ref() {
                    if j == close {
                        break;
                    }
                }
            }
            other => buffer.push(other),
        }
    }
    if !buffer.is_empty() {
        segments.push(buffer);
    }
    Ok(segments)
}

fn resolve_placeholder<'a>(
    expression: &str,
    template: &str,
    ctx: &TemplateContext<'a>,
) -> Result<&'a Value, TemplateError> {
    let segments = parse_segments(expression, template)?;
    let Some((name, rest)) = segments.split_first() else {
        return Err(TemplateError::EmptyPlaceholder {
            template: template.to_string(),
        });
    };
    let root = ctx
        .lookup(name)
        .ok_or_else(|| TemplateError::UnknownName {
            template: template.to_string(),
            name: name.clone(),
        })?;
    Ok(resolve_segments(root, expression, rest)?)
}

/// Expands `{name.path}` placeholders against the live sources.
///
/// Only name lookup and dotted or bracketed traversal are understood.
/// `{{` and `}}` produce literal braces.
pub fn format_template<'t>(
    template: &'t str,
    ctx: &TemplateContext<'_>,
) -> Result<Cow<'t, str>, TemplateError> {
    if !template.contains(['{', '}']) {
        return Ok(Cow::Borrowed(template));
    }

    let mut output = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    output.push('{');
                    continue;
                }
                let close = template[i + 1..]
                    .find('}')
                    .ok_or_else(|| TemplateError::Unclosed {
                        template: template.to_string(),
                    })?
                    + i
                    + 1;
                let expression = template[i + 1..close].trim();
                let value = resolve_placeholder(expression, template, ctx)?;
                output.push_str(&render(value));
                for (j, _) in chars.by_ref() {
                    if j == close {
                        break;
                    }
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    output.push('}');
                } else {
                    return Err(TemplateError::StrayClose {
                        template: template.to_string(),
                    });
                }
            }
            other => output.push(other),
        }
    }
    Ok(Cow::Owned(output))
}
