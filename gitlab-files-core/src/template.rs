//! Template expansion for destination paths and commit messages.
//!
//! Templates contain `{identifier}` tokens resolved against a [`ReplacementContext`].
//! Expansion is a bounded loop: each round finds the first token in the current string and
//! substitutes it, so values that themselves contain tokens are expanded too. The loop stops
//! after [`MAX_ROUNDS`] substitutions, whatever the input.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{UploaderError, UploaderResult};
use crate::image::ImageInput;

pub const MAX_ROUNDS: usize = 100;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("token pattern is valid"));

/// Token name to value mapping used for a single expansion.
#[derive(Debug, Clone, Default)]
pub struct ReplacementContext {
    values: HashMap<String, String>,
}

impl ReplacementContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// `year`, `month` (two digits), `day`, `hour`, `minute`, `second`, `milliseconds`.
    pub fn from_time(now: &DateTime<FixedOffset>) -> Self {
        Self::new()
            .with("year", now.year().to_string())
            .with("month", format!("{:02}", now.month()))
            .with("day", now.day().to_string())
            .with("hour", now.hour().to_string())
            .with("minute", now.minute().to_string())
            .with("second", now.second().to_string())
            .with("milliseconds", now.timestamp_subsec_millis().to_string())
    }

    /// Date tokens plus `fileName`, `hash16`, `hash32` and `ext` for a path template.
    pub fn for_path(image: &ImageInput, now: &DateTime<FixedOffset>) -> Self {
        let hash = image.payload.md5_hex();
        Self::from_time(now)
            .with("fileName", image.stem())
            .with("hash16", &hash[..16])
            .with("hash32", hash.as_str())
            .with("ext", image.ext())
    }

    /// Date tokens plus `fileName` set to the given display name.
    pub fn for_message(file_names: &str, now: &DateTime<FixedOffset>) -> Self {
        Self::from_time(now).with("fileName", file_names)
    }
}

fn expand_with<F>(template: &str, mut resolve: F) -> UploaderResult<String>
where
    F: FnMut(&str) -> UploaderResult<String>,
{
    let mut out = template.to_string();
    for _ in 0..MAX_ROUNDS {
        let found = TOKEN
            .captures(&out)
            .map(|caps| (caps.get(0).map_or(0..0, |m| m.range()), caps[1].to_string()));
        let Some((span, name)) = found else {
            return Ok(out);
        };
        let value = resolve(&name)?;
        out.replace_range(span, &value);
    }
    if TOKEN.is_match(&out) {
        warn!(template, rounds = MAX_ROUNDS, "Template expansion hit the round limit");
    }
    Ok(out)
}

/// Replaces every `{identifier}` token with its context value. Unknown tokens are erased.
pub fn expand(template: &str, context: &ReplacementContext) -> String {
    let expanded = expand_with(template, |name| {
        Ok(match context.get(name) {
            Some(value) => value.to_string(),
            None => {
                debug!(token = name, "Unknown template token erased");
                String::new()
            }
        })
    });
    // The resolver above never fails.
    expanded.unwrap_or_default()
}

/// Like [`expand`], but an unknown token is an error instead of being erased.
pub fn expand_strict(template: &str, context: &ReplacementContext) -> UploaderResult<String> {
    expand_with(template, |name| {
        context
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| UploaderError::UnknownToken(name.to_string()))
    })
}

pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Replaces every `/` with `%2F`, as required by the single-file endpoints.
pub fn escape_path(path: &str) -> String {
    path.replace('/', "%2F")
}

/// Turns an expanded path template into a repository path: normalises separators, drops one
/// leading slash, optionally escapes the remaining slashes and appends the extension.
pub fn finalize_path(expanded: &str, ext: &str, escape_slashes: bool) -> String {
    let normalized = normalize_separators(expanded);
    let trimmed = normalized.strip_prefix('/').unwrap_or(&normalized);
    let mut path = if escape_slashes {
        escape_path(trimmed)
    } else {
        trimmed.to_string()
    };
    if !ext.is_empty() {
        path.push('.');
        path.push_str(ext);
    }
    path
}

pub fn format_path(
    image: &ImageInput,
    template: &str,
    now: &DateTime<FixedOffset>,
    escape_slashes: bool,
) -> String {
    let context = ReplacementContext::for_path(image, now);
    finalize_path(&expand(template, &context), &image.ext(), escape_slashes)
}

pub fn format_message(template: &str, file_names: &str, now: &DateTime<FixedOffset>) -> String {
    expand(template, &ReplacementContext::for_message(file_names, now))
}

/// Quotes each name and joins them with ` & `, e.g. `"a.png" & "b.jpg"`.
pub fn join_file_names<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(" & ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_token_is_replaced_first() {
        let ctx = ReplacementContext::new().with("a", "1").with("b", "2");
        assert_eq!(expand("{b}-{a}-{b}", &ctx), "2-1-2");
    }

    #[test]
    fn braces_without_word_characters_are_left_alone() {
        let ctx = ReplacementContext::new();
        assert_eq!(expand("{} {-} {a b}", &ctx), "{} {-} {a b}");
    }
}
