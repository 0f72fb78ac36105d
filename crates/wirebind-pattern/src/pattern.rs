//! Path pattern compilation.

use regex::Regex;
use std::fmt;
use wirebind_core::{WireError, WireResult};

/// Default capture for a `{name}` placeholder: any non-empty run without `/`.
const DEFAULT_SEGMENT: &str = "[^/]+";

/// How a literal pattern is compared with a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// The path must start with the pattern.
    Prefix,
    /// The path must equal the pattern.
    Exact,
}

impl MatchMode {
    const fn from_prefix_only(prefix_only: bool) -> Self {
        if prefix_only {
            Self::Prefix
        } else {
            Self::Exact
        }
    }
}

/// A compiled path specification.
///
/// A spec without `{` compiles to a [`PathPattern::Literal`]; anything else
/// compiles to a [`PathPattern::Template`] regex anchored at the start, and
/// at the end too unless compiled for prefix matching.
///
/// # Example
///
/// ```
/// use wirebind_pattern::PathPattern;
///
/// let admin = PathPattern::compile("/admin", true).unwrap();
/// assert!(admin.matches("/admin/users"));
///
/// let user = PathPattern::compile(r"/users/{id:\d+}", false).unwrap();
/// assert!(user.matches("/users/42"));
/// assert!(!user.matches("/users/abc"));
/// ```
#[derive(Clone)]
pub enum PathPattern {
    /// Plain text compared by prefix or equality.
    Literal {
        /// The spec as written.
        text: String,
        /// Comparison mode.
        mode: MatchMode,
    },
    /// A compiled placeholder template.
    Template {
        /// The spec as written.
        source: String,
        /// The anchored regex.
        regex: Regex,
    },
}

impl PathPattern {
    /// Compiles `spec` for prefix (`prefix_only = true`) or full-path matching.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidPattern`] if a placeholder is unterminated
    /// or a custom placeholder expression is not a valid regex.
    pub fn compile(spec: &str, prefix_only: bool) -> WireResult<Self> {
        if !spec.contains('{') {
            return Ok(Self::Literal {
                text: spec.to_string(),
                mode: MatchMode::from_prefix_only(prefix_only),
            });
        }

        let mut expr = String::from("^");
        expr.push_str(&template_body(spec)?);
        if !prefix_only {
            expr.push('$');
        }

        let regex = Regex::new(&expr)
            .map_err(|err| WireError::invalid_pattern(spec, err.to_string()))?;
        Ok(Self::Template {
            source: spec.to_string(),
            regex,
        })
    }

    /// Returns `true` if `path` matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Literal {
                text,
                mode: MatchMode::Prefix,
            } => path.starts_with(text.as_str()),
            Self::Literal {
                text,
                mode: MatchMode::Exact,
            } => path == text,
            Self::Template { regex, .. } => regex.is_match(path),
        }
    }

    /// Returns the spec this pattern was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal { text, .. } => text,
            Self::Template { source, .. } => source,
        }
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { text, mode } => f
                .debug_struct("Literal")
                .field("text", text)
                .field("mode", mode)
                .finish(),
            Self::Template { regex, .. } => f
                .debug_struct("Template")
                .field("regex", &regex.as_str())
                .finish(),
        }
    }
}

/// Converts a template spec into an unanchored regex body.
fn template_body(spec: &str) -> WireResult<String> {
    let mut body = String::new();
    let mut rest = spec;

    while let Some(open) = rest.find('{') {
        body.push_str(&regex::escape(&rest[..open]));

        let after = &rest[open + 1..];
        let close = placeholder_end(after)
            .ok_or_else(|| WireError::invalid_pattern(spec, "unterminated placeholder"))?;
        let placeholder = &after[..close];

        match placeholder.split_once(':') {
            Some((_, custom)) if !custom.is_empty() => {
                body.push_str("(?:");
                body.push_str(custom);
                body.push(')');
            }
            _ => body.push_str(DEFAULT_SEGMENT),
        }

        rest = &after[close + 1..];
    }
    body.push_str(&regex::escape(rest));

    Ok(body)
}

/// Fills every placeholder of a template spec with the segment `lookup`
/// returns for its name. Literal text is copied unchanged and the
/// placeholder's own expression is not checked against the value.
///
/// # Errors
///
/// Returns [`WireError::MissingRouteData`] for a placeholder `lookup` has
/// no value for, or [`WireError::InvalidPattern`] for an unterminated one.
///
/// # Example
///
/// ```
/// use wirebind_pattern::expand_template;
///
/// let path = expand_template("/users/{id:\\d+}/", |name| {
///     (name == "id").then(|| "42".to_string())
/// })
/// .unwrap();
/// assert_eq!(path, "/users/42/");
/// ```
pub fn expand_template<F>(spec: &str, mut lookup: F) -> WireResult<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut path = String::with_capacity(spec.len());
    let mut rest = spec;

    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);

        let after = &rest[open + 1..];
        let close = placeholder_end(after)
            .ok_or_else(|| WireError::invalid_pattern(spec, "unterminated placeholder"))?;
        let name = after[..close]
            .split_once(':')
            .map_or(&after[..close], |(name, _)| name)
            .trim();

        let segment = lookup(name).ok_or_else(|| WireError::missing_route_data(spec, name))?;
        path.push_str(&segment);

        rest = &after[close + 1..];
    }
    path.push_str(rest);

    Ok(path)
}

/// Finds the `}` closing a placeholder, allowing balanced braces inside a
/// custom expression such as `{year:\d{4}}`.
fn placeholder_end(text: &str) -> Option<usize> {
    let mut depth = 0_usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// A list of exact-match patterns; the empty list matches nothing.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<PathPattern>,
}

impl ExclusionSet {
    /// Compiles every spec with exact semantics.
    ///
    /// # Errors
    ///
    /// Returns the first compilation error.
    pub fn compile<I, S>(specs: I) -> WireResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = specs
            .into_iter()
            .map(|spec| PathPattern::compile(spec.as_ref(), false))
            .collect::<WireResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Returns `true` if any pattern matches `path`.
    #[must_use]
    pub fn excludes(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }

    /// Returns the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if there are no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
