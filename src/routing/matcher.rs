//! Path template matching.
//!
//! # Responsibilities
//! - Parse a template such as `/api/builds/:id` into literal and placeholder segments
//! - Match an incoming path segment by segment
//! - Capture placeholder values by name
//!
//! # Design Decisions
//! - Segment counts must be equal; no prefix or catch-all matching
//! - Literal segments are compared character for character (case-sensitive)
//! - A placeholder matches exactly one non-empty segment
//! - One trailing slash is ignored on both templates and paths
//! - No regex to guarantee O(segments) matching

use std::collections::HashMap;

use thiserror::Error;

/// Prefix marking a placeholder segment.
pub const PLACEHOLDER: char = ':';

/// Error raised while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route `{template}` has an unnamed placeholder")]
    EmptyPlaceholder { template: String },

    #[error("route `{template}` repeats placeholder `{name}`")]
    DuplicatePlaceholder { template: String, name: String },
}

/// Captured placeholder values, keyed by placeholder name.
pub type Params = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template, rejecting empty or repeated placeholder names.
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let raw = normalize(template).to_string();
        let mut segments = Vec::new();

        for part in split(&raw) {
            match part.strip_prefix(PLACEHOLDER) {
                Some("") => {
                    return Err(RouteError::EmptyPlaceholder { template: raw.clone() });
                }
                Some(name) => {
                    let taken = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Placeholder(n) if n == name));
                    if taken {
                        return Err(RouteError::DuplicatePlaceholder {
                            template: raw.clone(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self { raw, segments })
    }

    /// The template as registered (after trailing slash normalization).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match `path`, returning the captured placeholders on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = split(normalize(path)).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Placeholder(_) if part.is_empty() => return None,
                Segment::Placeholder(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

/// Strip a single trailing slash, keeping the root path intact.
fn normalize(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}
