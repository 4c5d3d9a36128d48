//! Path template compilation and segment matching.
//!
//! A template such as `/pets/{petId}/photos` is split on `/` into segments.
//! Each segment is either a literal, compared byte-for-byte against the
//! request segment, or a placeholder spanning the whole segment, which
//! captures any single non-empty request segment.
//!
//! No normalisation is applied: `/pets/` and `/pets` have a different number
//! of segments and therefore never match each other.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::params::Params;

/// Errors raised while compiling a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template does not start with `/`.
    #[error("path template '{template}' must start with '/'")]
    MissingLeadingSlash {
        /// The offending template.
        template: String,
    },

    /// A segment contains an opening brace without a closing one (or vice versa).
    #[error("path template '{template}' has unbalanced braces in segment '{segment}'")]
    UnbalancedBrace {
        /// The offending template.
        template: String,
        /// The segment containing the brace.
        segment: String,
    },

    /// A placeholder has no name (`{}`).
    #[error("path template '{template}' contains an empty placeholder")]
    EmptyPlaceholder {
        /// The offending template.
        template: String,
    },

    /// A placeholder shares its segment with literal text (`/files/{name}.json`).
    #[error(
        "path template '{template}': placeholder in segment '{segment}' must span the whole segment"
    )]
    PartialSegment {
        /// The offending template.
        template: String,
        /// The mixed segment.
        segment: String,
    },

    /// The same placeholder name appears twice.
    #[error("path template '{template}' declares placeholder '{name}' more than once")]
    DuplicatePlaceholder {
        /// The offending template.
        template: String,
        /// The repeated name.
        name: String,
    },
}

/// One compiled template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Captures the request segment under this name.
    Placeholder(String),
}

/// A compiled path template.
///
/// # Example
///
/// ```rust
/// use kanon_router::PathTemplate;
///
/// let template = PathTemplate::parse("/pets/{petId}").unwrap();
/// assert_eq!(template.placeholder_count(), 1);
///
/// let params = template.matches("/pets/42").unwrap();
/// assert_eq!(params.get("petId"), Some("42"));
///
/// assert!(template.matches("/pets/42/").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    placeholders: usize,
}

impl PathTemplate {
    /// Compiles a template.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let Some(rest) = template.strip_prefix('/') else {
            return Err(TemplateError::MissingLeadingSlash {
                template: template.to_string(),
            });
        };

        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();

        for segment in rest.split('/') {
            let opens = segment.matches('{').count();
            let closes = segment.matches('}').count();

            if opens == 0 && closes == 0 {
                segments.push(Segment::Literal(segment.to_string()));
                continue;
            }
            if opens != closes {
                return Err(TemplateError::UnbalancedBrace {
                    template: template.to_string(),
                    segment: segment.to_string(),
                });
            }

            let name = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .filter(|name| !name.contains(['{', '}']))
                .ok_or_else(|| TemplateError::PartialSegment {
                    template: template.to_string(),
                    segment: segment.to_string(),
                })?;

            if name.is_empty() {
                return Err(TemplateError::EmptyPlaceholder {
                    template: template.to_string(),
                });
            }
            if names.contains(&name) {
                return Err(TemplateError::DuplicatePlaceholder {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }

            names.push(name);
            segments.push(Segment::Placeholder(name.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            placeholders: names.len(),
            segments,
        })
    }

    /// The template text as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Compiled segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of placeholder segments. Lower is more specific.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Placeholder names in template order.
    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a concrete request path, returning the decoded captures.
    ///
    /// The path must not carry a query string.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;

        let mut params = Params::with_capacity(self.placeholders);
        let mut request_segments = rest.split('/');

        for segment in &self.segments {
            let actual = request_segments.next()?;
            match segment {
                Segment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                Segment::Placeholder(name) => {
                    if actual.is_empty() {
                        return None;
                    }
                    params.push(name.as_str(), decode_segment(actual)?);
                }
            }
        }

        if request_segments.next().is_some() {
            return None;
        }
        Some(params)
    }
}

fn decode_segment(segment: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(segment).decode_utf8().ok()
}
