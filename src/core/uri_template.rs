/// URI Template Matching
///
/// Resource templates such as `greeting://{name}` are split into literal text
/// and named placeholders. A placeholder greedily captures one or more
/// characters other than `/`, and the whole URI must be consumed.

use std::collections::HashMap;

use crate::core::error::TemplateError;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed URI template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parse a template string.
    ///
    /// Placeholders must be named and must be separated by literal text,
    /// otherwise the split between them would be ambiguous.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| TemplateError::Unclosed(template.to_string()))?;
            let name = after[..close].trim();
            if name.is_empty() {
                return Err(TemplateError::EmptyName(template.to_string()));
            }
            if matches!(segments.last(), Some(Segment::Param(_))) {
                return Err(TemplateError::AdjacentPlaceholders(template.to_string()));
            }
            segments.push(Segment::Param(name.to_string()));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a concrete URI, returning the captured parameters.
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        self.match_from(0, uri, &mut params).then_some(params)
    }

    /// Match `rest` against the segments starting at `index`.
    ///
    /// Placeholders are greedy: the longest capture that still lets the
    /// remaining segments match wins. Captures never contain '/'.
    fn match_from(&self, index: usize, rest: &str, params: &mut HashMap<String, String>) -> bool {
        let Some(segment) = self.segments.get(index) else {
            return rest.is_empty();
        };

        match segment {
            Segment::Literal(text) => rest
                .strip_prefix(text.as_str())
                .is_some_and(|tail| self.match_from(index + 1, tail, params)),
            Segment::Param(name) => {
                let limit = rest.find('/').unwrap_or(rest.len());
                for end in (1..=limit).rev().filter(|end| rest.is_char_boundary(*end)) {
                    if self.match_from(index + 1, &rest[end..], params) {
                        params.insert(name.clone(), rest[..end].to_string());
                        return true;
                    }
                }
                false
            }
        }
    }
}
