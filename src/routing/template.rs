//! Path template parsing and matching.
//!
//! # Responsibilities
//! - Tokenize `users/{id}/files/{proxy+}` into literal / placeholder parts
//! - Render the router form (`/users/:id/files/:proxy*`)
//! - Match a request path and capture placeholder values
//!
//! # Design Decisions
//! - Every placeholder is rewritten, not only the first
//! - A template always renders with exactly one leading `/`
//! - Matching is case-sensitive and segment-based; no regex
//! - A trailing `/` on the request path is ignored

use std::collections::HashMap;

/// One token of a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Literal(String),
    /// `{name}`: one non-empty piece of a segment.
    Param(String),
    /// `{name+}`: the rest of the path; only valid as the final segment.
    Greedy(String),
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    segments: Vec<Vec<Part>>,
}

impl PathTemplate {
    /// Parse a template. Never fails: unbalanced braces are kept as literal text.
    pub fn parse(template: &str) -> Self {
        let trimmed = template.trim().trim_start_matches('/');
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Self { segments: Vec::new() };
        }

        let raw: Vec<&str> = trimmed.split('/').collect();
        let last = raw.len() - 1;
        let segments = raw
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                let mut parts = tokenize(segment);
                if i != last || parts.len() != 1 {
                    for part in parts.iter_mut() {
                        if let Part::Greedy(name) = part {
                            *part = Part::Param(std::mem::take(name));
                        }
                    }
                }
                parts
            })
            .collect();

        Self { segments }
    }

    /// Router form of the template, e.g. `/users/:id`.
    pub fn route_path(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            for part in segment {
                match part {
                    Part::Literal(text) => out.push_str(text),
                    Part::Param(name) => {
                        out.push(':');
                        out.push_str(name);
                    }
                    Part::Greedy(name) => {
                        out.push(':');
                        out.push_str(name);
                        out.push('*');
                    }
                }
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }

    /// Placeholder names in template order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .flatten()
            .filter_map(|part| match part {
                Part::Param(name) | Part::Greedy(name) => Some(name.as_str()),
                Part::Literal(_) => None,
            })
            .collect()
    }

    /// Match a request path, returning decoded placeholder values.
    pub fn capture(&self, path: &str) -> Option<HashMap<String, String>> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let request: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        let mut captured = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if let [Part::Greedy(name)] = segment.as_slice() {
                let rest = request.get(i..).filter(|rest| !rest.is_empty())?;
                captured.push((name.clone(), decode(&rest.join("/"))));
                return Some(captured.into_iter().collect());
            }
            let text = request.get(i)?;
            if !match_parts(segment, text, &mut captured) {
                return None;
            }
        }

        (request.len() == self.segments.len()).then(|| captured.into_iter().collect())
    }
}

fn tokenize(segment: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = segment;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else { break };
        let name = &after[..close];
        if name.is_empty() || name.contains('{') {
            literal.push_str(&rest[..open + 1]);
            rest = after;
            continue;
        }

        literal.push_str(&rest[..open]);
        if !literal.is_empty() {
            parts.push(Part::Literal(std::mem::take(&mut literal)));
        }
        parts.push(match name.strip_suffix('+') {
            Some(greedy) if !greedy.is_empty() => Part::Greedy(greedy.to_string()),
            _ => Part::Param(name.to_string()),
        });
        rest = &after[close + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    parts
}

fn match_parts(parts: &[Part], text: &str, out: &mut Vec<(String, String)>) -> bool {
    let Some((first, rest)) = parts.split_first() else {
        return text.is_empty();
    };

    match first {
        Part::Literal(literal) => text
            .strip_prefix(literal.as_str())
            .is_some_and(|remaining| match_parts(rest, remaining, out)),
        Part::Param(name) | Part::Greedy(name) => match rest.first() {
            None if !text.is_empty() => {
                out.push((name.clone(), decode(text)));
                true
            }
            Some(Part::Literal(next)) => {
                for (idx, _) in text.match_indices(next.as_str()).filter(|(idx, _)| *idx > 0) {
                    let mark = out.len();
                    out.push((name.clone(), decode(&text[..idx])));
                    if match_parts(rest, &text[idx..], out) {
                        return true;
                    }
                    out.truncate(mark);
                }
                false
            }
            _ => false,
        },
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
