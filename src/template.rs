//! Template assembler
//!
//! Artifacts are produced by substituting named `{{TOKEN}}` placeholders into
//! a shared template document. Substitution is first-match in a fixed order,
//! textual and non-recursive: a substituted value is never re-scanned for
//! placeholders.
//!
//! After substitution the *original* template is re-scanned and every token
//! it contained must be gone from the output; a surviving token is a fatal
//! build error, never shipped silently.

use crate::config::Brand;
use crate::error::{SimpackError, SimpackResult};

/// Scan a document for `{{TOKEN}}` placeholders, deduplicated in first-seen order
///
/// Token names are `A-Z a-z 0-9 _ . -`; anything else ends the scan for that
/// candidate without producing a token.
pub fn find_placeholders(document: &str) -> Vec<String> {
    let bytes = document.as_bytes();
    let mut tokens: Vec<String> = Vec::new();
    let mut i = 0;

    while i + 4 <= bytes.len() {
        if &bytes[i..i + 2] != b"{{" {
            i += 1;
            continue;
        }
        let start = i + 2;
        let mut end = start;
        while end < bytes.len()
            && (bytes[end].is_ascii_alphanumeric() || matches!(bytes[end], b'_' | b'.' | b'-'))
        {
            end += 1;
        }
        if end > start && end + 2 <= bytes.len() && &bytes[end..end + 2] == b"}}" {
            let token = &document[start..end];
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
            i = end + 2;
        } else {
            i += 1;
        }
    }
    tokens
}

/// Replace the first occurrence of `{{name}}` with `value`
///
/// Returns the input unchanged when the placeholder does not occur.
pub fn replace_first(document: &str, name: &str, value: &str) -> String {
    let pattern = format!("{{{{{}}}}}", name);
    match document.find(&pattern) {
        Some(idx) => {
            let mut out = String::with_capacity(document.len() + value.len());
            out.push_str(&document[..idx]);
            out.push_str(value);
            out.push_str(&document[idx + pattern.len()..]);
            out
        }
        None => document.to_string(),
    }
}

/// Substitutes values into a template and verifies no token leaks
#[derive(Debug, Clone)]
pub struct TemplateAssembler {
    template: String,
    substitutions: Vec<(String, String)>,
}

impl TemplateAssembler {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            substitutions: Vec::new(),
        }
    }

    /// Register a substitution; order of first registration is the
    /// application order. Re-registering a name replaces its value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.substitutions.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.substitutions.push((name, value)),
        }
        self
    }

    /// Produce the finished document, verifying the output is token-free
    pub fn assemble(&self) -> SimpackResult<String> {
        self.assemble_keeping(&[])
    }

    /// Produce a partially-resolved document, leaving `keep` tokens in place
    ///
    /// Used for the string-template variant handed to translation tooling.
    /// Tokens outside `keep` must still not survive.
    pub fn assemble_keeping(&self, keep: &[&str]) -> SimpackResult<String> {
        let mut output = self.template.clone();
        for (name, value) in &self.substitutions {
            if keep.contains(&name.as_str()) {
                continue;
            }
            output = replace_first(&output, name, value);
        }

        for token in find_placeholders(&self.template) {
            if keep.contains(&token.as_str()) {
                continue;
            }
            let pattern = format!("{{{{{}}}}}", token);
            if output.contains(&pattern) {
                return Err(SimpackError::PlaceholderLeak { token: pattern });
            }
        }
        Ok(output)
    }
}

/// Legal header embedded at the top of every artifact, by brand
pub fn legal_header(brand: Brand, title: &str, version: &str, license: &str) -> String {
    match brand {
        Brand::Standard => format!(
            "{title} {version}\n\
             Licensed under {license}\n\
             For licenses of third-party resources embedded in this file, see below.",
        ),
        Brand::Interop => format!(
            "{title} {version}\n\
             This interoperable build requires a separate license agreement.\n\
             Use without a license agreement is strictly prohibited.",
        ),
    }
}
