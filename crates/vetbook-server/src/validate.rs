//! Request-body validation helpers.
//!
//! Bodies deserialize leniently (everything optional), then each handler
//! checks the fields it needs and collects per-field violations into one
//! `VALIDATION_ERROR` response.

use serde_json::json;

use crate::error::ApiError;

/// Accumulates `{field, message}` violations for one request.
#[derive(Debug, Default)]
pub struct Violations(Vec<serde_json::Value>);

impl Violations {
  pub fn new() -> Self {
    Violations::default()
  }

  pub fn add(&mut self, field: &str, message: &str) {
    self.0.push(json!({ "field": field, "message": message }));
  }

  /// Require a non-blank string field; returns the trimmed value when
  /// present.
  pub fn require_str<'a>(
    &mut self,
    field: &str,
    value: Option<&'a str>,
  ) -> Option<&'a str> {
    match value.map(str::trim) {
      Some(v) if !v.is_empty() => Some(v),
      _ => {
        self.add(field, "is required");
        None
      }
    }
  }

  /// Err with all collected violations, or Ok if there were none.
  pub fn finish(self) -> Result<(), ApiError> {
    if self.0.is_empty() {
      Ok(())
    } else {
      Err(ApiError::Validation(self.0))
    }
  }
}

/// Minimal shape check for an email address. Not RFC-grade on purpose;
/// anything with a local part and a dotted domain passes.
pub fn looks_like_email(value: &str) -> bool {
  match value.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    }
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_shapes() {
    assert!(looks_like_email("ana@vet.example"));
    assert!(!looks_like_email("ana"));
    assert!(!looks_like_email("@vet.example"));
    assert!(!looks_like_email("ana@nodot"));
  }

  #[test]
  fn violations_collect_and_finish() {
    let mut v = Violations::new();
    assert_eq!(v.require_str("name", Some("  Ana ")), Some("Ana"));
    assert_eq!(v.require_str("email", Some("   ")), None);
    assert_eq!(v.require_str("phone", None), None);
    let err = v.finish().unwrap_err();
    match err {
      ApiError::Validation(details) => assert_eq!(details.len(), 2),
      other => panic!("expected validation error, got {other:?}"),
    }
  }
}
