//! Per-column validation rules from the entity document.

use crate::config::ValidationRule;
use crate::error::FieldError;
use regex::Regex;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Check one non-null value against its column rule. Returns every violated constraint.
    pub fn check(col: &str, v: &Value, rule: &ValidationRule) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if v.is_null() {
            return errors;
        }
        if let Some(format) = &rule.format {
            if let Some(e) = check_format(col, v, format) {
                errors.push(e);
            }
        }
        if let Some(s) = v.as_str() {
            let len = s.chars().count();
            if let Some(max) = rule.max_length {
                if len > max as usize {
                    errors.push(FieldError::new(col, format!("must be at most {} characters", max)));
                }
            }
            if let Some(min) = rule.min_length {
                if len < min as usize {
                    errors.push(FieldError::new(col, format!("must be at least {} characters", min)));
                }
            }
            if let Some(pattern) = &rule.pattern {
                match Regex::new(pattern) {
                    Ok(re) if !re.is_match(s) => {
                        errors.push(FieldError::new(col, "does not match required pattern"));
                    }
                    Ok(_) => {}
                    Err(_) => errors.push(FieldError::new(col, "invalid pattern")),
                }
            }
        }
        if let Some(allowed) = &rule.allowed {
            if !allowed.iter().any(|a| value_eq(v, a)) {
                errors.push(FieldError::new(
                    col,
                    format!("must be one of: {:?}", allowed.iter().take(5).collect::<Vec<_>>()),
                ));
            }
        }
        if let Some(n) = v.as_f64() {
            if let Some(min) = rule.minimum {
                if n < min {
                    errors.push(FieldError::new(col, format!("must be at least {}", min)));
                }
            }
            if let Some(max) = rule.maximum {
                if n > max {
                    errors.push(FieldError::new(col, format!("must be at most {}", max)));
                }
            }
        }
        errors
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn check_format(col: &str, v: &Value, format: &str) -> Option<FieldError> {
    let s = v.as_str()?;
    match format.to_lowercase().as_str() {
        "email" => {
            let valid = s.len() >= 3
                && s.split_once('@').is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
            (!valid).then(|| FieldError::new(col, "must be a valid email"))
        }
        "uuid" => uuid::Uuid::parse_str(s)
            .is_err()
            .then(|| FieldError::new(col, "must be a valid UUID")),
        _ => None,
    }
}
