use std::sync::OnceLock;

use regex::Regex;

/// Accumulates field validation failures so that a request can report all of them at once.
#[derive(Debug, Default)]
pub struct FieldCheck {
    problems: Vec<String>,
}

impl FieldCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_length(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if let Err(e) = check_length(field, value, max) {
            self.problems.push(e);
        }
        self
    }

    pub fn max_length_opt(&mut self, field: &str, value: Option<&String>, max: usize) -> &mut Self {
        if let Some(v) = value {
            self.max_length(field, v, max);
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.problems.push(format!("{field}: This field may not be blank."));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_valid_email(value) {
            self.problems.push(format!("{field}: Enter a valid email address."));
        }
        self
    }

    pub fn push<S: Into<String>>(&mut self, problem: S) -> &mut Self {
        self.problems.push(problem.into());
        self
    }

    /// Returns all the collected problems joined into a single message, or `Ok` if there were none.
    pub fn finish(&self) -> Result<(), String> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(self.problems.join(" "))
        }
    }
}

pub fn check_length(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        Err(format!("{field}: Ensure this field has no more than {max} characters."))
    } else {
        Ok(())
    }
}

pub fn is_valid_email(value: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    let re = EMAIL.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
        )
        .ok()
    });
    match re {
        Some(re) => value.len() <= 254 && re.is_match(value),
        None => false,
    }
}
