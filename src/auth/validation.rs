use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{LoginRequest, RegisterRequest};

/// Field name -> human readable complaint.
pub type FieldErrors = BTreeMap<&'static str, String>;

const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=30;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 6..=30;

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: FieldErrors,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, field: &'static str, msg: &str) {
        self.errors.insert(field, msg.to_string());
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn check_email(report: &mut ValidationReport, email: &str) {
    if is_blank(email) {
        report.fail("email", "Email field is required");
    } else if !is_valid_email(email.trim()) {
        report.fail("email", "Email is invalid");
    }
}

pub fn validate_register(input: &RegisterRequest) -> ValidationReport {
    let mut report = ValidationReport::default();

    if is_blank(&input.name) {
        report.fail("name", "Name field is required");
    } else if !NAME_LEN.contains(&input.name.trim().chars().count()) {
        report.fail("name", "Name must be between 2 and 30 characters");
    }

    check_email(&mut report, &input.email);

    if input.password.is_empty() {
        report.fail("password", "Password field is required");
    } else if !PASSWORD_LEN.contains(&input.password.chars().count()) {
        report.fail("password", "Password must be between 6 and 30 characters");
    }

    if input.password_confirm.is_empty() {
        report.fail("passwordConfirm", "Confirm Password field is required");
    } else if input.password_confirm != input.password {
        report.fail("passwordConfirm", "Passwords must match");
    }

    report
}

pub fn validate_login(input: &LoginRequest) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_email(&mut report, &input.email);
    if input.password.is_empty() {
        report.fail("password", "Password field is required");
    }
    report
}
