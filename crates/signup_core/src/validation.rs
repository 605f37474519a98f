use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{ErrorReport, FormField, FormFields};

lazy_static! {
    static ref NAME_PATTERN: Regex = Regex::new(r"^[A-Za-z '\-]+$").unwrap();
    static ref EMAIL_PATTERN: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub const DEFAULT_PASSWORD_SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|`~";
const SIGN_IN_PASSWORD_MIN_CHARS: usize = 6;

/// Tunable inputs of the sign-up rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub name_min_chars: usize,
    pub password_min_chars: usize,
    pub password_symbols: String,
    /// Addresses refused at sign-up, compared case-insensitively.
    pub email_deny_list: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            name_min_chars: 2,
            password_min_chars: 8,
            password_symbols: DEFAULT_PASSWORD_SYMBOLS.to_string(),
            email_deny_list: vec!["test@test.com".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharClass {
    Lowercase,
    Uppercase,
    Digit,
    Symbol(String),
}

impl CharClass {
    fn matches(&self, c: char) -> bool {
        match self {
            CharClass::Lowercase => c.is_ascii_lowercase(),
            CharClass::Uppercase => c.is_ascii_uppercase(),
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::Symbol(set) => set.contains(c),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RuleCheck {
    /// Non-empty after trimming. A failure makes the field's later rules
    /// inapplicable.
    Required,
    MinChars(usize),
    Matches(Regex),
    /// Value (lowercased) must not appear in the list.
    NotListed(Vec<String>),
    ContainsAny(CharClass),
    EqualsField(FormField),
    Checked,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub field: FormField,
    pub check: RuleCheck,
    pub message: String,
}

impl Rule {
    fn new(field: FormField, check: RuleCheck, message: impl Into<String>) -> Self {
        Self {
            field,
            check,
            message: message.into(),
        }
    }

    fn passes(&self, fields: &FormFields) -> bool {
        let value = subject(fields, self.field);
        match &self.check {
            RuleCheck::Required => !value.trim().is_empty(),
            RuleCheck::MinChars(min) => value.chars().count() >= *min,
            RuleCheck::Matches(pattern) => pattern.is_match(value),
            RuleCheck::NotListed(denied) => {
                let lowered = value.to_lowercase();
                !denied.iter().any(|entry| *entry == lowered)
            }
            RuleCheck::ContainsAny(class) => value.chars().any(|c| class.matches(c)),
            RuleCheck::EqualsField(other) => value == fields.text(*other).unwrap_or_default(),
            RuleCheck::Checked => fields.accept_terms,
        }
    }
}

// Passwords are compared raw; every other text field is trimmed first.
fn subject(fields: &FormFields, field: FormField) -> &str {
    let raw = fields.text(field).unwrap_or_default();
    match field {
        FormField::Password | FormField::ConfirmPassword => raw,
        _ => raw.trim(),
    }
}

/// Ordered sign-up rules. Built once from a [`ValidationPolicy`] and shared by
/// reference; validation never mutates it.
#[derive(Debug, Clone)]
pub struct ValidationRuleSet {
    rules: Vec<Rule>,
}

impl Default for ValidationRuleSet {
    fn default() -> Self {
        Self::new(&ValidationPolicy::default())
    }
}

impl ValidationRuleSet {
    pub fn new(policy: &ValidationPolicy) -> Self {
        let mut rules = Vec::new();

        for (field, label) in [
            (FormField::FirstName, "First name"),
            (FormField::LastName, "Last name"),
        ] {
            rules.push(Rule::new(
                field,
                RuleCheck::Required,
                format!("{label} is required"),
            ));
            rules.push(Rule::new(
                field,
                RuleCheck::MinChars(policy.name_min_chars),
                format!(
                    "{label} must be at least {} characters",
                    policy.name_min_chars
                ),
            ));
            rules.push(Rule::new(
                field,
                RuleCheck::Matches(NAME_PATTERN.clone()),
                format!("{label} may only contain letters, spaces, hyphens and apostrophes"),
            ));
        }

        rules.push(Rule::new(
            FormField::Email,
            RuleCheck::Required,
            "Email is required",
        ));
        rules.push(Rule::new(
            FormField::Email,
            RuleCheck::Matches(EMAIL_PATTERN.clone()),
            "Invalid email format",
        ));
        rules.push(Rule::new(
            FormField::Email,
            RuleCheck::NotListed(
                policy
                    .email_deny_list
                    .iter()
                    .map(|email| email.trim().to_lowercase())
                    .collect(),
            ),
            "This email address cannot be used",
        ));

        rules.push(Rule::new(
            FormField::Password,
            RuleCheck::Required,
            "Password is required",
        ));
        rules.push(Rule::new(
            FormField::Password,
            RuleCheck::MinChars(policy.password_min_chars),
            format!(
                "Password must be at least {} characters",
                policy.password_min_chars
            ),
        ));
        rules.push(Rule::new(
            FormField::Password,
            RuleCheck::ContainsAny(CharClass::Lowercase),
            "Password must contain a lowercase letter",
        ));
        rules.push(Rule::new(
            FormField::Password,
            RuleCheck::ContainsAny(CharClass::Uppercase),
            "Password must contain an uppercase letter",
        ));
        rules.push(Rule::new(
            FormField::Password,
            RuleCheck::ContainsAny(CharClass::Digit),
            "Password must contain a number",
        ));
        rules.push(Rule::new(
            FormField::Password,
            RuleCheck::ContainsAny(CharClass::Symbol(policy.password_symbols.clone())),
            format!(
                "Password must contain a symbol ({})",
                policy.password_symbols
            ),
        ));

        rules.push(Rule::new(
            FormField::ConfirmPassword,
            RuleCheck::Required,
            "Please confirm your password",
        ));
        rules.push(Rule::new(
            FormField::ConfirmPassword,
            RuleCheck::EqualsField(FormField::Password),
            "Passwords do not match",
        ));

        rules.push(Rule::new(
            FormField::AcceptTerms,
            RuleCheck::Checked,
            "You must accept the terms and conditions",
        ));

        Self { rules }
    }

    pub fn rules_for(&self, field: FormField) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter().filter(move |rule| rule.field == field)
    }

    /// Runs every applicable rule and reports the fields that fail. An empty
    /// report means the form is valid.
    pub fn validate(&self, fields: &FormFields) -> ErrorReport {
        let mut report = ErrorReport::new();
        let mut missing: Vec<FormField> = Vec::new();

        for rule in &self.rules {
            if missing.contains(&rule.field) || rule.passes(fields) {
                continue;
            }
            report.push(rule.field, rule.message.clone());
            if let RuleCheck::Required = rule.check {
                missing.push(rule.field);
            }
        }

        report
    }
}

/// Checks the sign-in form before credentials leave the client.
pub fn validate_sign_in(email: &str, password: &str) -> ErrorReport {
    let mut report = ErrorReport::new();

    if email.trim().is_empty() {
        report.push(FormField::Email, "Please enter your email");
    }

    if password.is_empty() {
        report.push(FormField::Password, "Please enter your password");
    } else if password.chars().count() < SIGN_IN_PASSWORD_MIN_CHARS {
        report.push(
            FormField::Password,
            format!("Password must be at least {SIGN_IN_PASSWORD_MIN_CHARS} characters"),
        );
    }

    report
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
