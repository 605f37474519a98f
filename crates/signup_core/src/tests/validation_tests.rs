use super::*;
use crate::types::ErrorKey;

fn valid_fields() -> FormFields {
    FormFields {
        first_name: "Jo".to_string(),
        last_name: "Li".to_string(),
        email: "jo@test.com".to_string(),
        password: "Abcdef1!".to_string(),
        confirm_password: "Abcdef1!".to_string(),
        accept_terms: true,
    }
}

#[test]
fn valid_form_produces_empty_report() {
    let rules = ValidationRuleSet::default();
    let report = rules.validate(&valid_fields());
    assert!(report.is_empty(), "unexpected errors: {report:?}");
}

#[test]
fn names_with_inner_spaces_hyphens_and_apostrophes_are_valid() {
    let rules = ValidationRuleSet::default();
    let mut fields = valid_fields();
    fields.first_name = "  Mary-Jane ".to_string();
    fields.last_name = "O'Neil Smith".to_string();
    assert!(rules.validate(&fields).is_empty());
}

#[test]
fn every_password_shorter_than_eight_chars_is_reported() {
    let rules = ValidationRuleSet::default();
    let full = "Abcdef1!";
    for len in 0..8 {
        let mut fields = valid_fields();
        fields.password = full.chars().take(len).collect();
        fields.confirm_password = fields.password.clone();
        let report = rules.validate(&fields);
        assert!(
            report.contains(FormField::Password),
            "password of length {len} should be rejected"
        );
    }
}

#[test]
fn deny_listed_email_is_rejected_in_any_case() {
    let rules = ValidationRuleSet::default();
    for email in ["test@test.com", "TEST@Test.COM", "  Test@test.com "] {
        let mut fields = valid_fields();
        fields.email = email.to_string();
        let report = rules.validate(&fields);
        assert_eq!(
            report.message(FormField::Email),
            Some("This email address cannot be used"),
            "{email} should be denied"
        );
        assert_eq!(report.len(), 1);
    }
}

#[test]
fn deny_listed_email_is_reported_alongside_other_failures() {
    let rules = ValidationRuleSet::default();
    let fields = FormFields {
        email: "TEST@TEST.COM".to_string(),
        ..FormFields::default()
    };
    let report = rules.validate(&fields);
    assert!(report.contains(FormField::Email));
    assert!(report.contains(FormField::FirstName));
}

#[test]
fn malformed_email_reports_format() {
    let rules = ValidationRuleSet::default();
    for email in ["jo", "jo@test", "jo @test.com", "@test.com"] {
        let mut fields = valid_fields();
        fields.email = email.to_string();
        assert_eq!(
            rules.validate(&fields).message(FormField::Email),
            Some("Invalid email format"),
            "{email}"
        );
    }
}

#[test]
fn last_failing_password_rule_is_displayed_and_all_are_kept() {
    let rules = ValidationRuleSet::default();
    let mut fields = valid_fields();
    fields.password = "abcdefgh".to_string();
    fields.confirm_password = "abcdefgh".to_string();

    let report = rules.validate(&fields);
    assert_eq!(
        report.messages(FormField::Password),
        [
            "Password must contain an uppercase letter".to_string(),
            "Password must contain a number".to_string(),
            format!("Password must contain a symbol ({DEFAULT_PASSWORD_SYMBOLS})"),
        ]
    );
    assert_eq!(
        report.message(FormField::Password),
        Some(format!("Password must contain a symbol ({DEFAULT_PASSWORD_SYMBOLS})").as_str())
    );
}

#[test]
fn empty_field_reports_only_required_message() {
    let rules = ValidationRuleSet::default();
    let mut fields = valid_fields();
    fields.password = "   ".to_string();
    fields.first_name = String::new();

    let report = rules.validate(&fields);
    assert_eq!(
        report.messages(FormField::Password),
        ["Password is required".to_string()]
    );
    assert_eq!(
        report.messages(FormField::FirstName),
        ["First name is required".to_string()]
    );
}

#[test]
fn mismatched_confirmation_is_reported() {
    let rules = ValidationRuleSet::default();
    let mut fields = valid_fields();
    fields.confirm_password = "Abcdef1?".to_string();

    let report = rules.validate(&fields);
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.message(FormField::ConfirmPassword),
        Some("Passwords do not match")
    );
}

#[test]
fn confirmation_compares_bytes_exactly() {
    let rules = ValidationRuleSet::default();
    let mut fields = valid_fields();
    fields.confirm_password = "Abcdef1! ".to_string();
    assert!(rules.validate(&fields).contains(FormField::ConfirmPassword));
}

#[test]
fn terms_must_be_accepted() {
    let rules = ValidationRuleSet::default();
    let mut fields = valid_fields();
    fields.accept_terms = false;
    assert_eq!(
        rules.validate(&fields).message(FormField::AcceptTerms),
        Some("You must accept the terms and conditions")
    );
}

#[test]
fn names_are_checked_for_length_and_characters() {
    let rules = ValidationRuleSet::default();
    let mut fields = valid_fields();
    fields.first_name = "J".to_string();
    fields.last_name = "L1".to_string();

    let report = rules.validate(&fields);
    assert_eq!(
        report.message(FormField::FirstName),
        Some("First name must be at least 2 characters")
    );
    assert_eq!(
        report.message(FormField::LastName),
        Some("Last name may only contain letters, spaces, hyphens and apostrophes")
    );
}

#[test]
fn every_field_is_checked_independently() {
    let rules = ValidationRuleSet::default();
    let report = rules.validate(&FormFields::default());
    let keys: Vec<ErrorKey> = report.keys().collect();
    assert_eq!(
        keys,
        FormField::ALL.into_iter().map(ErrorKey::from).collect::<Vec<_>>()
    );
    assert!(!report.contains(ErrorKey::General));
}

#[test]
fn validation_is_deterministic() {
    let rules = ValidationRuleSet::default();
    let mut fields = valid_fields();
    fields.email = "nope".to_string();
    assert_eq!(rules.validate(&fields), rules.validate(&fields));
}

#[test]
fn policy_loads_from_toml_with_defaults() {
    let policy: ValidationPolicy = toml::from_str(
        r#"
        password_min_chars = 12
        email_deny_list = ["Blocked@Example.com"]
        "#,
    )
    .expect("policy");
    assert_eq!(policy.name_min_chars, 2);
    assert_eq!(policy.password_symbols, DEFAULT_PASSWORD_SYMBOLS);

    let rules = ValidationRuleSet::new(&policy);
    let mut fields = valid_fields();
    let report = rules.validate(&fields);
    assert_eq!(
        report.message(FormField::Password),
        Some("Password must be at least 12 characters")
    );

    fields.password = "Abcdefghij1!".to_string();
    fields.confirm_password = fields.password.clone();
    fields.email = "blocked@example.com".to_string();
    let report = rules.validate(&fields);
    assert_eq!(report.keys().collect::<Vec<_>>(), [ErrorKey::Field(FormField::Email)]);
}

#[test]
fn rules_are_grouped_per_field_in_order() {
    let rules = ValidationRuleSet::default();
    let password_rules: Vec<&Rule> = rules.rules_for(FormField::Password).collect();
    assert_eq!(password_rules.len(), 6);
    assert!(matches!(password_rules[0].check, RuleCheck::Required));
    assert!(matches!(password_rules[1].check, RuleCheck::MinChars(8)));
}

#[test]
fn sign_in_requires_email_and_password() {
    let report = validate_sign_in("  ", "");
    assert_eq!(report.message(FormField::Email), Some("Please enter your email"));
    assert_eq!(
        report.message(FormField::Password),
        Some("Please enter your password")
    );
}

#[test]
fn sign_in_rejects_short_password() {
    let report = validate_sign_in("jo@test.com", "abc");
    assert!(!report.contains(FormField::Email));
    assert_eq!(
        report.message(FormField::Password),
        Some("Password must be at least 6 characters")
    );
    assert!(validate_sign_in("jo@test.com", "abcdef").is_empty());
}
