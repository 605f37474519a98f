use super::*;
use std::io::Write;

#[test]
fn missing_policy_path_uses_defaults() {
    let policy = load_policy(None).expect("policy");
    assert_eq!(policy, ValidationPolicy::default());
}

#[test]
fn policy_file_overrides_only_given_keys() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        "password_min_chars = 12\nemail_deny_list = [\"blocked@example.com\"]"
    )
    .expect("write");

    let policy = load_policy(Some(file.path())).expect("policy");
    assert_eq!(policy.password_min_chars, 12);
    assert_eq!(policy.email_deny_list, vec!["blocked@example.com"]);
    assert_eq!(policy.name_min_chars, ValidationPolicy::default().name_min_chars);
}

#[test]
fn unreadable_policy_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(load_policy(Some(dir.path().join("absent.toml").as_path())).is_err());
}

#[test]
fn report_lines_name_the_field() {
    let mut report = ErrorReport::new();
    report.push(FormField::Email, "Invalid email format");
    report.push(FormField::Password, "Password is required");

    let lines = render_report(&report);
    assert!(lines.contains(&"email: Invalid email format".to_string()));
    assert!(lines.contains(&"password: Password is required".to_string()));
}

#[test]
fn cli_parses_sign_up_flags() {
    let args = Args::try_parse_from([
        "signup_cli",
        "--server-url",
        "http://localhost:4000/",
        "sign-up",
        "--first-name",
        "Jo",
        "--last-name",
        "Li",
        "--email",
        "jo@example.com",
        "--password",
        "Abcdef1!",
        "--accept-terms",
    ])
    .expect("parse");

    assert_eq!(args.server_url.as_str(), "http://localhost:4000/");
    match args.command {
        Command::SignUp {
            accept_terms,
            confirm_password,
            timeout_secs,
            ..
        } => {
            assert!(accept_terms);
            assert!(confirm_password.is_none());
            assert_eq!(timeout_secs, 10);
        }
        Command::SignIn { .. } => panic!("expected sign-up"),
    }
}

#[test]
fn cli_rejects_malformed_server_url() {
    let parsed = Args::try_parse_from([
        "signup_cli",
        "--server-url",
        "not a url",
        "sign-in",
        "--email",
        "jo@example.com",
        "--password",
        "secret1",
    ]);
    assert!(parsed.is_err());
}
