use std::{collections::BTreeMap, fmt};

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

use crate::error::FieldError;

/// Input fields of the sign-up form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    FirstName,
    LastName,
    Email,
    Password,
    ConfirmPassword,
    AcceptTerms,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::Email,
        FormField::Password,
        FormField::ConfirmPassword,
        FormField::AcceptTerms,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormField::FirstName => "firstName",
            FormField::LastName => "lastName",
            FormField::Email => "email",
            FormField::Password => "password",
            FormField::ConfirmPassword => "confirmPassword",
            FormField::AcceptTerms => "acceptTerms",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// Current values of the sign-up form. `Default` is the empty initial form.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

impl FormFields {
    /// Text value of `field`, or `None` for the terms flag.
    pub fn text(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::FirstName => Some(&self.first_name),
            FormField::LastName => Some(&self.last_name),
            FormField::Email => Some(&self.email),
            FormField::Password => Some(&self.password),
            FormField::ConfirmPassword => Some(&self.confirm_password),
            FormField::AcceptTerms => None,
        }
    }

    pub fn set(&mut self, field: FormField, value: FieldValue) -> Result<(), FieldError> {
        match (field, value) {
            (FormField::AcceptTerms, FieldValue::Flag(checked)) => self.accept_terms = checked,
            (FormField::AcceptTerms, FieldValue::Text(_)) => {
                return Err(FieldError::TypeMismatch {
                    field,
                    expected: "flag",
                })
            }
            (_, FieldValue::Flag(_)) => {
                return Err(FieldError::TypeMismatch {
                    field,
                    expected: "text",
                })
            }
            (FormField::FirstName, FieldValue::Text(v)) => self.first_name = v,
            (FormField::LastName, FieldValue::Text(v)) => self.last_name = v,
            (FormField::Email, FieldValue::Text(v)) => self.email = v,
            (FormField::Password, FieldValue::Text(v)) => self.password = v,
            (FormField::ConfirmPassword, FieldValue::Text(v)) => self.confirm_password = v,
        }
        Ok(())
    }
}

impl fmt::Debug for FormFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormFields")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .field("accept_terms", &self.accept_terms)
            .finish()
    }
}

/// Key of an [`ErrorReport`] entry: a form field or the synthetic `general` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKey {
    Field(FormField),
    General,
}

impl ErrorKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKey::Field(field) => field.as_str(),
            ErrorKey::General => "general",
        }
    }
}

impl From<FormField> for ErrorKey {
    fn from(field: FormField) -> Self {
        ErrorKey::Field(field)
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field feedback. A key is present only while that field is invalid.
///
/// Every violated rule's message is kept in rule order. The message shown to
/// the user is the last one, which is what [`ErrorReport::message`] returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    entries: BTreeMap<ErrorKey, Vec<String>>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn general(message: impl Into<String>) -> Self {
        let mut report = Self::new();
        report.push(ErrorKey::General, message);
        report
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: impl Into<ErrorKey>) -> bool {
        self.entries.contains_key(&key.into())
    }

    pub fn message(&self, key: impl Into<ErrorKey>) -> Option<&str> {
        self.entries
            .get(&key.into())
            .and_then(|messages| messages.last())
            .map(String::as_str)
    }

    pub fn messages(&self, key: impl Into<ErrorKey>) -> &[String] {
        self.entries
            .get(&key.into())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn push(&mut self, key: impl Into<ErrorKey>, message: impl Into<String>) {
        self.entries
            .entry(key.into())
            .or_default()
            .push(message.into());
    }

    /// Removes the entry for `key`, returning whether one was present.
    pub fn clear(&mut self, key: impl Into<ErrorKey>) -> bool {
        self.entries.remove(&key.into()).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = ErrorKey> + '_ {
        self.entries.keys().copied()
    }

    /// Displayed message per key.
    pub fn iter(&self) -> impl Iterator<Item = (ErrorKey, &str)> + '_ {
        self.entries
            .iter()
            .filter_map(|(key, messages)| messages.last().map(|m| (*key, m.as_str())))
    }
}

impl Serialize for ErrorReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, message) in self.iter() {
            map.serialize_entry(key.as_str(), message)?;
        }
        map.end()
    }
}
