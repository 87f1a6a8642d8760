use std::{fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::users::dto::NewUser;

pub const PASSWORD_MIN_LENGTH: usize = 6;

pub const ID_REQUIRED: &str = "ID is required";
pub const INVALID_EMAIL: &str = "ID must be a valid email address";
pub const INVALID_PHONE: &str = "ID must be a valid phone number";
pub const INVALID_VERSION: &str = "Invalid API version";
pub const BODY_NOT_OBJECT: &str = "User data must be an object";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PASSWORD_NOT_STRING: &str = "Password must be a string";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters long";

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[1-9][0-9]{0,15}$").unwrap();
}

/// Identifier scheme of an API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// `v1`: users are keyed by email address.
    ByEmail,
    /// `v2`: users are keyed by phone number.
    ByPhone,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 2] = [ApiVersion::ByEmail, ApiVersion::ByPhone];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::ByEmail => "v1",
            ApiVersion::ByPhone => "v2",
        }
    }

    /// Path segment used in routes, e.g. `:email`.
    pub fn id_label(self) -> &'static str {
        match self {
            ApiVersion::ByEmail => "email",
            ApiVersion::ByPhone => "phone",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ApiVersion::ByEmail => "Email-based user management",
            ApiVersion::ByPhone => "Phone-based user management",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = ValidationErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(ApiVersion::ByEmail),
            "v2" => Ok(ApiVersion::ByPhone),
            _ => Err(ValidationErrors(vec![INVALID_VERSION.to_string()])),
        }
    }
}

/// Ordered, human-readable reasons an input was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    fn push(&mut self, msg: impl Into<String>) {
        self.0.push(msg.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, msg: &str) -> bool {
        self.0.iter().any(|e| e == msg)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Drops everything except ASCII digits and `+`.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(&normalize_phone(phone))
}

pub fn validate_password(password: Option<&Value>) -> Result<&str, &'static str> {
    let password = match password {
        Some(v) if !is_falsy(v) => v,
        _ => return Err(PASSWORD_REQUIRED),
    };
    let Some(password) = password.as_str() else {
        return Err(PASSWORD_NOT_STRING);
    };
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(PASSWORD_TOO_SHORT);
    }
    Ok(password)
}

/// Checks and normalizes a bare identifier, as used by read and delete.
pub fn validate_identifier(raw: &str, version: ApiVersion) -> Result<String, ValidationErrors> {
    if raw.is_empty() {
        return Err(ValidationErrors(vec![ID_REQUIRED.to_string()]));
    }
    normalize_identifier(raw, version).map_err(|e| ValidationErrors(vec![e.to_string()]))
}

/// Checks a create payload. Identifier and password errors accumulate.
pub fn validate_record(body: &Value, version: ApiVersion) -> Result<NewUser, ValidationErrors> {
    let Some(fields) = body.as_object() else {
        return Err(ValidationErrors(vec![BODY_NOT_OBJECT.to_string()]));
    };

    let mut errors = ValidationErrors::default();

    let id = match fields.get("id") {
        None => {
            errors.push(ID_REQUIRED);
            None
        }
        Some(v) if is_falsy(v) => {
            errors.push(ID_REQUIRED);
            None
        }
        Some(v) => match v.as_str() {
            Some(raw) => match normalize_identifier(raw, version) {
                Ok(id) => Some(id),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
            None => {
                errors.push(format_error(version));
                None
            }
        },
    };

    let password = match validate_password(fields.get("password")) {
        Ok(p) => Some(p.to_owned()),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    match (id, password) {
        (Some(id), Some(password)) if errors.is_empty() => Ok(NewUser { id, password }),
        _ => Err(errors),
    }
}

fn normalize_identifier(raw: &str, version: ApiVersion) -> Result<String, &'static str> {
    match version {
        ApiVersion::ByEmail if is_valid_email(raw) => Ok(raw.trim().to_lowercase()),
        ApiVersion::ByPhone if is_valid_phone(raw) => Ok(normalize_phone(raw)),
        _ => Err(format_error(version)),
    }
}

fn format_error(version: ApiVersion) -> &'static str {
    match version {
        ApiVersion::ByEmail => INVALID_EMAIL,
        ApiVersion::ByPhone => INVALID_PHONE,
    }
}

/// JSON values a loosely typed client would treat as "not provided".
fn is_falsy(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_record_is_trimmed_and_lowercased() {
        let body = json!({"id": "  USER@Example.com ", "password": "secret1"});
        let user = validate_record(&body, ApiVersion::ByEmail).expect("valid");
        assert_eq!(user.id, "user@example.com");
        assert_eq!(user.password, "secret1");
    }

    #[test]
    fn phone_identifier_keeps_digits_and_leading_plus() {
        let id = validate_identifier("+1 (234) 567-8901", ApiVersion::ByPhone).expect("valid");
        assert_eq!(id, "+12345678901");
    }

    #[test]
    fn phone_without_plus_is_accepted() {
        assert_eq!(
            validate_identifier("234.567.8901", ApiVersion::ByPhone).unwrap(),
            "2345678901"
        );
    }

    #[test]
    fn rejects_non_email() {
        let body = json!({"id": "notanemail", "password": "secret1"});
        let errs = validate_record(&body, ApiVersion::ByEmail).unwrap_err();
        assert!(errs.contains(INVALID_EMAIL));
        assert_eq!(errs.0.len(), 1);
    }

    #[test]
    fn rejects_short_password() {
        let body = json!({"id": "user@x.com", "password": "ab"});
        let errs = validate_record(&body, ApiVersion::ByEmail).unwrap_err();
        assert!(errs.contains("Password must be at least 6 characters long"));
    }

    #[test]
    fn identifier_and_password_errors_accumulate_in_order() {
        let body = json!({"id": "12", "password": 123456});
        let errs = validate_record(&body, ApiVersion::ByEmail).unwrap_err();
        assert_eq!(errs.into_vec(), vec![INVALID_EMAIL, PASSWORD_NOT_STRING]);
    }

    #[test]
    fn missing_fields_report_required() {
        let errs = validate_record(&json!({}), ApiVersion::ByPhone).unwrap_err();
        assert_eq!(errs.into_vec(), vec![ID_REQUIRED, PASSWORD_REQUIRED]);

        let errs = validate_record(&json!({"id": "", "password": null}), ApiVersion::ByPhone)
            .unwrap_err();
        assert_eq!(errs.into_vec(), vec![ID_REQUIRED, PASSWORD_REQUIRED]);
    }

    #[test]
    fn non_string_identifier_fails_format_check() {
        let body = json!({"id": 5551234, "password": "secret1"});
        let errs = validate_record(&body, ApiVersion::ByPhone).unwrap_err();
        assert_eq!(errs.into_vec(), vec![INVALID_PHONE]);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let errs = validate_record(&json!(["a"]), ApiVersion::ByEmail).unwrap_err();
        assert_eq!(errs.into_vec(), vec![BODY_NOT_OBJECT]);
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        assert!(validate_password(Some(&json!("ééééé"))).is_err());
        assert_eq!(validate_password(Some(&json!("éééééé"))), Ok("éééééé"));
    }

    #[test]
    fn empty_identifier_is_required() {
        let errs = validate_identifier("", ApiVersion::ByEmail).unwrap_err();
        assert_eq!(errs.into_vec(), vec![ID_REQUIRED]);
    }

    #[test]
    fn email_shapes() {
        for ok in ["a@b.co", "first.last@sub.example.org", " x@y.z "] {
            assert!(is_valid_email(ok), "{ok}");
        }
        for bad in ["a@b", "a b@c.d", "a@@b.c", "@b.c", "a@.c", "a@b.", ""] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn phone_shapes() {
        assert!(is_valid_phone("+1"));
        assert!(is_valid_phone("1234567890123456"));
        assert!(!is_valid_phone("12345678901234567"));
        assert!(!is_valid_phone("0123456"));
        assert!(!is_valid_phone("++123"));
        assert!(!is_valid_phone("12+3"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn email_normalization_is_trim_lowercase() {
        for raw in ["A@B.COM", "\tMiXeD@Case.Org\n", "plain@x.io"] {
            let id = validate_identifier(raw, ApiVersion::ByEmail).unwrap();
            assert_eq!(id, raw.trim().to_lowercase());
        }
    }

    #[test]
    fn version_parses_from_wire_name() {
        assert_eq!("v1".parse::<ApiVersion>(), Ok(ApiVersion::ByEmail));
        assert_eq!("v2".parse::<ApiVersion>(), Ok(ApiVersion::ByPhone));
        let err = "v3".parse::<ApiVersion>().unwrap_err();
        assert_eq!(err.into_vec(), vec![INVALID_VERSION]);
    }
}
