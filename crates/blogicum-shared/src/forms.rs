//! Submitted forms and their validation.
//!
//! Every field defaults to empty so that a missing field surfaces as a
//! validation message on the form rather than a malformed request.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_LENGTH: usize = 256;
pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Format of an HTML `datetime-local` input.
pub const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Create/edit post form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    /// `datetime-local` value or RFC 3339 timestamp, read as UTC.
    pub pub_date: String,
    pub category: String,
    pub location: String,
    pub image: String,
}

/// A post form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPost {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: i32,
    pub location_id: Option<i32>,
    pub image: Option<String>,
}

impl PostForm {
    /// Blank form with the publication date preset to `now`.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            pub_date: now.format(DATETIME_LOCAL_FORMAT).to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<ValidPost, Vec<String>> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push("title: This field is required.".to_string());
        } else if title.chars().count() > MAX_TITLE_LENGTH {
            errors.push(format!(
                "title: Ensure this value has at most {MAX_TITLE_LENGTH} characters."
            ));
        }

        let text = self.text.trim();
        if text.is_empty() {
            errors.push("text: This field is required.".to_string());
        }

        let pub_date = match parse_datetime(&self.pub_date) {
            Ok(date) => Some(date),
            Err(message) => {
                errors.push(format!("pub_date: {message}"));
                None
            }
        };

        let category_id = match self.category.trim() {
            "" => {
                errors.push("category: This field is required.".to_string());
                None
            }
            raw => parse_id("category", raw, &mut errors),
        };

        let location_id = match self.location.trim() {
            "" => None,
            raw => parse_id("location", raw, &mut errors),
        };

        match (pub_date, category_id) {
            (Some(pub_date), Some(category_id)) if errors.is_empty() => Ok(ValidPost {
                title: title.to_string(),
                text: text.to_string(),
                pub_date,
                category_id,
                location_id,
                image: non_empty(&self.image),
            }),
            _ => Err(errors),
        }
    }
}

/// Comment form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, Vec<String>> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(vec!["text: This field is required.".to_string()]);
        }
        Ok(text.to_string())
    }
}

/// Account registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        validate_username(&self.username, &mut errors);
        validate_email(&self.email, &mut errors);

        if self.password1.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(format!(
                "password1: This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
            ));
        }
        if self.password1 != self.password2 {
            errors.push("password2: The two password fields didn't match.".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Login form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Profile edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        validate_username(&self.username, &mut errors);
        validate_email(&self.email, &mut errors);
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.chars().count() > MAX_USERNAME_LENGTH {
                errors.push(format!(
                    "{field}: Ensure this value has at most {MAX_USERNAME_LENGTH} characters."
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn validate_username(username: &str, errors: &mut Vec<String>) {
    if username.is_empty() {
        errors.push("username: This field is required.".to_string());
    } else if username.chars().count() > MAX_USERNAME_LENGTH {
        errors.push(format!(
            "username: Ensure this value has at most {MAX_USERNAME_LENGTH} characters."
        ));
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.push(
            "username: Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
}

fn validate_email(email: &str, errors: &mut Vec<String>) {
    if !email.is_empty() && !email.contains('@') {
        errors.push("email: Enter a valid email address.".to_string());
    }
}

fn parse_id(field: &str, raw: &str, errors: &mut Vec<String>) -> Option<i32> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.push(format!(
                "{field}: Select a valid choice. That choice is not one of the available choices."
            ));
            None
        }
    }
}

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("This field is required.");
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }
    [DATETIME_LOCAL_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or("Enter a valid date/time.")
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post_form() -> PostForm {
        PostForm {
            title: "Trip".into(),
            text: "Went to the sea".into(),
            pub_date: "2024-05-01T12:30".into(),
            category: "3".into(),
            location: String::new(),
            image: String::new(),
        }
    }

    #[test]
    fn test_valid_post_form() {
        let valid = post_form().validate().unwrap();

        assert_eq!(valid.title, "Trip");
        assert_eq!(valid.category_id, 3);
        assert_eq!(valid.location_id, None);
        assert_eq!(valid.image, None);
        assert_eq!(
            valid.pub_date,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_post_form_accepts_rfc3339() {
        let form = PostForm {
            pub_date: "2024-05-01T14:30:00+02:00".into(),
            ..post_form()
        };
        assert_eq!(
            form.validate().unwrap().pub_date,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_post_form_collects_every_error() {
        let form = PostForm {
            title: "x".repeat(MAX_TITLE_LENGTH + 1),
            text: "  ".into(),
            pub_date: "yesterday".into(),
            category: String::new(),
            location: "abc".into(),
            image: String::new(),
        };
        let errors = form.validate().unwrap_err();

        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.starts_with("title:")));
        assert!(errors.iter().any(|e| e.starts_with("text:")));
        assert!(errors.iter().any(|e| e.starts_with("pub_date:")));
        assert!(errors.iter().any(|e| e.starts_with("category:")));
        assert!(errors.iter().any(|e| e.starts_with("location:")));
    }

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let form: PostForm = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        assert_eq!(form.title, "Only a title");
        assert!(form.text.is_empty());
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_initial_form_presets_pub_date() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(PostForm::initial(now).pub_date, "2024-01-02T03:04");
    }

    #[test]
    fn test_comment_form_requires_text() {
        assert!(CommentForm { text: "   ".into() }.validate().is_err());
        assert_eq!(
            CommentForm { text: " hi ".into() }.validate().unwrap(),
            "hi"
        );
    }

    #[test]
    fn test_registration_form() {
        let form = RegistrationForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password1: "correct-horse".into(),
            password2: "correct-horse".into(),
        };
        assert!(form.validate().is_ok());

        let bad = RegistrationForm {
            username: "al ice".into(),
            email: "not-an-email".into(),
            password1: "short".into(),
            password2: "other".into(),
        };
        assert_eq!(bad.validate().unwrap_err().len(), 4);
    }

    #[test]
    fn test_profile_form_rejects_blank_username() {
        let form = ProfileForm {
            username: String::new(),
            ..ProfileForm::default()
        };
        assert!(form.validate().is_err());
    }
}
