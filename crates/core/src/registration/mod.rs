//! Event registration form checks and the simulated submission.

use std::{cell::Cell, fmt, sync::LazyLock, time::Duration};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{RegistrationConfig, Result, TechXError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationField {
    Name,
    College,
    CourseYear,
    Phone,
    Email,
}

impl fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Name => "name",
            Self::College => "college",
            Self::CourseYear => "course year",
            Self::Phone => "phone",
            Self::Email => "email",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub college: String,
    pub course_year: String,
    pub phone: String,
    pub email: String,
}

impl RegistrationForm {
    /// Checks presence first, then the email shape, then the phone number.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            (RegistrationField::Name, &self.name),
            (RegistrationField::College, &self.college),
            (RegistrationField::CourseYear, &self.course_year),
            (RegistrationField::Phone, &self.phone),
            (RegistrationField::Email, &self.email),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(TechXError::MissingField(*field));
        }

        if !EMAIL_RE.is_match(&self.email) {
            return Err(TechXError::InvalidEmail);
        }
        if !PHONE_RE.is_match(&self.phone) {
            return Err(TechXError::InvalidPhone);
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Confirmation handed back after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    pub event_name: String,
    pub attendee: String,
    pub email: String,
    pub message: String,
}

/// Accepts registrations. There is no backend; submission only waits for
/// the configured delay before confirming.
#[derive(Debug)]
pub struct RegistrationDesk {
    submit_delay: Duration,
    submitting: Cell<bool>,
}

impl RegistrationDesk {
    pub fn new(config: &RegistrationConfig) -> Self {
        Self {
            submit_delay: config.submit_delay(),
            submitting: Cell::new(false),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.get()
    }

    /// Validates `form`, waits out the simulated round trip and clears the
    /// form. On a validation error the form is left as it was.
    pub async fn submit(
        &self,
        event_name: &str,
        form: &mut RegistrationForm,
    ) -> Result<RegistrationReceipt> {
        if self.submitting.get() {
            return Err(TechXError::IllegalState("a registration is already being submitted"));
        }
        if let Err(err) = form.validate() {
            tracing::warn!(event = event_name, error = %err, "registration rejected");
            return Err(err);
        }

        let in_progress = Submitting::begin(&self.submitting);
        tokio::time::sleep(self.submit_delay).await;
        drop(in_progress);

        let receipt = RegistrationReceipt {
            event_name: event_name.to_string(),
            attendee: form.name.clone(),
            email: form.email.clone(),
            message: format!("Successfully registered for {event_name}!"),
        };
        form.clear();

        tracing::info!(event = event_name, attendee = %receipt.attendee, "registration accepted");
        Ok(receipt)
    }
}

/// Clears the submitting flag even if the submission future is dropped.
struct Submitting<'a>(&'a Cell<bool>);

impl<'a> Submitting<'a> {
    fn begin(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            name: "Eleven".into(),
            college: "Hawkins Institute".into(),
            course_year: "B.Tech 2".into(),
            phone: "1234567890".into(),
            email: "a@b.com".into(),
        }
    }

    #[test]
    fn empty_name_is_missing() {
        let form = RegistrationForm {
            name: String::new(),
            college: "X".into(),
            course_year: "Y".into(),
            ..valid_form()
        };

        assert!(matches!(
            form.validate(),
            Err(TechXError::MissingField(RegistrationField::Name))
        ));
    }

    #[test]
    fn reports_first_missing_field() {
        let form = RegistrationForm {
            course_year: String::new(),
            email: String::new(),
            ..valid_form()
        };

        assert!(matches!(
            form.validate(),
            Err(TechXError::MissingField(RegistrationField::CourseYear))
        ));
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["plain", "a@b", "a b@c.com", "@b.com", "a@@b.com"] {
            let form = RegistrationForm {
                email: email.into(),
                ..valid_form()
            };
            assert!(
                matches!(form.validate(), Err(TechXError::InvalidEmail)),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_phone_without_ten_digits() {
        for phone in ["123456789", "12345678901", "12345abcde", "+911234567"] {
            let form = RegistrationForm {
                phone: phone.into(),
                ..valid_form()
            };
            assert!(
                matches!(form.validate(), Err(TechXError::InvalidPhone)),
                "{phone} should be rejected"
            );
        }
    }

    #[test]
    fn email_is_checked_before_phone() {
        let form = RegistrationForm {
            email: "nope".into(),
            phone: "12".into(),
            ..valid_form()
        };
        assert!(matches!(form.validate(), Err(TechXError::InvalidEmail)));
    }

    #[tokio::test(start_paused = true)]
    async fn successful_submit_waits_and_clears() {
        let desk = RegistrationDesk::new(&RegistrationConfig::default());
        let mut form = valid_form();
        let started = tokio::time::Instant::now();

        let receipt = desk.submit("Upside Down Hackathon", &mut form).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(receipt.message, "Successfully registered for Upside Down Hackathon!");
        assert_eq!(receipt.attendee, "Eleven");
        assert!(form.is_empty());
        assert!(!desk.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_submit_keeps_fields() {
        let desk = RegistrationDesk::new(&RegistrationConfig::default());
        let mut form = RegistrationForm {
            name: String::new(),
            ..valid_form()
        };
        let before = form.clone();

        let result = desk.submit("Code Demogorgon", &mut form).await;

        assert!(matches!(
            result,
            Err(TechXError::MissingField(RegistrationField::Name))
        ));
        assert_eq!(form, before);
        assert!(!desk.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn desk_is_busy_while_a_submission_is_in_flight() {
        let desk = RegistrationDesk::new(&RegistrationConfig::default());
        let mut first = valid_form();
        let mut second = valid_form();

        let (accepted, busy) = tokio::join!(desk.submit("Mind Flayer Quiz", &mut first), async {
            tokio::task::yield_now().await;
            assert!(desk.is_submitting());
            desk.submit("Mind Flayer Quiz", &mut second).await
        });

        assert!(accepted.is_ok());
        assert!(matches!(busy, Err(TechXError::IllegalState(_))));
        assert!(!second.is_empty());
        assert!(!desk.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submission_releases_the_desk() {
        let desk = RegistrationDesk::new(&RegistrationConfig::default());
        let mut form = valid_form();

        let pending = tokio::time::timeout(
            Duration::from_millis(10),
            desk.submit("Hellfire Club Gaming", &mut form),
        )
        .await;

        assert!(pending.is_err());
        assert!(!desk.is_submitting());
        assert!(!form.is_empty());
    }
}
