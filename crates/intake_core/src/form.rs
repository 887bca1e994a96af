use std::fmt;

use shared::{domain::is_blank, protocol::SubmissionPayload};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntakeField {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    Details,
}

impl IntakeField {
    pub const REQUIRED: [IntakeField; 3] = [Self::FirstName, Self::LastName, Self::Email];

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Details => "details",
        }
    }
}

impl fmt::Display for IntakeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("form is incomplete (missing: {missing:?}, invalid email: {invalid_email})")]
pub struct FormValidationError {
    pub missing: Vec<IntakeField>,
    pub invalid_email: bool,
}

/// Values currently entered in the consultation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub details: String,
}

impl IntakeFields {
    pub fn get(&self, field: IntakeField) -> &str {
        match field {
            IntakeField::FirstName => &self.first_name,
            IntakeField::LastName => &self.last_name,
            IntakeField::Email => &self.email,
            IntakeField::Phone => &self.phone,
            IntakeField::Address => &self.address,
            IntakeField::Details => &self.details,
        }
    }

    pub fn set(&mut self, field: IntakeField, value: impl Into<String>) {
        let slot = match field {
            IntakeField::FirstName => &mut self.first_name,
            IntakeField::LastName => &mut self.last_name,
            IntakeField::Email => &mut self.email,
            IntakeField::Phone => &mut self.phone,
            IntakeField::Address => &mut self.address,
            IntakeField::Details => &mut self.details,
        };
        *slot = value.into();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), FormValidationError> {
        let missing: Vec<IntakeField> = IntakeField::REQUIRED
            .into_iter()
            .filter(|field| is_blank(self.get(*field)))
            .collect();
        let invalid_email = !is_blank(&self.email) && !self.email.contains('@');

        if missing.is_empty() && !invalid_email {
            Ok(())
        } else {
            Err(FormValidationError {
                missing,
                invalid_email,
            })
        }
    }

    /// Builds the relay payload; blank optional inputs are left out.
    pub fn to_payload(&self) -> Result<SubmissionPayload, FormValidationError> {
        self.validate()?;
        Ok(SubmissionPayload {
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            email: Some(self.email.clone()),
            phone: non_blank(&self.phone),
            address: non_blank(&self.address),
            details: non_blank(&self.details),
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    (!is_blank(value)).then(|| value.to_string())
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
