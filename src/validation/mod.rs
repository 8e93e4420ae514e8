//! Form checks run before anything is sent to the backend.

use std::fmt;

use crate::auth::Role;
use crate::domain::{NewAgent, NewLead, NewProperty, NewTransaction};

pub const NAME_MAX_LEN: usize = 100;
pub const EMAIL_MAX_LEN: usize = 254;
pub const TITLE_MAX_LEN: usize = 200;
pub const ROLE_VALUES: &[&str] = &["admin", "agent", "user"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control() || ch.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_enum(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.iter().all(|candidate| value != *candidate) {
        return Err(ValidationError::new(
            field,
            format!("must be one of: {}", allowed.join(", ")),
        ));
    }

    Ok(())
}

/// Shape check only: one `@`, something before it, a dotted domain after.
pub fn validate_email(field: &'static str, value: &str) -> ValidationResult {
    validate_required(field, value)?;
    validate_max_len(field, value, EMAIL_MAX_LEN)?;

    let well_formed = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::new(field, "must be a valid email address"));
    }

    Ok(())
}

pub fn validate_positive_price(field: &'static str, price: f64) -> ValidationResult {
    if !price.is_finite() || price <= 0.0 {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> ValidationResult {
        validate_required("email", &self.email)?;
        validate_required("password", &self.password)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Raw selection; must be one of [`ROLE_VALUES`].
    pub role: String,
}

impl RegistrationForm {
    /// Every field filled, passwords equal, role known. Returns the role.
    pub fn validate(&self) -> Result<Role, ValidationError> {
        validate_required("firstName", &self.first_name)?;
        validate_required("lastName", &self.last_name)?;
        validate_required("email", &self.email)?;
        validate_required("password", &self.password)?;
        validate_required("confirmPassword", &self.confirm_password)?;
        validate_max_len("firstName", &self.first_name, NAME_MAX_LEN)?;
        validate_max_len("lastName", &self.last_name, NAME_MAX_LEN)?;

        if self.password != self.confirm_password {
            return Err(ValidationError::new("confirmPassword", "passwords do not match"));
        }

        validate_required("role", &self.role)?;
        validate_enum("role", &self.role, ROLE_VALUES)?;
        self.role
            .parse()
            .map_err(|e: crate::auth::role::UnknownRole| ValidationError::new("role", e.to_string()))
    }
}

pub fn validate_new_property(property: &NewProperty) -> ValidationResult {
    let title = sanitize_string(&property.title);
    validate_required("title", &title)?;
    validate_max_len("title", &title, TITLE_MAX_LEN)?;
    validate_required("city", &property.city)?;
    validate_positive_price("price", property.price)
}

pub fn validate_new_agent(agent: &NewAgent) -> ValidationResult {
    validate_required("name", &sanitize_string(&agent.name))?;
    validate_max_len("name", &agent.name, NAME_MAX_LEN)?;
    validate_email("email", &agent.email)
}

pub fn validate_new_lead(lead: &NewLead) -> ValidationResult {
    validate_required("name", &sanitize_string(&lead.name))?;
    validate_email("email", &lead.email)?;
    validate_required("message", &lead.message)?;
    validate_required("propertyRef", &lead.property_ref)
}

pub fn validate_new_transaction(transaction: &NewTransaction) -> ValidationResult {
    validate_required("client", &transaction.client)?;
    validate_required("agent", &transaction.agent)?;
    validate_required("propertyRef", &transaction.property_ref)?;
    validate_positive_price("price", transaction.price)
}
