//! Request inputs and the checks they pass before anything is persisted.
//!
//! Every input is trimmed first, then validated as a whole so that a single
//! response can list every offending field.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use startup_deals_db::models::{AccessLevel, Category};
use validator::{Validate, ValidationError, ValidationErrors};

/// Whitespace cleanup applied before validation.
pub trait Normalize {
    fn normalize(&mut self);
}

/// Normalize then validate, returning the input only if every field passes.
pub fn validated<T: Normalize + Validate>(mut input: T) -> Result<T, ValidationErrors> {
    input.normalize();
    input.validate()?;
    Ok(input)
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub company: Option<String>,
    pub website_url: Option<String>,
}

impl Normalize for RegisterInput {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self.company = trim_optional(self.company.take());
        self.website_url = trim_optional(self.website_url.take());
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Please provide email and password"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please provide email and password"))]
    pub password: String,
}

impl Normalize for LoginInput {
    fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct VerificationRequestInput {
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company: String,
    #[validate(length(min = 1, message = "Website URL is required"))]
    pub website_url: String,
}

impl Normalize for VerificationRequestInput {
    fn normalize(&mut self) {
        self.company = self.company.trim().to_string();
        self.website_url = self.website_url.trim().to_string();
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct DealInput {
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters long"))]
    pub description: String,
    #[validate(length(min = 1, max = 200, message = "Short description must be between 1 and 200 characters"))]
    pub short_description: String,
    #[validate(nested)]
    pub partner: PartnerInput,
    #[validate(custom(function = "validate_category"))]
    pub category: String,
    #[validate(custom(function = "validate_access_level"))]
    pub access_level: Option<String>,
    pub eligibility_conditions: EligibilityInput,
    #[validate(custom(function = "validate_benefits"))]
    pub benefits: Vec<String>,
    pub discount_value: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Claim limit must be at least 1"))]
    pub claim_limit: Option<u32>,
    pub is_active: Option<bool>,
    pub tags: Vec<String>,
    pub redemption_instructions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PartnerInput {
    #[validate(length(min = 1, message = "Partner name is required"))]
    pub name: String,
    pub logo: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EligibilityInput {
    pub requires_verification: bool,
    pub requirements: Vec<String>,
}

impl DealInput {
    /// Only meaningful after validation has accepted the category.
    pub fn category(&self) -> Option<Category> {
        self.category.parse().ok()
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or_default()
    }
}

impl Normalize for DealInput {
    fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.short_description = self.short_description.trim().to_string();
        self.category = self.category.trim().to_lowercase();
        self.access_level = trim_optional(self.access_level.take()).map(|l| l.to_lowercase());
        self.partner.name = self.partner.name.trim().to_string();
        self.partner.logo = trim_optional(self.partner.logo.take());
        self.partner.website = trim_optional(self.partner.website.take());
        self.discount_value = trim_optional(self.discount_value.take());
        self.redemption_instructions = trim_optional(self.redemption_instructions.take());
        trim_all(&mut self.benefits);
        trim_all(&mut self.tags);
        trim_all(&mut self.eligibility_conditions.requirements);
        self.tags.retain(|t| !t.is_empty());
        self.eligibility_conditions.requirements.retain(|r| !r.is_empty());
    }
}

fn validate_category(category: &str) -> Result<(), ValidationError> {
    category.parse::<Category>().map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("category");
        err.message = Some("Category must be one of cloud, marketing, analytics, productivity, development, design, communication, finance, legal, hr".into());
        err
    })
}

fn validate_access_level(level: &str) -> Result<(), ValidationError> {
    level.parse::<AccessLevel>().map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("access_level");
        err.message = Some("Access level must be public or locked".into());
        err
    })
}

fn validate_benefits(benefits: &[String]) -> Result<(), ValidationError> {
    if benefits.iter().any(|b| b.is_empty()) {
        let mut err = ValidationError::new("benefits");
        err.message = Some("Benefits cannot contain empty entries".into());
        return Err(err);
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trim_all(values: &mut [String]) {
    for value in values.iter_mut() {
        *value = value.trim().to_string();
    }
}
