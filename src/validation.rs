//! Declarative field constraints for list, item and credential input.
//!
//! The stores never enforce these; callers validate user input before
//! invoking a store action. Every failing field is collected, not just the
//! first one.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{
    MONEY_MAX, NAME_MAX_CHARS, PASSWORD_MAX_CHARS, PASSWORD_MIN_CHARS, QUANTITY_MAX, QUANTITY_MIN,
};
use crate::error::{Result, ShoplistError};
use crate::models::{NewItem, NewList};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

// ---------------------------------------------------------------------------
// FieldError / ValidationErrors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field failures from one `validate()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether `field` has at least one failure.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ShoplistError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

fn check_name(errors: &mut ValidationErrors, field: &'static str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, format!("{} name is required", label));
    } else if value.chars().count() > NAME_MAX_CHARS {
        errors.push(
            field,
            format!("{} name cannot be longer than {} characters", label, NAME_MAX_CHARS),
        );
    }
}

fn check_range(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !value.is_finite() {
        errors.push(field, "must be a number");
    } else if value < min {
        errors.push(field, format!("must be at least {}", min));
    } else if value > max {
        errors.push(field, format!("cannot be greater than {}", max));
    }
}

// ---------------------------------------------------------------------------
// ListInput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListInput {
    pub name: String,
    pub budget: f64,
}

impl ListInput {
    pub fn new(name: impl Into<String>, budget: f64) -> Self {
        Self {
            name: name.into(),
            budget,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::default();
        check_name(&mut errors, "name", "List", &self.name);
        check_range(&mut errors, "budget", self.budget, 0.0, MONEY_MAX);
        errors.into_result()
    }

    /// Validate and turn into an insert payload owned by `user_id`.
    pub fn into_new_list(self, user_id: &str) -> Result<NewList> {
        self.validate()?;
        Ok(NewList::new(self.name, self.budget, user_id))
    }
}

// ---------------------------------------------------------------------------
// ItemInput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInput {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl ItemInput {
    pub fn new(name: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
            completed: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::default();
        check_name(&mut errors, "name", "Item", &self.name);
        check_range(&mut errors, "quantity", self.quantity, QUANTITY_MIN, QUANTITY_MAX);
        check_range(&mut errors, "price", self.price, 0.0, MONEY_MAX);
        errors.into_result()
    }

    /// Validate and turn into an insert payload for `list_id`.
    pub fn into_new_item(self, list_id: &str) -> Result<NewItem> {
        self.validate()?;
        Ok(NewItem::new(list_id, self.name, self.quantity, self.price))
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::default();

        let email = self.email.trim();
        if email.is_empty() {
            errors.push("email", "Email is required");
        } else if !EMAIL_RE.is_match(email) {
            errors.push("email", "Invalid email");
        }

        let len = self.password.chars().count();
        if len < PASSWORD_MIN_CHARS {
            errors.push(
                "password",
                format!("Password must have at least {} characters", PASSWORD_MIN_CHARS),
            );
        } else if len > PASSWORD_MAX_CHARS {
            errors.push(
                "password",
                format!("Password cannot be longer than {} characters", PASSWORD_MAX_CHARS),
            );
        }

        errors.into_result()
    }
}
