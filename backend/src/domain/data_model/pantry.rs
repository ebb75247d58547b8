//! Household pantry inventory.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::{DataModelError, Quantity, optional_text, required_text};

/// Stock of one product kept by a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PantryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    name: String,
    pub category_id: Option<Uuid>,
    quantity: Quantity,
    unit: String,
    location: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    low_stock_threshold: Quantity,
}

impl PantryItem {
    /// # Errors
    ///
    /// Returns [`DataModelError`] for empty names or units and negative
    /// quantities.
    pub fn new(
        id: Uuid,
        user_id: Uuid,
        name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Result<Self, DataModelError> {
        Ok(Self {
            id,
            user_id,
            name: required_text("name", name, 255)?,
            category_id: None,
            quantity: Quantity::new("quantity", quantity)?,
            unit: required_text("unit", unit, 50)?,
            location: None,
            expiration_date: None,
            low_stock_threshold: Quantity::one(),
        })
    }

    /// # Errors
    ///
    /// Returns [`DataModelError`] when the location exceeds 100 characters.
    pub fn set_location(&mut self, location: Option<String>) -> Result<(), DataModelError> {
        self.location = optional_text("location", location, 100)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DataModelError::Negative`] for negative thresholds.
    pub fn set_low_stock_threshold(&mut self, threshold: f64) -> Result<(), DataModelError> {
        self.low_stock_threshold = Quantity::new("low_stock_threshold", threshold)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DataModelError::Negative`] for negative quantities.
    pub fn set_quantity(&mut self, quantity: f64) -> Result<(), DataModelError> {
        self.quantity = Quantity::new("quantity", quantity)?;
        Ok(())
    }

    /// Whether stock has fallen to or below the threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }

    /// Whether the item expires on or before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_some_and(|date| date <= today)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> f64 {
        self.quantity.value()
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}
