//! Shopping lists, their items and collaborators.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{
    CurrencyCode, DataModelError, Quantity, TableRow, optional_text, required_text, uuid_value,
};
use crate::domain::constraints::Row;

text_enum! {
    /// Lifecycle of a shopping list.
    pub enum ListStatus ("status") {
        Active => "active",
        Completed => "completed",
        Archived => "archived",
    }
}

text_enum! {
    /// Access a collaborator has on a list.
    pub enum PermissionLevel ("permission_level") {
        Owner => "owner",
        Editor => "editor",
        Viewer => "viewer",
    }
}

text_enum! {
    /// Invitation lifecycle of a collaborator.
    pub enum CollaboratorStatus ("status") {
        Pending => "pending",
        Accepted => "accepted",
        Declined => "declined",
    }
}

/// A list owned by one user and optionally shared with others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingList {
    pub id: Uuid,
    pub owner_id: Uuid,
    name: String,
    description: Option<String>,
    pub status: ListStatus,
    budget: Option<(Quantity, CurrencyCode)>,
    pub meta_data: Value,
}

impl ShoppingList {
    /// # Errors
    ///
    /// Returns [`DataModelError`] when the name is empty or too long.
    pub fn new(id: Uuid, owner_id: Uuid, name: impl Into<String>) -> Result<Self, DataModelError> {
        Ok(Self {
            id,
            owner_id,
            name: required_text("name", name, 255)?,
            description: None,
            status: ListStatus::Active,
            budget: None,
            meta_data: Value::Object(serde_json::Map::new()),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set a budget; amounts may be zero but not negative.
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError`] for negative amounts.
    pub fn set_budget(&mut self, amount: f64, currency: CurrencyCode) -> Result<(), DataModelError> {
        self.budget = Some((Quantity::new("budget_amount", amount)?, currency));
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn budget(&self) -> Option<(f64, &CurrencyCode)> {
        self.budget
            .as_ref()
            .map(|(amount, currency)| (amount.value(), currency))
    }
}

/// A line on a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub shopping_list_id: Uuid,
    name: String,
    pub category_id: Option<Uuid>,
    quantity: Quantity,
    unit: String,
    estimated_price: Option<Quantity>,
    actual_price: Option<Quantity>,
    currency: Option<CurrencyCode>,
    notes: Option<String>,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    pub assigned_user_id: Option<Uuid>,
    barcode: Option<String>,
}

impl ShoppingItem {
    /// # Errors
    ///
    /// Returns [`DataModelError`] when the name or unit is invalid or the
    /// quantity is not strictly positive.
    pub fn new(
        id: Uuid,
        shopping_list_id: Uuid,
        name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Result<Self, DataModelError> {
        Ok(Self {
            id,
            shopping_list_id,
            name: required_text("name", name, 255)?,
            category_id: None,
            quantity: Quantity::positive("quantity", quantity)?,
            unit: required_text("unit", unit, 50)?,
            estimated_price: None,
            actual_price: None,
            currency: None,
            notes: None,
            is_completed: false,
            completed_at: None,
            assigned_user_id: None,
            barcode: None,
        })
    }

    /// Record an estimated price; the currency is required alongside it.
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError`] for negative prices.
    pub fn set_estimated_price(
        &mut self,
        price: f64,
        currency: CurrencyCode,
    ) -> Result<(), DataModelError> {
        self.estimated_price = Some(Quantity::new("estimated_price", price)?);
        self.currency = Some(currency);
        Ok(())
    }

    /// Mark the item bought at `actual_price`.
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError`] for negative prices.
    pub fn complete(
        &mut self,
        at: DateTime<Utc>,
        actual_price: Option<(f64, CurrencyCode)>,
    ) -> Result<(), DataModelError> {
        if let Some((price, currency)) = actual_price {
            self.actual_price = Some(Quantity::new("actual_price", price)?);
            self.currency = Some(currency);
        }
        self.is_completed = true;
        self.completed_at = Some(at);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DataModelError`] when the barcode exceeds 50 characters.
    pub fn set_barcode(&mut self, barcode: Option<String>) -> Result<(), DataModelError> {
        self.barcode = optional_text("barcode", barcode, 50)?;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
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

    pub fn currency(&self) -> Option<&CurrencyCode> {
        self.currency.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

/// Grants a user access to a shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListCollaborator {
    pub id: Uuid,
    pub shopping_list_id: Uuid,
    pub user_id: Uuid,
    pub permission_level: PermissionLevel,
    status: CollaboratorStatus,
    joined_at: Option<DateTime<Utc>>,
}

impl ListCollaborator {
    /// A pending invitation.
    pub fn invite(
        id: Uuid,
        shopping_list_id: Uuid,
        user_id: Uuid,
        permission_level: PermissionLevel,
    ) -> Self {
        Self {
            id,
            shopping_list_id,
            user_id,
            permission_level,
            status: CollaboratorStatus::Pending,
            joined_at: None,
        }
    }

    /// Accept a pending invitation.
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError::Invalid`] unless the invitation is pending.
    pub fn accept(&mut self, at: DateTime<Utc>) -> Result<(), DataModelError> {
        self.respond(CollaboratorStatus::Accepted)?;
        self.joined_at = Some(at);
        Ok(())
    }

    /// Decline a pending invitation.
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError::Invalid`] unless the invitation is pending.
    pub fn decline(&mut self) -> Result<(), DataModelError> {
        self.respond(CollaboratorStatus::Declined)
    }

    fn respond(&mut self, status: CollaboratorStatus) -> Result<(), DataModelError> {
        if self.status != CollaboratorStatus::Pending {
            return Err(DataModelError::Invalid {
                field: "status",
                reason: "invitation already answered",
            });
        }
        self.status = status;
        Ok(())
    }

    pub fn status(&self) -> CollaboratorStatus {
        self.status
    }

    pub fn joined_at(&self) -> Option<DateTime<Utc>> {
        self.joined_at
    }
}

impl TableRow for ListCollaborator {
    const TABLE: &'static str = "list_collaborators";

    fn to_row(&self) -> Row {
        Row::from([
            ("id".to_owned(), uuid_value(self.id)),
            ("shopping_list_id".to_owned(), uuid_value(self.shopping_list_id)),
            ("user_id".to_owned(), uuid_value(self.user_id)),
            (
                "permission_level".to_owned(),
                Value::from(self.permission_level.as_str()),
            ),
            ("status".to_owned(), Value::from(self.status.as_str())),
        ])
    }
}
