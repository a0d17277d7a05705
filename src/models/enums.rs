//! Canonical book status and tracking action enums
//!
//! The admin client historically spelled these several ways (`CHECKED OUT`,
//! `CHECK OUT`, ...). The wire and storage form is the SCREAMING_SNAKE_CASE
//! one; the spaced spellings are still accepted on input.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// BookStatus
// ---------------------------------------------------------------------------

/// Circulation status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    #[default]
    Available,
    #[serde(alias = "CHECKED OUT")]
    CheckedOut,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "AVAILABLE",
            BookStatus::CheckedOut => "CHECKED_OUT",
        }
    }

    /// The single legal next action for a book in this status
    pub fn next_action(&self) -> TrackingAction {
        match self {
            BookStatus::Available => TrackingAction::CheckOut,
            BookStatus::CheckedOut => TrackingAction::CheckIn,
        }
    }
}

impl TryFrom<&str> for BookStatus {
    type Error = AppError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "AVAILABLE" => Ok(BookStatus::Available),
            "CHECKED_OUT" | "CHECKED OUT" => Ok(BookStatus::CheckedOut),
            other => Err(AppError::InvalidState(format!(
                "Unrecognized book status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TrackingAction
// ---------------------------------------------------------------------------

/// Transition recorded by a tracking entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingAction {
    #[serde(alias = "CHECK OUT")]
    CheckOut,
    #[serde(alias = "CHECK IN")]
    CheckIn,
}

impl TrackingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingAction::CheckOut => "CHECK_OUT",
            TrackingAction::CheckIn => "CHECK_IN",
        }
    }

    /// Book status after this action has been applied
    pub fn resulting_status(&self) -> BookStatus {
        match self {
            TrackingAction::CheckOut => BookStatus::CheckedOut,
            TrackingAction::CheckIn => BookStatus::Available,
        }
    }
}

impl TryFrom<&str> for TrackingAction {
    type Error = AppError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "CHECK_OUT" | "CHECK OUT" => Ok(TrackingAction::CheckOut),
            "CHECK_IN" | "CHECK IN" => Ok(TrackingAction::CheckIn),
            other => Err(AppError::InvalidState(format!(
                "Unrecognized tracking action '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TrackingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BookStatusFilter
// ---------------------------------------------------------------------------

/// Status filter for book lists and reports.
/// `Delayed` is derived: checked out with a due date before today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatusFilter {
    Available,
    #[serde(alias = "CHECKED OUT")]
    CheckedOut,
    Delayed,
}
