use crate::error::FieldErrors;
use crate::models::{Priority, Status};

pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;

/// The mutable fields of a ticket as entered by the user, before validation.
/// Shared by the create and update paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
}

/// A draft that passed validation: title and description are trimmed and
/// within bounds, an empty description is collapsed to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
}

/// Validate a draft, collecting every field failure into one map. Length
/// limits are in characters, measured after trimming.
pub fn validate(draft: &TicketDraft) -> Result<ValidDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = draft.title.trim();
    if title.is_empty() {
        errors.insert("title", "Title is required".to_string());
    } else if title.chars().count() < TITLE_MIN {
        errors.insert("title", "Title must be at least 5 characters".to_string());
    } else if title.chars().count() > TITLE_MAX {
        errors.insert("title", "Title must not exceed 100 characters".to_string());
    }

    let description = draft
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    if let Some(d) = description {
        if d.chars().count() > DESCRIPTION_MAX {
            errors.insert("description", "Description must not exceed 500 characters".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidDraft {
        title: title.to_string(),
        description: description.map(str::to_string),
        status: draft.status,
        priority: draft.priority,
    })
}
