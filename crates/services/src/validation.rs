//! # Listing validation
//!
//! The no-sale gate: adoption is free of charge, so listing text carrying
//! commerce terms is rejected before anything is persisted.

use configs::ModerationPolicy;
use domains::DomainError;

use crate::listings::ListingDraft;

/// Substring screen over the configured forbidden-keyword list.
/// Matching is case-insensitive for scripts that have case.
#[derive(Debug, Clone)]
pub struct KeywordScreen {
    keywords: Vec<String>,
}

impl KeywordScreen {
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn from_policy(policy: &ModerationPolicy) -> Self {
        Self::new(policy.forbidden_keywords.iter().cloned())
    }

    /// Returns the first forbidden keyword found in `text`, if any.
    pub fn first_hit(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }
}

/// Validates a listing draft: name and description are required, and no
/// textual field may contain a forbidden keyword.
pub fn validate_listing(screen: &KeywordScreen, draft: &ListingDraft) -> Result<(), DomainError> {
    if draft.name.trim().is_empty() {
        return Err(DomainError::Validation("pet name is required".into()));
    }
    if let Some(hit) = screen.first_hit(&draft.name) {
        return Err(DomainError::Validation(format!(
            "pet name contains a forbidden term: {hit}"
        )));
    }

    if draft.description.trim().is_empty() {
        return Err(DomainError::Validation("pet description is required".into()));
    }
    if let Some(hit) = screen.first_hit(&draft.description) {
        return Err(DomainError::Validation(format!(
            "pet description contains a forbidden term: {hit}"
        )));
    }

    if let Some(breed) = &draft.breed {
        if let Some(hit) = screen.first_hit(breed) {
            return Err(DomainError::Validation(format!(
                "breed contains a forbidden term: {hit}"
            )));
        }
    }

    Ok(())
}
