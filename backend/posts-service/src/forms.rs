//! Post form binding and validation.
//!
//! `PostForm` carries the raw user-editable fields (`text`, `group`). Static
//! rules are declared with `validator`; the group choice is checked against the
//! store. A successful bind yields a `PostDraft` without author or id.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::models::{Post, PostDraft};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field name to error messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Raw post input as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PostForm {
    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    pub text: String,
    /// Group id as submitted; absent or empty means "no group"
    #[serde(default)]
    pub group: Option<String>,
}

/// A rejected submission: the original input plus per-field errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FormRejection {
    pub input: PostForm,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

fn validate_required(text: &str) -> std::result::Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed(REQUIRED_MESSAGE));
        return Err(err);
    }
    Ok(())
}

impl PostForm {
    pub fn new(text: impl Into<String>, group_id: Option<i64>) -> Self {
        Self {
            text: text.into(),
            group: group_id.map(|id| id.to_string()),
        }
    }

    /// Form pre-populated with an existing post's editable fields
    pub fn from_post(post: &Post) -> Self {
        Self::new(post.text.clone(), post.group_id)
    }

    fn group_choice(&self) -> Option<&str> {
        self.group
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Validate against the store and produce a draft.
    ///
    /// Field problems surface as `AppError::Validation` carrying this input;
    /// store failures other than a missing group propagate unchanged. Nothing
    /// is written either way.
    pub async fn bind(self, store: &dyn PostStore) -> Result<PostDraft> {
        let mut errors = FieldErrors::new();

        if let Err(validation) = self.validate() {
            for (field, field_errors) in validation.field_errors() {
                let messages = errors.entry(field.to_string()).or_default();
                for err in field_errors.iter() {
                    messages.push(
                        err.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| err.code.to_string()),
                    );
                }
            }
        }

        let group_id = match self.group_choice() {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => match store.group_by_id(id).await {
                    Ok(group) => Some(group.id),
                    Err(AppError::NotFound(_)) => {
                        add_error(&mut errors, "group", INVALID_CHOICE_MESSAGE);
                        None
                    }
                    Err(other) => return Err(other),
                },
                Err(_) => {
                    add_error(&mut errors, "group", INVALID_CHOICE_MESSAGE);
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(AppError::Validation(FormRejection {
                input: self,
                errors,
            }));
        }

        Ok(PostDraft {
            text: self.text.trim().to_string(),
            group_id,
        })
    }
}

fn add_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}
