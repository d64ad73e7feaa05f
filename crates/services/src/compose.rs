//! # Posting Form
//!
//! Create and edit screens share one form. Fields are kept exactly as typed
//! so they can be shown back after a failed submission.

use domains::{validation, wire, BoardApi, Field, PostId, Posting, PostingDraft, PostingEcho};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FormError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingForm {
    pub title: String,
    pub description: String,
    pub company: String,
    pub link: String,
    /// Comma separated, as typed.
    pub tags: String,
}

impl PostingForm {
    /// Prefills the edit screen.
    pub fn from_posting(posting: &Posting) -> Self {
        Self {
            title: posting.title.clone(),
            description: posting.description.clone(),
            company: posting.company.clone().unwrap_or_default(),
            link: posting.link.clone(),
            tags: posting.tags.iter().cloned().collect::<Vec<_>>().join(", "),
        }
    }

    pub fn validate(&self) -> Result<PostingDraft, FormError> {
        validation::collect([
            (Field::Title, validation::title(&self.title)),
            (Field::Description, validation::description(&self.description)),
            (Field::Link, validation::link(&self.link)),
        ])?;

        let company = self.company.trim();
        Ok(PostingDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            company: (!company.is_empty()).then(|| company.to_string()),
            link: self.link.trim().to_string(),
            tags: wire::parse_tags(&self.tags),
        })
    }

    /// Nothing is sent when the form does not validate.
    pub async fn submit(&self, api: &dyn BoardApi) -> Result<PostingEcho, FormError> {
        let draft = self.validate()?;
        let echo = api
            .create_posting(&draft)
            .await
            .map_err(|err| FormError::from_api(&err, "Failed to create post"))?;
        info!(post_id = %echo.id, "posting created");
        Ok(echo)
    }

    pub async fn submit_edit(&self, api: &dyn BoardApi, id: PostId) -> Result<PostingEcho, FormError> {
        let draft = self.validate()?;
        api.update_posting(id, &draft)
            .await
            .map_err(|err| FormError::from_api(&err, "Failed to update post"))
    }
}
