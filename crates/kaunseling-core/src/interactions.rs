//! Comment and reaction mutation shared by attachments and guestbook entries.

use crate::error::{Error, Result};
use crate::models::{Attachment, Comment, Reaction};
use crate::uuid_utils::unique_id;

/// Anything that owns a comment thread and a reaction list.
///
/// Implementors only expose the two lists; the mutation rules live in the
/// provided methods so every owner behaves the same.
pub trait Interactions {
    fn comments(&self) -> &[Comment];
    fn comments_mut(&mut self) -> &mut Vec<Comment>;
    fn reactions(&self) -> &[Reaction];
    fn reactions_mut(&mut self) -> &mut Vec<Reaction>;

    /// Append a comment. Both text and user name must be non-empty after
    /// trimming; both are stored uppercased.
    fn add_comment(&mut self, text: &str, user_name: &str) -> Result<Comment> {
        let text = text.trim();
        let user_name = user_name.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("comment text is required".to_string()));
        }
        if user_name.is_empty() {
            return Err(Error::InvalidInput("comment user name is required".to_string()));
        }

        let mut comment = Comment::new(user_name.to_uppercase(), text.to_uppercase());
        let existing = self.comments();
        comment.id = unique_id(|c| existing.iter().any(|x| x.id == c));
        self.comments_mut().push(comment.clone());
        Ok(comment)
    }

    /// Remove the first comment with `comment_id`. Returns whether one was
    /// removed; an unknown id is not an error.
    fn delete_comment(&mut self, comment_id: &str) -> bool {
        let comments = self.comments_mut();
        match comments.iter().position(|c| c.id == comment_id) {
            Some(idx) => {
                comments.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Increment the counter for `emoji`, creating it at 1 when absent.
    /// Matching is exact and case-sensitive.
    fn add_reaction(&mut self, emoji: &str) -> Result<Reaction> {
        if emoji.trim().is_empty() {
            return Err(Error::InvalidInput("reaction emoji is required".to_string()));
        }
        let reactions = self.reactions_mut();
        if let Some(existing) = reactions.iter_mut().find(|r| r.emoji == emoji) {
            existing.count = existing.count.saturating_add(1);
            return Ok(existing.clone());
        }
        let reaction = Reaction {
            emoji: emoji.to_string(),
            count: 1,
        };
        reactions.push(reaction.clone());
        Ok(reaction)
    }
}

impl Interactions for Attachment {
    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }

    fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    fn reactions_mut(&mut self) -> &mut Vec<Reaction> {
        &mut self.reactions
    }
}
