//! Reviews and ratings on a recipe page.
//!
//! [`CommentSection`] owns the comment list, the draft, and the submission state
//! for one recipe page. Unlike the like toggle, a comment is never shown before
//! the gateway confirms it: the rating average depends on server-validated data.

use thiserror::Error;

use crate::error::{GatewayError, ValidationError};
use crate::gateway::{MutationGateway, RequestContext};
use crate::types::{Comment, PendingSubmission};

/// Longest accepted comment body, in characters.
pub const MAX_BODY_CHARS: usize = 2000;

/// Why a submit attempt did not go out, or came back failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a comment is already being posted")]
    InFlight,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
}

/// A validated review ready for the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRequest {
    pub recipe_id: String,
    pub body: String,
    pub rating: Option<u8>,
}

/// A settled `create_comment` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentResponse {
    pub recipe_id: String,
    pub result: Result<Comment, GatewayError>,
}

/// Comment list, draft, and submit state for one recipe page session.
#[derive(Debug, Clone)]
pub struct CommentSection {
    recipe_id: String,
    comments: Vec<Comment>,
    average: Option<f64>,
    draft: PendingSubmission,
    hovered_rating: Option<u8>,
    phase: Phase,
    error: Option<SubmitError>,
}

impl CommentSection {
    pub fn new(recipe_id: impl Into<String>, initial: Vec<Comment>) -> Self {
        let average = average_rating(&initial);
        Self {
            recipe_id: recipe_id.into(),
            comments: initial,
            average,
            draft: PendingSubmission::default(),
            hovered_rating: None,
            phase: Phase::Idle,
            error: None,
        }
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Mean of the present ratings, recomputed on every confirmed append.
    pub fn average_rating(&self) -> Option<f64> {
        self.average
    }

    pub fn draft(&self) -> &PendingSubmission {
        &self.draft
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    /// The error from the last submit attempt, if any.
    pub fn error(&self) -> Option<&SubmitError> {
        self.error.as_ref()
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && !self.draft.body.trim().is_empty()
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.draft.body = body.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.draft.body.push(c);
    }

    pub fn pop_char(&mut self) {
        self.draft.body.pop();
    }

    /// Sets the draft's star rating, rejecting anything outside 1..=5.
    pub fn set_rating(&mut self, stars: i64) -> Result<(), ValidationError> {
        self.draft.rating = Some(check_rating(stars)?);
        Ok(())
    }

    pub fn clear_rating(&mut self) {
        self.draft.rating = None;
    }

    /// Previews `stars` while the pointer rests on a star; `None` ends the preview.
    pub fn hover_rating(&mut self, stars: Option<u8>) {
        self.hovered_rating = stars.filter(|s| (1..=5).contains(s));
    }

    /// Stars to draw filled: the hovered preview wins over the chosen rating.
    pub fn shown_rating(&self) -> Option<u8> {
        self.hovered_rating.or(self.draft.rating)
    }

    /// Validates the draft and, if it passes, moves to `Submitting`.
    ///
    /// Validation failures leave the section `Idle` with the error recorded and
    /// never produce a request.
    pub fn submit(&mut self) -> Result<CommentRequest, SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::InFlight);
        }
        let (body, rating) = match validate(&self.draft) {
            Ok(valid) => valid,
            Err(e) => {
                let e = SubmitError::from(e);
                self.error = Some(e.clone());
                return Err(e);
            }
        };
        self.phase = Phase::Submitting;
        self.error = None;
        tracing::debug!(recipe_id = %self.recipe_id, ?rating, "submitting comment");
        Ok(CommentRequest { recipe_id: self.recipe_id.clone(), body, rating })
    }

    /// Applies the gateway's answer to the in-flight submission.
    ///
    /// Success appends the comment, clears the draft and recomputes the average.
    /// Failure keeps the draft for a retry. A response arriving while idle, or for
    /// another recipe, is ignored and `None` is returned.
    pub fn resolve(&mut self, response: CommentResponse) -> Option<Result<&Comment, SubmitError>> {
        if !self.is_submitting() || response.recipe_id != self.recipe_id {
            return None;
        }
        self.phase = Phase::Idle;
        match response.result {
            Ok(comment) => {
                self.comments.push(comment);
                self.average = average_rating(&self.comments);
                self.draft = PendingSubmission::default();
                self.hovered_rating = None;
                self.comments.last().map(Ok)
            }
            Err(e) => {
                tracing::warn!(recipe_id = %self.recipe_id, error = %e, "comment not posted");
                let e = SubmitError::Gateway(e);
                self.error = Some(e.clone());
                Some(Err(e))
            }
        }
    }
}

impl CommentRequest {
    /// Performs the gateway call and packages the result for [`CommentSection::resolve`].
    pub async fn send<G: MutationGateway>(self, gateway: &G, ctx: &RequestContext) -> CommentResponse {
        let result = gateway.create_comment(ctx, &self.recipe_id, &self.body, self.rating).await;
        CommentResponse { recipe_id: self.recipe_id, result }
    }
}

fn check_rating(stars: i64) -> Result<u8, ValidationError> {
    match u8::try_from(stars) {
        Ok(s @ 1..=5) => Ok(s),
        _ => Err(ValidationError::RatingOutOfRange(stars)),
    }
}

/// Checks a draft without touching any state. Returns the trimmed body and rating.
pub fn validate(draft: &PendingSubmission) -> Result<(String, Option<u8>), ValidationError> {
    let body = draft.body.trim();
    if body.is_empty() {
        return Err(ValidationError::EmptyBody);
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(ValidationError::BodyTooLong { max: MAX_BODY_CHARS });
    }
    let rating = draft.rating.map(|r| check_rating(i64::from(r))).transpose()?;
    Ok((body.to_owned(), rating))
}

/// Arithmetic mean of the ratings present in `comments`; unrated comments are skipped.
pub fn average_rating(comments: &[Comment]) -> Option<f64> {
    let (sum, n) = comments
        .iter()
        .filter_map(|c| c.rating)
        .fold((0u32, 0u32), |(sum, n), r| (sum + u32::from(r), n + 1));
    (n > 0).then(|| f64::from(sum) / f64::from(n))
}

/// Caption shown next to the chosen star count.
pub fn rating_label(stars: u8) -> &'static str {
    match stars {
        5 => "Excellent!",
        4 => "Very good",
        3 => "Good",
        2 => "Fair",
        _ => "Needs improvement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, rating: Option<u8>) -> Comment {
        Comment {
            id: id.into(),
            recipe_id: "r1".into(),
            author_id: "u1".into(),
            author_name: "ana".into(),
            body: "tasty".into(),
            rating,
            created_at: 0,
        }
    }

    #[test]
    fn average_skips_unrated() {
        let list = [comment("a", Some(5)), comment("b", Some(4)), comment("c", None)];
        assert_eq!(average_rating(&list), Some(4.5));
        assert_eq!(average_rating(&[comment("x", None)]), None);
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn whitespace_body_never_leaves_idle() {
        let mut section = CommentSection::new("r1", Vec::new());
        section.set_body("   \n\t ");

        assert!(!section.can_submit());
        assert_eq!(
            section.submit(),
            Err(SubmitError::Validation(ValidationError::EmptyBody))
        );
        assert_eq!(section.phase(), Phase::Idle);
        assert_eq!(
            section.error(),
            Some(&SubmitError::Validation(ValidationError::EmptyBody))
        );
    }

    #[test]
    fn out_of_range_rating_is_rejected_not_clamped() {
        let mut section = CommentSection::new("r1", Vec::new());
        assert_eq!(section.set_rating(0), Err(ValidationError::RatingOutOfRange(0)));
        assert_eq!(section.set_rating(6), Err(ValidationError::RatingOutOfRange(6)));
        assert_eq!(section.draft().rating, None);

        section.set_rating(3).unwrap();
        assert_eq!(section.draft().rating, Some(3));
    }

    #[test]
    fn draft_rating_is_revalidated_on_submit() {
        let draft = PendingSubmission { body: "ok".into(), rating: Some(9) };
        assert_eq!(validate(&draft), Err(ValidationError::RatingOutOfRange(9)));
    }

    #[test]
    fn overlong_body_is_rejected() {
        let draft = PendingSubmission { body: "x".repeat(MAX_BODY_CHARS + 1), rating: None };
        assert_eq!(
            validate(&draft),
            Err(ValidationError::BodyTooLong { max: MAX_BODY_CHARS })
        );
    }

    #[test]
    fn body_is_trimmed_before_dispatch() {
        let mut section = CommentSection::new("r1", Vec::new());
        section.set_body("  Great recipe!  ");
        let req = section.submit().unwrap();
        assert_eq!(req.body, "Great recipe!");
    }

    #[test]
    fn success_appends_and_clears_draft() {
        let mut section = CommentSection::new("r1", vec![comment("a", Some(4))]);
        section.set_body("Great recipe!");
        section.set_rating(5).unwrap();

        let req = section.submit().unwrap();
        assert!(section.is_submitting());
        assert_eq!(section.comments().len(), 1, "no optimistic insert");
        assert_eq!(section.submit(), Err(SubmitError::InFlight));

        let created = Comment { body: req.body.clone(), ..comment("c1", req.rating) };
        let posted = section
            .resolve(CommentResponse { recipe_id: "r1".into(), result: Ok(created) })
            .unwrap()
            .unwrap()
            .id
            .clone();

        assert_eq!(posted, "c1");
        assert_eq!(section.comments().len(), 2);
        assert_eq!(section.average_rating(), Some(4.5));
        assert_eq!(section.draft(), &PendingSubmission::default());
        assert_eq!(section.phase(), Phase::Idle);
    }

    #[test]
    fn failure_keeps_draft_for_retry() {
        let mut section = CommentSection::new("r1", Vec::new());
        section.set_body("Needs salt");
        section.set_rating(2).unwrap();
        section.submit().unwrap();

        let outcome = section.resolve(CommentResponse {
            recipe_id: "r1".into(),
            result: Err(GatewayError::Transient("db locked".into())),
        });

        assert!(matches!(outcome, Some(Err(SubmitError::Gateway(_)))));
        assert_eq!(section.draft().body, "Needs salt");
        assert_eq!(section.draft().rating, Some(2));
        assert!(section.can_submit());
    }

    #[test]
    fn response_while_idle_is_ignored() {
        let mut section = CommentSection::new("r1", Vec::new());
        let outcome = section.resolve(CommentResponse {
            recipe_id: "r1".into(),
            result: Ok(comment("c9", Some(1))),
        });
        assert!(outcome.is_none());
        assert!(section.comments().is_empty());
    }

    #[test]
    fn hover_preview_overrides_chosen_rating() {
        let mut section = CommentSection::new("r1", Vec::new());
        section.set_rating(2).unwrap();
        section.hover_rating(Some(4));
        assert_eq!(section.shown_rating(), Some(4));
        section.hover_rating(None);
        assert_eq!(section.shown_rating(), Some(2));
    }

    #[test]
    fn labels_match_star_count() {
        assert_eq!(rating_label(5), "Excellent!");
        assert_eq!(rating_label(1), "Needs improvement");
    }
}
