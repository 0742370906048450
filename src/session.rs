//! Upload/generate session state.
//!
//! A session holds the current food and person photos and moves between
//! [`SessionState::Idle`], [`SessionState::Generating`] and one of the two
//! settled states. Any upload resets it to idle. There is no cancel: a batch
//! that was started before an upload still runs to completion, and its
//! result is dropped when it arrives.

use crate::aggregate::{aggregate, ShotSet};
use crate::dispatch::dispatch_shots;
use crate::error::{Result, UgcError};
use crate::image::{ImageProvider, UploadedImage};

/// Where a session currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing generated since the last upload.
    #[default]
    Idle,
    /// A batch is in flight.
    Generating,
    /// The last batch produced at least one shot.
    Success(ShotSet),
    /// The last attempt failed; holds the message shown to the user.
    Failure(String),
}

/// Inputs captured when a batch starts, stamped with the session epoch.
#[derive(Debug, Clone)]
#[must_use = "a ticket must be run and handed back to the session"]
pub struct GenerationTicket {
    epoch: u64,
    food: UploadedImage,
    person: Option<UploadedImage>,
}

impl GenerationTicket {
    /// Dispatches the batch and aggregates its outcomes.
    pub async fn run<P>(&self, provider: &P) -> Result<ShotSet>
    where
        P: ImageProvider + ?Sized,
    {
        let outcomes = dispatch_shots(provider, Some(&self.food), self.person.as_ref()).await?;
        aggregate(outcomes)
    }
}

/// One user's upload/generate session.
#[derive(Debug, Default)]
pub struct Session {
    food: Option<UploadedImage>,
    person: Option<UploadedImage>,
    state: SessionState,
    epoch: u64,
}

impl Session {
    /// Creates an idle session with no photos.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the food photo and resets to idle.
    pub fn upload_food(&mut self, image: UploadedImage) {
        self.food = Some(image);
        self.reset();
    }

    /// Replaces the person photo and resets to idle.
    pub fn upload_person(&mut self, image: UploadedImage) {
        self.person = Some(image);
        self.reset();
    }

    fn reset(&mut self) {
        self.epoch += 1;
        self.state = SessionState::Idle;
    }

    /// The current food photo.
    pub fn food(&self) -> Option<&UploadedImage> {
        self.food.as_ref()
    }

    /// The current person photo.
    pub fn person(&self) -> Option<&UploadedImage> {
        self.person.as_ref()
    }

    /// The current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// True while a batch is in flight.
    pub fn is_generating(&self) -> bool {
        matches!(self.state, SessionState::Generating)
    }

    /// Whether the generate trigger should be enabled.
    pub fn can_generate(&self) -> bool {
        self.food.is_some() && !self.is_generating()
    }

    /// The shots of the last successful batch.
    pub fn shots(&self) -> Option<&ShotSet> {
        match &self.state {
            SessionState::Success(shots) => Some(shots),
            _ => None,
        }
    }

    /// The message to show in the error area, if any.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failure(message) => Some(message),
            _ => None,
        }
    }

    /// Starts a batch.
    ///
    /// Without a food photo the session fails with the precondition message
    /// and nothing is dispatched. While a batch is in flight the trigger is
    /// refused and the state is left alone.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket> {
        if self.is_generating() {
            return Err(UgcError::InvalidRequest(
                "generation already in progress".into(),
            ));
        }
        let Some(food) = self.food.clone() else {
            self.state = SessionState::Failure(UgcError::MissingFoodImage.user_message());
            return Err(UgcError::MissingFoodImage);
        };

        self.state = SessionState::Generating;
        Ok(GenerationTicket {
            epoch: self.epoch,
            food,
            person: self.person.clone(),
        })
    }

    /// Settles a batch started by [`Session::begin_generation`].
    ///
    /// Returns false, leaving the state untouched, if the ticket predates the
    /// latest upload.
    pub fn complete_generation(&mut self, ticket: GenerationTicket, result: Result<ShotSet>) -> bool {
        if ticket.epoch != self.epoch {
            tracing::debug!(
                ticket_epoch = ticket.epoch,
                session_epoch = self.epoch,
                "discarding result of a stale generation batch"
            );
            return false;
        }

        self.state = match result {
            Ok(shots) => SessionState::Success(shots),
            Err(e) => {
                tracing::error!("generation failed: {e}");
                SessionState::Failure(e.user_message())
            }
        };
        true
    }

    /// Runs a whole batch: begin, dispatch, aggregate, settle.
    pub async fn generate<P>(&mut self, provider: &P) -> &SessionState
    where
        P: ImageProvider + ?Sized,
    {
        let ticket = match self.begin_generation() {
            Ok(ticket) => ticket,
            Err(_) => return &self.state,
        };
        let result = ticket.run(provider).await;
        self.complete_generation(ticket, result);
        &self.state
    }
}
