use teloxide::dispatching::dialogue::{Dialogue, Storage};
use uuid::Uuid;

use crate::api::CrabApi;
use crate::catalog::{Catalog, SpecimenDraft};
use crate::quiz::{QuizOutcome, QuizSession};

/// Per-chat screen. Persisted by the dialogue storage between updates.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    Home,
    Quiz {
        session: QuizSession,
    },
    AwaitingResult {
        session: QuizSession,
    },
    Results {
        outcome: QuizOutcome,
    },
    Species {
        catalog: Catalog,
    },
    AddSpecies {
        catalog: Catalog,
        draft: SpecimenDraft,
    },
    DeleteSpecies {
        catalog: Catalog,
    },
    ConfirmDelete {
        catalog: Catalog,
        id: String,
    },
}

impl State {
    /// Whether a classification started by the session `token` may still be
    /// shown. Anything else means the user moved on and the result is stale.
    pub fn awaits(&self, token: Uuid) -> bool {
        matches!(self, State::AwaitingResult { session } if session.token() == token)
    }
}

/// Classifies a finished session and moves the chat to its results. Returns
/// `None` without touching the chat when it stopped waiting for `session`
/// while the classifier was working.
pub async fn settle_classification<S>(
    api: &CrabApi,
    dialogue: &Dialogue<State, S>,
    session: QuizSession,
) -> Result<Option<QuizOutcome>, S::Error>
where
    S: Storage<State> + ?Sized + Send + Sync + 'static,
{
    let species = api.classify_or_unknown(session.vector()).await;

    let current = dialogue.get().await?.unwrap_or_default();
    if !current.awaits(session.token()) {
        log::info!(
            "Discarding classification {:?} of stale quiz {}",
            species,
            session.token()
        );
        return Ok(None);
    }

    let outcome = session.finish(species);
    dialogue
        .update(State::Results {
            outcome: outcome.clone(),
        })
        .await?;
    Ok(Some(outcome))
}
