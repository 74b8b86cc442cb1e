//! Per-screen projections of the reception list.

use derive_more::Display;
use tracing::warn;

use crate::{
    reception::{Reception, ReceptionStore, State},
    Error,
};

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum View {
    /// The bench: everything not yet finished, plus returned items.
    #[default]
    #[display("reception")]
    Reception,
    /// Waiting for delivery.
    #[display("finished")]
    Finished,
    #[display("delivered")]
    Delivered,
}

impl View {
    pub fn includes(self, r: &Reception) -> bool {
        match self {
            Self::Reception => r.state != State::Finished || r.is_returned,
            Self::Finished => r.is_completed() && !r.delivered,
            Self::Delivered => r.is_completed() && r.delivered,
        }
    }
}

/// Status filter of the reception view.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum StatusFilter {
    #[default]
    #[display("all")]
    All,
    #[display("received")]
    Received,
    /// Returned items are back on the bench, so they count as in progress.
    #[display("in progress")]
    InProgress,
    #[display("returned")]
    Returned,
}

impl StatusFilter {
    pub fn matches(self, r: &Reception) -> bool {
        match self {
            Self::All => true,
            Self::Received => r.state == State::Received && !r.is_returned,
            Self::InProgress => r.state == State::InProgress || r.is_returned,
            Self::Returned => r.is_returned,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Query {
    pub view: View,
    pub search: String,
    /// Only applies to [`View::Reception`].
    pub status: StatusFilter,
}

impl Query {
    pub fn new(view: View) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Visible receptions, in display order. Ties keep their input order.
    pub fn apply<'a>(&self, receptions: &'a [Reception]) -> Vec<&'a Reception> {
        let term = self.search.trim().to_lowercase();
        let mut visible = receptions
            .iter()
            .filter(|r| self.view.includes(r))
            .filter(|r| {
                self.view != View::Reception || self.status.matches(r)
            })
            .filter(|r| term.is_empty() || self.matches_term(r, &term))
            .collect::<Vec<_>>();

        match self.view {
            View::Reception => visible.sort_by_key(|r| r.created_at),
            View::Finished | View::Delivered => {
                visible.sort_by_key(|r| r.last_transition_at())
            }
        }
        visible
    }

    fn matches_term(&self, r: &Reception, term: &str) -> bool {
        let contains = |field: &str| field.to_lowercase().contains(term);

        contains(r.client_name())
            || r.serial_number().is_some_and(contains)
            || contains(r.car_model())
            || (self.view == View::Reception && contains(&r.reception_number))
    }
}

/// Last fetched reception list.
///
/// A failed refresh keeps what was shown before.
#[derive(Debug, Default)]
pub struct Board {
    receptions: Vec<Reception>,
}

impl Board {
    pub fn receptions(&self) -> &[Reception] {
        &self.receptions
    }

    pub async fn refresh(
        &mut self,
        store: &impl ReceptionStore,
    ) -> Result<(), Error> {
        match store.list_receptions().await {
            Ok(receptions) => {
                self.receptions = receptions;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, kept = self.receptions.len(), "refresh failed");
                Err(e)
            }
        }
    }

    pub fn query(&self, query: &Query) -> Vec<&Reception> {
        query.apply(&self.receptions)
    }
}
