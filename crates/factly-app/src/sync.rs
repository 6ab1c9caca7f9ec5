// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::forms::FactFormInput;
use crate::ids::FactId;
use crate::model::{CATEGORIES, Fact, VoteKind};

/// Current category selection. Initialization and the "show all" action are
/// the same variant, so select-all cannot diverge between mount and click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(&'static str),
}

impl CategoryFilter {
    pub fn matches(self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => name == category,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(name) => name,
        }
    }
}

/// One entry per filter control: "all" first, then the registry order.
pub fn filter_options() -> Vec<CategoryFilter> {
    std::iter::once(CategoryFilter::All)
        .chain(
            CATEGORIES
                .iter()
                .map(|category| CategoryFilter::Only(category.name)),
        )
        .collect()
}

/// Identifies one outstanding fetch; only the most recently issued ticket may
/// apply its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchGuard {
    last_issued: u64,
}

impl FetchGuard {
    pub fn begin(&mut self) -> FetchTicket {
        self.last_issued += 1;
        FetchTicket(self.last_issued)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.last_issued
    }
}

/// The canonical fact collection. Children never mutate it directly; all
/// writes go through the three operations below.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactCollection {
    facts: Vec<Fact>,
}

impl FactCollection {
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn get(&self, id: FactId) -> Option<&Fact> {
        self.facts.iter().find(|fact| fact.id == id)
    }

    pub fn replace_all(&mut self, facts: Vec<Fact>) {
        self.facts = facts;
    }

    pub fn prepend(&mut self, fact: Fact) {
        self.facts.insert(0, fact);
    }

    /// Replaces the fact with the given id wholesale, adopting the server's
    /// row verbatim. Returns false if the id is no longer present.
    pub fn replace_by_id(&mut self, id: FactId, fact: Fact) -> bool {
        match self.facts.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => {
                *existing = fact;
                true
            }
            None => false,
        }
    }
}

/// Everything the runtime needs to perform one vote update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteRequest {
    pub id: FactId,
    pub kind: VoteKind,
    pub current: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    FilterChanged(CategoryFilter),
    LoadingChanged(bool),
    FactsReplaced(usize),
    StaleFetchDiscarded(FetchTicket),
    FormVisibilityChanged(bool),
    UploadingChanged(bool),
    FactPrepended(FactId),
    FactUpdated(FactId),
    VotePending(FactId, VoteKind),
    VoteSettled(FactId),
    StatusUpdated(String),
}

/// Owns the filter, the fact collection, and every in-flight flag. The UI
/// calls `begin_*` before dispatching a remote request and `complete_*` with
/// the outcome; both return the events the view layer should react to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Controller {
    filter: CategoryFilter,
    collection: FactCollection,
    guard: FetchGuard,
    loading: bool,
    form_visible: bool,
    form: FactFormInput,
    uploading: bool,
    pending_votes: BTreeSet<FactId>,
    status_line: Option<String>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn facts(&self) -> &[Fact] {
        self.collection.facts()
    }

    pub fn collection(&self) -> &FactCollection {
        &self.collection
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn form_visible(&self) -> bool {
        self.form_visible
    }

    pub fn form(&self) -> &FactFormInput {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FactFormInput {
        &mut self.form
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_vote_pending(&self, id: FactId) -> bool {
        self.pending_votes.contains(&id)
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    /// Starts the initial fetch (and any manual refresh).
    pub fn begin_fetch(&mut self) -> (FetchTicket, Vec<AppEvent>) {
        let ticket = self.guard.begin();
        self.loading = true;
        (ticket, vec![AppEvent::LoadingChanged(true)])
    }

    /// Applies a new filter and starts the refetch it requires. Selecting the
    /// already-active filter still refetches.
    pub fn select_filter(&mut self, filter: CategoryFilter) -> (FetchTicket, Vec<AppEvent>) {
        self.filter = filter;
        let (ticket, mut events) = self.begin_fetch();
        events.insert(0, AppEvent::FilterChanged(filter));
        (ticket, events)
    }

    /// Applies a fetch outcome. A ticket that has been superseded by a newer
    /// fetch is discarded without touching any state.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Fact>, String>,
    ) -> Vec<AppEvent> {
        if !self.guard.is_current(ticket) {
            return vec![AppEvent::StaleFetchDiscarded(ticket)];
        }

        self.loading = false;
        let mut events = vec![AppEvent::LoadingChanged(false)];
        match result {
            Ok(facts) => {
                let count = facts.len();
                self.collection.replace_all(facts);
                events.push(AppEvent::FactsReplaced(count));
            }
            Err(message) => {
                events.push(self.set_status(&format!("load failed: {message}")));
            }
        }
        events
    }

    pub fn toggle_form(&mut self) -> Vec<AppEvent> {
        self.form_visible = !self.form_visible;
        vec![AppEvent::FormVisibilityChanged(self.form_visible)]
    }

    /// Validates the form and, if it passes, marks the upload in flight and
    /// hands back the payload to insert. A failing validation is a no-op.
    pub fn begin_submit(&mut self) -> (Option<FactFormInput>, Vec<AppEvent>) {
        if self.uploading || self.form.validate().is_err() {
            return (None, Vec::new());
        }

        self.uploading = true;
        (
            Some(self.form.clone()),
            vec![AppEvent::UploadingChanged(true)],
        )
    }

    /// Applies an insert outcome. The form is cleared and hidden after every
    /// passing-validation submission attempt, success or not.
    pub fn complete_submit(&mut self, result: Result<Fact, String>) -> Vec<AppEvent> {
        self.uploading = false;
        self.form.clear();
        self.form_visible = false;
        let mut events = vec![
            AppEvent::UploadingChanged(false),
            AppEvent::FormVisibilityChanged(false),
        ];
        match result {
            Ok(fact) => {
                let id = fact.id;
                self.collection.prepend(fact);
                events.push(AppEvent::FactPrepended(id));
            }
            Err(message) => {
                events.push(self.set_status(&format!("share failed: {message}")));
            }
        }
        events
    }

    /// Marks a vote in flight and hands back the update request. Returns
    /// nothing while a vote on the same fact is already pending.
    pub fn begin_vote(
        &mut self,
        id: FactId,
        kind: VoteKind,
    ) -> (Option<VoteRequest>, Vec<AppEvent>) {
        if self.pending_votes.contains(&id) {
            return (None, Vec::new());
        }
        let Some(fact) = self.collection.get(id) else {
            return (None, Vec::new());
        };

        let request = VoteRequest {
            id,
            kind,
            current: fact.vote_count(kind),
        };
        self.pending_votes.insert(id);
        (Some(request), vec![AppEvent::VotePending(id, kind)])
    }

    /// Applies a vote outcome: the server's row replaces the local one by id;
    /// on failure the collection stays untouched either way.
    pub fn complete_vote(&mut self, id: FactId, result: Result<Fact, String>) -> Vec<AppEvent> {
        self.pending_votes.remove(&id);
        let mut events = vec![AppEvent::VoteSettled(id)];
        match result {
            Ok(fact) => {
                if self.collection.replace_by_id(id, fact) {
                    events.push(AppEvent::FactUpdated(id));
                }
            }
            Err(message) => {
                events.push(self.set_status(&format!("vote failed: {message}")));
            }
        }
        events
    }

    pub fn clear_status(&mut self) -> Vec<AppEvent> {
        self.status_line = None;
        Vec::new()
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
