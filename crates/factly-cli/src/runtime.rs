// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use factly_api::{Client, NewFact};
use factly_app::{CategoryFilter, Fact, FactFormInput, VoteRequest};

/// Bridges the view layer to the remote table client.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl factly_tui::AppRuntime for ApiRuntime {
    fn fetch_facts(&mut self, filter: CategoryFilter) -> Result<Vec<Fact>> {
        self.client.select_facts(filter)
    }

    fn submit_fact(&mut self, form: &FactFormInput) -> Result<Fact> {
        form.validate()?;
        self.client.insert_fact(&NewFact {
            text: form.text.clone(),
            source: form.source.clone(),
            category: form.category.clone(),
        })
    }

    fn cast_vote(&mut self, request: &VoteRequest) -> Result<Fact> {
        self.client
            .increment_vote(request.id, request.kind, request.current)
    }
}
