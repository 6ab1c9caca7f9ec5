// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use factly_app::{CATEGORIES, Fact, FactId};
use std::io::Read;
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Response, Server};

const FACT_TEXTS: [&str; 12] = [
    "Honey never spoils in sealed jars",
    "Octopuses have three hearts",
    "Bananas are botanically berries",
    "The Eiffel Tower grows in summer heat",
    "Sharks predate trees in the fossil record",
    "A day on Venus outlasts its year",
    "Wombats produce cube-shaped droppings",
    "Lightning strikes the Earth about 8 million times a day",
    "The Library of Alexandria declined over centuries",
    "Some metals are liquid at room temperature",
    "Compound interest doubles money on a fixed schedule",
    "The first computer bug was an actual moth",
];

const SOURCE_DOMAINS: [&str; 5] = [
    "https://factsource.example",
    "https://archive.example.org",
    "https://journal.example.com",
    "https://encyclopedia.example.net",
    "https://records.example.io",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic generator of plausible fact rows. Same seed, same facts.
#[derive(Debug, Clone)]
pub struct FactFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl FactFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: DeterministicRng::new(if seed == 0 { 1 } else { seed }),
            next_id: 1,
        }
    }

    pub fn fact(&mut self) -> Fact {
        let category = CATEGORIES[self.rng.int_n(CATEGORIES.len())].name;
        self.fact_in(category)
    }

    pub fn fact_in(&mut self, category: &str) -> Fact {
        let id = self.next_id;
        self.next_id += 1;

        let text = FACT_TEXTS[self.rng.int_n(FACT_TEXTS.len())];
        let domain = SOURCE_DOMAINS[self.rng.int_n(SOURCE_DOMAINS.len())];
        Fact {
            id: FactId::new(id),
            text: text.to_owned(),
            source: format!("{domain}/facts/{id}"),
            category: category.to_owned(),
            votes_interesting: self.rng.int_n(30) as i64,
            votes_mindblowing: self.rng.int_n(15) as i64,
            votes_false: self.rng.int_n(5) as i64,
        }
    }

    pub fn facts(&mut self, count: usize) -> Vec<Fact> {
        (0..count).map(|_| self.fact()).collect()
    }

    /// A fact whose false-votes strictly outweigh the other two counters.
    pub fn disputed_fact(&mut self) -> Fact {
        let mut fact = self.fact();
        fact.votes_false = fact.votes_interesting + fact.votes_mindblowing + 1;
        fact
    }
}

/// Server-side select ordering, for building expected responses.
pub fn ordered_by_interesting(mut facts: Vec<Fact>) -> Vec<Fact> {
    facts.sort_by(|a, b| b.votes_interesting.cmp(&a.votes_interesting));
    facts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
}

impl CannedResponse {
    pub fn rows(facts: &[Fact]) -> Self {
        Self {
            status: 200,
            body: serde_json::to_string(facts).expect("facts encode as JSON"),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "message": message }).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Scripted facts-table endpoint: serves the canned responses in order and
/// records what it received. `finish` joins the server thread and hands the
/// recorded requests back for assertions.
pub struct MockTableServer {
    base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockTableServer {
    pub fn start(responses: Vec<CannedResponse>) -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start mock table server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for canned in responses {
                let Ok(mut request) = server.recv() else {
                    break;
                };

                let headers = request
                    .headers()
                    .iter()
                    .map(|header| (header.field.to_string(), header.value.to_string()))
                    .collect();
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    body,
                    headers,
                });

                let response = Response::from_string(canned.body)
                    .with_status_code(canned.status)
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json")
                            .expect("valid content type header"),
                    );
                let _ = request.respond(response);
            }
            recorded
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock table server thread panicked"))
    }
}

#[cfg(test)]
mod tests {
    use super::{CannedResponse, FactFaker, ordered_by_interesting};
    use factly_app::find_category;
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_produces_identical_facts() {
        let mut left = FactFaker::new(42);
        let mut right = FactFaker::new(42);
        assert_eq!(left.facts(5), right.facts(5));
    }

    #[test]
    fn ids_are_sequential_and_categories_come_from_the_registry() {
        let mut faker = FactFaker::new(7);
        let facts = faker.facts(10);
        for (index, fact) in facts.iter().enumerate() {
            assert_eq!(fact.id.get(), index as i64 + 1);
            assert!(
                find_category(&fact.category).is_some(),
                "category {}",
                fact.category
            );
            assert!(fact.source.starts_with("https://"));
        }
    }

    #[test]
    fn disputed_fact_is_disputed() {
        let mut faker = FactFaker::new(3);
        assert!(faker.disputed_fact().is_disputed());
    }

    #[test]
    fn variety_across_seeds() {
        let mut seen = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = FactFaker::new(seed);
            let fact = faker.fact();
            seen.insert(format!("{}|{}|{}", fact.text, fact.source, fact.category));
        }
        assert!(seen.len() >= 10, "got {}", seen.len());
    }

    #[test]
    fn ordering_helper_sorts_descending() {
        let mut faker = FactFaker::new(11);
        let ordered = ordered_by_interesting(faker.facts(8));
        for pair in ordered.windows(2) {
            assert!(pair[0].votes_interesting >= pair[1].votes_interesting);
        }
    }

    #[test]
    fn canned_error_uses_the_table_error_envelope() {
        let canned = CannedResponse::error(409, "duplicate key value");
        assert_eq!(canned.status, 409);
        assert_eq!(canned.body, r#"{"message":"duplicate key value"}"#);
    }
}
