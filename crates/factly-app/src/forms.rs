// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use url::Url;

use crate::model::find_category;

pub const FACT_TEXT_MAX: usize = 200;

/// Controlled input for the new-fact form. Fields mirror what the user has
/// typed, not what the server will store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactFormInput {
    pub text: String,
    pub source: String,
    pub category: String,
}

impl FactFormInput {
    /// Characters left before the text cap; negative once over it. Drives
    /// the live counter next to the text field.
    pub fn remaining_chars(&self) -> i64 {
        FACT_TEXT_MAX as i64 - self.text.chars().count() as i64
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            bail!("fact text is required -- share a fact and retry");
        }
        if self.text.chars().count() > FACT_TEXT_MAX {
            bail!("fact text must be at most {FACT_TEXT_MAX} characters");
        }
        if !is_valid_http_url(&self.source) {
            bail!("fact source must be an absolute http/https URL");
        }
        if find_category(&self.category).is_none() {
            bail!("fact category is required -- choose a category and retry");
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.source.clear();
        self.category.clear();
    }
}

pub fn is_valid_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{FACT_TEXT_MAX, FactFormInput, is_valid_http_url};

    fn valid_form() -> FactFormInput {
        FactFormInput {
            text: "Honey never spoils".to_owned(),
            source: "https://example.com/honey".to_owned(),
            category: "science".to_owned(),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut form = valid_form();
        form.text = "   ".to_owned();
        assert!(form.validate().is_err());
    }

    #[test]
    fn over_length_text_is_rejected_even_when_other_fields_are_valid() {
        let mut form = valid_form();
        form.text = "x".repeat(FACT_TEXT_MAX + 1);
        assert!(form.validate().is_err());

        form.text = "x".repeat(FACT_TEXT_MAX);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn bad_source_url_is_rejected() {
        let mut form = valid_form();
        for source in ["notaurl", "ftp://example.com", "example.com", "/relative"] {
            form.source = source.to_owned();
            assert!(form.validate().is_err(), "source {source}");
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut form = valid_form();
        form.category = "astrology".to_owned();
        assert!(form.validate().is_err());

        form.category = String::new();
        assert!(form.validate().is_err());
    }

    #[test]
    fn remaining_chars_counts_down_and_goes_negative() {
        let mut form = FactFormInput::default();
        assert_eq!(form.remaining_chars(), 200);

        form.text = "abcde".to_owned();
        assert_eq!(form.remaining_chars(), 195);

        form.text = "x".repeat(201);
        assert_eq!(form.remaining_chars(), -1);
    }

    #[test]
    fn remaining_chars_counts_characters_not_bytes() {
        let mut form = FactFormInput::default();
        form.text = "caf\u{e9}".to_owned();
        assert_eq!(form.remaining_chars(), 196);
    }

    #[test]
    fn url_check_requires_http_scheme() {
        assert!(is_valid_http_url("http://example.com"));
        assert!(is_valid_http_url("https://example.com/path?q=1"));
        assert!(!is_valid_http_url("mailto:facts@example.com"));
        assert!(!is_valid_http_url(""));
    }

    #[test]
    fn clear_resets_all_fields() {
        let mut form = valid_form();
        form.clear();
        assert_eq!(form, FactFormInput::default());
    }
}
