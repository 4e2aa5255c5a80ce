//! Offset pagination of quiz listings and the `nextUrl` link.

use serde::Deserialize;
use serde_with::{DefaultOnError, DisplayFromStr, serde_as};
use utoipa::IntoParams;

/// Query accepted by quiz listings. Malformed numbers fall back to their defaults.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Text searched in questions; whitespace acts as a wildcard.
    pub search: Option<String>,
    /// Any non-empty value restricts the listing to the caller favourites.
    pub searchfavourites: Option<String>,
    /// One-based page number.
    #[serde_as(as = "DefaultOnError<Option<DisplayFromStr>>")]
    #[serde(default)]
    #[param(value_type = Option<u64>)]
    pub pageno: Option<u64>,
    /// Quizzes per page.
    #[serde_as(as = "DefaultOnError<Option<DisplayFromStr>>")]
    #[serde(default)]
    #[param(value_type = Option<u64>)]
    pub pagelength: Option<u64>,
}

impl ListQuery {
    pub fn favourites_only(&self) -> bool {
        self.searchfavourites
            .as_deref()
            .is_some_and(|value| !value.is_empty())
    }
}

/// Resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub pageno: u64,
    pub pagelength: u64,
}

impl PageWindow {
    /// Apply defaults: page 1, and `default_length` for a missing or zero page length.
    pub fn resolve(pageno: Option<u64>, pagelength: Option<u64>, default_length: u64) -> Self {
        Self {
            pageno: pageno.filter(|page| *page > 0).unwrap_or(1),
            pagelength: pagelength
                .filter(|length| *length > 0)
                .unwrap_or(default_length.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        self.pagelength.saturating_mul(self.pageno - 1)
    }

    /// Whether more items follow this page out of `total`.
    pub fn has_next(&self, total: u64) -> bool {
        self.pageno < total.div_ceil(self.pagelength)
    }
}

/// Request path and raw query used to build links to other pages.
#[derive(Debug, Clone, Default)]
pub struct PageLink {
    pub path: String,
    pub query: Option<String>,
}

impl PageLink {
    pub fn new(path: impl Into<String>, query: Option<&str>) -> Self {
        Self {
            path: path.into(),
            query: query.map(str::to_owned),
        }
    }

    /// Same path and query, with `pageno` set to `pageno`.
    pub fn with_pageno(&self, pageno: u64) -> String {
        let mut pairs: Vec<(String, String)> = self
            .query
            .as_deref()
            .and_then(|query| serde_urlencoded::from_str(query).ok())
            .unwrap_or_default();
        pairs.retain(|(key, _)| key != "pageno");
        pairs.push(("pageno".into(), pageno.to_string()));

        match serde_urlencoded::to_string(&pairs) {
            Ok(query) => format!("{}?{}", self.path, query),
            Err(_) => format!("{}?pageno={}", self.path, pageno),
        }
    }

    /// Link to the page after `window`, or an empty string on the last page.
    pub fn next_url(&self, window: PageWindow, total: u64) -> String {
        if window.has_next(total) {
            self.with_pageno(window.pageno + 1)
        } else {
            String::new()
        }
    }
}
