//! # Listing search
//!
//! Predicate filtering, sorting, and pagination over `Available` listings.
//! Equality filters are pushed to the store when it has an index for the
//! shape; age buckets and location prefixes are always applied here, since
//! the store only understands equality.

use std::sync::Arc;

use tracing::debug;

use configs::SearchDefaults;
use domains::{
    DocumentStore, DomainError, Filter, Gender, Listing, ListingStatus, OrderBy, Page, StoreError,
};

use crate::codec;
use crate::collections::LISTINGS;

/// Age predicate: an exact age in years, or a named bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeFilter {
    Exact(u8),
    Bucket(AgeBucket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBucket {
    /// Up to one year.
    Young,
    /// Over one year, up to seven.
    Adult,
    /// Over seven years.
    Senior,
}

impl AgeBucket {
    fn contains(self, age: u8) -> bool {
        match self {
            AgeBucket::Young => age <= 1,
            AgeBucket::Adult => age > 1 && age <= 7,
            AgeBucket::Senior => age > 7,
        }
    }
}

impl AgeFilter {
    /// Listings without a recorded age never match an age filter.
    fn matches(self, age: Option<u8>) -> bool {
        match (self, age) {
            (AgeFilter::Exact(want), Some(age)) => age == want,
            (AgeFilter::Bucket(bucket), Some(age)) => bucket.contains(age),
            (_, None) => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub species: Option<String>,
    pub age: Option<AgeFilter>,
    pub gender: Option<Gender>,
    /// Prefix match: "台北市" finds "台北市信義區".
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    CreatedAt,
    Location,
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub filters: SearchFilters,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    /// 1-indexed; 0 is treated as 1.
    pub page: usize,
    /// Defaults to the configured page size.
    pub page_size: Option<usize>,
}

#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn DocumentStore>,
    defaults: SearchDefaults,
}

impl SearchService {
    pub fn new(store: Arc<dyn DocumentStore>, defaults: SearchDefaults) -> Self {
        Self { store, defaults }
    }

    pub async fn search(&self, request: SearchRequest) -> Result<Page<Listing>, DomainError> {
        let page_size = request.page_size.unwrap_or(self.defaults.page_size);

        // Tier 1: equality filters at the store. Tier 2: status only,
        // everything else client-side.
        let mut filters = vec![Filter::eq(
            "status",
            ListingStatus::Available.to_string(),
        )];
        if let Some(species) = &request.filters.species {
            filters.push(Filter::eq("species", species.clone()));
        }
        if let Some(gender) = request.filters.gender {
            filters.push(Filter::eq("gender", codec::encode(&gender)?));
        }

        let docs = match self
            .store
            .query(LISTINGS, &filters, Some(OrderBy::desc("created_at")), None)
            .await
        {
            Ok(docs) => docs,
            Err(StoreError::UnsupportedQuery { reason, .. }) => {
                debug!(%reason, "indexed listing query unsupported, filtering client-side");
                self.store.query(LISTINGS, &[], None, None).await?
            }
            Err(error) => return Err(error.into()),
        };

        let mut listings: Vec<Listing> = codec::decode_all(docs)?;
        listings.retain(|l| l.status == ListingStatus::Available);
        if let Some(species) = &request.filters.species {
            listings.retain(|l| &l.species == species);
        }
        if let Some(gender) = request.filters.gender {
            listings.retain(|l| l.gender == gender);
        }
        if let Some(age) = request.filters.age {
            listings.retain(|l| age.matches(l.age));
        }
        if let Some(prefix) = &request.filters.location {
            listings.retain(|l| l.location.starts_with(prefix.as_str()));
        }

        sort_listings(&mut listings, request.sort_by, request.sort_order);
        Ok(Page::slice(listings, request.page.max(1), page_size))
    }
}

/// `created_at` compares as an instant; text keys compare
/// case-insensitively.
fn sort_listings(listings: &mut [Listing], by: SortBy, order: SortOrder) {
    match by {
        SortBy::CreatedAt => listings.sort_by_key(|l| l.created_at),
        SortBy::Location => listings.sort_by_key(|l| l.location.to_lowercase()),
        SortBy::Name => listings.sort_by_key(|l| l.name.to_lowercase()),
    }
    if order == SortOrder::Desc {
        listings.reverse();
    }
}
