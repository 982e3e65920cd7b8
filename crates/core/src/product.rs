//! Products, product pages and listing queries.

use serde::{Deserialize, Serialize};

use crate::types::lenient::{count_or_zero, list_or_empty};
use crate::types::{Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub stock: u32,
}

/// One page of a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(default, deserialize_with = "list_or_empty")]
    pub products: Vec<Product>,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_pages: u32,
}

impl ProductPage {
    /// Number of pages, never more than the number of products when the
    /// total is known.
    #[must_use]
    pub fn page_count(&self) -> u32 {
        if self.total > 0 {
            self.total_pages.min(self.total)
        } else {
            self.total_pages
        }
    }
}

/// Parameters for `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    page: u32,
    pub search: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::page(1)
    }
}

impl ProductQuery {
    /// A query for the given page with no search or filters.
    ///
    /// Pages are 1-based; zero is treated as the first page.
    #[must_use]
    pub const fn page(page: u32) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            search: None,
            min_price: None,
            max_price: None,
        }
    }

    /// Set the search text. Blank text clears the search.
    #[must_use]
    pub fn with_search(mut self, search: &str) -> Self {
        let trimmed = search.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Set the price bounds.
    #[must_use]
    pub const fn with_price_range(mut self, min: Option<Price>, max: Option<Price>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    #[must_use]
    pub const fn page_number(&self) -> u32 {
        self.page
    }

    /// Query-string pairs in the order the API documents them.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string())];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.amount().normalize().to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.amount().normalize().to_string()));
        }
        pairs
    }
}
