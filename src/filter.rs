//! Safelisted pagination and sort parameters for listing queries.
//!
//! `sort` is the only caller-supplied value that ever reaches SQL text, and
//! it does so solely through [`Filter::sort_column`], which refuses anything
//! outside the safelist. Values are always bound as parameters.

use serde::Serialize;

use crate::validator::{permitted, Validator};

/// Upper bound on `page`. Together with [`MAX_PAGE_SIZE`] this keeps every
/// computed offset at or below 10^9.
pub const MAX_PAGE: i64 = 10_000_000;

/// Upper bound on `page_size`.
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct Filter {
    pub page: i64,
    pub page_size: i64,
    /// Column name, optionally `-`-prefixed for descending order.
    pub sort: String,
    /// The sort values this caller is allowed to request.
    pub sort_safelist: Vec<&'static str>,
}

impl Filter {
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(self.page <= MAX_PAGE, "page", "must not exceed 10 million");
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(
            self.page_size <= MAX_PAGE_SIZE,
            "page_size",
            "must not exceed 100",
        );
        v.check(
            permitted(&self.sort, &self.sort_safelist),
            "sort",
            "invalid sort value",
        );
    }

    /// Column name for ORDER BY, with any descending prefix stripped.
    ///
    /// Panics when `sort` is not in the safelist: such a value can only
    /// reach this point through a caller that skipped [`Filter::validate`].
    pub fn sort_column(&self) -> &str {
        for safe in &self.sort_safelist {
            if self.sort == *safe {
                return self.sort.trim_start_matches('-');
            }
        }
        panic!("unsafe sort parameter: {}", self.sort);
    }

    pub fn sort_direction(&self) -> &'static str {
        if self.sort.starts_with('-') {
            "DESC"
        } else {
            "ASC"
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Pagination facts for one listing response. The zero value means "no
/// matching records" and serializes to an empty object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

impl Metadata {
    /// Pure pagination arithmetic; independent of any store.
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Metadata {
        if total_records == 0 {
            return Metadata::default();
        }
        Metadata {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}
