use serde::Deserialize;
use thiserror::Error;

pub const MAX_PAGE_SIZE: u64 = 100;

/// Highest page served. Keeps `page * limit` inside the signed 64-bit offset
/// the database binds; anything above lands on an empty page.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Invalid value '{value}' for parameter '{name}'")]
    InvalidParameter { name: &'static str, value: String },
}

/// `?page=&limit=` as sent by clients. `page` is 1-based. Values stay raw so
/// a malformed number is reported like every other bad parameter.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PaginationParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn from_params(
        params: &PaginationParams,
        default_limit: u64,
    ) -> Result<Self, PaginationError> {
        let page = parse_number("page", params.page.as_deref())?.unwrap_or(1);
        let limit = parse_number("limit", params.limit.as_deref())?.unwrap_or(default_limit);

        Ok(Self {
            page: page.clamp(1, MAX_PAGE),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        })
    }

    /// Zero-based index for sea-orm's paginator.
    pub fn index(&self) -> u64 {
        self.page.saturating_sub(1)
    }
}

fn parse_number(name: &'static str, raw: Option<&str>) -> Result<Option<u64>, PaginationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        // Out-of-range but well-formed pages are clamped, not rejected.
        Some(value) if value.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(Some(value.parse::<u64>().unwrap_or(u64::MAX)))
        }
        Some(value) => Err(PaginationError::InvalidParameter {
            name,
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of rows across all pages.
    pub count: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.request.page.saturating_mul(self.request.limit) < self.count
    }

    pub fn has_previous(&self) -> bool {
        self.request.page > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            request: self.request,
        }
    }
}
