use serde::{Deserialize, Serialize};

/// Largest page size a client can ask for.
pub const MAX_PER_PAGE: u64 = 100;
const DEFAULT_PER_PAGE: u64 = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    DEFAULT_PER_PAGE
}

impl PaginationParams {
    /// Effective page size. `per_page` is untrusted query input and is
    /// clamped into `1..=MAX_PER_PAGE` before use; a raw zero would produce
    /// empty pages and divide the page count by zero.
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit()
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        Self {
            items,
            total,
            page: params.page,
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: u64, per_page: u64) -> PaginationParams {
        PaginationParams { page, per_page }
    }

    #[test]
    fn per_page_zero_is_clamped_not_divided_by() {
        let p = params(1, 0);
        assert_eq!(p.limit(), 1);
        assert_eq!(p.offset(), 0);

        let page = Paginated::new(vec![1, 2, 3], 3, &p);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn per_page_is_capped() {
        let p = params(2, 10_000);
        assert_eq!(p.limit(), MAX_PER_PAGE);
        assert_eq!(p.offset(), MAX_PER_PAGE);
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = params(1, 20);
        assert_eq!(Paginated::new(Vec::<u8>::new(), 0, &p).total_pages, 0);
        assert_eq!(Paginated::new(Vec::<u8>::new(), 41, &p).total_pages, 3);
        assert_eq!(Paginated::new(Vec::<u8>::new(), 40, &p).total_pages, 2);
    }
}
