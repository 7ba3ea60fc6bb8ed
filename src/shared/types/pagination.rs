/// Offset pagination used by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u64 = 100;
    pub const MAX_LIMIT: u64 = 1000;

    /// Clamp raw query values into a usable page.
    pub fn new(skip: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            skip: skip.unwrap_or(0),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Apply the page to an already materialised iterator.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.skip as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(Page::new(None, Some(0)).limit, 1);
        assert_eq!(Page::new(None, Some(50_000)).limit, Page::MAX_LIMIT);
        assert_eq!(Page::new(Some(5), None), Page { skip: 5, limit: 100 });
    }

    #[test]
    fn slice_skips_and_takes() {
        let page = Page::new(Some(2), Some(3));
        assert_eq!(page.slice(0..10), vec![2, 3, 4]);
    }
}
