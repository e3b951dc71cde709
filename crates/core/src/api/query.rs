use crate::paging::PageRequest;

/// Query parameters kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    /// Empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter.
    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    /// Append a parameter only when `value` is non-blank.
    pub fn param_if_present(self, key: &'static str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Append `page` and `page_size`.
    pub fn page(self, page: PageRequest) -> Self {
        self.param("page", page.page())
            .param("page_size", page.page_size())
    }

    /// Parameters in the order they were added.
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Whether no parameter was added.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order_and_skips_blank_optionals() {
        let query = Query::new()
            .param_if_present("search", Some("  "))
            .param_if_present("genres", None)
            .param("ordering", "-rating")
            .page(PageRequest::new(3, 10));
        assert_eq!(
            query.pairs(),
            &[
                ("ordering", "-rating".to_string()),
                ("page", "3".to_string()),
                ("page_size", "10".to_string()),
            ]
        );
        assert!(Query::new().is_empty());
    }
}
