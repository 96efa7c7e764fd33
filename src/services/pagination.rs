use sea_orm::{ConnectionTrait, Paginator, SelectorTrait};
use serde::{Deserialize, Serialize};

use crate::config::MAX_PAGE_SIZE;
use crate::error::ApiError;

/// `?page=` (à partir de 1) et `?page_size=`
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PageQuery {
    /// (page, page_size) effectifs
    pub fn resolve(&self, default_size: u64) -> Result<(u64, u64), ApiError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::field("page", "Invalid page."));
        }
        let size = self.page_size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE);
        Ok((page, size))
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub num_pages: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            num_pages: self.num_pages,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Récupère une page; une page au-delà de la dernière -> 404 (la page 1 existe toujours).
pub async fn fetch_page<'db, C, S>(
    paginator: Paginator<'db, C, S>,
    page: u64,
) -> Result<Page<S::Item>, ApiError>
where
    C: ConnectionTrait,
    S: SelectorTrait + 'db,
{
    let totals = paginator.num_items_and_pages().await?;
    if page > 1 && page > totals.number_of_pages {
        return Err(ApiError::NotFound {
            field: "detail",
            message: "Invalid page.".to_string(),
        });
    }

    let results = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        count: totals.number_of_items,
        page,
        num_pages: totals.number_of_pages.max(1),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_and_bounds() {
        assert_eq!(PageQuery::default().resolve(10).unwrap(), (1, 10));

        let q = PageQuery { page: Some(3), page_size: Some(1000) };
        assert_eq!(q.resolve(10).unwrap(), (3, MAX_PAGE_SIZE));

        let q = PageQuery { page: Some(0), page_size: None };
        assert!(matches!(q.resolve(10), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_page_map() {
        let page = Page { count: 2, page: 1, num_pages: 1, results: vec![1, 2] };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.results, vec![10, 20]);
        assert_eq!(mapped.count, 2);
    }
}
