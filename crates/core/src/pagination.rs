//! Client-side pagination over already-fetched results.
//!
//! Display pages are 1-based. Each result source keeps its own [`PagedSource`], so
//! switching sources never disturbs another source's position.

use crate::constants::PAGE_WINDOW_WIDTH;
use crate::TerminologyResult;
use ayush_types::Page;
use serde::Serialize;
use std::future::Future;
use std::ops::RangeInclusive;

/// Number of display pages needed for `total` items: `ceil(total / page_size)`.
///
/// A zero page size yields zero pages.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// The items on 1-based display page `page`.
///
/// Page `k` holds `min(page_size, len - (k - 1) * page_size)` items; pages outside
/// `1..=page_count` are empty.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Page numbers for the pagination control: at most [`PAGE_WINDOW_WIDTH`] buttons centered
/// on `current`, shifted to stay inside `1..=total_pages`.
pub fn page_window(current: usize, total_pages: usize) -> Vec<usize> {
    if total_pages == 0 {
        return Vec::new();
    }
    let width = PAGE_WINDOW_WIDTH.min(total_pages);
    let current = current.clamp(1, total_pages);

    let half = width / 2;
    let start = current
        .saturating_sub(half)
        .max(1)
        .min(total_pages + 1 - width);
    (start..start + width).collect()
}

/// Server pages holding display page `page` when the server serves `server_size` items
/// per page.
pub fn covering_server_pages(
    page: usize,
    display_size: usize,
    server_size: usize,
) -> RangeInclusive<u32> {
    let display_size = display_size.max(1);
    let server_size = server_size.max(1);
    let start = (page.max(1) - 1) * display_size;
    let end = start + display_size - 1;
    let first = (start / server_size + 1) as u32;
    let last = (end / server_size + 1) as u32;
    first..=last
}

/// Display page `page` read from just the server pages that hold it.
///
/// For callers that keep no [`PagedSource`] between requests. Fetching stops early when a
/// server page is empty or reports no `next`.
pub async fn fetch_display_page<T, F, Fut>(
    page: usize,
    display_size: usize,
    server_size: usize,
    mut fetch: F,
) -> TerminologyResult<PageView<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = TerminologyResult<Page<T>>>,
{
    let page = page.max(1);
    let display_size = display_size.max(1);
    let server_size = server_size.max(1);
    let server_pages = covering_server_pages(page, display_size, server_size);
    let preceding = (*server_pages.start() as usize - 1) * server_size;
    let skip = (page - 1) * display_size - preceding;

    let mut fetched_items = Vec::new();
    let mut count = 0;
    let mut has_more_remote = false;
    for server_page in server_pages {
        tracing::debug!("loading server page {} for display page {}", server_page, page);
        let fetched = fetch(server_page).await?;
        count = fetched.count;
        has_more_remote = fetched.next.is_some();
        let exhausted = fetched.results.is_empty() || !has_more_remote;
        fetched_items.extend(fetched.results);
        if exhausted {
            break;
        }
    }

    let seen = if fetched_items.is_empty() {
        0
    } else {
        preceding + fetched_items.len()
    };
    let total_items = count.max(seen as u64);
    let total_pages = page_count(total_items as usize, display_size);
    Ok(PageView {
        page,
        page_size: display_size,
        total_pages,
        total_items,
        window: page_window(page, total_pages),
        has_more_remote,
        items: fetched_items
            .into_iter()
            .skip(skip)
            .take(display_size)
            .collect(),
    })
}

/// One display page of a source, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView<T> {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: u64,
    pub window: Vec<usize>,
    pub has_more_remote: bool,
    pub items: Vec<T>,
}

/// Results of one source: what has been fetched so far plus the server cursor.
#[derive(Debug, Clone)]
pub struct PagedSource<T> {
    items: Vec<T>,
    count: u64,
    next: Option<String>,
    server_page: u32,
    current_page: usize,
    page_size: usize,
}

impl<T: Clone> PagedSource<T> {
    /// Start from the first server page.
    pub fn from_first_page(page: Page<T>, page_size: usize) -> Self {
        let server_page = if page.results.is_empty() && page.next.is_none() {
            0
        } else {
            1
        };
        Self {
            count: page.count,
            next: page.next,
            items: page.results,
            server_page,
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    /// A source with nothing fetched yet; the first `load_page` fetches server page 1.
    pub fn unfetched(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            next: Some(String::new()),
            server_page: 0,
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn server_pages_fetched(&self) -> u32 {
        self.server_page
    }

    pub fn has_more_remote(&self) -> bool {
        self.next.is_some()
    }

    /// Server-reported total, or the local count when the server under-reports.
    pub fn total_items(&self) -> u64 {
        self.count.max(self.items.len() as u64)
    }

    pub fn total_pages(&self) -> usize {
        page_count(self.total_items() as usize, self.page_size)
    }

    /// Back to page 1, e.g. after a tab or filter change.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    fn locally_available(&self, page: usize) -> bool {
        page.saturating_mul(self.page_size) <= self.items.len()
    }

    /// Move to `page`, fetching further server pages first when local data runs out.
    ///
    /// `fetch` receives the 1-based server page to request. Fetching stops once the
    /// requested page is covered, the server reports no `next`, or a server page comes
    /// back empty. A fetch error leaves the already-held items untouched.
    pub async fn load_page<F, Fut>(&mut self, page: usize, mut fetch: F) -> TerminologyResult<PageView<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = TerminologyResult<Page<T>>>,
    {
        let page = page.max(1);
        while !self.locally_available(page) && self.next.is_some() {
            let server_page = self.server_page + 1;
            tracing::debug!("loading server page {} for display page {}", server_page, page);
            let fetched = fetch(server_page).await?;

            self.server_page = server_page;
            self.count = fetched.count;
            self.next = fetched.next;
            if fetched.results.is_empty() {
                self.next = None;
                break;
            }
            self.items.extend(fetched.results);
        }

        self.current_page = page;
        Ok(self.view())
    }

    /// The current display page.
    pub fn view(&self) -> PageView<T> {
        let total_pages = self.total_pages();
        PageView {
            page: self.current_page,
            page_size: self.page_size,
            total_pages,
            total_items: self.total_items(),
            window: page_window(self.current_page, total_pages),
            has_more_remote: self.has_more_remote(),
            items: page_slice(&self.items, self.current_page, self.page_size).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::paginate;
    use crate::TerminologyError;
    use std::cell::RefCell;

    #[test]
    fn page_count_is_ceiling_division() {
        for (n, p) in [(0, 10), (1, 10), (10, 10), (11, 10), (25, 7), (7, 1)] {
            let expected = (n + p - 1) / p;
            assert_eq!(page_count(n, p), expected, "n={n} p={p}");
        }
        assert_eq!(page_count(5, 0), 0);
    }

    #[test]
    fn every_page_has_min_of_size_and_remainder() {
        let items: Vec<usize> = (0..23).collect();
        let size = 5;
        let pages = page_count(items.len(), size);
        assert_eq!(pages, 5);

        let mut seen = Vec::new();
        for k in 1..=pages {
            let slice = page_slice(&items, k, size);
            assert_eq!(slice.len(), size.min(items.len() - (k - 1) * size));
            seen.extend_from_slice(slice);
        }
        assert_eq!(seen, items);
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let items = [1, 2, 3];
        assert!(page_slice(&items, 0, 2).is_empty());
        assert!(page_slice(&items, 3, 2).is_empty());
        assert!(page_slice(&items, 1, 0).is_empty());
    }

    #[test]
    fn window_centres_and_clamps() {
        assert_eq!(page_window(1, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(5, 10), vec![3, 4, 5, 6, 7]);
        assert_eq!(page_window(10, 10), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_window(9, 10), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_window(2, 3), vec![1, 2, 3]);
        assert_eq!(page_window(42, 3), vec![1, 2, 3]);
        assert!(page_window(1, 0).is_empty());
    }

    #[tokio::test]
    async fn load_page_fetches_only_when_local_data_runs_out() {
        let terms: Vec<u32> = (0..45).collect();
        let server = paginate(&terms, 20, "x");
        let mut source = PagedSource::from_first_page(server[0].clone(), 10);
        let requested = RefCell::new(Vec::new());

        let fetch = |n: u32| {
            requested.borrow_mut().push(n);
            let page = server[(n - 1) as usize].clone();
            async move { Ok(page) }
        };

        let view = source.load_page(2, fetch).await.unwrap();
        assert_eq!(view.items, (10..20).collect::<Vec<_>>());
        assert!(requested.borrow().is_empty());

        let view = source.load_page(3, fetch).await.unwrap();
        assert_eq!(view.items, (20..30).collect::<Vec<_>>());
        assert_eq!(*requested.borrow(), vec![2]);

        let view = source.load_page(5, fetch).await.unwrap();
        assert_eq!(view.items, (40..45).collect::<Vec<_>>());
        assert_eq!(*requested.borrow(), vec![2, 3]);
        assert!(!view.has_more_remote);
        assert_eq!(view.total_pages, 5);
    }

    #[tokio::test]
    async fn load_page_stops_when_server_has_no_next() {
        let mut source = PagedSource::from_first_page(
            Page {
                results: vec![1, 2, 3],
                count: 3,
                next: None,
                previous: None,
            },
            2,
        );
        let view = source
            .load_page(4, |_| async {
                Err::<Page<i32>, _>(TerminologyError::InvalidInput("must not fetch".into()))
            })
            .await
            .unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.page, 4);
        assert_eq!(view.total_pages, 2);
    }

    #[tokio::test]
    async fn empty_server_page_ends_paging() {
        let mut source = PagedSource::from_first_page(
            Page {
                results: vec![1],
                count: 50,
                next: Some("more".into()),
                previous: None,
            },
            10,
        );
        let view = source
            .load_page(2, |_| async { Ok(Page::<i32>::empty()) })
            .await
            .unwrap();
        assert!(view.items.is_empty());
        assert!(!source.has_more_remote());
    }

    #[tokio::test]
    async fn fetch_error_keeps_existing_items() {
        let mut source = PagedSource::from_first_page(
            Page {
                results: vec![1, 2],
                count: 10,
                next: Some("more".into()),
                previous: None,
            },
            2,
        );
        let result = source
            .load_page(2, |_| async {
                Err::<Page<i32>, _>(TerminologyError::InvalidInput("offline".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(source.items(), &[1, 2]);
        assert!(source.has_more_remote());
    }

    #[tokio::test]
    async fn unfetched_source_loads_first_server_page() {
        let mut source = PagedSource::unfetched(5);
        let view = source
            .load_page(1, |n| async move {
                assert_eq!(n, 1);
                Ok(Page {
                    results: vec!["a", "b"],
                    count: 2,
                    next: None,
                    previous: None,
                })
            })
            .await
            .unwrap();
        assert_eq!(view.items, vec!["a", "b"]);
        assert_eq!(source.server_pages_fetched(), 1);
    }

    #[test]
    fn covering_pages_for_aligned_and_straddling_pages() {
        assert_eq!(covering_server_pages(1, 10, 20), 1..=1);
        assert_eq!(covering_server_pages(9, 10, 20), 5..=5);
        assert_eq!(covering_server_pages(2, 10, 15), 1..=2);
        assert_eq!(covering_server_pages(3, 10, 15), 2..=2);
        assert_eq!(covering_server_pages(0, 10, 20), 1..=1);
    }

    #[tokio::test]
    async fn deep_display_page_fetches_only_its_server_page() {
        let terms: Vec<u32> = (0..100).collect();
        let server = paginate(&terms, 20, "x");
        let requested = RefCell::new(Vec::new());

        let view = fetch_display_page(9, 10, 20, |n| {
            requested.borrow_mut().push(n);
            let page = server[(n - 1) as usize].clone();
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(*requested.borrow(), vec![5]);
        assert_eq!(view.items, (80..90).collect::<Vec<_>>());
        assert_eq!(view.total_pages, 10);
        assert_eq!(view.window, vec![6, 7, 8, 9, 10]);
        assert!(!view.has_more_remote);
    }

    #[tokio::test]
    async fn display_page_straddling_two_server_pages() {
        let terms: Vec<u32> = (0..40).collect();
        let server = paginate(&terms, 15, "x");
        let requested = RefCell::new(Vec::new());

        let view = fetch_display_page(2, 10, 15, |n| {
            requested.borrow_mut().push(n);
            let page = server[(n - 1) as usize].clone();
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(*requested.borrow(), vec![1, 2]);
        assert_eq!(view.items, (10..20).collect::<Vec<_>>());
        assert_eq!(view.total_items, 40);
        assert!(view.has_more_remote);
    }

    #[tokio::test]
    async fn display_page_past_the_end_is_empty() {
        let view = fetch_display_page(7, 10, 20, |_| async { Ok(Page::<u32>::empty()) })
            .await
            .unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.total_items, 0);
        assert_eq!(view.total_pages, 0);
    }

    #[test]
    fn reset_returns_to_first_page() {
        let mut source = PagedSource::from_first_page(
            Page {
                results: (0..30).collect::<Vec<i32>>(),
                count: 30,
                next: None,
                previous: None,
            },
            10,
        );
        source.current_page = 3;
        source.reset();
        assert_eq!(source.view().items, (0..10).collect::<Vec<_>>());
    }
}
