use model::document::DocumentHit;

/// One page of hits returned by the scroll.
#[derive(Debug, Clone)]
pub struct ScrollPage {
    pub hits: Vec<DocumentHit>,

    /// Handle for fetching the next page; absent once the backend has
    /// released the scroll context.
    pub scroll_id: Option<String>,

    /// Total matching documents, advertised with the first response and
    /// stable for the lifetime of the scroll snapshot.
    pub total_hits: u64,

    /// True when the backend reports no more pages.
    pub exhausted: bool,
}

impl ScrollPage {
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }
}
