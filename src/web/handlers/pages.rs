//! Upload and share pages.
//!
//! Both pages are static documents with inline scripts; everything dynamic
//! goes through the JSON API.

use axum::response::Html;

const INDEX_PAGE: &str = include_str!("../../../static/index.html");
const SHARE_PAGE: &str = include_str!("../../../static/share.html");

/// GET / - Upload page.
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// GET /share/:file_id - Share/download page.
///
/// The page reads the id from its own URL and asks the metadata endpoint,
/// so unknown ids still get the page and show its not-found state.
pub async fn share_page() -> Html<&'static str> {
    Html(SHARE_PAGE)
}
