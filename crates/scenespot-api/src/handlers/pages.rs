//! Static pages.

use axum::response::Html;

const UPLOAD_PAGE: &str = include_str!("../../templates/upload.html");
const PLAYER_PAGE: &str = include_str!("../../templates/player.html");

/// Upload page.
pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}

/// Player page.
pub async fn player_page() -> Html<&'static str> {
    Html(PLAYER_PAGE)
}
