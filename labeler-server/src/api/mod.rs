//! HTTP API handlers for labeler-server

pub mod health;
pub mod images;
pub mod labels;
pub mod ui;

pub use health::health_routes;
pub use images::image_routes;
pub use labels::label_routes;
pub use ui::ui_routes;

/// URL under which an indexed image is served
///
/// Each `/`-separated segment is percent-encoded so names containing `#`,
/// `?`, `%` or spaces round-trip through the `/image/*image_path` route.
pub fn image_url(image_path: &str) -> String {
    let encoded: Vec<_> = image_path.split('/').map(urlencoding::encode).collect();
    format!("/image/{}", encoded.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_plain_path_unchanged() {
        assert_eq!(image_url("day1/embryo_01.jpg"), "/image/day1/embryo_01.jpg");
    }

    #[test]
    fn test_image_url_encodes_segments() {
        assert_eq!(image_url("day 1/a#b?.jpg"), "/image/day%201/a%23b%3F.jpg");
        assert_eq!(image_url("100%.png"), "/image/100%25.png");
    }
}
