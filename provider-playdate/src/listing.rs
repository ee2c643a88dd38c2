//! Portal page parsing
//!
//! The portal has no JSON API; everything is scraped from HTML. These are
//! pure functions over page text so they can be tested against fixtures
//! without a session.

use scraper::{Html, Selector};

use core_sideload::InstalledEntry;

use crate::error::{PlaydateError, Result};

const CSRF_SELECTOR: &str = r#"input[name="csrfmiddlewaretoken"]"#;
const GAME_LIST_LINK_SELECTOR: &str = "#sideloadGameList a";
const TITLE_SELECTOR: &str = "h2.sideloadGameTitle";
const VERSION_SELECTOR: &str = "dl.game-build dd.game-version";
const DATE_SELECTOR: &str = "dl.game-build dd.game-date";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PlaydateError::ParseError(format!("selector {css}: {e:?}")))
}

/// Pull the Django CSRF token out of a portal form page.
pub fn extract_csrf_token(html: &str) -> Result<String> {
    let selector = selector(CSRF_SELECTOR)?;
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(|token| token.to_string())
        .ok_or(PlaydateError::MissingCsrf)
}

/// Collect the relative detail-page paths from the sideload list page.
pub fn extract_sideload_paths(html: &str) -> Result<Vec<String>> {
    let selector = selector(GAME_LIST_LINK_SELECTOR)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| href.to_string())
        .collect())
}

/// Parse one game detail page into an installed entry.
pub fn extract_installed_entry(html: &str) -> Result<InstalledEntry> {
    let document = Html::parse_document(html);

    let text_of = |css: &str| -> Result<String> {
        let selector = selector(css)?;
        document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .ok_or_else(|| PlaydateError::ParseError(format!("missing element {css}")))
    };

    Ok(InstalledEntry {
        title: text_of(TITLE_SELECTOR)?,
        version: text_of(VERSION_SELECTOR)?,
        date: text_of(DATE_SELECTOR)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNIN_PAGE: &str = r#"
        <html><body>
          <form method="post">
            <input type="hidden" name="csrfmiddlewaretoken" value="tok-abc123">
            <input name="username"><input name="password">
          </form>
        </body></html>
    "#;

    const LIST_PAGE: &str = r#"
        <html><body>
          <div id="sideloadGameList">
            <ul>
              <li><a href="/account/sideload/1111/">Bloom</a></li>
              <li><a href="/account/sideload/2222/">Echoes</a></li>
            </ul>
          </div>
        </body></html>
    "#;

    const DETAIL_PAGE: &str = r#"
        <html><body><div id="main">
          <h2 class="sideloadGameTitle"><a href="/games/1111/bloom/">Bloom</a></h2>
          <dl class="game-build">
            <dt>Version</dt><dd class="game-version"> 1.2.0 </dd>
            <dt>Uploaded</dt><dd class="game-date">Jan 5, 2024</dd>
          </dl>
        </div></body></html>
    "#;

    #[test]
    fn test_extract_csrf_token() {
        assert_eq!(extract_csrf_token(SIGNIN_PAGE).unwrap(), "tok-abc123");
    }

    #[test]
    fn test_missing_csrf_token() {
        assert!(matches!(
            extract_csrf_token("<html><body></body></html>"),
            Err(PlaydateError::MissingCsrf)
        ));
    }

    #[test]
    fn test_extract_sideload_paths() {
        let paths = extract_sideload_paths(LIST_PAGE).unwrap();
        assert_eq!(paths, vec!["/account/sideload/1111/", "/account/sideload/2222/"]);
    }

    #[test]
    fn test_empty_list_page() {
        let html = r#"<html><body><div id="sideloadGameList"><ul></ul></div></body></html>"#;
        assert!(extract_sideload_paths(html).unwrap().is_empty());
    }

    #[test]
    fn test_extract_installed_entry() {
        let entry = extract_installed_entry(DETAIL_PAGE).unwrap();
        assert_eq!(entry.title, "Bloom");
        assert_eq!(entry.version, "1.2.0");
        assert_eq!(entry.date, "Jan 5, 2024");
    }

    #[test]
    fn test_detail_page_without_build_info_errors() {
        let html = r#"<html><body><h2 class="sideloadGameTitle">Bloom</h2></body></html>"#;
        assert!(matches!(
            extract_installed_entry(html),
            Err(PlaydateError::ParseError(_))
        ));
    }
}
