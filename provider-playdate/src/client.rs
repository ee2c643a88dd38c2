//! Playdate portal client
//!
//! Device-side seams for the sideload engine: the installed catalog and
//! asset uploads. The portal authenticates by session cookie, so the
//! supplied [`HttpClient`] must keep a cookie store; every form post also
//! needs the page's CSRF token and a matching `Referer` header.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use bridge_traits::{BridgeError, HttpClient, HttpRequest, HttpResponse, MultipartForm};
use core_sideload::{AssetUploader, InstalledCatalogSource, InstalledEntry, SideloadError};

use crate::error::{PlaydateError, Result};
use crate::listing::{extract_csrf_token, extract_installed_entry, extract_sideload_paths};

const PORTAL_BASE: &str = "https://play.date";
const SIGNIN_URL: &str = "https://play.date/signin/";
const SIDELOAD_URL: &str = "https://play.date/account/sideload/";

/// Playdate portal client holding an authenticated session.
///
/// Construct via [`PlaydateClient::login`]; the session lives in the
/// HTTP client's cookie store.
pub struct PlaydateClient {
    http_client: Arc<dyn HttpClient>,
}

impl PlaydateClient {
    /// Sign in to the portal and return a session-holding client.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(
        http_client: Arc<dyn HttpClient>,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let client = Self { http_client };
        let token = client.fetch_csrf(SIGNIN_URL).await?;

        let request = HttpRequest::post(SIGNIN_URL)
            .header("Referer", SIGNIN_URL)
            .form([
                ("csrfmiddlewaretoken", token.as_str()),
                ("username", username),
                ("password", password),
            ]);

        let response = client.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(PlaydateError::AuthenticationFailed(format!(
                "sign-in rejected with status {}",
                response.status
            )));
        }

        info!("Playdate portal login succeeded");
        Ok(client)
    }

    /// GET a portal page and return its body text.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self
            .http_client
            .execute(HttpRequest::get(url))
            .await?
            .error_for_status()
            .map_err(into_portal_error)?;
        Ok(response.text()?)
    }

    /// GET a form page and pull its CSRF token.
    async fn fetch_csrf(&self, url: &str) -> Result<String> {
        let html = self.fetch_page(url).await?;
        extract_csrf_token(&html)
    }
}

fn into_portal_error(error: BridgeError) -> PlaydateError {
    match error {
        BridgeError::Http { status, message } => PlaydateError::PortalError {
            status_code: status,
            message,
        },
        other => other.into(),
    }
}

#[async_trait]
impl InstalledCatalogSource for PlaydateClient {
    /// Walk the sideload list page, then each game's detail page.
    async fn installed_entries(&self) -> core_sideload::Result<Vec<InstalledEntry>> {
        let list_html = self
            .fetch_page(SIDELOAD_URL)
            .await
            .map_err(|e| SideloadError::Catalog(e.to_string()))?;
        let paths =
            extract_sideload_paths(&list_html).map_err(|e| SideloadError::Catalog(e.to_string()))?;

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let detail_html = self
                .fetch_page(&format!("{PORTAL_BASE}{path}"))
                .await
                .map_err(|e| SideloadError::Catalog(e.to_string()))?;
            let entry = extract_installed_entry(&detail_html)
                .map_err(|e| SideloadError::Catalog(e.to_string()))?;
            entries.push(entry);
        }

        debug!(entries = entries.len(), "Fetched installed catalog");
        Ok(entries)
    }
}

#[async_trait]
impl AssetUploader for PlaydateClient {
    async fn upload(&self, path: &Path) -> core_sideload::Result<()> {
        let token = self
            .fetch_csrf(SIDELOAD_URL)
            .await
            .map_err(|e| SideloadError::Asset(e.to_string()))?;

        let form = MultipartForm::new()
            .text("csrfmiddlewaretoken", token)
            .file("file", path);
        let request = HttpRequest::post(SIDELOAD_URL)
            .header("Referer", SIDELOAD_URL)
            .multipart(form);

        let response: HttpResponse = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| SideloadError::Asset(e.to_string()))?;
        response
            .error_for_status()
            .map_err(|e| SideloadError::Asset(into_portal_error(e).to_string()))?;

        debug!(path = %path.display(), "Asset uploaded to portal");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{HttpBody, HttpMethod};
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;
    use std::path::PathBuf;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::Result<HttpResponse>;
            async fn download_to_file(&self, request: HttpRequest, dest: &Path) -> bridge_traits::Result<u64>;
        }
    }

    fn page(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    const SIGNIN_PAGE: &str = r#"
        <form><input name="csrfmiddlewaretoken" value="tok-1"></form>
    "#;

    #[tokio::test]
    async fn test_login_posts_csrf_and_credentials() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Get && req.url == SIGNIN_URL)
            .times(1)
            .returning(|_| Ok(page(SIGNIN_PAGE)));
        http.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Post
                    && req.url == SIGNIN_URL
                    && req.headers.get("Referer") == Some(&SIGNIN_URL.to_string())
                    && matches!(
                        &req.body,
                        Some(HttpBody::Form(fields))
                            if fields.contains(&("csrfmiddlewaretoken".to_string(), "tok-1".to_string()))
                                && fields.contains(&("username".to_string(), "user".to_string()))
                    )
            })
            .times(1)
            .returning(|_| Ok(page("welcome")));

        PlaydateClient::login(Arc::new(http), "user", "pass")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_rejection_is_authentication_error() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Get)
            .returning(|_| Ok(page(SIGNIN_PAGE)));
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Post)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 403,
                    headers: HashMap::new(),
                    body: Bytes::from_static(b"forbidden"),
                })
            });

        let result = PlaydateClient::login(Arc::new(http), "user", "wrong").await;
        assert!(matches!(result, Err(PlaydateError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_installed_entries_walks_detail_pages() {
        const LIST: &str = r#"
            <div id="sideloadGameList"><ul>
              <li><a href="/account/sideload/1/">Bloom</a></li>
            </ul></div>
        "#;
        const DETAIL: &str = r#"
            <h2 class="sideloadGameTitle"><a href="/games/1/bloom/">Bloom</a></h2>
            <dl class="game-build">
              <dd class="game-version">2.0</dd>
              <dd class="game-date">Feb 1, 2024</dd>
            </dl>
        "#;

        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.url == SIDELOAD_URL)
            .returning(|_| Ok(page(LIST)));
        http.expect_execute()
            .withf(|req| req.url == "https://play.date/account/sideload/1/")
            .returning(|_| Ok(page(DETAIL)));

        let client = PlaydateClient {
            http_client: Arc::new(http),
        };

        let entries = client.installed_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Bloom");
        assert_eq!(entries[0].version, "2.0");
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_with_fresh_csrf() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Get && req.url == SIDELOAD_URL)
            .times(1)
            .returning(|_| Ok(page(SIGNIN_PAGE)));
        http.expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Post
                    && req.url == SIDELOAD_URL
                    && req.headers.get("Referer") == Some(&SIDELOAD_URL.to_string())
                    && matches!(
                        &req.body,
                        Some(HttpBody::Multipart(form))
                            if form.fields.contains(&("csrfmiddlewaretoken".to_string(), "tok-1".to_string()))
                                && form.file.as_ref().map(|f| f.path.clone())
                                    == Some(PathBuf::from("/tmp/bloom.pdx.zip"))
                    )
            })
            .times(1)
            .returning(|_| Ok(page("uploaded")));

        let client = PlaydateClient {
            http_client: Arc::new(http),
        };

        client.upload(Path::new("/tmp/bloom.pdx.zip")).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_failure_is_asset_error() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Get)
            .returning(|_| Ok(page(SIGNIN_PAGE)));
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Post)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 500,
                    headers: HashMap::new(),
                    body: Bytes::from_static(b"server error"),
                })
            });

        let client = PlaydateClient {
            http_client: Arc::new(http),
        };

        let result = client.upload(Path::new("/tmp/bloom.pdx.zip")).await;
        assert!(matches!(result, Err(SideloadError::Asset(_))));
    }
}
