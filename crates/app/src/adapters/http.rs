use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tasklist_core::domain::{ListQuery, PageMeta, Stats, Todo, TodoPage};
use tasklist_core::ports::{Envelope, Mutation, ServerConfig, TodoTransport, TransportResponse};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Header carrying the anti-forgery token
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Form field carrying the anti-forgery token
pub const CSRF_FIELD: &str = "_token";

/// Name of the session cookie set by the server
pub const SESSION_COOKIE: &str = "laravel_session";

/// Header carrying the asset version of the last Inertia page
pub const INERTIA_VERSION_HEADER: &str = "X-Inertia-Version";

/// Header naming the page to reload after a version conflict
pub const INERTIA_LOCATION_HEADER: &str = "X-Inertia-Location";

/// Inertia page object returned for the listing route
#[derive(Debug, Deserialize)]
struct InertiaPage {
    props: ListingProps,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingProps {
    todos: Paginator,
    #[serde(default)]
    stats: Stats,
}

#[derive(Debug, Deserialize)]
struct Paginator {
    #[serde(default)]
    data: Vec<Todo>,
    #[serde(flatten)]
    meta: PageMeta,
}

/// Todo transport over HTTP using reqwest.
///
/// Session cookies live in the client's cookie jar. The anti-forgery token
/// is scraped from the home page on first use and whenever the session is
/// re-primed.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    csrf_token: RwLock<Option<String>>,
    inertia_version: RwLock<Option<String>>,
}

impl HttpTransport {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid server base url: {}", config.base_url))?;

        let jar = Arc::new(Jar::default());
        if let Some(session) = &config.session_cookie {
            jar.add_cookie_str(&format!("{SESSION_COOKIE}={session}; Path=/"), &base_url);
        }

        let client = Client::builder()
            .cookie_provider(jar)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            csrf_token: RwLock::new(None),
            inertia_version: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Failed to build url for {path}"))
    }

    /// Current token, priming the session first if there is none yet
    async fn token(&self) -> Result<String> {
        if let Some(token) = self.csrf_token.read().await.clone() {
            return Ok(token);
        }
        self.prime_session().await?;
        self.csrf_token
            .read()
            .await
            .clone()
            .ok_or_else(|| anyhow!("Session priming produced no token"))
    }

    /// Keep the asset version of a decoded page and turn it into a listing
    async fn accept_page(&self, page: InertiaPage) -> TodoPage {
        if let Some(version) = page.version.filter(|version| !version.is_empty()) {
            *self.inertia_version.write().await = Some(version);
        }
        TodoPage {
            items: page.props.todos.data,
            meta: page.props.todos.meta,
            stats: page.props.stats,
        }
    }

    /// Load `url` as a plain document and decode the page embedded in it
    async fn full_page(&self, url: Url) -> Result<InertiaPage> {
        debug!("GET {} (full page)", url);
        let html = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html, application/xhtml+xml")
            .send()
            .await
            .context("Failed to request todo page")?
            .error_for_status()
            .context("Todo page rejected")?
            .text()
            .await
            .context("Failed to read todo page")?;

        let data = extract_page_data(&html).ok_or_else(|| anyhow!("Todo page carries no data-page attribute"))?;
        serde_json::from_str(&data).context("Failed to decode embedded todo page")
    }

    fn ajax(builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .header("X-Requested-With", "XMLHttpRequest")
            .header(reqwest::header::ACCEPT, "application/json")
            .header(CSRF_HEADER, token)
    }

    fn todo_form(
        token: &str,
        title: &str,
        description: Option<&str>,
        cover: Option<&tasklist_core::domain::CoverUpload>,
    ) -> Result<Form> {
        let mut form = Form::new()
            .text("title", title.to_string())
            .text("description", description.unwrap_or_default().to_string())
            .text(CSRF_FIELD, token.to_string());

        if let Some(cover) = cover {
            let part = Part::bytes(cover.bytes.clone())
                .file_name(cover.file_name.clone())
                .mime_str(cover.mime_type())
                .context("Invalid cover mime type")?;
            form = form.part("cover", part);
        }

        Ok(form)
    }

    fn request_for(&self, mutation: &Mutation, token: &str) -> Result<RequestBuilder> {
        let builder = match mutation {
            Mutation::Create(todo) => {
                let form = Self::todo_form(
                    token,
                    &todo.title,
                    todo.description.as_deref(),
                    todo.cover.as_ref(),
                )?;
                self.client.post(self.endpoint("todos")?).multipart(form)
            }
            Mutation::Update { id, form } => {
                let mut multipart = Self::todo_form(
                    token,
                    &form.title,
                    form.description.as_deref(),
                    form.cover.as_ref(),
                )?
                .text("_method", "PUT");
                if let Some(finished) = form.is_finished {
                    multipart = multipart.text("is_finished", if finished { "1" } else { "0" });
                }
                self.client
                    .post(self.endpoint(&format!("todos/{id}"))?)
                    .multipart(multipart)
            }
            Mutation::Delete { id } => self.client.delete(self.endpoint(&format!("todos/{id}"))?),
            Mutation::Toggle { id } => self.client.put(self.endpoint(&format!("todos/{id}/toggle"))?),
        };

        Ok(Self::ajax(builder, token))
    }
}

#[async_trait]
impl TodoTransport for HttpTransport {
    async fn list(&self, query: &ListQuery) -> Result<TodoPage> {
        let mut url = self.endpoint("todos")?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());
        debug!("GET {} {:?}", url, query);

        let mut request = self
            .client
            .get(url.clone())
            .header("X-Inertia", "true")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(reqwest::header::ACCEPT, "text/html, application/xhtml+xml");
        if let Some(version) = self.inertia_version.read().await.clone() {
            request = request.header(INERTIA_VERSION_HEADER, version);
        }

        let response = request.send().await.context("Failed to request todo listing")?;

        // Assets changed since the last page; the server wants a full visit
        if response.status() == reqwest::StatusCode::CONFLICT {
            let location = response
                .headers()
                .get(INERTIA_LOCATION_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(|location| self.base_url.join(location))
                .transpose()
                .context("Invalid Inertia location")?
                .unwrap_or(url);
            warn!("Inertia version conflict, reloading {}", location);
            let page = self.full_page(location).await?;
            return Ok(self.accept_page(page).await);
        }

        let page: InertiaPage = response
            .error_for_status()
            .context("Todo listing rejected")?
            .json()
            .await
            .context("Failed to decode todo listing")?;

        Ok(self.accept_page(page).await)
    }

    async fn send(&self, mutation: &Mutation) -> Result<TransportResponse> {
        let token = self.token().await?;
        let response = self
            .request_for(mutation, &token)?
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", mutation.kind()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response", mutation.kind()))?;
        let envelope = serde_json::from_str::<Envelope>(&body).ok();
        debug!("{} answered {} (envelope: {})", mutation.kind(), status, envelope.is_some());

        Ok(TransportResponse::new(status, envelope))
    }

    async fn prime_session(&self) -> Result<()> {
        let url = self.base_url.clone();
        let html = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to load home page")?
            .error_for_status()
            .context("Home page rejected")?
            .text()
            .await
            .context("Failed to read home page")?;

        let Some(token) = extract_csrf_token(&html) else {
            bail!("Home page carries no csrf-token meta tag");
        };
        info!("Session primed with a fresh anti-forgery token");
        *self.csrf_token.write().await = Some(token);
        Ok(())
    }
}

/// Pull the token out of `<meta name="csrf-token" content="...">`
pub fn extract_csrf_token(html: &str) -> Option<String> {
    html.match_indices("<meta")
        .filter_map(|(start, _)| {
            let rest = &html[start..];
            rest.find('>').map(|end| &rest[..end])
        })
        .find(|tag| attribute(tag, "name").as_deref() == Some("csrf-token"))
        .and_then(|tag| attribute(tag, "content"))
        .filter(|token| !token.is_empty())
}

/// Pull the page object out of `<div id="app" data-page="...">`
pub fn extract_page_data(html: &str) -> Option<String> {
    let raw = attribute(html, "data-page")?;
    let data = raw
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    Some(data)
}

fn attribute(tag: &str, name: &str) -> Option<String> {
    ['"', '\''].iter().find_map(|quote| {
        let needle = format!("{name}={quote}");
        let start = tag.find(&needle)? + needle.len();
        let len = tag[start..].find(*quote)?;
        Some(tag[start..start + len].to_string())
    })
}
