use std::sync::Arc;

use freeblog_util_error::FmtCompact as _;
use reqwest::cookie::{CookieStore as _, Jar};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::ResultExt as _;
use tracing::{debug, trace};
use url::Url;

use crate::LOG_TARGET;
use crate::error::{
    BaseUrlSnafu, DecodeSnafu, EncodeSnafu, FetchResult, HttpClientSnafu, InitResult,
    InvalidTargetSnafu, StatusSnafu, TransportSnafu,
};
use crate::session::{Session, SessionSchema};

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// How [`Client::find`] should interpret a successful response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Json,
    Text,
}

/// Body returned by [`Client::find`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

/// Create-or-replace semantics of [`Client::submit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMethod {
    /// Create (`POST`)
    Create,
    /// Replace (`PUT`)
    Replace,
}

impl From<SubmitMethod> for Method {
    fn from(value: SubmitMethod) -> Self {
        match value {
            SubmitMethod::Create => Method::POST,
            SubmitMethod::Replace => Method::PUT,
        }
    }
}

/// A response that was fully received, whatever its status
pub(crate) struct Reply {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) status: StatusCode,
    pub(crate) body: String,
}

impl Reply {
    pub(crate) fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// Turn any non-2xx reply into [`crate::error::FetchError::Status`]
    pub(crate) fn success(self) -> FetchResult<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        StatusSnafu {
            method: self.method,
            url: self.url,
            status: self.status,
            body: self.body,
        }
        .fail()
    }

    pub(crate) fn decode<T>(&self) -> FetchResult<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(&self.body).context(DecodeSnafu {
            method: self.method.clone(),
            url: self.url.clone(),
        })
    }
}

/// HTTP client for the freeblog API
///
/// Every call returns a `Result` and never panics: transport problems,
/// non-success statuses and undecodable bodies all come back as
/// [`crate::error::FetchError`]. A 404 on a read is not an error, but `None`.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    /// Cookies set by the server (and seeded at construction)
    cookie_jar: Arc<Jar>,
    session_schema: SessionSchema,
}

#[bon::bon]
impl Client {
    #[builder(finish_fn(name = "build"))]
    pub fn new(
        // targets are resolved against it
        #[builder(into)]
        base_url: String,
        #[builder(into)] user_agent: Option<String>,
        // initial cookies, `Cookie` header format (`a=1; b=2`)
        #[builder(into)]
        cookies: Option<String>,
        #[builder(default)] session_schema: SessionSchema,
    ) -> InitResult<Self> {
        let base_url = Url::parse(&base_url).context(BaseUrlSnafu {
            base_url: base_url.clone(),
        })?;

        let cookie_jar = Arc::new(Jar::default());
        if let Some(cookies) = cookies {
            for cookie in cookies.split(';').map(str::trim).filter(|c| !c.is_empty()) {
                cookie_jar.add_cookie_str(cookie, &base_url);
            }
        }

        let http = reqwest::Client::builder()
            .user_agent(user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .cookie_provider(cookie_jar.clone())
            .build()
            .context(HttpClientSnafu)?;

        debug!(target: LOG_TARGET, %base_url, %session_schema, "Client initialized");

        Ok(Self {
            http,
            base_url,
            cookie_jar,
            session_schema,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session identity from the cookies currently held for the base url
    ///
    /// Recomputed on every call; the zero value when nobody is logged in.
    pub fn current_session(&self) -> Session {
        self.cookie_jar
            .cookies(&self.base_url)
            .and_then(|header| header.to_str().map(ToOwned::to_owned).ok())
            .map(|header| Session::from_cookie_header(&header, self.session_schema))
            .unwrap_or_default()
    }

    pub(crate) fn resolve(&self, target: &str) -> FetchResult<Url> {
        self.base_url
            .join(target)
            .context(InvalidTargetSnafu { target })
    }

    /// Send a request and read the whole response body
    pub(crate) async fn send(
        &self,
        method: Method,
        url: Url,
        prepare: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> FetchResult<Reply> {
        trace!(target: LOG_TARGET, %method, %url, "Sending request");

        let response = prepare(self.http.request(method.clone(), url.clone()))
            .send()
            .await
            .inspect_err(|err| {
                debug!(target: LOG_TARGET, %method, %url, err = %err.fmt_compact(), "Request failed");
            })
            .context(TransportSnafu {
                method: method.clone(),
                url: url.clone(),
            })?;

        let status = response.status();
        let body = response.text().await.context(TransportSnafu {
            method: method.clone(),
            url: url.clone(),
        })?;
        debug!(target: LOG_TARGET, %method, %url, %status, len = body.len(), "Response");

        Ok(Reply {
            method,
            url,
            status,
            body,
        })
    }

    async fn send_json<I>(&self, method: Method, target: &str, item: &I) -> FetchResult<Reply>
    where
        I: Serialize + ?Sized,
    {
        let url = self.resolve(target)?;
        let bytes = serde_json::to_vec(item).with_context(|_| EncodeSnafu {
            method: method.clone(),
            url: url.clone(),
        })?;
        self.send(method, url, |req| {
            req.header(CONTENT_TYPE, "application/json").body(bytes)
        })
        .await
    }

    /// Read `target`
    ///
    /// `Ok(None)` on 404. The body is parsed as JSON, unless
    /// [`ResponseFormat::Text`] asks for the raw text.
    pub async fn find(
        &self,
        target: &str,
        format: ResponseFormat,
    ) -> FetchResult<Option<ResponseBody>> {
        let Some(reply) = self.get(target).await? else {
            return Ok(None);
        };
        Ok(Some(match format {
            ResponseFormat::Json => ResponseBody::Json(reply.decode()?),
            ResponseFormat::Text => ResponseBody::Text(reply.body),
        }))
    }

    /// [`Self::find`] decoding the JSON body into `T`
    pub async fn find_json<T>(&self, target: &str) -> FetchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.get(target).await? {
            Some(reply) => reply.decode().map(Some),
            None => Ok(None),
        }
    }

    async fn get(&self, target: &str) -> FetchResult<Option<Reply>> {
        let reply = self
            .send(Method::GET, self.resolve(target)?, |req| req)
            .await?;
        if reply.is_not_found() {
            debug!(target: LOG_TARGET, url = %reply.url, "Not found");
            return Ok(None);
        }
        reply.success().map(Some)
    }

    /// Send `item` as JSON and return what the server saved
    ///
    /// The result is decoded from the response, not copied from `item`, so it
    /// includes any field the server generated.
    pub async fn submit<I, O>(&self, target: &str, method: SubmitMethod, item: &I) -> FetchResult<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.send_json(method.into(), target, item)
            .await?
            .success()?
            .decode()
    }

    /// `POST` `item` as JSON, ignoring the response body
    pub async fn exec<I>(&self, target: &str, item: &I) -> FetchResult<()>
    where
        I: Serialize + ?Sized,
    {
        self.send_json(Method::POST, target, item)
            .await?
            .success()?;
        Ok(())
    }

    /// `DELETE` `target`
    pub async fn del(&self, target: &str) -> FetchResult<()> {
        self.send(Method::DELETE, self.resolve(target)?, |req| req)
            .await?
            .success()?;
        Ok(())
    }
}
