use http::{Method, StatusCode};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub mod article;
pub mod comment;
pub mod dashboard;

pub type ClientResult<T> = Result<T, ClientError>;

/// Error text returned by the api, or a transport error.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientError(pub String);

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        ClientError(value.to_string())
    }
}

/// Http client for the threadlab api. Cookies are kept between requests, so one client acts
/// like one browser.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    pub hostname: String,
    admin_token: Option<String>,
}

impl ApiClient {
    pub fn new(hostname: String) -> ClientResult<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            hostname,
            admin_token: None,
        })
    }

    /// Send the token as bearer auth, needed for admin endpoints.
    pub fn with_admin_token(mut self, token: &str) -> Self {
        self.admin_token = Some(token.to_string());
        self
    }

    async fn get<T, R>(&self, endpoint: &str, query: Option<R>) -> ClientResult<T>
    where
        T: for<'de> Deserialize<'de>,
        R: Serialize + Debug,
    {
        let (status, text, url) = self.send(Method::GET, endpoint, query).await?;
        Self::response(status, text, &url)
    }

    /// For endpoints which dont return json, like csv exports.
    async fn get_text<R>(&self, endpoint: &str, query: Option<R>) -> ClientResult<String>
    where
        R: Serialize + Debug,
    {
        let (status, text, url) = self.send(Method::GET, endpoint, query).await?;
        if status == StatusCode::OK {
            Ok(text)
        } else {
            info!("API error: {text} on {url} status {status}");
            Err(ClientError(text))
        }
    }

    async fn post<T, R>(&self, endpoint: &str, params: Option<R>) -> ClientResult<T>
    where
        T: for<'de> Deserialize<'de>,
        R: Serialize + Debug,
    {
        let (status, text, url) = self.send(Method::POST, endpoint, params).await?;
        Self::response(status, text, &url)
    }

    async fn delete<T, R>(&self, endpoint: &str, params: Option<R>) -> ClientResult<T>
    where
        T: for<'de> Deserialize<'de>,
        R: Serialize + Debug,
    {
        let (status, text, url) = self.send(Method::DELETE, endpoint, params).await?;
        Self::response(status, text, &url)
    }

    async fn send<P>(
        &self,
        method: Method,
        path: &str,
        params: Option<P>,
    ) -> ClientResult<(StatusCode, String, String)>
    where
        P: Serialize + Debug,
    {
        let mut req = self
            .client
            .request(method.clone(), self.request_endpoint(path));
        // comment bodies contain nested lists, so they are sent as json instead of a form
        req = match (method == Method::GET, &params) {
            (true, Some(params)) => req.query(params),
            (false, Some(params)) => req.json(params),
            (_, None) => req,
        };
        if let Some(token) = &self.admin_token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await?;
        let status = res.status();
        let url = res.url().to_string();
        let text = res.text().await?;
        Ok((status, text, url))
    }

    fn response<T>(status: StatusCode, text: String, url: &str) -> ClientResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        if status != StatusCode::OK {
            info!("API error: {text} on {url} status {status}");
            return Err(ClientError(text));
        }
        serde_json::from_str(&text).map_err(|e| {
            info!("Failed to deserialize api response: {e} from {text} on {url}");
            ClientError(text)
        })
    }

    fn request_endpoint(&self, path: &str) -> String {
        format!("http://{}{path}", &self.hostname)
    }
}
