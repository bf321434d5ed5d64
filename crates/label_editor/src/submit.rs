//! Replays a label edit the way the host's own label form submits it.

use crate::EditorError;
use crate::form::{FormSnapshot, LABEL_FIELD};
use log::{debug, error};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, COOKIE, PRAGMA};
use reqwest::{Client, Method};
use std::iter;
use url::Url;
use url::form_urlencoded;

/// `application/x-www-form-urlencoded` body for `params`, in order.
pub fn encode_params<'pairs, I>(params: I) -> String
where
    I: IntoIterator<Item = &'pairs (String, String)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

/// One label edit, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub method: String,
    pub action: Url,
    pub params: Vec<(String, String)>,
}

impl EditRequest {
    /// Base fields of `snapshot`, the empty label sentinel, then one pair per title.
    pub fn new(snapshot: &FormSnapshot, titles: &[String]) -> Self {
        let params = snapshot
            .base_params()
            .cloned()
            .chain(
                iter_label_values(titles).map(|title| (LABEL_FIELD.to_owned(), title.to_owned())),
            )
            .collect();
        Self {
            method: snapshot.method.clone(),
            action: snapshot.action.clone(),
            params,
        }
    }

    #[inline]
    pub fn body(&self) -> String {
        encode_params(&self.params)
    }

    /// Label titles this request selects, sentinel excluded.
    pub fn titles(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(name, value)| name == LABEL_FIELD && !value.is_empty())
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

fn iter_label_values(titles: &[String]) -> impl Iterator<Item = &str> {
    iter::once("").chain(titles.iter().map(String::as_str))
}

/// Sends [`EditRequest`]s. Holds no state besides the HTTP client.
#[derive(Debug, Clone, Default)]
pub struct EditSubmitter {
    client: Client,
}

impl EditSubmitter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Perform the request with the page's session cookie and return the body text.
    ///
    /// # Errors
    /// Returns [`EditorError::Transport`] when the request or body read fails and
    /// [`EditorError::Status`] on a non-2xx answer.
    pub async fn submit(
        &self,
        request: &EditRequest,
        cookie: Option<&str>,
    ) -> Result<String, EditorError> {
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .unwrap_or(Method::GET);
        let body = request.body();
        let mut builder = if method == Method::GET {
            let mut url = request.action.clone();
            url.set_query(Some(&body));
            self.client.get(url)
        } else {
            self.client
                .request(method.clone(), request.action.clone())
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body)
        };
        builder = builder
            .header("X-Requested-With", "XMLHttpRequest")
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache");
        if let Some(cookie) = cookie.filter(|cookie| !cookie.is_empty()) {
            builder = builder.header(COOKIE, cookie);
        }

        debug!(target: "label_editor", "{method} {} selecting {:?}", request.action, request.titles());
        let response = builder.send().await.inspect_err(|err| {
            error!(target: "label_editor", "label update to {} failed: {err}", request.action);
        })?;
        let status = response.status();
        if !status.is_success() {
            error!(target: "label_editor", "label update to {} answered {status}", request.action);
            return Err(EditorError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
