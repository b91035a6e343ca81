//! Query string and form values.
//!
//! The query string is parsed on first access and cached until the context is
//! reset. Form values come from the request body when it is url-encoded or
//! multipart, followed by the query values.

use super::multipart::MultipartForm;
use super::Context;
use crate::error::Error;
use http::header::CONTENT_TYPE;
use mime::Mime;
use std::collections::hash_map::{self, HashMap};
use tracing::warn;

/// Multi-valued string map, the decoded form of a query string or form body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Values {
    inner: HashMap<String, Vec<String>>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an `application/x-www-form-urlencoded` payload.
    ///
    /// # Errors
    /// Returns an error when the payload is not valid url-encoded data.
    pub fn parse(input: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_bytes::<Vec<(String, String)>>(input).map(|pairs| pairs.into_iter().collect())
    }

    /// The first value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Appends `value` to the values of `key`.
    pub fn add<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Vec<String>> {
        self.inner.iter()
    }

    fn merge(&mut self, other: &Values) {
        for (key, values) in &other.inner {
            self.inner.entry(key.clone()).or_default().extend(values.iter().cloned());
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = Values::new();
        for (key, value) in iter {
            values.add(key, value);
        }
        values
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = hash_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Context {
    /// The raw query string, without the leading `?`.
    pub fn query_string(&self) -> &str {
        self.request.uri().query().unwrap_or_default()
    }

    /// All query values, parsed on first access.
    pub fn query_params(&mut self) -> &Values {
        let request = &self.request;
        self.query.get_or_insert_with(|| {
            let query = request.uri().query().unwrap_or_default();
            Values::parse(query.as_bytes()).unwrap_or_else(|e| {
                warn!(cause = %e, query, "invalid query string, ignored");
                Values::new()
            })
        })
    }

    /// The first query value of `name`, or an empty string.
    pub fn query_param(&mut self, name: &str) -> String {
        self.query_params().get(name).unwrap_or_default().to_owned()
    }

    pub(crate) fn content_type(&self) -> Option<Mime> {
        self.request.headers().get(CONTENT_TYPE)?.to_str().ok()?.parse().ok()
    }

    /// All form values: the decoded body for url-encoded and multipart
    /// requests, followed by the query values.
    ///
    /// # Errors
    /// Returns an error when the body can not be decoded.
    pub async fn form_params(&mut self) -> Result<&Values, Error> {
        if self.form.is_none() {
            let mut values = match self.content_type() {
                Some(ct) if ct.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() => {
                    Values::parse(self.request.body())?
                }
                Some(ct) if ct.essence_str() == mime::MULTIPART_FORM_DATA.essence_str() => {
                    self.multipart_form().await?.values().clone()
                }
                _ => Values::new(),
            };
            values.merge(self.query_params());
            self.form = Some(values);
        }
        Ok(&*self.form.get_or_insert_with(Values::new))
    }

    /// The first form value of `name`, or an empty string when it is absent or the body is invalid.
    pub async fn form_value(&mut self, name: &str) -> String {
        match self.form_params().await {
            Ok(values) => values.get(name).unwrap_or_default().to_owned(),
            Err(e) => {
                warn!(cause = %e, "failed to parse form");
                String::new()
            }
        }
    }

    /// The parsed `multipart/form-data` body.
    ///
    /// # Errors
    /// Returns [`Error::NotMultipart`] when the request is not multipart, or
    /// the parse failure of a malformed body.
    pub async fn multipart_form(&mut self) -> Result<&MultipartForm, Error> {
        if self.multipart.is_none() {
            let boundary = self
                .content_type()
                .filter(|ct| ct.essence_str() == mime::MULTIPART_FORM_DATA.essence_str())
                .and_then(|ct| ct.get_param(mime::BOUNDARY).map(|boundary| boundary.as_str().to_owned()))
                .ok_or(Error::NotMultipart)?;
            let form = MultipartForm::parse(self.request.body().clone(), boundary).await?;
            self.multipart = Some(form);
        }
        Ok(&*self.multipart.get_or_insert_with(MultipartForm::default))
    }
}
