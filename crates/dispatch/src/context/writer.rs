//! Response writers.
//!
//! Every writer encodes its payload before touching the response, so a value
//! that fails to serialize leaves the response uncommitted. On success the
//! writer sets `Content-Type`, commits the status and writes the body.

use super::Context;
use crate::error::{Error, HttpError};
use crate::mime_types::{
    APPLICATION_JAVASCRIPT_CHARSET_UTF8, APPLICATION_JSON_CHARSET_UTF8, APPLICATION_OCTET_STREAM,
    APPLICATION_XML_CHARSET_UTF8, TEXT_HTML_CHARSET_UTF8, TEXT_PLAIN_CHARSET_UTF8,
};
use http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Prepended to every XML body.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Indent used when a request asks for pretty output with the `pretty` query flag.
pub const DEFAULT_INDENT: &str = "  ";

const PRETTY_FLAG: &str = "pretty";
const INDEX_FILE: &str = "index.html";

impl Context {
    /// Renders the template `name` with the server's renderer and writes the result as HTML.
    ///
    /// # Errors
    /// Returns [`Error::RendererNotRegistered`] when the server has no renderer,
    /// or the renderer's failure.
    pub fn render<T: Serialize + ?Sized>(&mut self, code: StatusCode, name: &str, data: &T) -> Result<(), Error> {
        let renderer = self.shared.renderer.as_ref().map(Arc::clone).ok_or(Error::RendererNotRegistered)?;
        let data = serde_json::to_value(data)?;
        let mut buf = Vec::new();
        renderer.render(&mut buf, name, &data, self).map_err(Error::render)?;
        self.html_blob(code, &buf)
    }

    pub fn html(&mut self, code: StatusCode, html: &str) -> Result<(), Error> {
        self.html_blob(code, html.as_bytes())
    }

    pub fn html_blob(&mut self, code: StatusCode, bytes: &[u8]) -> Result<(), Error> {
        self.blob(code, TEXT_HTML_CHARSET_UTF8, bytes)
    }

    pub fn string(&mut self, code: StatusCode, s: &str) -> Result<(), Error> {
        self.blob(code, TEXT_PLAIN_CHARSET_UTF8, s.as_bytes())
    }

    /// Writes `value` as JSON, indented when the request carries the `pretty` query flag.
    ///
    /// # Errors
    /// Returns [`Error::Json`] when `value` can not be encoded; nothing is written then.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T) -> Result<(), Error> {
        if self.query_params().contains_key(PRETTY_FLAG) {
            return self.json_pretty(code, value, DEFAULT_INDENT);
        }
        let body = serde_json::to_vec(value)?;
        self.json_blob(code, &body)
    }

    /// Writes `value` as JSON indented with `indent`.
    ///
    /// # Errors
    /// Returns [`Error::Json`] when `value` can not be encoded; nothing is written then.
    pub fn json_pretty<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T, indent: &str) -> Result<(), Error> {
        let mut body = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut body, PrettyFormatter::with_indent(indent.as_bytes()));
        value.serialize(&mut serializer)?;
        self.json_blob(code, &body)
    }

    pub fn json_blob(&mut self, code: StatusCode, bytes: &[u8]) -> Result<(), Error> {
        self.blob(code, APPLICATION_JSON_CHARSET_UTF8, bytes)
    }

    /// Writes `value` as JSON wrapped in a call to `callback`.
    ///
    /// # Errors
    /// Returns [`Error::Json`] when `value` can not be encoded; nothing is written then.
    pub fn jsonp<T: Serialize + ?Sized>(&mut self, code: StatusCode, callback: &str, value: &T) -> Result<(), Error> {
        let body = serde_json::to_vec(value)?;
        self.jsonp_blob(code, callback, &body)
    }

    pub fn jsonp_blob(&mut self, code: StatusCode, callback: &str, bytes: &[u8]) -> Result<(), Error> {
        let mut body = Vec::with_capacity(callback.len() + bytes.len() + 3);
        body.extend_from_slice(callback.as_bytes());
        body.push(b'(');
        body.extend_from_slice(bytes);
        body.extend_from_slice(b");");
        self.blob(code, APPLICATION_JAVASCRIPT_CHARSET_UTF8, &body)
    }

    /// Writes `value` as XML, indented when the request carries the `pretty` query flag.
    ///
    /// # Errors
    /// Returns [`Error::Xml`] when `value` can not be encoded; nothing is written then.
    pub fn xml<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T) -> Result<(), Error> {
        if self.query_params().contains_key(PRETTY_FLAG) {
            return self.xml_pretty(code, value, DEFAULT_INDENT);
        }
        let body = encode_xml(value, None)?;
        self.xml_blob(code, body.as_bytes())
    }

    /// Writes `value` as XML indented with `indent`.
    ///
    /// The indent is repeated from its first character, so `"  "` and `"\t"`
    /// both work; an empty indent writes compact XML.
    ///
    /// # Errors
    /// Returns [`Error::Xml`] when `value` can not be encoded; nothing is written then.
    pub fn xml_pretty<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T, indent: &str) -> Result<(), Error> {
        let body = encode_xml(value, Some(indent))?;
        self.xml_blob(code, body.as_bytes())
    }

    /// Writes `bytes` after the XML declaration.
    pub fn xml_blob(&mut self, code: StatusCode, bytes: &[u8]) -> Result<(), Error> {
        let mut body = Vec::with_capacity(XML_HEADER.len() + bytes.len());
        body.extend_from_slice(XML_HEADER.as_bytes());
        body.extend_from_slice(bytes);
        self.blob(code, APPLICATION_XML_CHARSET_UTF8, &body)
    }

    /// Writes raw `bytes` with the given content type.
    ///
    /// On a response that is already committed the status and headers are
    /// left as they are and only `bytes` is appended.
    ///
    /// # Errors
    /// Returns [`Error::HeaderValue`] when `content_type` is not a valid header value.
    pub fn blob(&mut self, code: StatusCode, content_type: &str, bytes: &[u8]) -> Result<(), Error> {
        let content_type = HeaderValue::from_str(content_type)?;
        if !self.response.committed() {
            self.response.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        self.response.write_header(code);
        self.response.write_body(bytes);
        Ok(())
    }

    /// Copies everything `reader` yields into the body.
    ///
    /// The reader is drained before anything is committed, so a failing reader leaves the response untouched.
    ///
    /// # Errors
    /// Returns [`Error::Io`] when reading fails.
    pub async fn stream<R>(&mut self, code: StatusCode, content_type: &str, mut reader: R) -> Result<(), Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await?;
        self.blob(code, content_type, &body)
    }

    /// Sends the file at `path` with status `200`. A directory is served through its `index.html`.
    ///
    /// # Errors
    /// Returns a `404` [`HttpError`] when the file does not exist, otherwise the I/O failure.
    pub async fn file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let (path, content) = read_file(path.as_ref()).await?;
        self.blob(StatusCode::OK, content_type_of(&path), &content)
    }

    /// Sends the file at `path` as a download named `name`.
    ///
    /// # Errors
    /// Same as [`Context::file`].
    pub async fn attachment<P: AsRef<Path>>(&mut self, path: P, name: &str) -> Result<(), Error> {
        self.content_disposition(path.as_ref(), name, "attachment").await
    }

    /// Sends the file at `path` for display in the browser under the name `name`.
    ///
    /// # Errors
    /// Same as [`Context::file`].
    pub async fn inline<P: AsRef<Path>>(&mut self, path: P, name: &str) -> Result<(), Error> {
        self.content_disposition(path.as_ref(), name, "inline").await
    }

    async fn content_disposition(&mut self, path: &Path, name: &str, disposition: &str) -> Result<(), Error> {
        let (path, content) = read_file(path).await?;
        let value = HeaderValue::from_str(&format!("{disposition}; filename=\"{name}\""))?;
        if !self.response.committed() {
            self.response.headers_mut().insert(CONTENT_DISPOSITION, value);
        }
        self.blob(StatusCode::OK, content_type_of(&path), &content)
    }

    /// Commits `code` with an empty body.
    pub fn no_content(&mut self, code: StatusCode) -> Result<(), Error> {
        self.response.write_header(code);
        Ok(())
    }

    /// Redirects the client to `url`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRedirectCode`] unless `code` is in `300..=308`;
    /// the response is left untouched then.
    pub fn redirect(&mut self, code: StatusCode, url: &str) -> Result<(), Error> {
        if !(300..=308).contains(&code.as_u16()) {
            return Err(Error::InvalidRedirectCode(code));
        }
        let location = HeaderValue::from_str(url)?;
        if !self.response.committed() {
            self.response.headers_mut().insert(LOCATION, location);
        }
        self.response.write_header(code);
        Ok(())
    }
}

fn encode_xml<T: Serialize + ?Sized>(value: &T, indent: Option<&str>) -> Result<String, Error> {
    let mut out = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut out);
    if let Some(ch) = indent.and_then(|indent| indent.chars().next()) {
        serializer.indent(ch, indent.map_or(0, str::len));
    }
    value.serialize(serializer).map_err(Error::xml)?;
    Ok(out)
}

async fn read_file(path: &Path) -> Result<(PathBuf, Vec<u8>), Error> {
    let mut path = path.to_path_buf();
    if tokio::fs::metadata(&path).await.map_err(not_found_or_io)?.is_dir() {
        path.push(INDEX_FILE);
    }
    let content = tokio::fs::read(&path).await.map_err(not_found_or_io)?;
    Ok((path, content))
}

fn not_found_or_io(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::NotFound { HttpError::not_found().into() } else { e.into() }
}

fn content_type_of(path: &Path) -> &'static str {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => TEXT_HTML_CHARSET_UTF8,
        Some("txt") => TEXT_PLAIN_CHARSET_UTF8,
        Some("json") => APPLICATION_JSON_CHARSET_UTF8,
        Some("xml") => APPLICATION_XML_CHARSET_UTF8,
        Some("js") => APPLICATION_JAVASCRIPT_CHARSET_UTF8,
        Some("css") => "text/css; charset=UTF-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => APPLICATION_OCTET_STREAM,
    }
}
