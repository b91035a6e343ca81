//! `Content-Type` values written by the context's response writers.

pub const APPLICATION_JSON_CHARSET_UTF8: &str = "application/json; charset=UTF-8";
pub const APPLICATION_JAVASCRIPT_CHARSET_UTF8: &str = "application/javascript; charset=UTF-8";
pub const APPLICATION_XML_CHARSET_UTF8: &str = "application/xml; charset=UTF-8";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN_CHARSET_UTF8: &str = "text/plain; charset=UTF-8";
pub const TEXT_HTML_CHARSET_UTF8: &str = "text/html; charset=UTF-8";
