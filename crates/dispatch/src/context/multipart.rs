use super::form::Values;
use super::Context;
use crate::error::Error;
use bytes::Bytes;
use std::collections::HashMap;
use std::convert::Infallible;

/// A file part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    filename: String,
    content_type: Option<String>,
    content: Bytes,
}

impl FileHeader {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// A decoded `multipart/form-data` body: plain fields and file parts, keyed by field name.
#[derive(Debug, Default, Clone)]
pub struct MultipartForm {
    values: Values,
    files: HashMap<String, Vec<FileHeader>>,
}

impl MultipartForm {
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// The first file uploaded under `name`.
    pub fn file(&self, name: &str) -> Option<&FileHeader> {
        self.files(name).first()
    }

    pub fn files(&self, name: &str) -> &[FileHeader] {
        self.files.get(name).map_or(&[], Vec::as_slice)
    }

    pub(crate) async fn parse(body: Bytes, boundary: String) -> Result<Self, Error> {
        let stream = futures::stream::once(async move { Ok::<_, Infallible>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            match field.file_name() {
                Some(filename) => {
                    let filename = filename.to_owned();
                    let content_type = field.content_type().map(ToString::to_string);
                    let content = field.bytes().await?;
                    form.files.entry(name).or_default().push(FileHeader { filename, content_type, content });
                }
                None => {
                    let value = field.text().await?;
                    form.values.add(name, value);
                }
            }
        }
        Ok(form)
    }
}

impl Context {
    /// The first file uploaded under the multipart field `name`.
    ///
    /// # Errors
    /// Returns [`Error::FormFileNotFound`] when no such file part exists, or
    /// the errors of [`Context::multipart_form`].
    pub async fn form_file(&mut self, name: &str) -> Result<&FileHeader, Error> {
        self.multipart_form().await?.file(name).ok_or_else(|| Error::form_file_not_found(name))
    }
}
