//! File upload form

use std::path::Path;

use freeblog_util_error::FmtCompact as _;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{error, info, warn};

use crate::LOG_TARGET;
use crate::client::Client;
use crate::error::{FetchError, FetchResult, MissingFileNameSnafu, ReadFileSnafu, UploadFormResult};

pub const UPLOAD_FILES_TARGET: &str = "/api/uploadfiles/";

/// Multipart field name the server reads uploaded files from
pub const UPLOAD_FILES_FIELD: &str = "files";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Contents of the upload form: plain fields and the selected files
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    fields: Vec<(String, String)>,
    files: Vec<UploadFile>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.push(UploadFile {
            file_name: file_name.into(),
            bytes: bytes.into(),
        });
        self
    }

    /// Add a file from disk, named after the last path component
    pub async fn file_from_path(self, path: &Path) -> UploadFormResult<Self> {
        let file_name = path
            .file_name()
            .context(MissingFileNameSnafu { path })?
            .to_string_lossy()
            .into_owned();
        let bytes = tokio::fs::read(path).await.context(ReadFileSnafu { path })?;
        Ok(self.file(file_name, bytes))
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    fn into_multipart(self) -> Form {
        let form = self
            .fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        self.files.into_iter().fold(form, |form, file| {
            form.part(
                UPLOAD_FILES_FIELD,
                Part::bytes(file.bytes).file_name(file.file_name),
            )
        })
    }
}

/// What happened to a submitted [`UploadForm`]
#[derive(Debug)]
pub enum UploadOutcome {
    /// Nothing was sent
    NoFilesSelected,
    Uploaded,
    Failed(FetchError),
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded)
    }
}

impl Client {
    /// `POST` the form as `multipart/form-data` to [`UPLOAD_FILES_TARGET`]
    pub async fn upload_files(&self, form: UploadForm) -> FetchResult<()> {
        let url = self.resolve(UPLOAD_FILES_TARGET)?;
        self.send(Method::POST, url, |req| req.multipart(form.into_multipart()))
            .await?
            .success()?;
        Ok(())
    }
}

/// Handle a submission of the upload form
///
/// Requires at least one file. The result is only logged; the returned
/// [`UploadOutcome`] is for callers that want to react to it.
pub async fn handle_upload_submit(client: &Client, form: UploadForm) -> UploadOutcome {
    if !form.has_files() {
        warn!(target: LOG_TARGET, "Please select a file");
        return UploadOutcome::NoFilesSelected;
    }

    let count = form.files().len();
    match client.upload_files(form).await {
        Ok(()) => {
            info!(target: LOG_TARGET, count, "Files uploaded");
            UploadOutcome::Uploaded
        }
        Err(err) => {
            error!(target: LOG_TARGET, count, err = %err.fmt_compact(), "Upload failed");
            UploadOutcome::Failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn file_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let form = UploadForm::new().file_from_path(&path).await.unwrap();
        assert_eq!(
            form.files(),
            &[UploadFile {
                file_name: "notes.txt".into(),
                bytes: b"hello".to_vec(),
            }]
        );
    }

    #[test_log::test(tokio::test)]
    async fn file_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let res = UploadForm::new()
            .file_from_path(&dir.path().join("missing.txt"))
            .await;
        assert!(res.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn empty_form_is_not_sent() {
        // Nothing listens on the discard port; a request would fail, not pass.
        let client = Client::builder()
            .base_url("http://127.0.0.1:9/")
            .build()
            .unwrap();
        let outcome = handle_upload_submit(&client, UploadForm::new().field("title", "x")).await;
        assert!(matches!(outcome, UploadOutcome::NoFilesSelected));
    }
}
