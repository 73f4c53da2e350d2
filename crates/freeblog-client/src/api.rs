//! Typed access to the freeblog entry and file endpoints

use serde::{Deserialize, Serialize};

use crate::client::{Client, SubmitMethod};
use crate::error::FetchResult;

pub const ENTRY_TARGET: &str = "/api/entry/";
pub const ENTRIES_TARGET: &str = "/api/entries/";
pub const FILES_TARGET: &str = "/api/files/";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub entryid: i64,
    pub title: String,
    pub body: String,
    pub createdt: String,
    pub userid: i64,
    pub username: String,
}

/// Metadata of an uploaded file (the contents are served separately, at `url`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    pub fileid: i64,
    pub filename: String,
    pub url: String,
    pub createdt: String,
    pub userid: i64,
    pub username: String,
}

/// Filters of [`Client::find_entries`]; empty/zero fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntriesQuery {
    pub username: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl EntriesQuery {
    pub fn to_target(&self) -> String {
        QueryBuilder::new(ENTRIES_TARGET)
            .text("username", self.username.as_deref())
            .number("limit", self.limit)
            .number("offset", self.offset)
            .finish()
    }
}

/// Filters of [`Client::find_files`]; `filename` matches a substring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesQuery {
    pub username: Option<String>,
    pub filename: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl FilesQuery {
    pub fn to_target(&self) -> String {
        QueryBuilder::new(FILES_TARGET)
            .text("username", self.username.as_deref())
            .text("filename", self.filename.as_deref())
            .number("limit", self.limit)
            .number("offset", self.offset)
            .finish()
    }
}

struct QueryBuilder {
    path: &'static str,
    query: url::form_urlencoded::Serializer<'static, String>,
    empty: bool,
}

impl QueryBuilder {
    fn new(path: &'static str) -> Self {
        Self {
            path,
            query: url::form_urlencoded::Serializer::new(String::new()),
            empty: true,
        }
    }

    fn text(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.query.append_pair(key, value);
            self.empty = false;
        }
        self
    }

    fn number(self, key: &str, value: Option<u32>) -> Self {
        let value = value.filter(|v| *v != 0).map(|v| v.to_string());
        self.text(key, value.as_deref())
    }

    fn finish(mut self) -> String {
        if self.empty {
            return self.path.to_owned();
        }
        format!("{}?{}", self.path, self.query.finish())
    }
}

impl Client {
    /// `None` if there is no such entry
    pub async fn find_entry(&self, entryid: i64) -> FetchResult<Option<Entry>> {
        self.find_json(&format!("{ENTRY_TARGET}?id={entryid}")).await
    }

    /// Newest first
    pub async fn find_entries(&self, query: &EntriesQuery) -> FetchResult<Vec<Entry>> {
        Ok(self
            .find_json(&query.to_target())
            .await?
            .unwrap_or_default())
    }

    /// Returns the entry as saved, with the `entryid` assigned by the server
    pub async fn create_entry(&self, entry: &Entry) -> FetchResult<Entry> {
        self.submit(ENTRY_TARGET, SubmitMethod::Create, entry).await
    }

    pub async fn update_entry(&self, entry: &Entry) -> FetchResult<Entry> {
        self.submit(ENTRY_TARGET, SubmitMethod::Replace, entry).await
    }

    pub async fn find_files(&self, query: &FilesQuery) -> FetchResult<Vec<FileInfo>> {
        Ok(self
            .find_json(&query.to_target())
            .await?
            .unwrap_or_default())
    }
}
