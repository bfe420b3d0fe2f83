use std::{collections::VecDeque, sync::Arc};

use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, warn};

use crate::{
    domain::{
        errors::StorageResult,
        models::{Entry, FolderDescriptor, ListMode},
        value_objects::Prefix,
    },
    ports::storage::{ListRequest, StorageClient},
};

/// A cursor over the entries below a prefix.
///
/// Holds the continuation token and at most one buffered page. Once drained
/// it stays drained; start a new enumeration to list again.
pub struct Enumeration {
    client: Arc<dyn StorageClient>,
    prefix: Prefix,
    mode: ListMode,
    include_placeholders: bool,
    page_size: Option<usize>,
    token: Option<String>,
    buffer: VecDeque<Entry>,
    exhausted: bool,
    pages: usize,
}

impl Enumeration {
    pub fn new(client: Arc<dyn StorageClient>, prefix: Prefix, mode: ListMode) -> Self {
        Self {
            client,
            prefix,
            mode,
            include_placeholders: false,
            page_size: None,
            token: None,
            buffer: VecDeque::new(),
            exhausted: false,
            pages: 0,
        }
    }

    /// Also yield folder marker keys as [`Entry::Placeholder`]
    pub fn with_placeholders(mut self) -> Self {
        self.include_placeholders = true;
        self
    }

    /// Ask the backend for at most `page_size` keys per call
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// Pages fetched so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Next entry, fetching another page when the buffer runs dry
    pub async fn next(&mut self) -> StorageResult<Option<Entry>> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Ok(Some(entry));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    async fn fetch_page(&mut self) -> StorageResult<()> {
        let request = ListRequest {
            prefix: self.prefix.as_str().to_string(),
            delimited: self.mode == ListMode::Delimited,
            continuation_token: self.token.take(),
            max_keys: self.page_size,
        };

        let page = match self.client.list_page(&request).await {
            Ok(page) => page,
            Err(e) => {
                // A failed page ends the enumeration.
                self.exhausted = true;
                return Err(e);
            }
        };
        self.pages += 1;

        debug!(
            bucket = %self.client.bucket(),
            prefix = %self.prefix,
            page = self.pages,
            objects = page.objects.len(),
            prefixes = page.common_prefixes.len(),
            "Fetched listing page"
        );

        for object in page.objects {
            if object.is_placeholder() {
                if self.include_placeholders {
                    self.buffer.push_back(Entry::Placeholder(object.key));
                }
                continue;
            }
            if !self.prefix.contains(&object.key) {
                continue;
            }
            self.buffer.push_back(Entry::Object(object));
        }

        if self.mode == ListMode::Delimited {
            for common in page.common_prefixes {
                if common == self.prefix.as_str() {
                    continue;
                }
                self.buffer
                    .push_back(Entry::Folder(FolderDescriptor::new(common)));
            }
        }

        match page.next_continuation_token {
            Some(next) if request.continuation_token.as_deref() == Some(next.as_str()) => {
                warn!(prefix = %self.prefix, token = %next, "Backend repeated continuation token, stopping");
                self.exhausted = true;
            }
            Some(next) => self.token = Some(next),
            None => self.exhausted = true,
        }

        Ok(())
    }

    /// Turn the cursor into a stream; an error ends the stream
    pub fn into_stream(self) -> BoxStream<'static, StorageResult<Entry>> {
        stream::unfold(Some(self), |state| async move {
            let mut cursor = state?;
            match cursor.next().await {
                Ok(Some(entry)) => Some((Ok(entry), Some(cursor))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
        .boxed()
    }
}

/// Lazily list the entries below `prefix`
pub fn enumerate(
    client: Arc<dyn StorageClient>,
    prefix: Prefix,
    mode: ListMode,
) -> BoxStream<'static, StorageResult<Entry>> {
    Enumeration::new(client, prefix, mode).into_stream()
}
