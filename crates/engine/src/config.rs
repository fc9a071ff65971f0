//! Index reader configuration. A plain struct with a `Default` impl —
//! loading it from a file or CLI flags is explicitly out of scope (§1);
//! callers construct it directly or via [`IndexReaderConfig::builder`].

use logindex_core::metadata::StreamMetadata;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct IndexReaderConfig {
    pub index_directory: Option<PathBuf>,
    pub in_memory: bool,
    pub initial_reader_count: usize,
    pub max_reader_count: usize,
    /// 0 disables the stream-existence filter.
    pub stream_existence_filter_size: i64,
    pub hash_collision_read_limit: usize,
    pub skip_index_scan_on_read: bool,
    pub metastream_metadata: StreamMetadata,
}

impl Default for IndexReaderConfig {
    fn default() -> Self {
        IndexReaderConfig {
            index_directory: None,
            in_memory: true,
            initial_reader_count: 5,
            max_reader_count: 100,
            stream_existence_filter_size: 0,
            hash_collision_read_limit: 10,
            skip_index_scan_on_read: false,
            metastream_metadata: StreamMetadata::empty(),
        }
    }
}

impl IndexReaderConfig {
    pub fn builder() -> IndexReaderConfigBuilder {
        IndexReaderConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexReaderConfigBuilder {
    config: IndexReaderConfig,
}

impl IndexReaderConfigBuilder {
    pub fn index_directory(mut self, path: PathBuf) -> Self {
        self.config.index_directory = Some(path);
        self.config.in_memory = false;
        self
    }

    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.config.in_memory = in_memory;
        self
    }

    pub fn max_reader_count(mut self, count: usize) -> Self {
        self.config.max_reader_count = count;
        self
    }

    pub fn hash_collision_read_limit(mut self, limit: usize) -> Self {
        self.config.hash_collision_read_limit = limit;
        self
    }

    pub fn skip_index_scan_on_read(mut self, skip: bool) -> Self {
        self.config.skip_index_scan_on_read = skip;
        self
    }

    pub fn metastream_metadata(mut self, metadata: StreamMetadata) -> Self {
        self.config.metastream_metadata = metadata;
        self
    }

    pub fn build(self) -> IndexReaderConfig {
        self.config
    }
}
