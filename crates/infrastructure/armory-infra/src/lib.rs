pub mod checksum;
pub mod net;

// Re-exports for convenience
pub use checksum::{checksum_file, checksum_reader, Crc32};
pub use net::{default_http_client, FetchRequest, FetchResult, MirrorDownloader};
