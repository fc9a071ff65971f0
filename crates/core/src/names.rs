//! System-stream naming conventions for format A (string stream ids).
//!
//! A stream whose name starts with `$` is a system stream. Every ordinary
//! stream has an associated metastream carrying its metadata; in format A
//! the metastream name is `$$` + the original name, so that it itself also
//! satisfies the system-stream predicate and is never confused with an
//! ordinary stream that happens to start with `$`.

/// Prefix marking a stream name as a metastream.
pub const METASTREAM_PREFIX: &str = "$$";

/// Prefix marking a stream name as any kind of system stream.
pub const SYSTEM_STREAM_PREFIX: &str = "$";

/// True if `name` is a system stream (starts with `$`), which covers both
/// metastreams and other reserved streams like `$all` projections.
pub fn is_system_stream(name: &str) -> bool {
    name.starts_with(SYSTEM_STREAM_PREFIX)
}

/// True if `name` is specifically a metastream.
pub fn is_metastream(name: &str) -> bool {
    name.starts_with(METASTREAM_PREFIX)
}

/// The metastream name for a given stream name.
pub fn metastream_of(stream_name: &str) -> String {
    format!("{}{}", METASTREAM_PREFIX, stream_name)
}

/// The original stream name a metastream name refers to, or `None` if
/// `name` is not a metastream.
pub fn original_stream_of(name: &str) -> Option<&str> {
    name.strip_prefix(METASTREAM_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_stream_is_not_system() {
        assert!(!is_system_stream("order-123"));
    }

    #[test]
    fn metastream_is_system() {
        assert!(is_system_stream(&metastream_of("order-123")));
    }

    #[test]
    fn metastream_of_and_original_stream_of_round_trip() {
        let meta = metastream_of("order-123");
        assert_eq!(original_stream_of(&meta), Some("order-123"));
    }

    #[test]
    fn non_metastream_has_no_original_stream() {
        assert_eq!(original_stream_of("order-123"), None);
        assert_eq!(original_stream_of("$all"), None);
    }

    #[test]
    fn is_metastream_distinguishes_from_plain_system_streams() {
        assert!(!is_metastream("$all"));
        assert!(is_metastream("$$order-123"));
    }

    proptest::proptest! {
        /// `metastream_of`/`original_stream_of` round-trip for any stream
        /// name, including names that already start with `$` or are empty.
        #[test]
        fn metastream_round_trips_for_arbitrary_names(name in ".*") {
            let meta = metastream_of(&name);
            proptest::prop_assert_eq!(original_stream_of(&meta), Some(name.as_str()));
            proptest::prop_assert!(is_metastream(&meta));
            proptest::prop_assert!(is_system_stream(&meta));
        }
    }
}
