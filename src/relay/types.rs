//! Core value types shared across the relay.

/// The remote execution target, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// Principal to authenticate as.
    pub user: String,
}

impl Target {
    /// `host:port` form, for logging.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Combined stdout/stderr capture buffer.
///
/// Both streams append to a single byte buffer in the order their chunks
/// arrive, so the resulting text reflects emission order rather than
/// separating the streams. The entire output is held in memory until the
/// remote command exits.
#[derive(Debug, Default)]
pub struct CombinedBuffer {
    bytes: Vec<u8>,
}

impl CombinedBuffer {
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(4096),
        }
    }

    /// Append one output chunk, regardless of which stream produced it.
    pub fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the buffer into text. Invalid UTF-8 is replaced, not dropped.
    pub fn into_text(self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod target {
        use super::*;

        #[test]
        fn test_address_formats_host_and_port() {
            let target = Target {
                host: "203.0.113.7".to_string(),
                port: 2222,
                user: "ops".to_string(),
            };
            assert_eq!(target.address(), "203.0.113.7:2222");
        }
    }

    mod combined_buffer {
        use super::*;

        #[test]
        fn test_interleaved_chunks_preserve_emission_order() {
            let mut buf = CombinedBuffer::new();
            buf.push(b"out-1\n");
            buf.push(b"err-1\n");
            buf.push(b"out-2\n");
            assert_eq!(buf.into_text(), "out-1\nerr-1\nout-2\n");
        }

        #[test]
        fn test_empty_buffer_yields_empty_string() {
            let buf = CombinedBuffer::new();
            assert!(buf.is_empty());
            assert_eq!(buf.into_text(), "");
        }

        #[test]
        fn test_len_tracks_bytes() {
            let mut buf = CombinedBuffer::new();
            buf.push(b"hello\n");
            assert_eq!(buf.len(), 6);
        }

        #[test]
        fn test_invalid_utf8_is_replaced() {
            let mut buf = CombinedBuffer::new();
            buf.push(b"ok ");
            buf.push(&[0xff, 0xfe]);
            let text = buf.into_text();
            assert!(text.starts_with("ok "));
            assert!(text.contains('\u{fffd}'));
        }

        #[test]
        fn test_chunk_split_mid_codepoint_is_tolerated() {
            // A multi-byte codepoint split across two chunks still decodes,
            // since conversion happens once over the full buffer.
            let bytes = "héllo".as_bytes();
            let mut buf = CombinedBuffer::new();
            buf.push(&bytes[..2]);
            buf.push(&bytes[2..]);
            assert_eq!(buf.into_text(), "héllo");
        }
    }
}
