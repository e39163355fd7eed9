/// File content sniffing and size formatting for catalog metadata

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes examined when sniffing a file's content type
pub const SNIFF_LEN: usize = 512;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Content type from leading bytes
///
/// Known image signatures map to their image type, NUL-free UTF-8 to plain
/// text, anything else to `application/octet-stream`.
pub fn sniff_mime(head: &[u8]) -> String {
    if head.is_empty() {
        return TEXT_PLAIN.to_string();
    }
    if let Ok(format) = image::guess_format(head) {
        return format.to_mime_type().to_string();
    }

    // A multi-byte character may be cut at the sniff boundary
    let text = match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    if text && !head.contains(&0) {
        TEXT_PLAIN.to_string()
    } else {
        OCTET_STREAM.to_string()
    }
}

/// Sniff the content type of a file on disk
pub fn sniff_file(path: &Path) -> io::Result<String> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    Ok(sniff_mime(&head))
}

/// Binary-unit size string: "512 B", "1.50 KB", "3.00 MB", ...
pub fn human_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    let prefix = b"KMGTPE"[exp] as char;
    format!("{:.2} {}B", bytes as f64 / div as f64, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1024), "1.00 KB");
        assert_eq!(human_size(1536), "1.50 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(human_size(u64::MAX), "16.00 EB");
    }

    #[test]
    fn test_sniff_images() {
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(sniff_mime(b"GIF89a\x01\x00\x01\x00"), "image/gif");
        assert_eq!(sniff_mime(b"\xff\xd8\xff\xe0\0\x10JFIF"), "image/jpeg");
    }

    #[test]
    fn test_sniff_fallbacks() {
        assert_eq!(sniff_mime(b"just some notes"), TEXT_PLAIN);
        assert_eq!(sniff_mime(b"\0\x01\x02\x03binary"), OCTET_STREAM);
        assert_eq!(sniff_mime(b""), TEXT_PLAIN);
    }

    #[test]
    fn test_sniff_file_reads_head_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        let mut body = vec![b'a'; 600];
        body[SNIFF_LEN + 10] = 0;
        std::fs::write(&path, &body).unwrap();
        // The NUL byte sits past the sniff window
        assert_eq!(sniff_file(&path).unwrap(), TEXT_PLAIN);
    }
}
