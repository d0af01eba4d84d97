//! Library directory scanning.

use std::io;
use std::path::{Path, PathBuf};

/// Non-recursive scan of a directory for book files.
///
/// Matches the `.epub` extension case-insensitively and returns paths sorted
/// for a stable menu order. Mounting the storage the directory lives on is
/// the platform's job.
pub fn scan_library<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut books = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_book = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));
        if is_book {
            books.push(path);
        }
    }
    books.sort();
    Ok(books)
}
