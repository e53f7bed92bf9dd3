//! BLAKE3 fingerprint of terraform definition files.

use std::io::Read;
use std::path::{Path, PathBuf};

const STREAM_BUF_SIZE: usize = 65536;

/// Files terraform loads as definitions or variable values.
/// `.terraform/` and `.terraform.lock.hcl` are deliberately absent so the
/// fingerprint survives `terraform init`.
pub const DEFINITION_PATTERNS: [&str; 4] = ["*.tf", "*.tf.json", "*.tfvars", "*.tfvars.json"];

/// Hash a file's contents. Returns `"blake3:{hex}"`.
pub fn hash_file(path: &Path) -> Result<String, String> {
    let mut file =
        std::fs::File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; STREAM_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| format!("read error {}: {}", path.display(), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("blake3:{}", hasher.finalize().to_hex()))
}

/// Definition files directly inside `dir`, sorted by name.
/// Returned paths are `dir` joined with the file name, whatever form `dir` takes.
pub fn definition_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    if !dir.is_dir() {
        return Err(format!("{} is not a directory", dir.display()));
    }
    let patterns = DEFINITION_PATTERNS
        .iter()
        .map(|p| glob::Pattern::new(p).map_err(|e| format!("bad glob pattern {}: {}", p, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let read_dir = std::fs::read_dir(dir)
        .map_err(|e| format!("cannot read dir {}: {}", dir.display(), e))?;
    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| format!("read dir error {}: {}", dir.display(), e))?;
        let path = dir.join(entry.file_name());
        let name = entry.file_name().to_string_lossy().to_string();
        if patterns.iter().any(|p| p.matches(&name)) && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Fingerprint every definition file in `dir` (names and contents).
///
/// Keyed on file names, so `.`, a relative path and the absolute path of the
/// same directory all give the same fingerprint.
pub fn hash_definitions(dir: &Path) -> Result<String, String> {
    let mut hasher = blake3::Hasher::new();
    for path in definition_files(dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| format!("no file name in {}", path.display()))?;
        let hash = hash_file(&path)?;
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
        hasher.update(hash.as_bytes());
        hasher.update(b"\n");
    }
    Ok(format!("blake3:{}", hasher.finalize().to_hex()))
}
