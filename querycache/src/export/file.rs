// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Exports stored as files in a single directory

use super::{read_full, ExportTally, ResultStorageEngine, StorageError, StorageResult, TableExportResult};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

const COPY_BUFFER_SIZE: usize = 8 * 1024;
const STAGING_PREFIX: &str = ".staging-";

/// Stores each export as `<base_path>/<id>[.<extension>]`
///
/// Every id must resolve to a file directly inside the base directory. Ids
/// that would escape it, or that name no stored export, are reported as
/// [`StorageError::NotFound`] without revealing any filesystem path.
#[derive(Debug, Clone)]
pub struct FileResultStorageEngine {
    base_path: PathBuf,
    extension: Option<String>,
}

impl FileResultStorageEngine {
    /// Use `base_path` for exports, creating the directory if needed
    pub fn new<P: AsRef<Path>>(base_path: P) -> StorageResult<Self> {
        fs::create_dir_all(base_path.as_ref())?;
        let base_path = fs::canonicalize(base_path.as_ref())?;
        log::debug!("File export storage at {}", base_path.display());
        Ok(Self {
            base_path,
            extension: None,
        })
    }

    /// Append `.<extension>` to every stored file name
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = Some(extension.trim_start_matches('.').to_string());
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_name(&self, id: &str) -> String {
        match &self.extension {
            Some(ext) if !ext.is_empty() => format!("{}.{}", id, ext),
            _ => id.to_string(),
        }
    }

    /// Resolve `id` to a path whose parent is exactly the base directory
    fn resolve(&self, id: &str) -> StorageResult<PathBuf> {
        let not_found = || StorageError::NotFound(id.to_string());

        if id.is_empty() || id.contains(['/', '\\', '\0']) {
            return Err(not_found());
        }
        let file_name = self.file_name(id);
        let mut components = Path::new(&file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(not_found()),
        }

        let candidate = self.base_path.join(&file_name);
        if candidate.parent() != Some(self.base_path.as_path()) {
            return Err(not_found());
        }
        Ok(candidate)
    }
}

impl ResultStorageEngine for FileResultStorageEngine {
    fn store_results(&self, id: &str, source: &mut dyn Read) -> StorageResult<TableExportResult> {
        let path = self.resolve(id)?;

        // Only regular files are replaced; a planted symlink or directory is not an export
        match fs::symlink_metadata(&path) {
            Ok(meta) if !meta.file_type().is_file() => {
                return Err(StorageError::NotFound(id.to_string()))
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        // Written beside the target and renamed into place, so readers never
        // see a partial export; the staged file is removed on any failure
        let staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.base_path)?;
        let mut writer = BufWriter::new(staged);
        let mut tally = ExportTally::default();
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];

        loop {
            let n = read_full(source, &mut buf)?;
            if n == 0 {
                break;
            }
            tally.observe(&buf[..n]);
            writer.write_all(&buf[..n])?;
        }
        let staged = writer.into_inner().map_err(|e| e.into_error())?;
        staged.persist(&path).map_err(|e| e.error)?;

        let result = tally.finish(id);
        log::debug!(
            "Stored export {}: {} records, {} bytes",
            id,
            result.record_count,
            result.byte_count
        );
        Ok(result)
    }

    fn get_results(&self, id: &str) -> StorageResult<Box<dyn Read + Send>> {
        let path = self.resolve(id)?;

        // Symlinks must not lead out of the base directory either
        let resolved = fs::canonicalize(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(id.to_string()),
            _ => StorageError::Io(e),
        })?;
        if resolved.parent() != Some(self.base_path.as_path()) || !resolved.is_file() {
            return Err(StorageError::NotFound(id.to_string()));
        }

        let file = File::open(&resolved).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(id.to_string()),
            _ => StorageError::Io(e),
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine() -> (TempDir, FileResultStorageEngine) {
        let temp_dir = TempDir::new().unwrap();
        let engine = FileResultStorageEngine::new(temp_dir.path().join("exports")).unwrap();
        (temp_dir, engine)
    }

    fn read_all(engine: &FileResultStorageEngine, id: &str) -> Vec<u8> {
        let mut out = Vec::new();
        engine.get_results(id).unwrap().read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_store_and_get() {
        let (_dir, engine) = engine();
        let data = b"name,score\nSaintJohn,1234\n".to_vec();
        let result = engine.store_results("e1", &mut data.as_slice()).unwrap();

        assert_eq!(result.export_id, "e1");
        assert_eq!(result.record_count, 2);
        assert_eq!(result.byte_count, data.len() as u64);
        assert_eq!(read_all(&engine, "e1"), data);
    }

    #[test]
    fn test_store_replaces() {
        let (_dir, engine) = engine();
        engine.store_results("e1", &mut &b"old\nold\n"[..]).unwrap();
        engine.store_results("e1", &mut &b"new\n"[..]).unwrap();
        assert_eq!(read_all(&engine, "e1"), b"new\n");
    }

    #[test]
    fn test_extension() {
        let (_dir, engine) = engine();
        let engine = engine.with_extension(".csv");
        engine.store_results("e1", &mut &b"a\n"[..]).unwrap();
        assert!(engine.base_path().join("e1.csv").is_file());
        assert_eq!(read_all(&engine, "e1"), b"a\n");
    }

    #[test]
    fn test_missing_is_not_found() {
        let (_dir, engine) = engine();
        assert!(matches!(
            engine.get_results("missing"),
            Err(StorageError::NotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_traversal_rejected() {
        let (dir, engine) = engine();
        fs::write(dir.path().join("secret"), b"secret\n").unwrap();

        for id in ["../secret", "..", ".", "", "/etc/passwd", "a/b", "..\\secret"] {
            let err = engine.get_results(id).err().unwrap();
            assert!(matches!(&err, StorageError::NotFound(found) if found == id), "{}", id);
            assert!(!err.to_string().contains(&*dir.path().to_string_lossy()));

            assert!(matches!(
                engine.store_results(id, &mut &b"x\n"[..]),
                Err(StorageError::NotFound(_))
            ));
        }
        assert_eq!(fs::read(dir.path().join("secret")).unwrap(), b"secret\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, engine) = engine();
        fs::write(dir.path().join("secret"), b"secret\n").unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret"), engine.base_path().join("link"))
            .unwrap();
        assert!(matches!(
            engine.get_results("link"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_store_does_not_follow_symlink() {
        let (dir, engine) = engine();
        fs::write(dir.path().join("secret"), b"secret\n").unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret"), engine.base_path().join("link"))
            .unwrap();

        assert!(matches!(
            engine.store_results("link", &mut &b"evil\n"[..]),
            Err(StorageError::NotFound(id)) if id == "link"
        ));
        assert_eq!(fs::read(dir.path().join("secret")).unwrap(), b"secret\n");
    }

    /// Yields `data` once, then fails
    struct BrokenSource {
        data: Option<&'static [u8]>,
    }

    impl Read for BrokenSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Ok(n)
                }
                None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "source closed")),
            }
        }
    }

    #[test]
    fn test_failed_store_keeps_previous_export() {
        let (_dir, engine) = engine();
        engine.store_results("e1", &mut &b"old\n"[..]).unwrap();

        let mut source = BrokenSource {
            data: Some(&b"partial"[..]),
        };
        assert!(matches!(
            engine.store_results("e1", &mut source),
            Err(StorageError::Io(_))
        ));
        assert_eq!(read_all(&engine, "e1"), b"old\n");

        // No staged file is left behind
        let names: Vec<_> = fs::read_dir(engine.base_path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("e1")]);
    }
}
