use crate::bulk::BulkSink;
use crate::memory::MemoryStore;
use anyhow::{Context, Result};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Bulk sink that appends every batch to an NDJSON file instead of a live store.
pub struct DumpFile {
    path: PathBuf,
    out: BufWriter<File>,
}

impl DumpFile {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            create_dir_all(dir)?;
        }
        let f = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self { path, out: BufWriter::new(f) })
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn close(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl BulkSink for DumpFile {
    async fn send_bulk(&mut self, body: String) -> Result<()> {
        self.out.write_all(body.as_bytes())?;
        Ok(())
    }
}

/// Read a dump written by [`DumpFile`] back into an in-process store.
pub fn load_dump<P: AsRef<Path>>(path: P) -> Result<MemoryStore> {
    let path = path.as_ref();
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let mut store = MemoryStore::new();
    store.load_bulk(&buf).with_context(|| format!("parsing {}", path.display()))?;
    Ok(store)
}
