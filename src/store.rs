use memmap2::MmapMut;
use std::fs::File;
use tracing::debug;

use crate::error::Result;

/// Growable byte region mapped read-write from a backing file.
///
/// `len` always matches the backing file's length. Growth extends the file
/// and remaps; the old mapping may relocate, so everything layered on top
/// addresses the region through byte offsets resolved at point of use and
/// never holds a reference across a `grow` call. Dropping the store unmaps
/// the region and closes the file; the file itself survives for reopening.
pub struct BitStore {
    file: File,
    map: MmapMut,
    len: u64,
}

impl BitStore {
    /// Extends the file to `initial_bytes` and maps it shared read-write.
    pub fn create(file: File, initial_bytes: u64) -> Result<Self> {
        file.set_len(initial_bytes)?;
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            file,
            map,
            len: initial_bytes,
        })
    }

    /// Maps an existing file at its current length.
    pub fn open(file: File) -> Result<Self> {
        let len = file.metadata()?.len();
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { file, map, len })
    }

    /// Extends the backing file and remaps. Previously written bytes keep
    /// their offsets. A failed grow restores the pre-growth file length and
    /// leaves the existing mapping valid. Never shrinks.
    pub fn grow(&mut self, new_bytes: u64) -> Result<()> {
        if new_bytes <= self.len {
            return Ok(());
        }
        self.file.set_len(new_bytes)?;
        let map = match unsafe { MmapMut::map_mut(&self.file) } {
            Ok(map) => map,
            Err(err) => {
                let _ = self.file.set_len(self.len);
                return Err(err.into());
            }
        };
        debug!(old = self.len, new = new_bytes, "grew bit store");
        self.map = map;
        self.len = new_bytes;
        Ok(())
    }

    /// Synchronizes the mapped region with the backing file.
    pub fn flush(&mut self) -> Result<()> {
        self.map.flush()?;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.map
    }

    /// Little-endian u64 at `offset`.
    pub fn read_u64(&self, offset: u64) -> u64 {
        let start = offset as usize;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.map[start..start + 8]);
        u64::from_le_bytes(buf)
    }

    pub fn write_u64(&mut self, offset: u64, value: u64) {
        let start = offset as usize;
        self.map[start..start + 8].copy_from_slice(&value.to_le_bytes());
    }
}
