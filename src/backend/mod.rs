pub mod mock;
pub mod stdfs;

use std::io;
use std::path::Path;

pub use mock::MockFsBackend;
pub use stdfs::StdFsBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn can_read(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}

/// An open file, released when dropped or closed.
pub trait FileHandle: Send {
    fn rewind(&mut self) -> io::Result<()>;
    /// Reads the byte at the current position, `UnexpectedEof` past the end.
    fn read_byte(&mut self) -> io::Result<u8>;
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()>;
    fn close(self) -> io::Result<()>
    where
        Self: Sized,
    {
        drop(self);
        Ok(())
    }
}

pub trait FileBackend: Send + Sync {
    type Handle: FileHandle;

    fn open(&self, path: &Path, mode: AccessMode) -> io::Result<Self::Handle>;
}
