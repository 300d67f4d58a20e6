use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

use crate::backend::{AccessMode, FileBackend, FileHandle};

/// Real files through `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFsBackend;

impl StdFsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl FileBackend for StdFsBackend {
    type Handle = File;

    fn open(&self, path: &Path, mode: AccessMode) -> io::Result<File> {
        OpenOptions::new()
            .read(mode.can_read())
            .write(mode.can_write())
            .open(path)
    }
}

impl FileHandle for File {
    fn rewind(&mut self) -> io::Result<()> {
        Seek::rewind(self)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        Read::read_exact(self, &mut buf)?;
        Ok(buf[0])
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        Write::write_all(self, buf)
    }
}
