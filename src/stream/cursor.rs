//! In-memory binary cursor.
//!
//! All multi-byte values are little-endian. Writing past the end grows the
//! buffer; writing inside it overwrites, which is what back-patching relies on.

use std::io::{self, Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::util::{Error, Result};

/// Seekable little-endian reader/writer over an owned byte buffer.
#[derive(Debug, Default)]
pub struct Cursor {
    inner: io::Cursor<Vec<u8>>,
}

macro_rules! read_le {
    ($name:ident, $ty:ty, $method:ident) => {
        #[doc = concat!("Read a `", stringify!($ty), "` (little-endian).")]
        pub fn $name(&mut self) -> Result<$ty> {
            let pos = self.position();
            self.inner
                .$method::<LittleEndian>()
                .map_err(|e| Self::read_error(e, pos))
        }
    };
}

macro_rules! write_le {
    ($name:ident, $ty:ty, $method:ident) => {
        #[doc = concat!("Write a `", stringify!($ty), "` (little-endian).")]
        pub fn $name(&mut self, value: $ty) -> Result<()> {
            self.inner.$method::<LittleEndian>(value)?;
            Ok(())
        }
    };
}

impl Cursor {
    /// Create an empty cursor for writing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cursor over existing bytes, positioned at the start.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: io::Cursor::new(bytes.into()),
        }
    }

    /// Get the current position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Seek to an absolute position.
    pub fn seek(&mut self, pos: u64) -> Result<u64> {
        Ok(self.inner.seek(SeekFrom::Start(pos))?)
    }

    /// Seek to the end of the buffer and return the position.
    pub fn seek_end(&mut self) -> Result<u64> {
        Ok(self.inner.seek(SeekFrom::End(0))?)
    }

    /// Total buffer length.
    #[inline]
    pub fn len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }

    /// Check if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    /// Bytes left between the position and the end.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.position())
    }

    /// Borrow the whole buffer.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.get_ref()
    }

    /// Consume the cursor and return the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.inner.into_inner()
    }

    fn read_error(e: io::Error, pos: u64) -> Error {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof(pos)
        } else {
            Error::Io(e)
        }
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let pos = self.position();
        self.inner.read_u8().map_err(|e| Self::read_error(e, pos))
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        let pos = self.position();
        self.inner.read_i8().map_err(|e| Self::read_error(e, pos))
    }

    read_le!(read_u16, u16, read_u16);
    read_le!(read_i16, i16, read_i16);
    read_le!(read_u32, u32, read_u32);
    read_le!(read_i32, i32, read_i32);
    read_le!(read_u64, u64, read_u64);
    read_le!(read_f32, f32, read_f32);

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let pos = self.position();
        if (len as u64) > self.remaining() {
            return Err(Error::UnexpectedEof(pos));
        }
        let mut buf = vec![0u8; len];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| Self::read_error(e, pos))?;
        Ok(buf)
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        Ok(())
    }

    /// Write a signed byte.
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.inner.write_i8(value)?;
        Ok(())
    }

    write_le!(write_u16, u16, write_u16);
    write_le!(write_i16, i16, write_i16);
    write_le!(write_u32, u32, write_u32);
    write_le!(write_i32, i32, write_i32);
    write_le!(write_u64, u64, write_u64);
    write_le!(write_f32, f32, write_f32);

    /// Write raw bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        Ok(())
    }
}
