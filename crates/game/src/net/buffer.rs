//! Growable wire buffer with independent read and write cursors.
//!
//! Every multi-byte value is little-endian. That is a protocol constant shared
//! with the server, not a platform default.

use std::collections::TryReserveError;

use glam::{IVec3, U8Vec3, Vec3};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("buffer underrun: wanted {wanted} bytes, {remaining} remaining")]
    Underrun { wanted: usize, remaining: usize },
    #[error("buffer allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Byte container backing every wire message.
///
/// Reads advance `read_pos`, writes advance `write_pos`, and the two never
/// interact. Writes land at `write_pos`: bytes already present there are
/// overwritten and the storage grows only for the part that runs past the end,
/// so repositioning the write cursor into existing content never shrinks the
/// buffer.
#[derive(Debug, Default)]
pub struct ByteBuf {
    data: Vec<u8>,
    read_pos: usize,
    write_pos: usize,
}

impl ByteBuf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty buffer with `capacity` bytes preallocated. The capacity is a
    /// hint; `clear` keeps it, `resize` may reallocate past it.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            read_pos: 0,
            write_pos: 0,
        }
    }

    /// Copies `source` in full. The read cursor starts at 0 so the content can
    /// be decoded immediately; the write cursor starts at the end so appends
    /// continue after the copied bytes.
    pub fn from_bytes(source: &[u8]) -> Self {
        Self {
            data: source.to_vec(),
            read_pos: 0,
            write_pos: source.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    pub fn set_read_pos(&mut self, pos: usize) {
        self.read_pos = pos;
    }

    pub fn set_write_pos(&mut self, pos: usize) {
        self.write_pos = pos;
    }

    /// Bytes between the read cursor and the end of the content.
    pub fn bytes_remaining(&self) -> usize {
        self.data.len().saturating_sub(self.read_pos)
    }

    /// Drops all content and resets both cursors. Preallocated capacity is
    /// kept as a hint.
    pub fn clear(&mut self) {
        self.data.clear();
        self.read_pos = 0;
        self.write_pos = 0;
    }

    /// Sets the logical length to exactly `new_len`, truncating or
    /// zero-extending, and resets both cursors. Growth allocates through
    /// `try_reserve`, so exhaustion surfaces as [`CodecError::Alloc`] instead
    /// of aborting.
    pub fn resize(&mut self, new_len: usize) -> Result<(), CodecError> {
        if new_len > self.data.len() {
            self.data.try_reserve(new_len - self.data.len())?;
        }
        self.data.resize(new_len, 0);
        self.read_pos = 0;
        self.write_pos = 0;
        Ok(())
    }

    /// Deep copy with both cursors of the copy reset to 0.
    pub fn try_clone(&self) -> Result<Self, CodecError> {
        let mut data = Vec::new();
        data.try_reserve_exact(self.data.len())?;
        data.extend_from_slice(&self.data);
        Ok(Self {
            data,
            read_pos: 0,
            write_pos: 0,
        })
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let bytes = self.read_at::<N>(self.read_pos)?;
        self.read_pos += N;
        Ok(bytes)
    }

    fn read_at<const N: usize>(&self, index: usize) -> Result<[u8; N], CodecError> {
        let end = index.checked_add(N);
        match end {
            Some(end) if end <= self.data.len() => {
                let mut out = [0u8; N];
                out.copy_from_slice(&self.data[index..end]);
                Ok(out)
            }
            _ => Err(CodecError::Underrun {
                wanted: N,
                remaining: self.data.len().saturating_sub(index.min(self.data.len())),
            }),
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        let end = self.write_pos + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.write_pos..end].copy_from_slice(bytes);
        self.write_pos = end;
    }

    fn write_at(&mut self, bytes: &[u8], index: usize) {
        self.write_pos = index;
        self.write(bytes);
    }

    // Sequential reads. Each advances the read cursor by the value's width;
    // reading past the end reports an underrun rather than returning garbage.

    /// One byte at the read cursor without advancing it.
    pub fn peek(&self) -> Result<u8, CodecError> {
        Ok(self.read_at::<1>(self.read_pos)?[0])
    }

    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn get_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.take::<1>()?[0] as i8)
    }

    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub fn get_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    pub fn get_f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    pub fn get_f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    /// Fills `dst` from the read cursor and advances by `dst.len()`.
    pub fn get_bytes(&mut self, dst: &mut [u8]) -> Result<(), CodecError> {
        let remaining = self.bytes_remaining();
        if dst.len() > remaining {
            return Err(CodecError::Underrun {
                wanted: dst.len(),
                remaining,
            });
        }
        dst.copy_from_slice(&self.data[self.read_pos..self.read_pos + dst.len()]);
        self.read_pos += dst.len();
        Ok(())
    }

    // Indexed reads at an explicit offset. The read cursor is untouched.

    pub fn get_u8_at(&self, index: usize) -> Result<u8, CodecError> {
        Ok(self.read_at::<1>(index)?[0])
    }

    pub fn get_i8_at(&self, index: usize) -> Result<i8, CodecError> {
        Ok(self.read_at::<1>(index)?[0] as i8)
    }

    pub fn get_u16_at(&self, index: usize) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_at(index)?))
    }

    pub fn get_u32_at(&self, index: usize) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_at(index)?))
    }

    pub fn get_i32_at(&self, index: usize) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.read_at(index)?))
    }

    pub fn get_u64_at(&self, index: usize) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_at(index)?))
    }

    pub fn get_f32_at(&self, index: usize) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.read_at(index)?))
    }

    pub fn get_f64_at(&self, index: usize) -> Result<f64, CodecError> {
        Ok(f64::from_le_bytes(self.read_at(index)?))
    }

    /// Three little-endian f32 components in x, y, z order.
    pub fn get_vec3(&mut self) -> Result<Vec3, CodecError> {
        Ok(Vec3::new(self.get_f32()?, self.get_f32()?, self.get_f32()?))
    }

    pub fn get_ivec3(&mut self) -> Result<IVec3, CodecError> {
        Ok(IVec3::new(self.get_i32()?, self.get_i32()?, self.get_i32()?))
    }

    pub fn get_u8vec3(&mut self) -> Result<U8Vec3, CodecError> {
        Ok(U8Vec3::new(self.get_u8()?, self.get_u8()?, self.get_u8()?))
    }

    // Sequential writes. Each lands at the write cursor, grows the storage by
    // whatever runs past the end, and advances the cursor by the width.

    pub fn put_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    pub fn put_i8(&mut self, value: i8) {
        self.write(&[value as u8]);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.write(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.write(&value.to_le_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    pub fn put_f32(&mut self, value: f32) {
        self.write(&value.to_le_bytes());
    }

    pub fn put_f64(&mut self, value: f64) {
        self.write(&value.to_le_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.write(bytes);
    }

    // Indexed writes. Overwrite at the offset, zero-extending if the value
    // runs past the end; the write cursor lands after the written value.

    pub fn put_u8_at(&mut self, value: u8, index: usize) {
        self.write_at(&[value], index);
    }

    pub fn put_i8_at(&mut self, value: i8, index: usize) {
        self.write_at(&[value as u8], index);
    }

    pub fn put_u16_at(&mut self, value: u16, index: usize) {
        self.write_at(&value.to_le_bytes(), index);
    }

    pub fn put_u32_at(&mut self, value: u32, index: usize) {
        self.write_at(&value.to_le_bytes(), index);
    }

    pub fn put_i32_at(&mut self, value: i32, index: usize) {
        self.write_at(&value.to_le_bytes(), index);
    }

    pub fn put_u64_at(&mut self, value: u64, index: usize) {
        self.write_at(&value.to_le_bytes(), index);
    }

    pub fn put_f32_at(&mut self, value: f32, index: usize) {
        self.write_at(&value.to_le_bytes(), index);
    }

    pub fn put_f64_at(&mut self, value: f64, index: usize) {
        self.write_at(&value.to_le_bytes(), index);
    }

    /// Seek-then-append: repositions the write cursor to `index`, then writes
    /// `bytes` from there. Existing content under the write is overwritten in
    /// place and nothing is discarded — writing at offset 0 into a non-empty
    /// buffer keeps the buffer's length and continues growing from that offset
    /// once the write runs past the end. Mixing this with sequential writers
    /// therefore continues from `index + bytes.len()`, not from the old end.
    pub fn put_bytes_at(&mut self, bytes: &[u8], index: usize) {
        self.write_at(bytes, index);
    }

    /// Appends the full logical content of `other`, byte for byte.
    pub fn put_buf(&mut self, other: &ByteBuf) {
        self.write(other.as_slice());
    }

    /// Three f32 components in x, y, z order. No length prefix; the arity is
    /// fixed at three.
    pub fn put_vec3(&mut self, value: Vec3) {
        self.put_f32(value.x);
        self.put_f32(value.y);
        self.put_f32(value.z);
    }

    pub fn put_ivec3(&mut self, value: IVec3) {
        self.put_i32(value.x);
        self.put_i32(value.y);
        self.put_i32(value.z);
    }

    pub fn put_u8vec3(&mut self, value: U8Vec3) {
        self.put_u8(value.x);
        self.put_u8(value.y);
        self.put_u8(value.z);
    }

    /// Scans forward from `start` and overwrites each byte equal to `key` with
    /// `replacement`; stops after the first hit when `first_only`. Returns the
    /// number of bytes replaced.
    ///
    /// Legacy quirk, kept for wire compatibility: while searching for a
    /// non-zero key the scan halts at the first zero byte, treating it as an
    /// end-of-data marker even though the buffer is length-delimited.
    pub fn replace(&mut self, key: u8, replacement: u8, start: usize, first_only: bool) -> usize {
        let mut replaced = 0;
        for i in start..self.data.len() {
            let byte = self.data[i];
            if key != 0 && byte == 0 {
                break;
            }
            if byte == key {
                self.data[i] = replacement;
                replaced += 1;
                if first_only {
                    break;
                }
            }
        }
        replaced
    }
}

/// Content equality: same logical length, byte-for-byte identical. Cursor
/// positions are never consulted.
impl PartialEq for ByteBuf {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for ByteBuf {}
