//! The UF2 container format consumed by USB mass-storage bootloaders.
//!
//! A container is a flat sequence of 512 byte blocks, each carrying its own target address and position so the
//! bootloader can flash them as they arrive.

use core::fmt;

pub mod read;
pub mod write;

#[cfg(test)]
mod test;

pub const BLOCK_LEN: usize = 512;
pub const MAGIC_START0: u32 = 0x0A324655;
pub const MAGIC_START1: u32 = 0x9E5D5157;
pub const MAGIC_END: u32 = 0x0AB16F30;
pub const FLAG_NOT_MAIN_FLASH: u32 = 0x00000001;
pub const FLAG_FILE_CONTAINER: u32 = 0x00001000;
pub const FLAG_FAMILY_ID_PRESENT: u32 = 0x00002000;
pub const FLAG_MD5_PRESENT: u32 = 0x00004000;
pub const RP2040_FAMILY_ID: u32 = 0xE48BFF56;
/// Start of the execute-in-place flash window.
pub const FLASH_BASE: u32 = 0x10000000;
/// Payload bytes per block, and the value written to every block's size field.
pub const PAYLOAD_SIZE: usize = 256;
pub const DATA_START: usize = 0x20;
pub const DATA_END: usize = BLOCK_LEN - 4;
pub const DATA_LEN: usize = DATA_END - DATA_START;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Info
{
	Unused,
	FileSize(u32),
	BoardFamily(u32),
}

impl Info
{
	fn from_raw(flags: u32, value: u32) -> Self
	{
		if flags & FLAG_FAMILY_ID_PRESENT != 0 {Info::BoardFamily(value)}
		else if flags & FLAG_FILE_CONTAINER != 0 {Info::FileSize(value)}
		else {Info::Unused}
	}
	
	fn to_raw(self) -> (u32, u32)
	{
		match self
		{
			Info::Unused => (0, 0),
			Info::FileSize(sz) => (FLAG_FILE_CONTAINER, sz),
			Info::BoardFamily(fid) => (FLAG_FAMILY_ID_PRESENT, fid),
		}
	}
}

impl fmt::Display for Info
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		match self
		{
			Info::Unused => f.write_str("none"),
			Info::FileSize(sz) => write!(f, "file size {sz}"),
			Info::BoardFamily(fid) => write!(f, "family {fid:#010X}"),
		}
	}
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum EncodeError
{
	#[error("chunk too large (max {}, got {len})", PAYLOAD_SIZE)]
	ChunkTooLarge{len: usize},
	#[error("address overflow (need {need} bytes from {addr:#010X})")]
	AddressOverflow{addr: u32, need: usize},
	#[error("too many blocks ({count})")]
	BlockCount{count: usize},
}

/// Builds a single block targeting flash with the given family ID.
///
/// The size field always reads [`PAYLOAD_SIZE`], even when `chunk` is shorter; the rest of the data region is zero
/// filled and a reader has to know the image length to tell padding from payload.
pub fn encode_block(chunk: &[u8], addr: u32, index: u32, count: u32, family_id: u32) -> Result<[u8; BLOCK_LEN], EncodeError>
{
	let mut dst = [0u8; BLOCK_LEN];
	write_block(&mut dst, chunk, addr, index, count, Info::BoardFamily(family_id))?;
	Ok(dst)
}

pub(crate) fn write_block(dst: &mut [u8; BLOCK_LEN], chunk: &[u8], addr: u32, index: u32, count: u32, info: Info) -> Result<(), EncodeError>
{
	if chunk.len() > PAYLOAD_SIZE
	{
		return Err(EncodeError::ChunkTooLarge{len: chunk.len()});
	}
	let (flags, info_val) = info.to_raw();
	dst[0x000..0x004].copy_from_slice(&u32::to_le_bytes(MAGIC_START0));
	dst[0x004..0x008].copy_from_slice(&u32::to_le_bytes(MAGIC_START1));
	dst[0x008..0x00C].copy_from_slice(&u32::to_le_bytes(flags));
	dst[0x00C..0x010].copy_from_slice(&u32::to_le_bytes(addr));
	dst[0x010..0x014].copy_from_slice(&u32::to_le_bytes(PAYLOAD_SIZE as u32));
	dst[0x014..0x018].copy_from_slice(&u32::to_le_bytes(index));
	dst[0x018..0x01C].copy_from_slice(&u32::to_le_bytes(count));
	dst[0x01C..DATA_START].copy_from_slice(&u32::to_le_bytes(info_val));
	let data_end = DATA_START + chunk.len();
	dst[DATA_START..data_end].copy_from_slice(chunk);
	dst[data_end..DATA_END].fill(0);
	dst[DATA_END..BLOCK_LEN].copy_from_slice(&u32::to_le_bytes(MAGIC_END));
	Ok(())
}

/// Borrowed view of a parsed block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Uf2Block<'l>
{
	pub flags: u32,
	pub addr: u32,
	pub index: u32,
	pub count: u32,
	pub info: Info,
	pub data: &'l [u8],
}

fn word(src: &[u8], pos: usize) -> u32
{
	let mut tmp = [0u8; 4];
	tmp.copy_from_slice(&src[pos..pos + 4]);
	u32::from_le_bytes(tmp)
}

impl<'l> Uf2Block<'l>
{
	pub fn read(src: &'l [u8]) -> Result<Self, ReadError>
	{
		if src.len() < BLOCK_LEN
		{
			return Err(ReadError::Underflow{need: BLOCK_LEN, have: src.len()});
		}
		let start0 = word(src, 0x000);
		let start1 = word(src, 0x004);
		let end = word(src, DATA_END);
		if start0 != MAGIC_START0 || start1 != MAGIC_START1 || end != MAGIC_END
		{
			return Err(ReadError::Magic{start0, start1, end});
		}
		let flags = word(src, 0x008);
		let len = word(src, 0x010);
		if len as usize > DATA_LEN
		{
			return Err(ReadError::DataSize{len});
		}
		Ok(Self
		{
			flags,
			addr: word(src, 0x00C),
			index: word(src, 0x014),
			count: word(src, 0x018),
			info: Info::from_raw(flags, word(src, 0x01C)),
			data: &src[DATA_START..DATA_START + len as usize],
		})
	}
	
	pub fn no_flash(&self) -> bool
	{
		self.flags & FLAG_NOT_MAIN_FLASH != 0
	}
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum ReadError
{
	#[error("block underflow (need {need}, got {have})")]
	Underflow{need: usize, have: usize},
	#[error("bad magic ({start0:#010X}, {start1:#010X}, {end:#010X})")]
	Magic{start0: u32, start1: u32, end: u32},
	#[error("payload size {len} exceeds data region")]
	DataSize{len: u32},
}
