use std::io::{self, Write};

use log::debug;

use crate::uf2::{BLOCK_LEN, EncodeError, Info, PAYLOAD_SIZE, write_block};

/// Number of blocks needed for `len` bytes of payload.
pub fn block_count(len: usize) -> usize
{
	len.div_ceil(PAYLOAD_SIZE)
}

fn check_space(addr: u32, len: usize) -> Result<u32, EncodeError>
{
	let count = block_count(len);
	if count == 0 {return Ok(0);}
	// whole blocks are reserved even when the final chunk is short
	let need = count.checked_mul(PAYLOAD_SIZE).ok_or(EncodeError::BlockCount{count})?;
	let have = u64::from(u32::MAX - addr) + 1;
	if need as u64 > have
	{
		return Err(EncodeError::AddressOverflow{addr, need});
	}
	u32::try_from(count).map_err(|_| EncodeError::BlockCount{count})
}

/// Streams a flat image into any writer as consecutive UF2 blocks.
pub struct Uf2Writer<W: Write>
{
	dst: W,
	info: Info,
	blocks: usize,
}

impl<W: Write> Uf2Writer<W>
{
	pub fn new(dst: W, family_id: Option<u32>) -> Self
	{
		let info = match family_id
		{
			None => Info::Unused,
			Some(fid) => Info::BoardFamily(fid),
		};
		Self{dst, info, blocks: 0}
	}
	
	/// Splits `data` into chunks of [`PAYLOAD_SIZE`] bytes and writes one block per chunk, numbered from zero and
	/// addressed from `addr` upwards. Every block reserves a full page, so a short final chunk still needs
	/// [`PAYLOAD_SIZE`] bytes of address space below `u32::MAX`. The address range is validated before anything is
	/// written. Returns the number of blocks written, which is zero for an empty image.
	pub fn write_image(&mut self, addr: u32, data: &[u8]) -> Result<usize, WriteError>
	{
		let count = check_space(addr, data.len())?;
		let mut block = [0u8; BLOCK_LEN];
		for (i, chunk) in data.chunks(PAYLOAD_SIZE).enumerate()
		{
			// `check_space` guarantees neither of these overflow
			let index = i as u32;
			let target = addr + index * PAYLOAD_SIZE as u32;
			write_block(&mut block, chunk, target, index, count, self.info)?;
			self.dst.write_all(&block)?;
			self.blocks += 1;
		}
		debug!("wrote {count} blocks for {} bytes at {addr:#010X}", data.len());
		Ok(count as usize)
	}
	
	pub fn blocks(&self) -> usize
	{
		self.blocks
	}
	
	pub fn into_inner(mut self) -> io::Result<W>
	{
		self.dst.flush()?;
		Ok(self.dst)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError
{
	#[error(transparent)]
	Encode(#[from] EncodeError),
	#[error("failed to write uf2 block")]
	Io(#[from] io::Error),
}

/// Encodes the whole of `data` as individual blocks, in flash order.
///
/// Like [`Uf2Writer::write_image`], the final block claims a whole [`PAYLOAD_SIZE`] page even when the last chunk is
/// shorter, so `addr + block_count(data.len()) * PAYLOAD_SIZE` must not exceed the 32-bit address space.
pub fn assemble(data: &[u8], addr: u32, family_id: u32) -> Result<Vec<[u8; BLOCK_LEN]>, EncodeError>
{
	let count = check_space(addr, data.len())?;
	let info = Info::BoardFamily(family_id);
	let mut blocks = Vec::with_capacity(count as usize);
	for (i, chunk) in data.chunks(PAYLOAD_SIZE).enumerate()
	{
		let index = i as u32;
		let mut block = [0u8; BLOCK_LEN];
		write_block(&mut block, chunk, addr + index * PAYLOAD_SIZE as u32, index, count, info)?;
		blocks.push(block);
	}
	Ok(blocks)
}

/// Same as [`assemble`] but returns the container as one contiguous buffer.
pub fn encode(data: &[u8], addr: u32, family_id: u32) -> Result<Vec<u8>, EncodeError>
{
	let mut dst = Vec::with_capacity(block_count(data.len()) * BLOCK_LEN);
	let result = Uf2Writer::new(&mut dst, Some(family_id)).write_image(addr, data);
	match result
	{
		Ok(..) => Ok(dst),
		Err(WriteError::Encode(e)) => Err(e),
		// writing into a `Vec` cannot fail
		Err(WriteError::Io(e)) => unreachable!("{e}"),
	}
}
