use crate::uf2::{BLOCK_LEN, Info, PAYLOAD_SIZE, ReadError, Uf2Block};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Decoded
{
	pub addr: u32,
	pub info: Info,
	pub blocks: u32,
	/// Payload of every block in order, including the zero padding of a short final block.
	pub data: Vec<u8>,
}

impl Decoded
{
	pub fn family_id(&self) -> Option<u32>
	{
		match self.info
		{
			Info::BoardFamily(fid) => Some(fid),
			_ => None,
		}
	}
}

/// Iterates the blocks of a container without checking how they relate to each other.
pub fn blocks(src: &[u8]) -> impl Iterator<Item = Result<Uf2Block<'_>, ReadError>>
{
	src.chunks(BLOCK_LEN).map(Uf2Block::read)
}

/// Parses a container produced for a single contiguous flash image.
///
/// Blocks must be numbered from zero without gaps, agree on the block count and family, and target consecutive
/// [`PAYLOAD_SIZE`] byte pages. An empty container decodes to an empty image.
pub fn decode(src: &[u8]) -> Result<Decoded, DecodeError>
{
	if src.len() % BLOCK_LEN != 0
	{
		return Err(DecodeError::Length{len: src.len()});
	}
	let mut out = Decoded{addr: 0, info: Info::Unused, blocks: 0, data: Vec::with_capacity(src.len() / BLOCK_LEN * PAYLOAD_SIZE)};
	let mut prev: Option<Uf2Block<'_>> = None;
	for (i, block) in blocks(src).enumerate()
	{
		let idx = i as u32;
		let block = block.map_err(|err| DecodeError::BlockRead{idx, err})?;
		if block.index != idx
		{
			return Err(DecodeError::IndexJump{idx: block.index, expect: idx});
		}
		if block.no_flash()
		{
			return Err(DecodeError::NotFlash{idx});
		}
		match &prev
		{
			None =>
			{
				out.addr = block.addr;
				out.info = block.info;
				out.blocks = block.count;
			},
			Some(prev) =>
			{
				if block.count != out.blocks
				{
					return Err(DecodeError::CountMismatch{idx, expect: out.blocks, have: block.count});
				}
				if block.info != out.info
				{
					return Err(DecodeError::BadInfo{idx, expect: out.info, have: block.info});
				}
				if prev.addr.checked_add(PAYLOAD_SIZE as u32) != Some(block.addr)
				{
					return Err(DecodeError::AddressJump{idx, from: prev.addr, to: block.addr});
				}
			},
		}
		out.data.extend_from_slice(block.data);
		prev = Some(block);
	}
	if let Some(prev) = prev
	{
		if prev.index.checked_add(1) != Some(prev.count)
		{
			return Err(DecodeError::BlockCount{have: prev.index + 1, expect: prev.count});
		}
	}
	Ok(out)
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum DecodeError
{
	#[error("container length {len} is not a multiple of {}", BLOCK_LEN)]
	Length{len: usize},
	#[error("malformed uf2 block (index {idx})")]
	BlockRead{idx: u32, #[source] err: ReadError},
	#[error("index discontinuity at block {idx} (should be {expect})")]
	IndexJump{idx: u32, expect: u32},
	#[error("block {idx} is not meant for main flash")]
	NotFlash{idx: u32},
	#[error("block {idx} reports {have} blocks (expected {expect})")]
	CountMismatch{idx: u32, expect: u32, have: u32},
	#[error("incorrect info value at block {idx} (expected {expect}, got {have})")]
	BadInfo{idx: u32, expect: Info, have: Info},
	#[error("address discontinuity at block {idx} ({from:#010X} -> {to:#010X})")]
	AddressJump{idx: u32, from: u32, to: u32},
	#[error("wrong number of blocks (expected {expect}, got {have})")]
	BlockCount{expect: u32, have: u32},
}
