use super::*;
use super::read::{DecodeError, decode};
use super::write::{Uf2Writer, assemble, block_count, encode};

fn image(len: usize) -> Vec<u8>
{
	(0..len).map(|i| (i % 251) as u8 ^ 0x5A).collect()
}

fn field(block: &[u8], pos: usize) -> u32
{
	u32::from_le_bytes([block[pos], block[pos + 1], block[pos + 2], block[pos + 3]])
}

#[test]
fn block_layout()
{
	let block = encode_block(b"abc", 0x10000100, 1, 5, RP2040_FAMILY_ID).unwrap();
	assert_eq!(block.len(), BLOCK_LEN);
	assert_eq!(field(&block, 0), MAGIC_START0);
	assert_eq!(field(&block, 4), MAGIC_START1);
	assert_eq!(field(&block, 8), FLAG_FAMILY_ID_PRESENT);
	assert_eq!(field(&block, 12), 0x10000100);
	assert_eq!(field(&block, 16), 256);
	assert_eq!(field(&block, 20), 1);
	assert_eq!(field(&block, 24), 5);
	assert_eq!(field(&block, 28), 0xE48BFF56);
	assert_eq!(&block[32..35], b"abc");
	assert!(block[35..508].iter().all(|&b| b == 0));
	assert_eq!(field(&block, 508), MAGIC_END);
	assert_eq!(&block[508..], &[0x30, 0x6F, 0xB1, 0x0A]);
}

#[test]
fn empty_chunk()
{
	let block = encode_block(&[], FLASH_BASE, 0, 1, RP2040_FAMILY_ID).unwrap();
	assert_eq!(field(&block, 16), 256);
	assert!(block[DATA_START..DATA_END].iter().all(|&b| b == 0));
}

#[test]
fn oversized_chunk()
{
	let chunk = [0u8; PAYLOAD_SIZE + 1];
	assert!(matches!(encode_block(&chunk, 0, 0, 1, 0), Err(EncodeError::ChunkTooLarge{len: 257})));
}

#[test]
fn counts()
{
	assert_eq!(block_count(0), 0);
	assert_eq!(block_count(1), 1);
	assert_eq!(block_count(256), 1);
	assert_eq!(block_count(257), 2);
	assert_eq!(block_count(1024), 4);
	for len in [0, 1, 255, 256, 257, 511, 512, 513, 4000]
	{
		assert_eq!(assemble(&image(len), FLASH_BASE, RP2040_FAMILY_ID).unwrap().len(), block_count(len));
	}
}

#[test]
fn empty_image()
{
	assert!(assemble(&[], FLASH_BASE, RP2040_FAMILY_ID).unwrap().is_empty());
	assert!(encode(&[], FLASH_BASE, RP2040_FAMILY_ID).unwrap().is_empty());
	let decoded = decode(&[]).unwrap();
	assert_eq!(decoded.blocks, 0);
	assert!(decoded.data.is_empty());
}

#[test]
fn single_page()
{
	let data = image(256);
	let blocks = assemble(&data, FLASH_BASE, RP2040_FAMILY_ID).unwrap();
	assert_eq!(blocks.len(), 1);
	let block = &blocks[0];
	assert_eq!(field(block, 20), 0);
	assert_eq!(field(block, 24), 1);
	assert_eq!(field(block, 12), FLASH_BASE);
	assert_eq!(&block[DATA_START..DATA_START + 256], &data[..]);
	assert_eq!(block[DATA_START + 256..DATA_END].len(), 220);
	assert!(block[DATA_START + 256..DATA_END].iter().all(|&b| b == 0));
}

#[test]
fn short_final_block()
{
	let data = image(300);
	let blocks = assemble(&data, FLASH_BASE, RP2040_FAMILY_ID).unwrap();
	assert_eq!(blocks.len(), 2);
	assert_eq!(&blocks[0][DATA_START..DATA_START + 256], &data[..256]);
	assert_eq!(&blocks[1][DATA_START..DATA_START + 44], &data[256..]);
	assert_eq!(blocks[1][DATA_START + 44..DATA_END].len(), 432);
	assert!(blocks[1][DATA_START + 44..DATA_END].iter().all(|&b| b == 0));
	// size field is not reduced for the partial block
	assert_eq!(field(&blocks[0], 16), 256);
	assert_eq!(field(&blocks[1], 16), 256);
	assert_eq!(field(&blocks[1], 12), FLASH_BASE + 256);
}

#[test]
fn constant_fields()
{
	let blocks = assemble(&image(2000), 0x20000000, RP2040_FAMILY_ID).unwrap();
	assert_eq!(blocks.len(), 8);
	for (i, block) in blocks.iter().enumerate()
	{
		assert_eq!(field(block, 0), MAGIC_START0);
		assert_eq!(field(block, 4), MAGIC_START1);
		assert_eq!(field(block, 8), FLAG_FAMILY_ID_PRESENT);
		assert_eq!(field(block, 28), RP2040_FAMILY_ID);
		assert_eq!(field(block, 508), MAGIC_END);
		assert_eq!(field(block, 20), i as u32);
		assert_eq!(field(block, 24), 8);
		assert_eq!(field(block, 12), 0x20000000 + i as u32 * 256);
	}
}

#[test]
fn round_trip()
{
	for len in [1, 100, 256, 300, 512, 1000, 4097]
	{
		let data = image(len);
		let container = encode(&data, FLASH_BASE, RP2040_FAMILY_ID).unwrap();
		assert_eq!(container.len(), block_count(len) * BLOCK_LEN);
		let decoded = decode(&container).unwrap();
		assert_eq!(decoded.addr, FLASH_BASE);
		assert_eq!(decoded.family_id(), Some(RP2040_FAMILY_ID));
		assert_eq!(decoded.blocks as usize, block_count(len));
		assert_eq!(decoded.data.len(), block_count(len) * PAYLOAD_SIZE);
		assert_eq!(&decoded.data[..len], &data[..]);
	}
}

#[test]
fn writer_matches_assemble()
{
	let data = image(777);
	let mut dst = Vec::new();
	let mut writer = Uf2Writer::new(&mut dst, Some(RP2040_FAMILY_ID));
	assert_eq!(writer.write_image(FLASH_BASE, &data).unwrap(), 4);
	assert_eq!(writer.blocks(), 4);
	writer.into_inner().unwrap();
	assert_eq!(dst, assemble(&data, FLASH_BASE, RP2040_FAMILY_ID).unwrap().concat());
}

#[test]
fn writer_without_family()
{
	let mut dst = Vec::new();
	Uf2Writer::new(&mut dst, None).write_image(0, &image(10)).unwrap();
	assert_eq!(field(&dst, 8), 0);
	assert_eq!(field(&dst, 28), 0);
	assert_eq!(decode(&dst).unwrap().info, Info::Unused);
}

#[test]
fn address_overflow()
{
	// the last page of the address space fits exactly
	assert_eq!(assemble(&image(256), 0xFFFFFF00, 0).unwrap().len(), 1);
	assert!(matches!(assemble(&image(257), 0xFFFFFF00, 0), Err(EncodeError::AddressOverflow{addr: 0xFFFFFF00, need: 512})));
	// a short final chunk still claims a whole page
	assert!(matches!(assemble(&image(1), 0xFFFFFFF0, 0), Err(EncodeError::AddressOverflow{..})));
	let mut dst = Vec::new();
	assert!(Uf2Writer::new(&mut dst, None).write_image(0xFFFFFF00, &image(300)).is_err());
	assert!(dst.is_empty());
}

#[test]
fn read_rejects_garbage()
{
	assert!(matches!(Uf2Block::read(&[0u8; 100]), Err(ReadError::Underflow{need: 512, have: 100})));
	assert!(matches!(Uf2Block::read(&[0u8; BLOCK_LEN]), Err(ReadError::Magic{..})));
	let mut block = encode_block(b"x", 0, 0, 1, 0).unwrap();
	block[16..20].copy_from_slice(&u32::to_le_bytes(477));
	assert!(matches!(Uf2Block::read(&block), Err(ReadError::DataSize{len: 477})));
}

#[test]
fn decode_checks_sequence()
{
	let mut container = encode(&image(1024), FLASH_BASE, RP2040_FAMILY_ID).unwrap();
	assert!(matches!(decode(&container[..1000]), Err(DecodeError::Length{len: 1000})));
	assert!(matches!(decode(&container[..1024]), Err(DecodeError::BlockCount{expect: 4, have: 2})));
	
	let mut swapped = container.clone();
	swapped[BLOCK_LEN..].rotate_left(BLOCK_LEN);
	assert!(matches!(decode(&swapped), Err(DecodeError::IndexJump{idx: 2, expect: 1})));
	
	let pos = 2 * BLOCK_LEN + 12;
	container[pos..pos + 4].copy_from_slice(&u32::to_le_bytes(FLASH_BASE));
	assert!(matches!(decode(&container), Err(DecodeError::AddressJump{idx: 2, ..})));
}
