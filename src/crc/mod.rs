//! The CRC32 variant checked by the RP2040 boot ROM before it jumps into boot2.
//!
//! This is CRC-32/MPEG-2: polynomial `0x04C11DB7`, register seeded with all
//! ones, no reflection and no final XOR. The register is serialized
//! little-endian when embedded in an image.


pub const POLYNOMIAL: u32 = 0x04C11DB7;
pub const INITIAL: u32 = 0xFFFFFFFF;

/// Shift one byte through the register, most significant bit first.
pub const fn add_byte(mut crc: u32, value: u8) -> u32
{
	let mut word = (value as u32) << 24;
	let mut bit = 0;
	while bit < 8
	{
		let top = (crc ^ word) & 0x80000000;
		crc <<= 1;
		if top != 0 {crc ^= POLYNOMIAL;}
		word <<= 1;
		bit += 1;
	}
	crc
}

pub fn checksum(data: &[u8]) -> u32
{
	data.iter().fold(INITIAL, |crc, &b| add_byte(crc, b))
}

/// Checksum of `data` in the byte order it is stored in a boot image.
pub fn crc32(data: &[u8]) -> [u8; 4]
{
	u32::to_le_bytes(checksum(data))
}
