//! Finishing steps for RP2040 firmware images: boot2 checksum patching and UF2 packaging.

pub mod boot2;
pub mod crc;
pub mod output;
pub mod uf2;
