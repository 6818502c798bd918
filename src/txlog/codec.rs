//! Frame codec for spilled containers.
//!
//! store.bin frame: [page_key u64][len u32][crc32 u32] + payload
//! (LittleEndian). CRC is crc32 over the header without the crc field,
//! then the payload. Payload is the bincode encoding of the container.

use anyhow::{Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use crc32fast::Hasher as Crc32;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::consts::FRAME_HDR_SIZE;
use crate::errors::StoreError;
use crate::page::RecordPageContainer;

/// Encode one container as a full frame ready to append.
pub(crate) fn encode_frame<K, V>(
    page_key: u64,
    container: &RecordPageContainer<K, V>,
) -> Result<Vec<u8>>
where
    K: Ord + Serialize,
    V: Serialize,
{
    let payload =
        bincode::serialize(container).with_context(|| format!("encode container {page_key}"))?;

    let mut frame = vec![0u8; FRAME_HDR_SIZE + payload.len()];
    LittleEndian::write_u64(&mut frame[0..8], page_key);
    LittleEndian::write_u32(&mut frame[8..12], payload.len() as u32);
    frame[FRAME_HDR_SIZE..].copy_from_slice(&payload);

    let mut hasher = Crc32::new();
    hasher.update(&frame[0..12]);
    hasher.update(&payload);
    LittleEndian::write_u32(&mut frame[12..16], hasher.finalize());

    Ok(frame)
}

/// Parsed frame header fields.
pub(crate) struct FrameHeader {
    pub page_key: u64,
    pub len: u32,
    pub crc: u32,
}

pub(crate) fn read_frame_header(hdr: &[u8; FRAME_HDR_SIZE]) -> FrameHeader {
    FrameHeader {
        page_key: LittleEndian::read_u64(&hdr[0..8]),
        len: LittleEndian::read_u32(&hdr[8..12]),
        crc: LittleEndian::read_u32(&hdr[12..16]),
    }
}

/// Verify the CRC and decode the payload back into a container.
pub(crate) fn decode_frame<K, V>(
    hdr: &[u8; FRAME_HDR_SIZE],
    payload: &[u8],
) -> Result<RecordPageContainer<K, V>>
where
    K: Ord + DeserializeOwned,
    V: DeserializeOwned,
{
    let header = read_frame_header(hdr);

    let mut hasher = Crc32::new();
    hasher.update(&hdr[0..12]);
    hasher.update(payload);
    let actual = hasher.finalize();
    if actual != header.crc {
        return Err(StoreError::StorageIo(format!(
            "crc mismatch for page {}: stored {:#010x}, computed {:#010x}",
            header.page_key, header.crc, actual
        ))
        .into());
    }

    bincode::deserialize(payload)
        .with_context(|| format!("decode container {}", header.page_key))
}
