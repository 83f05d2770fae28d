//! 16-bit PCM WAV encoding with a canonical 44-byte header.
//!
//! Float samples are clamped to [-1, 1] and scaled asymmetrically:
//! negatives by 32768, the rest by 32767, truncating toward zero.
//! Channels are interleaved frame by frame.

use std::io::{self, Write};

use bf_engine::Frame;

use crate::FormatError;

/// Size of the canonical header.
pub const HEADER_LEN: usize = 44;

/// Convert one float sample to signed 16-bit.
pub fn to_pcm16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Write interleaved `samples` with `channels` channels as a WAV stream.
pub fn write_wav(
    w: &mut impl Write,
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
) -> io::Result<()> {
    if !(1..=2).contains(&channels) {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "channels must be 1 or 2"));
    }
    let whole = samples.len() - samples.len() % channels as usize;
    let data_size = u32::try_from(whole * 2)
        .ok()
        .filter(|size| *size <= u32::MAX - 36)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "audio too long for WAV"))?;

    w.write_all(&WavHeader::pcm16(channels, sample_rate, data_size).to_bytes())?;
    let pcm: Vec<u8> = samples[..whole].iter().flat_map(|&s| to_pcm16(s).to_le_bytes()).collect();
    w.write_all(&pcm)
}

/// Encode interleaved samples to WAV bytes.
pub fn encode_wav(samples: &[f32], channels: u16, sample_rate: u32) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEADER_LEN + samples.len() * 2);
    write_wav(&mut buf, samples, channels, sample_rate)?;
    Ok(buf)
}

/// Interleave stereo frames for `channels` output; mono takes the average.
pub fn interleave(frames: &[Frame], channels: u16) -> Vec<f32> {
    match channels {
        1 => frames.iter().map(|f| f.to_mono()).collect(),
        _ => frames.iter().flat_map(|f| [f.left, f.right]).collect(),
    }
}

/// Encode stereo frames as a 1- or 2-channel WAV.
pub fn frames_to_wav(frames: &[Frame], channels: u16, sample_rate: u32) -> io::Result<Vec<u8>> {
    encode_wav(&interleave(frames, channels), channels, sample_rate)
}

// --- Reading ---

/// Fields of a canonical PCM header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Header for 16-bit integer PCM carrying `data_size` bytes of samples.
    pub fn pcm16(num_channels: u16, sample_rate: u32, data_size: u32) -> Self {
        let block_align = num_channels * 2;
        Self {
            chunk_size: 36 + data_size,
            audio_format: 1,
            num_channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: 16,
            data_size,
        }
    }

    /// Lay the header out in canonical order: RIFF, a 16-byte fmt chunk,
    /// then the data chunk preamble.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&16u32.to_le_bytes());
        out[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        out[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }
}

/// Parse the canonical 44-byte header at the start of `data`.
pub fn parse_header(data: &[u8]) -> Result<WavHeader, FormatError> {
    if data.len() < HEADER_LEN {
        return Err(FormatError::UnexpectedEof);
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" || &data[12..16] != b"fmt " {
        return Err(FormatError::InvalidHeader);
    }
    if &data[36..40] != b"data" {
        return Err(FormatError::Unsupported("non-canonical chunk layout".into()));
    }
    Ok(WavHeader {
        chunk_size: read_u32_le(data, 4),
        audio_format: read_u16_le(data, 20),
        num_channels: read_u16_le(data, 22),
        sample_rate: read_u32_le(data, 24),
        byte_rate: read_u32_le(data, 28),
        block_align: read_u16_le(data, 32),
        bits_per_sample: read_u16_le(data, 34),
        data_size: read_u32_le(data, 40),
    })
}

fn read_u16_le(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn read_u32_le(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}
