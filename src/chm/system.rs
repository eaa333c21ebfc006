//! `/#SYSTEM` stream parsing.
//!
//! The system stream opens with a 4-byte version word followed by a flat
//! sequence of `(code: u16, length: u16, data)` records. Only three codes
//! matter here: 2 (default topic, the home page), 3 (archive title) and 4
//! (a locale block whose first four bytes are the Windows LCID). Everything
//! else is skipped.
//!
//! Text fields stay as raw bytes: the encoding to decode them with is only
//! known once the LCID record has been seen, so the caller decodes after
//! the whole stream is walked.

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info, trace};

use super::error::{ChmError, Result};
use super::utils;

const CODE_DEFAULT_TOPIC: u16 = 2;
const CODE_TITLE: u16 = 3;
const CODE_LOCALE: u16 = 4;

/// Raw metadata gathered from the system stream.
#[derive(Debug, Default)]
pub(crate) struct SystemInfo {
    pub title: Option<Vec<u8>>,
    pub home_url: Option<Vec<u8>>,
    pub lcid: Option<u32>,
}

/// Walk the system stream records.
///
/// A stream shorter than its version word cannot be a system stream at all
/// and fails the load; a record cut off mid-way further down stops the walk
/// with whatever was gathered, since real-world archives are frequently
/// truncated there and still usable.
pub(crate) fn parse(data: &[u8]) -> Result<SystemInfo> {
    info!("Parsing #SYSTEM stream ({} bytes)", data.len());

    let mut reader = data;
    let version = utils::read_u32(&mut reader, "#SYSTEM")
        .map_err(|_| ChmError::LoadFailed("#SYSTEM stream is too short".to_string()))?;
    trace!("#SYSTEM version word: {}", version);

    let mut info = SystemInfo::default();
    while reader.len() >= 4 {
        let code = utils::read_u16(&mut reader, "#SYSTEM")?;
        let length = utils::read_u16(&mut reader, "#SYSTEM")? as usize;
        let Ok(payload) = utils::take(&mut reader, length, "#SYSTEM") else {
            debug!("#SYSTEM record {} truncated, stopping the walk", code);
            break;
        };
        match code {
            CODE_DEFAULT_TOPIC => {
                info.home_url = Some(trim_nul(payload).to_vec());
            }
            CODE_TITLE => {
                info.title = Some(trim_nul(payload).to_vec());
            }
            CODE_LOCALE if payload.len() >= 4 => {
                info.lcid = Some(LittleEndian::read_u32(&payload[..4]));
            }
            _ => trace!("skipping #SYSTEM record code {} ({} bytes)", code, length),
        }
    }

    debug!(
        "#SYSTEM parsed: title={}, home={}, lcid={:?}",
        info.title.is_some(),
        info.home_url.is_some(),
        info.lcid
    );
    Ok(info)
}

/// System stream strings carry a trailing NUL.
fn trim_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
