use educe::Educe;
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use std::io::{Read, Write};
use std::{cell::RefCell, convert::TryFrom, fmt};

thread_local! {
    static ZSTD_CCTX: RefCell<zstd_safe::CCtx<'static>> = RefCell::new(zstd_safe::CCtx::create());
    static ZSTD_DCTX: RefCell<zstd_safe::DCtx<'static>> = RefCell::new(zstd_safe::DCtx::create());
}

/// Compression level used for every dictionary-seeded compression.
pub const DICT_COMPRESSION_LEVEL: i32 = 19;

/// Default zlib level for plain deflate compression.
pub const DEFAULT_DEFLATE_LEVEL: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionError {
    ExceededSize { max: usize, actual: usize },
    ZstdInner(usize),
    Deflate(String),
    Parsing(&'static str),
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::ExceededSize { max, actual } => write!(
                f,
                "Decompressed size is at least {} bytes, larger than max of {}",
                actual, max
            ),
            CompressionError::ZstdInner(v) => write!(
                f,
                "zstd failure, code {} ({})",
                v,
                zstd_safe::get_error_name(*v)
            ),
            CompressionError::Deflate(s) => write!(f, "deflate failure: {}", s),
            CompressionError::Parsing(s) => f.write_str(s),
        }
    }
}

impl std::error::Error for CompressionError {}

impl From<zstd_safe::ErrorCode> for CompressionError {
    fn from(value: zstd_safe::ErrorCode) -> Self {
        CompressionError::ZstdInner(value)
    }
}

/// The compression strategy of a container. Which one applies is decided by the version profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Compress {
    /// zlib-framed deflate at the given level (0-9).
    Deflate {
        #[serde(default = "default_deflate_level")]
        level: u8,
    },
    /// zstd seeded with a shared dictionary, always at [`DICT_COMPRESSION_LEVEL`].
    Dict(Dictionary),
}

fn default_deflate_level() -> u8 {
    DEFAULT_DEFLATE_LEVEL
}

impl Compress {
    pub fn new_deflate(level: u8) -> Self {
        Compress::Deflate { level }
    }

    /// Create a dictionary-seeded setting. Fails if zstd won't accept the dictionary.
    pub fn new_dict(dict: Vec<u8>) -> Option<Self> {
        Some(Compress::Dict(Dictionary::new(dict)?))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Compress::Deflate { .. } => "deflate",
            Compress::Dict(_) => "zstd-dict",
        }
    }

    pub(crate) fn compress(&self, src: &[u8]) -> Result<Vec<u8>, CompressionError> {
        match self {
            Compress::Deflate { level } => deflate_compress(src, *level),
            Compress::Dict(dict) => zstd_compress(src, &dict.cdict),
        }
    }

    /// Decompress `src`, failing if the result would be larger than `max_size`.
    pub(crate) fn decompress(
        &self,
        src: &[u8],
        max_size: usize,
    ) -> Result<Vec<u8>, CompressionError> {
        match self {
            Compress::Deflate { .. } => deflate_decompress(src, max_size),
            Compress::Dict(dict) => zstd_decompress(src, &dict.ddict, max_size),
        }
    }
}

impl std::default::Default for Compress {
    fn default() -> Self {
        Compress::Deflate {
            level: DEFAULT_DEFLATE_LEVEL,
        }
    }
}

/// A zstd dictionary blob, along with the prepared compression & decompression dictionaries.
///
/// Any byte blob of useful content works as a dictionary; trained dictionaries (see
/// [`train_dictionary`]) usually do better.
#[derive(Educe, Serialize, Deserialize)]
#[educe(PartialEq)]
#[serde(try_from = "DictionarySerde", into = "DictionarySerde")]
pub struct Dictionary {
    dict: Vec<u8>,
    #[educe(PartialEq(ignore))]
    cdict: zstd_safe::CDict<'static>,
    #[educe(PartialEq(ignore))]
    ddict: zstd_safe::DDict<'static>,
}

impl Dictionary {
    pub fn new(dict: Vec<u8>) -> Option<Self> {
        let cdict = zstd_safe::CDict::try_create(&dict, DICT_COMPRESSION_LEVEL)?;
        let ddict = zstd_safe::DDict::try_create(&dict)?;
        Some(Self { dict, cdict, ddict })
    }

    /// The raw dictionary blob.
    pub fn as_bytes(&self) -> &[u8] {
        &self.dict
    }
}

impl Clone for Dictionary {
    fn clone(&self) -> Self {
        Self {
            dict: self.dict.clone(),
            cdict: zstd_safe::CDict::create(&self.dict, DICT_COMPRESSION_LEVEL),
            ddict: zstd_safe::DDict::create(&self.dict),
        }
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Dictionary")
            .field("level", &DICT_COMPRESSION_LEVEL)
            .field("len", &self.dict.len())
            .finish()
    }
}

// Struct used solely for serialization/deserialization
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DictionarySerde {
    dict: ByteBuf,
}

impl TryFrom<DictionarySerde> for Dictionary {
    type Error = &'static str;
    fn try_from(value: DictionarySerde) -> Result<Self, Self::Error> {
        Dictionary::new(value.dict.into_vec()).ok_or("Invalid ZSTD dictionary")
    }
}

impl From<Dictionary> for DictionarySerde {
    fn from(value: Dictionary) -> Self {
        Self {
            dict: ByteBuf::from(value.dict),
        }
    }
}

/// Attempt to train a zstd dictionary from a set of sample payloads.
pub fn train_dictionary(
    target_len: usize,
    samples: &[u8],
    sample_lens: &[usize],
) -> Result<Dictionary, CompressionError> {
    let mut dict: Vec<u8> = Vec::with_capacity(target_len);
    // SAFETY:
    // zstd only writes into the spare capacity, and reports how much of it was filled.
    unsafe {
        let spare = dict.spare_capacity_mut();
        let target = core::slice::from_raw_parts_mut(spare.as_mut_ptr() as *mut u8, spare.len());
        let dict_len = zstd_safe::train_from_buffer(target, samples, sample_lens)?;
        dict.set_len(dict_len);
    }
    Dictionary::new(dict).ok_or(CompressionError::Parsing(
        "Couldn't parse completed dictionary",
    ))
}

fn deflate_compress(input: &[u8], level: u8) -> Result<Vec<u8>, CompressionError> {
    let mut enc = ZlibEncoder::new(
        Vec::with_capacity(input.len()),
        Compression::new(level as u32),
    );
    enc.write_all(input)
        .map_err(|e| CompressionError::Deflate(e.to_string()))?;
    enc.finish()
        .map_err(|e| CompressionError::Deflate(e.to_string()))
}

fn deflate_decompress(input: &[u8], max_size: usize) -> Result<Vec<u8>, CompressionError> {
    let mut output = Vec::new();
    // Read one byte past the limit so oversized output is detectable
    ZlibDecoder::new(input)
        .take(max_size as u64 + 1)
        .read_to_end(&mut output)
        .map_err(|e| CompressionError::Deflate(e.to_string()))?;
    if output.len() > max_size {
        return Err(CompressionError::ExceededSize {
            max: max_size,
            actual: output.len(),
        });
    }
    Ok(output)
}

fn zstd_compress(
    input: &[u8],
    dict: &zstd_safe::CDict<'static>,
) -> Result<Vec<u8>, CompressionError> {
    use zstd_safe::*;
    ZSTD_CCTX.with_borrow_mut(|ctx| {
        // Single frame that records its content size, so decompression can be bounded up front.
        ctx.reset(ResetDirective::SessionAndParameters)?;
        ctx.ref_cdict(dict)?;
        ctx.set_parameter(CParameter::ChecksumFlag(false))?;
        ctx.set_parameter(CParameter::ContentSizeFlag(true))?;
        ctx.set_pledged_src_size(Some(input.len() as u64))?;

        let mut output: Vec<u8> = Vec::with_capacity(compress_bound(input.len()));
        // SAFETY:
        // We're just passing the spare capacity directly to zstd to fill out,
        // then adjusting the vec up by how much zstd filled in.
        unsafe {
            let spare = output.spare_capacity_mut();
            let out_buffer =
                core::slice::from_raw_parts_mut(spare.as_mut_ptr() as *mut u8, spare.len());
            let used_len = ctx.compress2(out_buffer, input)?;
            output.set_len(used_len);
        }
        Ok(output)
    })
}

fn zstd_decompress(
    input: &[u8],
    dict: &zstd_safe::DDict<'static>,
    max_size: usize,
) -> Result<Vec<u8>, CompressionError> {
    use zstd_safe::*;

    let out_size = match get_frame_content_size(input) {
        Ok(Some(size)) => size,
        Ok(None) => return zstd_decompress_unsized(input, dict, max_size),
        Err(_) => return Err(CompressionError::Parsing("Not a zstd frame")),
    };
    if out_size > max_size as u64 {
        return Err(CompressionError::ExceededSize {
            max: max_size,
            actual: usize::try_from(out_size).unwrap_or(usize::MAX),
        });
    }
    let out_size = out_size as usize;

    ZSTD_DCTX.with_borrow_mut(|dtx| {
        dtx.reset(ResetDirective::SessionAndParameters)?;
        dtx.ref_ddict(dict)?;

        let mut output: Vec<u8> = Vec::with_capacity(out_size);
        // SAFETY:
        // We're just passing the spare capacity directly to zstd to fill out,
        // then adjusting the vec up by how much zstd filled in.
        let used_len = unsafe {
            let spare = output.spare_capacity_mut();
            let out_buffer =
                core::slice::from_raw_parts_mut(spare.as_mut_ptr() as *mut u8, spare.len());
            let used_len = dtx.decompress(out_buffer, input)?;
            output.set_len(used_len);
            used_len
        };
        if used_len != out_size {
            return Err(CompressionError::Parsing(
                "Decompressed size doesn't match promised size",
            ));
        }
        Ok(output)
    })
}

// Frames that leave out their content size are streamed into a buffer one byte larger than the
// limit, so an oversized frame is caught without decoding all of it.
fn zstd_decompress_unsized(
    input: &[u8],
    dict: &zstd_safe::DDict<'static>,
    max_size: usize,
) -> Result<Vec<u8>, CompressionError> {
    use zstd_safe::*;

    let mut output = vec![0u8; max_size + 1];
    let used_len = ZSTD_DCTX.with_borrow_mut(|dtx| -> Result<usize, CompressionError> {
        dtx.reset(ResetDirective::SessionAndParameters)?;
        dtx.ref_ddict(dict)?;

        let mut in_buffer = InBuffer::around(input);
        let mut out_buffer = OutBuffer::around(&mut output[..]);
        loop {
            let remaining = dtx.decompress_stream(&mut out_buffer, &mut in_buffer)?;
            if remaining == 0 {
                break;
            }
            if out_buffer.pos() == out_buffer.capacity() {
                return Err(CompressionError::ExceededSize {
                    max: max_size,
                    actual: out_buffer.pos(),
                });
            }
            if in_buffer.pos() == input.len() {
                return Err(CompressionError::Parsing("zstd frame is truncated"));
            }
        }
        Ok(out_buffer.pos())
    })?;
    if used_len > max_size {
        return Err(CompressionError::ExceededSize {
            max: max_size,
            actual: used_len,
        });
    }
    output.truncate(used_len);
    Ok(output)
}

#[cfg(test)]
mod test {
    use super::*;

    // Raw-content dictionary: zstd accepts arbitrary bytes as a dictionary.
    fn sample_dict() -> Vec<u8> {
        let mut dict = Vec::new();
        for _ in 0..8 {
            dict.extend_from_slice(b"loadouts slotType itemAssetName Hat Shoes Gloves cap_01 ");
        }
        dict
    }

    fn payload() -> Vec<u8> {
        b"slotType Hat itemAssetName cap_01 slotType Shoes itemAssetName shoe_02".to_vec()
    }

    #[test]
    fn deflate_roundtrip() {
        let compress = Compress::new_deflate(9);
        let enc = compress.compress(&payload()).unwrap();
        assert_eq!(&enc[..1], &[0x78]); // zlib header
        let dec = compress.decompress(&enc, 1024).unwrap();
        assert_eq!(dec, payload());
    }

    #[test]
    fn dict_roundtrip() {
        let compress = Compress::new_dict(sample_dict()).unwrap();
        let enc = compress.compress(&payload()).unwrap();
        assert!(enc.len() < payload().len());
        let dec = compress.decompress(&enc, 1024).unwrap();
        assert_eq!(dec, payload());
    }

    #[test]
    fn dict_must_match() {
        let compress = Compress::new_dict(sample_dict()).unwrap();
        let enc = compress.compress(&payload()).unwrap();
        let mut other_dict = sample_dict();
        other_dict.reverse();
        let other = Compress::new_dict(other_dict).unwrap();
        assert!(other.decompress(&enc, 1024) != Ok(payload()));
    }

    #[test]
    fn size_limits() {
        let data = vec![0u8; 4096];
        for compress in [
            Compress::default(),
            Compress::new_dict(sample_dict()).unwrap(),
        ] {
            let enc = compress.compress(&data).unwrap();
            assert_eq!(compress.decompress(&enc, 4096).unwrap(), data);
            match compress.decompress(&enc, 4095) {
                Err(CompressionError::ExceededSize { max: 4095, .. }) => (),
                other => panic!("{} should hit the size limit, got {:?}", compress.name(), other),
            }
        }
    }

    // Same dictionary, but a frame without its content size, as other zstd writers may produce.
    fn compress_unsized(src: &[u8], dict: &Dictionary) -> Vec<u8> {
        use zstd_safe::*;
        let mut ctx = CCtx::create();
        ctx.ref_cdict(&dict.cdict).unwrap();
        ctx.set_parameter(CParameter::ContentSizeFlag(false)).unwrap();
        let mut out = vec![0u8; compress_bound(src.len())];
        let len = ctx.compress2(&mut out[..], src).unwrap();
        out.truncate(len);
        assert!(matches!(get_frame_content_size(&out), Ok(None)));
        out
    }

    #[test]
    fn dict_frame_without_content_size() {
        let dict = Dictionary::new(sample_dict()).unwrap();
        let enc = compress_unsized(&payload(), &dict);
        let compress = Compress::Dict(dict);
        assert_eq!(compress.decompress(&enc, 1024).unwrap(), payload());
        assert_eq!(
            compress.decompress(&enc, payload().len()).unwrap(),
            payload()
        );
    }

    #[test]
    fn dict_frame_without_content_size_is_bounded() {
        let dict = Dictionary::new(sample_dict()).unwrap();
        let data = vec![0u8; 4096];
        let enc = compress_unsized(&data, &dict);
        let compress = Compress::Dict(dict);
        assert_eq!(compress.decompress(&enc, 4096).unwrap(), data);
        match compress.decompress(&enc, 4095) {
            Err(CompressionError::ExceededSize { max: 4095, .. }) => (),
            other => panic!("Should hit the size limit, got {:?}", other),
        }
        match compress.decompress(&enc[..enc.len() - 1], 4096) {
            Err(_) => (),
            Ok(out) => assert_ne!(out, data),
        }
    }

    #[test]
    fn garbage_input() {
        let garbage = [0x12u8, 0x34, 0x56, 0x78, 0x9a];
        assert!(Compress::default().decompress(&garbage, 1024).is_err());
        assert!(Compress::new_dict(sample_dict())
            .unwrap()
            .decompress(&garbage, 1024)
            .is_err());
    }

    #[test]
    fn dictionary_serde() {
        let compress = Compress::new_dict(sample_dict()).unwrap();
        let json = serde_json::to_string(&compress).unwrap();
        let back: Compress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, compress);
        assert_eq!(back.clone(), compress);

        let deflate: Compress = serde_json::from_str(r#"{"Deflate": {}}"#).unwrap();
        assert_eq!(deflate, Compress::default());
    }

    #[test]
    fn train() {
        let mut samples = Vec::new();
        let mut lens = Vec::new();
        for i in 0..2000u32 {
            let sample = format!(
                "{{\"loadouts\":[{{\"slotType\":\"Hat\",\"itemAssetName\":\"cap_{:04}\"}},\
                 {{\"slotType\":\"Shoes\",\"itemAssetName\":\"shoe_{:03}\"}}]}}",
                i,
                i % 97
            );
            samples.extend_from_slice(sample.as_bytes());
            lens.push(sample.len());
        }
        let dict = train_dictionary(2048, &samples, &lens).unwrap();
        assert!(!dict.as_bytes().is_empty());
        let compress = Compress::Dict(dict);
        let first = &samples[..lens[0]];
        let enc = compress.compress(first).unwrap();
        assert_eq!(compress.decompress(&enc, 1024).unwrap(), first);
    }
}
