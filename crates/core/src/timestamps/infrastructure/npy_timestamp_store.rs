use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::Array1;

use crate::timestamps::domain::timestamp_store::{TimestampStore, TimestampStoreError};

const MAGIC: &[u8] = b"\x93NUMPY";
const HEADER_ALIGNMENT: usize = 64;
/// Magic, two version bytes and the u16 header length.
const PREAMBLE_LEN_V1: usize = 10;

/// Stores timestamps as a NumPy `.npy` file: little-endian float64, 1-D,
/// C order, loadable with `numpy.load`.
///
/// Writes go to a temporary file beside the target which is renamed over
/// it once fully flushed, so a failed write never leaves a truncated log.
pub struct NpyTimestampStore;

impl NpyTimestampStore {
    pub fn new() -> Self {
        Self
    }

    /// Reads a 1-D `<f8` array written by this store (or by numpy).
    pub fn load(path: &Path) -> Result<Array1<f64>, TimestampStoreError> {
        let bytes = fs::read(path).map_err(|source| TimestampStoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let format_err = |reason: &str| TimestampStoreError::Format {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if bytes.len() < PREAMBLE_LEN_V1 || &bytes[..MAGIC.len()] != MAGIC {
            return Err(format_err("missing NUMPY magic"));
        }
        let (header_start, header_len) = match bytes[6] {
            1 => (10, u16::from_le_bytes([bytes[8], bytes[9]]) as usize),
            2 | 3 if bytes.len() >= 12 => (
                12,
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            ),
            _ => return Err(format_err("unsupported format version")),
        };
        let data_start = header_start + header_len;
        if bytes.len() < data_start {
            return Err(format_err("header truncated"));
        }
        let header = std::str::from_utf8(&bytes[header_start..data_start])
            .map_err(|_| format_err("header is not text"))?;

        if !header.contains("'descr': '<f8'") {
            return Err(format_err("dtype is not <f8"));
        }
        if !header.contains("'fortran_order': False") {
            return Err(format_err("array is Fortran-ordered"));
        }
        let len = parse_1d_shape(header).ok_or_else(|| format_err("shape is not 1-D"))?;

        let data = &bytes[data_start..];
        if data.len() != len * 8 {
            return Err(format_err("data length does not match shape"));
        }
        Ok(data
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect())
    }
}

impl Default for NpyTimestampStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampStore for NpyTimestampStore {
    fn persist(&self, path: &Path, timestamps: &[f64]) -> Result<(), TimestampStoreError> {
        let write_err = |source| TimestampStoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        {
            let mut out = BufWriter::new(tmp.as_file());
            out.write_all(&npy_header(timestamps.len()))
                .map_err(write_err)?;
            for value in timestamps {
                out.write_all(&value.to_le_bytes()).map_err(write_err)?;
            }
            out.flush().map_err(write_err)?;
        }
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        log::debug!("Wrote {} timestamps to {}", timestamps.len(), path.display());
        Ok(())
    }
}

/// Version 1.0 preamble and header dict, space-padded so the data starts
/// on a 64-byte boundary.
fn npy_header(len: usize) -> Vec<u8> {
    let dict = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({len},), }}");
    let unpadded = PREAMBLE_LEN_V1 + dict.len() + 1;
    let padding = (HEADER_ALIGNMENT - unpadded % HEADER_ALIGNMENT) % HEADER_ALIGNMENT;
    let header_len = dict.len() + padding + 1;

    let mut header = Vec::with_capacity(PREAMBLE_LEN_V1 + header_len);
    header.extend_from_slice(MAGIC);
    header.extend_from_slice(&[1, 0]);
    header.extend_from_slice(&(header_len as u16).to_le_bytes());
    header.extend_from_slice(dict.as_bytes());
    header.extend(std::iter::repeat(b' ').take(padding));
    header.push(b'\n');
    header
}

fn parse_1d_shape(header: &str) -> Option<usize> {
    let start = header.find("'shape': (")? + "'shape': (".len();
    let rest = &header[start..];
    let end = rest.find(')')?;
    let dims: Vec<&str> = rest[..end]
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    match dims.as_slice() {
        [len] => len.parse().ok(),
        _ => None,
    }
}
