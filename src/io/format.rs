//! Binary automaton files
//!
//! Layout, little-endian throughout:
//!
//! ```text
//! u8        colour representation
//! i32       number of states N
//! i32       width
//! i32       height
//! f64 x N   final distribution
//! then until EOF, 17-byte records:
//! f64 weight, i32 from, i32 to, u8 label
//! ```
//!
//! Transitions among the basis states are never stored; they are appended
//! after loading.

use crate::automaton::alphabet::Symbol;
use crate::automaton::transition::Transition;
use crate::automaton::wfa::{ColorRepresentation, Resolution, Wfa};
use crate::io::configuration::{
    BASE_STATE_COUNT, CHUNK_SIZE, MAX_RESOLUTION_POWER, ROOT_STATE_ID, WFA_EXTENSION,
};
use crate::io::error::{Result, WfaError, invalid_parameter, load_failure};
use crate::math::linalg::Vector;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bytes before the final distribution
pub const HEADER_LEN: usize = 13;

/// Bytes per final-distribution entry
pub const FINAL_ENTRY_LEN: usize = 8;

/// Bytes per transition record
pub const RECORD_LEN: usize = 17;

/// Fewest states a valid file can declare: the basis plus the root
const MIN_STATES: usize = ROOT_STATE_ID + 1;

/// Reads fixed-size fields from a stream in `CHUNK_SIZE` pieces
///
/// Bytes of a field split across two chunks stay in the buffer and are
/// completed by the next read.
struct ChunkReader<R> {
    inner: R,
    buffer: Vec<u8>,
    cursor: usize,
    path: PathBuf,
}

impl<R: Read> ChunkReader<R> {
    fn new(inner: R, path: &Path) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(CHUNK_SIZE * 2),
            cursor: 0,
            path: path.to_path_buf(),
        }
    }

    const fn available(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    // Returns false if the stream ended before `needed` bytes were buffered
    fn fill(&mut self, needed: usize) -> Result<bool> {
        if self.available() >= needed {
            return Ok(true);
        }

        let carried = self.available();
        self.buffer.copy_within(self.cursor.., 0);
        self.buffer.truncate(carried);
        self.cursor = 0;

        let mut chunk = [0_u8; CHUNK_SIZE];
        while self.buffer.len() < needed {
            let read = self.inner.read(&mut chunk).map_err(|e| WfaError::FileSystem {
                path: self.path.clone(),
                operation: "read automaton",
                source: e,
            })?;
            if read == 0 {
                return Ok(false);
            }
            self.buffer.extend(chunk.iter().take(read));
        }
        Ok(true)
    }

    /// Next `N` bytes, or `None` at a clean end of stream
    fn next<const N: usize>(&mut self) -> Result<Option<[u8; N]>> {
        if !self.fill(N)? {
            if self.available() == 0 {
                return Ok(None);
            }
            return Err(load_failure(
                &self.path,
                &format!("{} trailing bytes do not form a complete field", self.available()),
            ));
        }

        let bytes = self
            .buffer
            .get(self.cursor..self.cursor + N)
            .and_then(|slice| <[u8; N]>::try_from(slice).ok())
            .ok_or_else(|| load_failure(&self.path, &"read past the buffered data"))?;
        self.cursor += N;
        Ok(Some(bytes))
    }

    fn require<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        self.next::<N>()?
            .ok_or_else(|| load_failure(&self.path, &format!("file ends before {what}")))
    }
}

fn field<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    bytes
        .get(offset..offset + N)
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
        .unwrap_or([0; N])
}

/// Check a file's total length against the state count its header declares
///
/// # Errors
///
/// Returns a load failure if the distribution does not fit or the remaining
/// bytes are not a whole number of transition records
pub fn validate_length(path: &Path, length: u64, number_of_states: usize) -> Result<()> {
    let fixed = (HEADER_LEN + FINAL_ENTRY_LEN * number_of_states) as u64;
    if length < fixed {
        return Err(load_failure(
            path,
            &format!("{number_of_states} states need {fixed} bytes but the file has {length}"),
        ));
    }
    let records = length - fixed;
    if records % RECORD_LEN as u64 != 0 {
        return Err(load_failure(
            path,
            &format!("{records} bytes of transitions are not a multiple of {RECORD_LEN}"),
        ));
    }
    Ok(())
}

/// Read an automaton from a stream of `length` bytes
///
/// `path` is only used in error messages. Basis transitions are appended to
/// the ones read.
///
/// # Errors
///
/// Returns a load failure on any inconsistency between header and content
pub fn read_from<R: Read>(reader: R, length: u64, path: &Path) -> Result<Wfa> {
    let mut chunks = ChunkReader::new(reader, path);

    let [tag] = chunks.require::<1>("the header")?;
    let color_representation = ColorRepresentation::from_byte(tag)
        .ok_or_else(|| load_failure(path, &format!("unknown colour representation {tag}")))?;

    let declared = i32::from_le_bytes(chunks.require::<4>("the state count")?);
    let width = i32::from_le_bytes(chunks.require::<4>("the width")?);
    let height = i32::from_le_bytes(chunks.require::<4>("the height")?);

    let number_of_states = usize::try_from(declared)
        .ok()
        .filter(|n| *n >= MIN_STATES)
        .ok_or_else(|| {
            load_failure(path, &format!("declares {declared} states, at least {MIN_STATES} needed"))
        })?;
    if width <= 0 || height <= 0 {
        return Err(load_failure(
            path,
            &format!("resolution {width}x{height} is not positive"),
        ));
    }
    let resolution = Resolution::new(width as usize, height as usize);
    if resolution.power() > MAX_RESOLUTION_POWER {
        return Err(load_failure(
            path,
            &format!(
                "resolution {width}x{height} exceeds {0}x{0}",
                1_usize << MAX_RESOLUTION_POWER
            ),
        ));
    }
    validate_length(path, length, number_of_states)?;

    let mut final_distribution = Vec::with_capacity(number_of_states);
    for _ in 0..number_of_states {
        final_distribution.push(f64::from_le_bytes(
            chunks.require::<8>("the end of the final distribution")?,
        ));
    }

    let mut transitions = Vec::new();
    while let Some(record) = chunks.next::<RECORD_LEN>()? {
        transitions.push(parse_record(&record, number_of_states, path)?);
    }

    debug!(
        states = number_of_states,
        transitions = transitions.len(),
        "read automaton"
    );

    let mut wfa = Wfa::from_parts(
        color_representation,
        resolution,
        Vector::from(final_distribution),
        transitions,
    )
    .map_err(|e| load_failure(path, &e))?;
    wfa.add_base_transitions();
    Ok(wfa)
}

fn parse_record(record: &[u8; RECORD_LEN], number_of_states: usize, path: &Path) -> Result<Transition> {
    let weight = f64::from_le_bytes(field(record, 0));
    let from = i32::from_le_bytes(field(record, 8));
    let to = i32::from_le_bytes(field(record, 12));
    let [label] = field::<1>(record, 16);

    let state_id = |raw: i32| {
        usize::try_from(raw)
            .ok()
            .filter(|id| *id < number_of_states)
            .ok_or_else(|| {
                load_failure(
                    path,
                    &format!("transition refers to state {raw} of {number_of_states}"),
                )
            })
    };
    let symbol = Symbol::try_from(label).map_err(|e| load_failure(path, &e))?;

    Ok(Transition::new(state_id(from)?, state_id(to)?, symbol, weight))
}

/// Load an automaton file
///
/// # Errors
///
/// Returns an error if the file is missing, lacks the `.wfa` extension or
/// its content is corrupt
pub fn read_wfa(path: &Path) -> Result<Wfa> {
    if !path.exists() {
        return Err(WfaError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if path.extension().and_then(|e| e.to_str()) != Some(WFA_EXTENSION) {
        return Err(WfaError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: format!("expected a .{WFA_EXTENSION} file"),
        });
    }

    let file = File::open(path).map_err(|e| WfaError::FileSystem {
        path: path.to_path_buf(),
        operation: "open automaton",
        source: e,
    })?;
    let length = file
        .metadata()
        .map_err(|e| WfaError::FileSystem {
            path: path.to_path_buf(),
            operation: "inspect automaton",
            source: e,
        })?
        .len();

    read_from(file, length, path)
}

fn to_i32(parameter: &'static str, value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|e| invalid_parameter(parameter, &value, &e))
}

/// Serialise an automaton to a stream
///
/// Transitions leaving a basis state are skipped.
///
/// # Errors
///
/// Returns an error if a count does not fit the format or writing fails
pub fn write_to<W: Write>(wfa: &Wfa, writer: &mut W) -> Result<()> {
    let final_distribution = wfa.final_distribution();
    if final_distribution.len() != wfa.number_of_states() {
        return Err(invalid_parameter(
            "final_distribution",
            &final_distribution.len(),
            &format!("automaton has {} states", wfa.number_of_states()),
        ));
    }

    writer.write_all(&[wfa.color_representation().to_byte()])?;
    writer.write_all(&to_i32("number_of_states", wfa.number_of_states())?.to_le_bytes())?;
    writer.write_all(&to_i32("width", wfa.resolution().width)?.to_le_bytes())?;
    writer.write_all(&to_i32("height", wfa.resolution().height)?.to_le_bytes())?;

    for weight in final_distribution.as_array() {
        writer.write_all(&weight.to_le_bytes())?;
    }

    let mut record = [0_u8; RECORD_LEN];
    for transition in wfa
        .transitions()
        .iter()
        .filter(|t| t.from >= BASE_STATE_COUNT)
    {
        let (weight, rest) = record.split_at_mut(8);
        weight.copy_from_slice(&transition.weight.to_le_bytes());
        let (from, rest) = rest.split_at_mut(4);
        from.copy_from_slice(&to_i32("from", transition.from)?.to_le_bytes());
        let (to, label) = rest.split_at_mut(4);
        to.copy_from_slice(&to_i32("to", transition.to)?.to_le_bytes());
        label.copy_from_slice(&[transition.label.index() as u8]);
        writer.write_all(&record)?;
    }
    Ok(())
}

/// Write an automaton file through a `CHUNK_SIZE` buffer
///
/// # Errors
///
/// Returns an error if the file cannot be created or written
pub fn write_wfa(wfa: &Wfa, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| WfaError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    let file = File::create(path).map_err(|e| WfaError::FileSystem {
        path: path.to_path_buf(),
        operation: "create automaton",
        source: e,
    })?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    write_to(wfa, &mut writer).map_err(|error| match error {
        WfaError::FileSystem { source, .. } => WfaError::FileSystem {
            path: path.to_path_buf(),
            operation: "write automaton",
            source,
        },
        other => other,
    })?;
    writer.flush().map_err(|e| WfaError::FileSystem {
        path: path.to_path_buf(),
        operation: "write automaton",
        source: e,
    })?;

    debug!(path = %path.display(), "wrote automaton");
    Ok(())
}
