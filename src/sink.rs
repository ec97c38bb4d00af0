//! Text encoding of trajectory snapshots and energies
//!
//! Any [`std::io::Write`] serves as a sink. Positions are written as
//! `"x y z "` per particle with six decimals and no newline; energies as one
//! `"U "` per report. Nothing else (headers, separators) is emitted.

use std::fmt::Write as _;
use std::io::Write;

use nalgebra::Vector3;

use crate::error::Result;

/// Size threshold at which buffered position text is flushed to the sink
pub const CHUNK_SIZE: usize = 4096;

/// Write a full position snapshot, handing the sink chunks of at least
/// [`CHUNK_SIZE`] bytes followed by the remainder.
pub fn write_positions<W: Write + ?Sized>(sink: &mut W, positions: &[Vector3<f64>]) -> Result<()> {
    // one line of slack past the chunk threshold
    let mut buf = String::with_capacity(CHUNK_SIZE + 64);
    for p in positions {
        // formatting into a String cannot fail
        let _ = write!(buf, "{:.6} {:.6} {:.6} ", p.x, p.y, p.z);
        if buf.len() >= CHUNK_SIZE {
            sink.write_all(buf.as_bytes())?;
            buf.clear();
        }
    }
    if !buf.is_empty() {
        sink.write_all(buf.as_bytes())?;
    }
    Ok(())
}

/// Append one energy value
pub fn write_energy<W: Write + ?Sized>(sink: &mut W, energy: f64) -> Result<()> {
    write!(sink, "{:.6} ", energy)?;
    Ok(())
}
