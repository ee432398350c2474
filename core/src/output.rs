//! Output contract — stable serialized forms of the engine's tables.
//!
//! CSV headers are the display names carried by each record's serde
//! renames. Reading a table back yields records equal by value to the
//! ones written; f64 values round-trip exactly.

use crate::error::EngineResult;
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};
use std::path::Path;

pub fn write_csv<T: Serialize, W: Write>(records: &[T], writer: W) -> EngineResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_csv<T: DeserializeOwned, R: Read>(reader: R) -> EngineResult<Vec<T>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for record in rdr.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

pub fn write_json<T: Serialize + ?Sized, W: Write>(value: &T, writer: W) -> EngineResult<()> {
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned, R: Read>(reader: R) -> EngineResult<T> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_csv<T: Serialize>(records: &[T], path: &Path) -> EngineResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv(records, std::io::BufWriter::new(file))?;
    log::debug!("output: wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> EngineResult<()> {
    let file = std::fs::File::create(path)?;
    write_json(value, std::io::BufWriter::new(file))?;
    log::debug!("output: wrote {}", path.display());
    Ok(())
}
