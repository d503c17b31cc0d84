//! Binary journal encoding
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! u16  format version
//! i32  record count
//! per record:
//!     u16 length + UTF-8 bytes   key
//!     u16 length + UTF-8 bytes   name
//!     i64                        access time (epoch millis)
//!     i64                        size (bytes)
//! ```

use crate::types::Record;
use std::io::{self, Read, Write};

pub const JOURNAL_FORMAT_VERSION: u16 = 1;

/// Longest string the length prefix can describe
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

pub fn write_journal<'a, W, I>(writer: &mut W, records: I) -> io::Result<()>
where
    W: Write,
    I: ExactSizeIterator<Item = &'a Record>,
{
    let count = i32::try_from(records.len())
        .map_err(|_| invalid_input("too many records for journal"))?;

    writer.write_all(&JOURNAL_FORMAT_VERSION.to_be_bytes())?;
    writer.write_all(&count.to_be_bytes())?;
    for record in records {
        write_string(writer, &record.key)?;
        write_string(writer, &record.name)?;
        writer.write_all(&record.time.to_be_bytes())?;
        let size = i64::try_from(record.size)
            .map_err(|_| invalid_input("record size out of range"))?;
        writer.write_all(&size.to_be_bytes())?;
    }
    Ok(())
}

/// Decode a whole journal. Any error means nothing read is usable.
pub fn read_journal<R: Read>(reader: &mut R) -> io::Result<Vec<Record>> {
    let version = read_u16(reader)?;
    if version != JOURNAL_FORMAT_VERSION {
        return Err(invalid_data(format!(
            "unsupported journal format version {}",
            version
        )));
    }

    let count = read_i32(reader)?;
    let count = usize::try_from(count)
        .map_err(|_| invalid_data(format!("negative record count {}", count)))?;

    // The count is untrusted, so do not preallocate from it blindly
    let mut records = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let key = read_string(reader)?;
        let name = read_string(reader)?;
        let time = read_i64(reader)?;
        let size = read_i64(reader)?;
        let size = u64::try_from(size)
            .map_err(|_| invalid_data(format!("negative size for {}", key)))?;
        records.push(Record {
            key,
            name,
            time,
            size,
        });
    }
    Ok(records)
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let len = u16::try_from(value.len())
        .map_err(|_| invalid_input("string longer than 65535 bytes"))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(value.as_bytes())
}

fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = read_u16(reader)? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| invalid_data(e.to_string()))
}

fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_i64<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn invalid_input(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(records: &[Record]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_journal(&mut buf, records.iter()).unwrap();
        buf
    }

    #[test]
    fn test_empty_journal_layout() {
        let buf = encode(&[]);
        assert_eq!(buf, vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_record_layout() {
        let buf = encode(&[Record::new("k", "ab", 3, 5)]);

        let expected: Vec<u8> = [
            &[0x00u8, 0x01][..],
            &[0x00, 0x00, 0x00, 0x01],
            &[0x00, 0x01, b'k'],
            &[0x00, 0x02, b'a', b'b'],
            &3i64.to_be_bytes(),
            &5i64.to_be_bytes(),
        ]
        .concat();
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_read_back_records() {
        let records = vec![
            Record::new("first", "0a1b.txt", 1_700_000_000_000, 100),
            Record::new("second ✓", "2c3d", 1_700_000_000_500, 0),
        ];
        let buf = encode(&records);

        let decoded = read_journal(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut buf = encode(&[Record::new("k", "n", 1, 1)]);
        buf[1] = 0x02;

        let err = read_journal(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let buf = encode(&[Record::new("k", "n", 1, 1), Record::new("j", "m", 2, 2)]);
        let truncated = &buf[..buf.len() - 3];

        let err = read_journal(&mut Cursor::new(truncated)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_negative_size_rejected() {
        let mut buf = encode(&[Record::new("k", "n", 1, 1)]);
        let len = buf.len();
        buf[len - 8..].copy_from_slice(&(-1i64).to_be_bytes());

        assert!(read_journal(&mut Cursor::new(buf)).is_err());
    }

    #[test]
    fn test_oversized_string_not_written() {
        let long_key = "x".repeat(MAX_STRING_LEN + 1);
        let records = [Record::new(long_key, "n", 1, 1)];

        let mut buf = Vec::new();
        let err = write_journal(&mut buf, records.iter()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
