//! Random files and keys for filling a cache with demo data

use rand::seq::IndexedRandom;
use rand::Rng;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["jpg", "png", "dat", "bin", "tmp", "cache"];

pub const KEY_LENGTH: usize = 16;

/// Random lowercase ASCII string
pub fn random_key<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| rng.random_range(b'a'..=b'z') as char)
        .collect()
}

/// Write a file of 2000 to 8000 random 8-byte blocks into `dir`
pub fn create_random_file<R: Rng + ?Sized>(rng: &mut R, dir: &Path) -> io::Result<PathBuf> {
    let extension = EXTENSIONS.choose(rng).copied().unwrap_or("bin");
    let path = dir.join(format!("demo_{}.{}", random_key(rng, 8), extension));

    let mut writer = BufWriter::new(File::create(&path)?);
    let blocks = 2000 + rng.random_range(0..6000);
    for _ in 0..blocks {
        writer.write_all(&rng.random::<i64>().to_be_bytes())?;
    }
    writer.flush()?;

    Ok(path)
}
