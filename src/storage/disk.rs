//! Backing file I/O for MiniSQL
//!
//! One file per database instance, opened at connect and rewritten at
//! checkpoint/disconnect. Layout: a fixed header, the JSON-encoded
//! catalog, the allocator state (next id + free list), then each page
//! length-prefixed in its byte encoding. Writes go through a temp file
//! and a rename.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::storage::page::{Page, PageId};

const MAGIC: u32 = 0x4D53_5144; // "MSQD"
const VERSION: u16 = 1;

/// Everything that persists for one database
#[derive(Debug)]
pub struct DatabaseImage {
    pub catalog: Catalog,
    pub pages: Vec<Page>,
    pub free_pages: Vec<PageId>,
    pub next_page_id: PageId,
}

pub struct DiskManager {
    path: PathBuf,
}

impl DiskManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DiskManager { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<DatabaseImage> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);

        if reader.read_u32::<BigEndian>()? != MAGIC {
            return Err(Error::CorruptFile(format!(
                "{}: bad magic number",
                self.path.display()
            )));
        }
        let version = reader.read_u16::<BigEndian>()?;
        if version != VERSION {
            return Err(Error::CorruptFile(format!(
                "{}: unsupported format version {}",
                self.path.display(),
                version
            )));
        }

        let catalog_len = reader.read_u32::<BigEndian>()? as usize;
        let mut catalog_bytes = vec![0u8; catalog_len];
        reader.read_exact(&mut catalog_bytes)?;
        let catalog: Catalog = serde_json::from_slice(&catalog_bytes)?;

        let next_page_id = reader.read_u32::<BigEndian>()?;
        let free_count = reader.read_u32::<BigEndian>()? as usize;
        let mut free_pages = Vec::with_capacity(free_count);
        for _ in 0..free_count {
            free_pages.push(reader.read_u32::<BigEndian>()?);
        }

        let page_count = reader.read_u32::<BigEndian>()? as usize;
        let mut pages = Vec::with_capacity(page_count);
        for _ in 0..page_count {
            let len = reader.read_u32::<BigEndian>()? as usize;
            let mut bytes = vec![0u8; len];
            reader.read_exact(&mut bytes)?;
            pages.push(Page::decode(&mut &bytes[..])?);
        }

        debug!(path = %self.path.display(), pages = pages.len(), "loaded database file");
        Ok(DatabaseImage {
            catalog,
            pages,
            free_pages,
            next_page_id,
        })
    }

    pub fn save(&self, image: &DatabaseImage) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);

            writer.write_u32::<BigEndian>(MAGIC)?;
            writer.write_u16::<BigEndian>(VERSION)?;

            let catalog_bytes = serde_json::to_vec(&image.catalog)?;
            writer.write_u32::<BigEndian>(catalog_bytes.len() as u32)?;
            writer.write_all(&catalog_bytes)?;

            writer.write_u32::<BigEndian>(image.next_page_id)?;
            writer.write_u32::<BigEndian>(image.free_pages.len() as u32)?;
            for id in &image.free_pages {
                writer.write_u32::<BigEndian>(*id)?;
            }

            writer.write_u32::<BigEndian>(image.pages.len() as u32)?;
            for page in &image.pages {
                let bytes = page.encode();
                writer.write_u32::<BigEndian>(bytes.len() as u32)?;
                writer.write_all(&bytes)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), pages = image.pages.len(), "saved database file");
        Ok(())
    }
}
