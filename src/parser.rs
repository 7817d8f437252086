//! Acorn DFS disk catalog parser.
//!
//! A DFS image starts with two catalog sectors. Sector 0 holds the first
//! eight title characters and up to 31 eight-byte file names; sector 1
//! holds the rest of the title, the disk attributes, and the address and
//! length fields of each file. Contents are stored in whole 256 byte
//! sectors counted from the start of the image.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::{DiskParser, DisassemblyError};

/// Bytes per disk sector.
pub const SECTOR_SIZE: usize = 256;

/// The two catalog sectors every image must contain.
const CATALOG_SIZE: usize = 2 * SECTOR_SIZE;

const NAMES_OFFSET: usize = 0x008;
const INFO_OFFSET: usize = 0x108;
const ENTRY_SIZE: usize = 8;

/// A parsed DFS disk image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskImage {
    /// Disk title, up to twelve characters
    pub title: String,
    /// Total sectors on the disk
    pub sectors: u16,
    /// `*OPT 4` boot option
    pub boot_option: u8,
    /// Write cycle counter, bumped on every catalog update
    pub cycle: u8,
    /// Catalog entries in catalog order
    pub files: Vec<CatalogEntry>,
}

/// One file in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// File name without directory, trailing spaces removed
    pub filename: String,
    /// Single character directory, usually `$`
    pub directory: char,
    /// Set when the directory byte has bit 7 set
    pub locked: bool,
    /// Bit 7 of each filename character, character `i` in bit `i`
    pub attributes: u8,
    pub length: u32,
    pub load_address: u32,
    pub exec_address: u32,
    pub start_sector: u16,
}

impl CatalogEntry {
    /// Name in `D.NAME` form.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.directory, self.filename)
    }

    /// Whether `name` selects this entry, either bare or directory qualified.
    pub fn matches(&self, name: &str) -> bool {
        name == self.filename || name == self.qualified_name()
    }

    /// Byte offset of the file contents within the image.
    pub fn offset(&self) -> usize {
        usize::from(self.start_sector) * SECTOR_SIZE
    }

    /// File name safe to use on the host, with path separators replaced.
    pub fn host_filename(&self) -> String {
        host_safe(&self.filename)
    }
}

fn host_safe(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Host file names for a selection of entries, in the same order.
///
/// Entries in different directories may share a bare name. Any bare name
/// used more than once in the selection is qualified with its directory,
/// so `$.A` and `B.A` become `$.A` and `B.A` rather than both `A`.
pub fn host_filenames(entries: &[&CatalogEntry]) -> Vec<String> {
    let mut uses: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        *uses.entry(entry.host_filename()).or_default() += 1;
    }
    entries
        .iter()
        .map(|entry| {
            let bare = entry.host_filename();
            if uses[&bare] > 1 {
                host_safe(&entry.qualified_name())
            } else {
                bare
            }
        })
        .collect()
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<7}   {:04X}   {:08X} {:08X} {:3}",
            self.filename, self.length, self.load_address, self.exec_address, self.start_sector
        )
    }
}

impl DiskImage {
    /// First entry matching `name`.
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.files.iter().find(|entry| entry.matches(name))
    }

    /// Entries named in `names`, in that order, or every entry when `names`
    /// is empty. Fails on the first name with no entry.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&CatalogEntry>, DisassemblyError> {
        if names.is_empty() {
            return Ok(self.files.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.find(name)
                    .ok_or_else(|| DisassemblyError::InvalidArgument(format!("no entry named {}", name)))
            })
            .collect()
    }

    /// Contents of `entry` within the image `data` it was parsed from.
    pub fn contents<'d>(&self, entry: &CatalogEntry, data: &'d [u8]) -> Result<&'d [u8], DisassemblyError> {
        let start = entry.offset();
        let end = start + entry.length as usize;
        data.get(start..end).ok_or_else(|| {
            DisassemblyError::ParsingError(format!(
                "{} occupies bytes {:#x}..{:#x} but the image is only {:#x} bytes",
                entry.qualified_name(),
                start,
                end,
                data.len()
            ))
        })
    }
}

/// Reads the catalog of a single sided 40 or 80 track DFS image.
#[derive(Debug, Default)]
pub struct DfsParser;

impl DfsParser {
    /// Construct a new DfsParser.
    pub fn new() -> Self {
        DfsParser
    }

    fn parse_entry(&self, data: &[u8], index: usize) -> CatalogEntry {
        let name = &data[NAMES_OFFSET + index * ENTRY_SIZE..][..ENTRY_SIZE];
        let info = &data[INFO_OFFSET + index * ENTRY_SIZE..][..ENTRY_SIZE];

        let (filename, attributes) = read_filename(&name[..7]);
        let high = info[6];

        CatalogEntry {
            filename,
            directory: char::from(name[7] & 0x7F),
            locked: name[7] & 0x80 != 0,
            attributes,
            length: u32::from(info[4]) | u32::from(info[5]) << 8 | u32::from(high & 0x30) << 12,
            load_address: u32::from(info[0]) | u32::from(info[1]) << 8 | u32::from(high & 0x0C) << 14,
            exec_address: u32::from(info[2]) | u32::from(info[3]) << 8 | u32::from(high & 0xC0) << 10,
            start_sector: u16::from(info[7]) | u16::from(high & 0x03) << 8,
        }
    }
}

impl DiskParser for DfsParser {
    fn parse(&self, data: &[u8]) -> Result<DiskImage, DisassemblyError> {
        if data.len() < CATALOG_SIZE {
            return Err(DisassemblyError::ParsingError(format!(
                "image is {} bytes, too short for a DFS catalog",
                data.len()
            )));
        }

        // One byte of entry offset, so at most 31 entries
        let count = usize::from(data[0x105]) / ENTRY_SIZE;

        let title_bytes: Vec<u8> = data[0..8].iter().chain(&data[0x100..0x104]).copied().collect();
        let title = String::from_utf8_lossy(&title_bytes)
            .trim_end_matches(['\0', ' '])
            .to_string();

        let files = (0..count).map(|i| self.parse_entry(data, i)).collect();

        let image = DiskImage {
            title,
            sectors: u16::from(data[0x107]) | u16::from(data[0x106] & 0x03) << 8,
            boot_option: (data[0x106] >> 4) & 0x03,
            cycle: data[0x104],
            files,
        };
        log::debug!(
            "DFS catalog {:?}: {} files, {} sectors",
            image.title,
            image.files.len(),
            image.sectors
        );
        Ok(image)
    }
}

/// Split a filename field into its printable name and attribute bits.
fn read_filename(block: &[u8]) -> (String, u8) {
    let mut attributes = 0u8;
    let mut name = String::with_capacity(block.len());
    for (i, &b) in block.iter().enumerate() {
        attributes |= ((b & 0x80) >> 7) << i;
        name.push(char::from(b & 0x7F));
    }
    (name.trim_end_matches(' ').to_string(), attributes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an image with the given files stored consecutively from
    /// sector 2.
    pub(crate) fn build_image(title: &str, files: &[(&str, char, u32, u32, &[u8])]) -> Vec<u8> {
        let mut sector = 2usize;
        let total: usize = files
            .iter()
            .map(|f| f.4.len().div_ceil(SECTOR_SIZE))
            .sum::<usize>()
            + 2;
        let mut data = vec![0u8; total * SECTOR_SIZE];

        let title = title.as_bytes();
        for (i, &b) in title.iter().take(12).enumerate() {
            if i < 8 {
                data[i] = b;
            } else {
                data[0x100 + i - 8] = b;
            }
        }
        data[0x104] = 0x12;
        data[0x105] = (files.len() * ENTRY_SIZE) as u8;
        data[0x106] = 0x30 | ((total >> 8) as u8 & 0x03);
        data[0x107] = total as u8;

        for (i, &(name, dir, load, exec, contents)) in files.iter().enumerate() {
            let n = NAMES_OFFSET + i * ENTRY_SIZE;
            let mut padded = [b' '; 7];
            padded[..name.len()].copy_from_slice(name.as_bytes());
            data[n..n + 7].copy_from_slice(&padded);
            data[n + 7] = dir as u8;

            let info = INFO_OFFSET + i * ENTRY_SIZE;
            let len = contents.len() as u32;
            data[info] = load as u8;
            data[info + 1] = (load >> 8) as u8;
            data[info + 2] = exec as u8;
            data[info + 3] = (exec >> 8) as u8;
            data[info + 4] = len as u8;
            data[info + 5] = (len >> 8) as u8;
            data[info + 6] = ((exec >> 10) & 0xC0) as u8
                | ((len >> 12) & 0x30) as u8
                | ((load >> 14) & 0x0C) as u8
                | ((sector >> 8) & 0x03) as u8;
            data[info + 7] = sector as u8;

            let start = sector * SECTOR_SIZE;
            data[start..start + contents.len()].copy_from_slice(contents);
            sector += contents.len().div_ceil(SECTOR_SIZE);
        }
        data
    }

    #[test]
    fn test_parse_catalog() {
        let elite = vec![0xEA; 300];
        let image = build_image(
            "GAMES DISK",
            &[
                ("!BOOT", '$', 0, 0, &b"CHAIN \"ELITE\"\r"[..]),
                ("ELITE", '$', 0x1900, 0x1A00, &elite[..]),
            ],
        );

        let disk = DfsParser::new().parse(&image).unwrap();
        assert_eq!(disk.title, "GAMES DISK");
        assert_eq!(disk.boot_option, 3);
        assert_eq!(disk.cycle, 0x12);
        assert_eq!(disk.sectors, 5);
        assert_eq!(disk.files.len(), 2);

        let boot = &disk.files[0];
        assert_eq!(boot.filename, "!BOOT");
        assert_eq!(boot.qualified_name(), "$.!BOOT");
        assert_eq!(boot.start_sector, 2);
        assert!(!boot.locked);

        let elite_entry = disk.find("$.ELITE").unwrap();
        assert_eq!(elite_entry.load_address, 0x1900);
        assert_eq!(elite_entry.exec_address, 0x1A00);
        assert_eq!(elite_entry.length, 300);
        assert_eq!(elite_entry.start_sector, 3);
        assert_eq!(disk.contents(elite_entry, &image).unwrap(), &elite[..]);
    }

    #[test]
    fn test_high_address_bits() {
        let mut image = build_image("", &[("CODE", 'W', 0x1900, 0x8023, &[0x60][..])]);
        // Load and exec in the I/O processor: &FFFF1900 style high bits
        image[INFO_OFFSET + 6] |= 0xCC;
        // Locked, with an attribute bit on the first character
        image[NAMES_OFFSET + 7] |= 0x80;
        image[NAMES_OFFSET] |= 0x80;

        let disk = DfsParser::new().parse(&image).unwrap();
        let entry = &disk.files[0];
        assert_eq!(entry.load_address, 0x31900);
        assert_eq!(entry.exec_address, 0x38023);
        assert_eq!(entry.directory, 'W');
        assert!(entry.locked);
        assert_eq!(entry.attributes, 0x01);
        assert_eq!(entry.filename, "CODE");
        assert_eq!(disk.title, "");
    }

    #[test]
    fn test_listing_row() {
        let image = build_image("", &[("ELITE", '$', 0x1900, 0x1A00, &[0; 0x200][..])]);
        let disk = DfsParser::new().parse(&image).unwrap();
        assert_eq!(
            disk.files[0].to_string(),
            "ELITE     0200   00001900 00001A00   2"
        );
    }

    #[test]
    fn test_select_entries() {
        let image = build_image(
            "",
            &[
                ("!BOOT", '$', 0, 0, &[0x0D][..]),
                ("A/B", '$', 0, 0, &[1][..]),
                ("LOADER", 'W', 0x1100, 0x1100, &[0x60][..]),
            ],
        );
        let disk = DfsParser::new().parse(&image).unwrap();

        let all = disk.select::<&str>(&[]).unwrap();
        assert_eq!(all.len(), 3);

        let picked = disk.select(&["W.LOADER", "!BOOT"]).unwrap();
        assert_eq!(picked[0].filename, "LOADER");
        assert_eq!(picked[1].filename, "!BOOT");

        // prefixes do not match
        assert!(matches!(
            disk.select(&["!BOO"]),
            Err(DisassemblyError::InvalidArgument(_))
        ));

        assert_eq!(disk.find("A/B").unwrap().host_filename(), "A_B");
    }

    #[test]
    fn test_clashing_names_are_qualified() {
        let image = build_image(
            "",
            &[
                ("A", '$', 0, 0, &[1][..]),
                ("A", 'B', 0, 0, &[2][..]),
                ("C/D", 'B', 0, 0, &[3][..]),
            ],
        );
        let disk = DfsParser::new().parse(&image).unwrap();

        let all = disk.select::<&str>(&[]).unwrap();
        assert_eq!(host_filenames(&all), vec!["$.A", "B.A", "C_D"]);

        // Only one A selected, so it keeps its bare name
        let one = disk.select(&["B.A", "C/D"]).unwrap();
        assert_eq!(host_filenames(&one), vec!["A", "C_D"]);
    }

    #[test]
    fn test_full_catalog() {
        let mut image = build_image("", &[]);
        for offset in [0xF8, 0xFF] {
            image[0x105] = offset;
            let disk = DfsParser::new().parse(&image).unwrap();
            assert_eq!(disk.files.len(), 31);
        }
    }

    #[test]
    fn test_truncated_image() {
        let result = DfsParser::new().parse(&[0u8; 0x1FF]);
        assert!(matches!(result, Err(DisassemblyError::ParsingError(_))));
    }

    #[test]
    fn test_contents_out_of_bounds() {
        let mut image = build_image("", &[("BIG", '$', 0, 0, &[1, 2, 3][..])]);
        image.truncate(CATALOG_SIZE + 1);
        let disk = DfsParser::new().parse(&image).unwrap();
        assert!(disk.contents(&disk.files[0], &image).is_err());
    }
}
