//! Import from the Unicode Character Database text files.
//!
//! Three files are read from one directory:
//!
//! * `Blocks.txt` gives the groups, in file order, with spaces in block
//!   names replaced by underscores.
//! * `UnicodeData.txt` gives the characters. `<control>` names become empty,
//!   and `<..., First>`/`<..., Last>` pairs are expanded into every codepoint
//!   of the range with an empty name. Surrogate and private-use ranges are not
//!   expanded.
//! * `NameAliases.txt` gives the aliases. The file is optional.
//!
//! Characters outside every block are put in [`NO_BLOCK`]. Malformed lines
//! are logged and skipped.

use crate::codepoint_ty::Codepoint;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::utf16;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::ops::RangeInclusive;
use std::path::Path;

/// Group of characters that no block covers.
pub const NO_BLOCK: &str = "No_Block";

const BLOCKS_FILE: &str = "Blocks.txt";
const UNICODE_DATA_FILE: &str = "UnicodeData.txt";
const NAME_ALIASES_FILE: &str = "NameAliases.txt";

const CONTROL_NAME: &str = "<control>";
const RANGE_FIRST_SUFFIX: &str = ", First>";
const RANGE_LAST_SUFFIX: &str = ", Last>";

/// A named codepoint range from `Blocks.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Covered scalar values
    pub range: RangeInclusive<u32>,
    /// Group key, with underscores for spaces.
    pub name: String,
}

/// Strips a `#` comment and surrounding whitespace.
fn content_of(line: &str) -> &str {
    line.split_once('#').map_or(line, |(content, _)| content).trim()
}

fn parse_scalar(hex: &str, line_no: usize) -> Option<u32> {
    match utf16::hex_to_scalar(hex.trim()) {
        Ok(value) if value <= utf16::MAX_SCALAR => Some(value),
        Ok(value) => {
            warn!("line {}: {:#X} is out of range, skipping", line_no, value);
            None
        }
        Err(e) => {
            warn!("line {}: {}, skipping", line_no, e);
            None
        }
    }
}

/// Parses `Blocks.txt`. Returns blocks sorted by start.
pub fn parse_blocks(content: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = content_of(line);
        if line.is_empty() {
            continue;
        }
        let Some((range, name)) = line.split_once(';') else {
            warn!("line {}: block without a name, skipping", line_no);
            continue;
        };
        let Some((start, end)) = range.trim().split_once("..") else {
            warn!("line {}: malformed block range {:?}, skipping", line_no, range);
            continue;
        };
        let (Some(start), Some(end)) = (parse_scalar(start, line_no), parse_scalar(end, line_no))
        else {
            continue;
        };
        let name = name.trim();
        if start > end || name.is_empty() {
            warn!("line {}: unusable block {:?}, skipping", line_no, line);
            continue;
        }
        blocks.push(Block {
            range: start..=end,
            name: name.replace(' ', "_"),
        });
    }
    blocks.sort_by_key(|block| *block.range.start());
    blocks
}

fn block_of(blocks: &[Block], value: u32) -> Option<&Block> {
    let pos = blocks.partition_point(|block| *block.range.start() <= value);
    let block = blocks.get(pos.checked_sub(1)?)?;
    block.range.contains(&value).then_some(block)
}

struct Importer<'a> {
    blocks: &'a [Block],
    dataset: Dataset,
    skipped: usize,
}

impl<'a> Importer<'a> {
    fn new(blocks: &'a [Block]) -> Self {
        let mut dataset = Dataset::new();
        for block in blocks {
            if !dataset.push_group(block.name.as_str()) {
                debug!("duplicate block {:?} ignored", block.name);
            }
        }
        Importer {
            blocks,
            dataset,
            skipped: 0,
        }
    }

    fn push(&mut self, value: u32, name: &str) {
        let Ok(codepoint) = Codepoint::from_scalar(value) else {
            self.skipped += 1;
            return;
        };
        let group = match block_of(self.blocks, value) {
            Some(block) => block.name.as_str(),
            None => {
                self.dataset.push_group(NO_BLOCK);
                NO_BLOCK
            }
        };
        if !self.dataset.push_character(codepoint, name, group) {
            warn!("{} listed twice, skipping", codepoint);
            self.skipped += 1;
        }
    }

    fn unicode_data(&mut self, content: &str) {
        // first codepoint and general category of an open range
        let mut open_range: Option<(u32, String)> = None;

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(';');
            let (Some(hex), Some(name), Some(category)) =
                (fields.next(), fields.next(), fields.next())
            else {
                warn!("line {}: too few fields, skipping", line_no);
                self.skipped += 1;
                continue;
            };
            let Some(value) = parse_scalar(hex, line_no) else {
                self.skipped += 1;
                continue;
            };
            let name = name.trim();

            if name.starts_with('<') && name.ends_with(RANGE_FIRST_SUFFIX) {
                if let Some((start, _)) = open_range.replace((value, category.to_owned())) {
                    warn!("line {}: range at {:04X} never closed", line_no, start);
                }
                continue;
            }
            if name.starts_with('<') && name.ends_with(RANGE_LAST_SUFFIX) {
                match open_range.take() {
                    Some((start, category)) if start <= value => {
                        self.expand_range(start..=value, &category)
                    }
                    _ => {
                        warn!("line {}: range end without a start, skipping", line_no);
                        self.skipped += 1;
                    }
                }
                continue;
            }

            let name = if name == CONTROL_NAME { "" } else { name };
            self.push(value, name);
        }

        if let Some((start, _)) = open_range {
            warn!("range at {:04X} never closed", start);
        }
    }

    fn expand_range(&mut self, range: RangeInclusive<u32>, category: &str) {
        if matches!(category, "Cs" | "Co") {
            debug!(
                "not expanding {} range {:04X}..{:04X}",
                category,
                range.start(),
                range.end()
            );
            return;
        }
        for value in range {
            self.push(value, "");
        }
    }

    fn name_aliases(&mut self, content: &str) {
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = content_of(line);
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split(';');
            let (Some(hex), Some(alias)) = (fields.next(), fields.next()) else {
                warn!("line {}: alias without text, skipping", line_no);
                self.skipped += 1;
                continue;
            };
            let alias = alias.trim();
            let Some(value) = parse_scalar(hex, line_no) else {
                self.skipped += 1;
                continue;
            };
            match Codepoint::from_scalar(value) {
                Ok(codepoint) if !alias.is_empty() && self.dataset.contains(codepoint) => {
                    self.dataset.push_alias(codepoint, alias);
                }
                _ => {
                    warn!("line {}: alias {:?} for unknown character, skipping", line_no, alias);
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Builds a dataset from the contents of the three UCD files.
pub fn build_dataset(blocks: &str, unicode_data: &str, name_aliases: Option<&str>) -> Dataset {
    let blocks = parse_blocks(blocks);
    let mut importer = Importer::new(&blocks);
    importer.unicode_data(unicode_data);
    if let Some(content) = name_aliases {
        importer.name_aliases(content);
    }
    let Importer {
        dataset, skipped, ..
    } = importer;
    info!(
        "imported UCD: {} groups, {} characters, {} aliases, {} lines skipped",
        dataset.groups().len(),
        dataset.characters().len(),
        dataset.aliases().len(),
        skipped
    );
    dataset
}

fn read_required(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    fs::read_to_string(&path)
        .map_err(|e| Error::DatasetUnavailable(format!("{}: {}", path.display(), e)))
}

/// Imports the UCD files found in `dir`.
pub fn import_dir(dir: &Path) -> Result<Dataset> {
    let blocks = read_required(dir, BLOCKS_FILE)?;
    let unicode_data = read_required(dir, UNICODE_DATA_FILE)?;
    let aliases_path = dir.join(NAME_ALIASES_FILE);
    let name_aliases = match fs::read_to_string(&aliases_path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("{} not found, importing without aliases", aliases_path.display());
            None
        }
        Err(e) => {
            return Err(Error::DatasetUnavailable(format!(
                "{}: {}",
                aliases_path.display(),
                e
            )))
        }
    };
    Ok(build_dataset(
        &blocks,
        &unicode_data,
        name_aliases.as_deref(),
    ))
}
