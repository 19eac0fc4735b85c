//! Unpack a container into script files and repack them.

use rgss_bundle::{ScriptRecord, SectionIdAllocator, decode_with, encode};
use rgss_fs::constants::SCRIPT_EXTENSION;
use rgss_fs::{NormalizedPath, RobustnessConfig, io};
use rgss_index::{IndexEntry, IndexFile, OrderKey, is_placeholder, script_file_name, script_stem};

use crate::config::NamingScheme;
use crate::tree::ScriptTree;
use crate::Result;

/// A record whose payload could not be inflated.
///
/// It keeps its index line, and its payload is stored untouched in a
/// `<file_name>.raw` sidecar so repacking writes it back as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptScript {
    /// Position in the container
    pub position: usize,
    pub section_id: i32,
    pub title: String,
    /// Index line reserved for the record
    pub file_name: String,
    pub message: String,
}

/// Result of unpacking a container.
#[derive(Debug)]
pub struct UnpackOutcome {
    pub tree: ScriptTree,
    pub index: IndexFile,
    /// Script files extracted, in container order
    pub written: Vec<String>,
    /// Records kept as raw payloads because they could not be inflated
    pub corrupt: Vec<CorruptScript>,
}

/// Extract every record of `container` into `scripts_dir` and rewrite the
/// index file.
///
/// Corrupt records are reported and kept as raw payload sidecars; the rest
/// are still extracted.
pub fn unpack(
    container: &[u8],
    scripts_dir: &NormalizedPath,
    naming: NamingScheme,
) -> Result<UnpackOutcome> {
    let mut allocator = SectionIdAllocator::new();
    let records = decode_with(container, &mut allocator)?;

    let index = IndexFile::new(scripts_dir.clone());
    let mut lines: Vec<String> = Vec::with_capacity(records.len());
    let mut written = Vec::with_capacity(records.len());
    let mut corrupt = Vec::new();
    for (position, record) in records.iter().enumerate() {
        let file_name = unique_file_name(&file_stem_for(record, position, naming), position, &lines);
        let script_path = index.resolve(&file_name);
        let raw_path = index.raw_payload_path(&file_name);

        match record.inflate() {
            Ok(text) => {
                io::write_atomic(&script_path, &text, RobustnessConfig::default())?;
                io::remove_file(&raw_path)?;
                written.push(file_name.clone());
            }
            Err(error) => {
                tracing::warn!(
                    position,
                    section_id = record.section_id,
                    %error,
                    "keeping corrupt script record as raw payload"
                );
                io::write_atomic(&raw_path, &record.payload, RobustnessConfig::default())?;
                io::remove_file(&script_path)?;
                corrupt.push(CorruptScript {
                    position,
                    section_id: record.section_id,
                    title: record.title_lossy(),
                    file_name: file_name.clone(),
                    message: error.to_string(),
                });
            }
        }
        lines.push(file_name);
    }

    index.write(&lines)?;
    let tree = ScriptTree::from_index(&index)?;

    tracing::info!(
        scripts = written.len(),
        corrupt = corrupt.len(),
        dir = %scripts_dir,
        "unpacked script container"
    );
    Ok(UnpackOutcome {
        tree,
        index,
        written,
        corrupt,
    })
}

/// `stem` as a file name not already in `taken`, ignoring case.
/// Collisions get `_<position>`, then `_<position>_<k>` from k = 2 on.
fn unique_file_name(stem: &str, position: usize, taken: &[String]) -> String {
    let is_free = |candidate: &String| {
        let folded = candidate.to_lowercase();
        !taken.iter().any(|name| name.to_lowercase() == folded)
    };
    let file_name = script_file_name(stem);
    if is_free(&file_name) {
        return file_name;
    }
    tracing::warn!(position, title = %stem, "duplicate script title, suffixing position");
    let suffixed = format!("{}_{}", stem, position);
    std::iter::once(script_file_name(&suffixed))
        .chain((2..).map(|k| script_file_name(&format!("{}_{}", suffixed, k))))
        .find(|candidate| is_free(candidate))
        .unwrap_or(file_name)
}

fn file_stem_for(record: &ScriptRecord, position: usize, naming: NamingScheme) -> String {
    let title = sanitize_title(&record.display_title(position));
    match naming {
        NamingScheme::Plain => title,
        NamingScheme::Ordered => OrderKey::new(position as u32).apply(&title),
    }
}

/// Replace characters that cannot appear in a file name.
fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "." | ".." => cleaned.replace('.', "_"),
        _ => cleaned,
    }
}

/// Title stored in the container for a script file name.
///
/// The stem is the title; the order key is dropped under the ordered
/// scheme, and `Untitled_<n>` placeholders become empty titles.
pub fn title_for(file_name: &str, naming: NamingScheme) -> String {
    if is_placeholder(file_name) {
        return String::new();
    }
    let stem = script_stem(file_name);
    match naming {
        NamingScheme::Plain => stem.to_string(),
        NamingScheme::Ordered => OrderKey::strip(stem).to_string(),
    }
}

/// Build a container from the scripts listed in `index`.
///
/// Without an index file every `*.rb` file in the scripts directory is
/// packed, sorted by name. Fresh section ids are drawn for every record.
pub fn repack(index: &IndexFile, naming: NamingScheme) -> Result<Vec<u8>> {
    repack_with(index, naming, &mut SectionIdAllocator::new())
}

pub fn repack_with(
    index: &IndexFile,
    naming: NamingScheme,
    allocator: &mut SectionIdAllocator,
) -> Result<Vec<u8>> {
    let files = if index.is_valid() {
        index
            .entries()?
            .into_iter()
            .filter_map(|entry| match entry {
                IndexEntry::Blank { .. } => None,
                entry => entry.file_name().map(str::to_string),
            })
            .collect()
    } else {
        tracing::warn!(
            dir = %index.scripts_dir(),
            "no index file, packing every script in the directory"
        );
        list_scripts(index.scripts_dir())?
    };

    let mut records = Vec::with_capacity(files.len());
    for file_name in &files {
        let title = title_for(file_name, naming);
        let record = if index.is_preserved(file_name) {
            let payload = io::read_bytes(&index.raw_payload_path(file_name))?;
            tracing::debug!(file = %file_name, "packing raw payload unchanged");
            ScriptRecord::new(allocator.next()?, title, payload)
        } else {
            let text = io::read_bytes(&index.resolve(file_name))?;
            ScriptRecord::from_text(allocator.next()?, title, &text)?
        };
        records.push(record);
    }

    let bytes = encode(&records)?;
    tracing::info!(scripts = records.len(), bytes = bytes.len(), "repacked script container");
    Ok(bytes)
}

fn list_scripts(dir: &NormalizedPath) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir.to_native())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if NormalizedPath::new(&name).extension() == Some(SCRIPT_EXTENSION) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
