//! Package document parsing: manifest, spine, and chapter resolution.
//!
//! The package document declares a manifest (id → href) and a spine (ordered
//! chapter references). Chapters come out in spine document order; an itemref
//! whose idref has no manifest match is dropped silently rather than treated
//! as an error.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::StructureError;

/// One manifest declaration carrying both required attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestItem {
    /// Unique manifest id (first occurrence wins on duplicates).
    pub id: String,
    /// Resource href relative to the package document.
    pub href: String,
}

/// One readable chapter resolved from the spine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chapter {
    /// Spine idref.
    pub id: String,
    /// Archive entry path, resolved against the package document directory.
    pub path: String,
    /// Display title. Defaults to the id; table-of-contents extraction is
    /// deliberately out of scope.
    pub title: String,
}

/// Parsed package document: manifest declarations plus spine order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageDoc {
    manifest: Vec<ManifestItem>,
    spine: Vec<String>,
}

impl PackageDoc {
    /// Manifest items in document order.
    pub fn manifest(&self) -> &[ManifestItem] {
        &self.manifest
    }

    /// Spine idrefs in document order.
    pub fn spine(&self) -> &[String] {
        &self.spine
    }

    /// Look up the href declared for a manifest id.
    pub fn href_for(&self, id: &str) -> Option<&str> {
        self.manifest
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.href.as_str())
    }

    /// Resolve spine entries into chapters, in spine order.
    ///
    /// Unresolvable idrefs are dropped. Paths join the package document's
    /// directory with the manifest href, normalizing `.`/`..` segments.
    pub fn chapters(&self, package_path: &str) -> Vec<Chapter> {
        self.spine
            .iter()
            .filter_map(|idref| {
                self.href_for(idref).map(|href| Chapter {
                    id: idref.clone(),
                    path: resolve_package_relative(package_path, href),
                    title: idref.clone(),
                })
            })
            .collect()
    }
}

/// Parse a package document.
///
/// Manifest items missing either `id` or `href` are skipped silently, as are
/// spine itemrefs without `idref`. Section order in the document does not
/// matter; resolution happens after the scan.
pub fn parse_package(xml: &str) -> Result<PackageDoc, StructureError> {
    let mut reader = Reader::from_str(xml);
    let mut doc = PackageDoc::default();
    let mut in_manifest = false;
    let mut in_spine = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.name();
                match name.local_name().as_ref() {
                    b"manifest" => in_manifest = true,
                    b"spine" => in_spine = true,
                    b"item" if in_manifest => {
                        if let Some(item) = manifest_item(&e)? {
                            // First declaration of an id wins.
                            if doc.href_for(&item.id).is_none() {
                                doc.manifest.push(item);
                            }
                        }
                    }
                    b"itemref" if in_spine => {
                        if let Some(idref) = attribute_value(&e, b"idref")? {
                            doc.spine.push(idref);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => match e.name().local_name().as_ref() {
                b"manifest" => in_manifest = false,
                b"spine" => in_spine = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(StructureError::MalformedXml(format!("package: {}", err))),
        }
    }

    Ok(doc)
}

fn manifest_item(e: &BytesStart<'_>) -> Result<Option<ManifestItem>, StructureError> {
    let id = attribute_value(e, b"id")?;
    let href = attribute_value(e, b"href")?;
    Ok(match (id, href) {
        (Some(id), Some(href)) => Some(ManifestItem { id, href }),
        _ => None,
    })
}

fn attribute_value(
    e: &BytesStart<'_>,
    key: &[u8],
) -> Result<Option<String>, StructureError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| StructureError::MalformedXml(format!("package: {}", err)))?;
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| StructureError::MalformedXml(format!("package: {}", err)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Join an href to the package document's directory, archive-path style.
pub(crate) fn resolve_package_relative(package_path: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    if href.is_empty() {
        return normalize_path(package_path);
    }
    if let Some(rooted) = href.strip_prefix('/') {
        return normalize_path(rooted);
    }
    let base_dir = package_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");
    if base_dir.is_empty() {
        normalize_path(href)
    } else {
        normalize_path(&format!("{}/{}", base_dir, href))
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}
