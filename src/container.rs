//! Container descriptor parsing.
//!
//! The fixed `META-INF/container.xml` entry names the package document. Only
//! the first declared rootfile matters; elements are matched by local name so
//! namespace prefixes are irrelevant.

extern crate alloc;

use alloc::format;
use alloc::string::String;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::StructureError;

/// Resolve the package document path from the container descriptor XML.
///
/// Returns the `full-path` attribute of the first `rootfile` element inside
/// `rootfiles`. Any missing piece -- the root element, `rootfiles`,
/// `rootfile`, or the attribute itself -- aborts with `MalformedXml`.
pub fn resolve_rootfile(xml: &str) -> Result<String, StructureError> {
    let mut reader = Reader::from_str(xml);
    let mut in_rootfiles = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.name();
                match name.local_name().as_ref() {
                    b"rootfiles" => in_rootfiles = true,
                    b"rootfile" if in_rootfiles => return rootfile_path(&e),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if e.name().local_name().as_ref() == b"rootfiles" {
                    in_rootfiles = false;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(StructureError::MalformedXml(format!("container: {}", err)))
            }
        }
    }

    Err(StructureError::MalformedXml(
        "container: no <rootfile> inside <rootfiles>".into(),
    ))
}

fn rootfile_path(e: &BytesStart<'_>) -> Result<String, StructureError> {
    for attr in e.attributes() {
        let attr =
            attr.map_err(|err| StructureError::MalformedXml(format!("container: {}", err)))?;
        if attr.key.local_name().as_ref() == b"full-path" {
            let value = attr
                .unescape_value()
                .map_err(|err| StructureError::MalformedXml(format!("container: {}", err)))?;
            return Ok(value.into_owned());
        }
    }
    Err(StructureError::MalformedXml(
        "container: <rootfile> missing full-path attribute".into(),
    ))
}
