//! In-memory EPUB fixtures.
//!
//! Synthesizes zip archives byte-by-byte -- local headers, central directory,
//! end-of-central-directory -- with STORED or DEFLATE entries, so tests
//! exercise the real extraction path without binary fixture files.

use miniz_oxide::deflate::compress_to_vec;

pub const METHOD_STORED: u16 = 0;
pub const METHOD_DEFLATE: u16 = 8;

/// One entry to place in a synthesized archive.
pub struct Entry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub method: u16,
}

impl<'a> Entry<'a> {
    pub fn stored(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            method: METHOD_STORED,
        }
    }

    pub fn deflated(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            method: METHOD_DEFLATE,
        }
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Build a zip archive from the given entries, in order.
pub fn build_zip(entries: &[Entry]) -> Vec<u8> {
    struct Record {
        name: String,
        method: u16,
        crc: u32,
        comp_size: u32,
        uncomp_size: u32,
        offset: u32,
    }

    let mut out = Vec::new();
    let mut directory: Vec<Record> = Vec::new();

    for entry in entries {
        let crc = crc32fast::hash(entry.data);
        let deflated;
        let payload: &[u8] = if entry.method == METHOD_DEFLATE {
            deflated = compress_to_vec(entry.data, 6);
            &deflated
        } else {
            entry.data
        };

        let offset = out.len() as u32;
        push_u32(&mut out, 0x0403_4b50); // local header signature
        push_u16(&mut out, 20); // version needed
        push_u16(&mut out, 0); // flags
        push_u16(&mut out, entry.method);
        push_u16(&mut out, 0); // mod time
        push_u16(&mut out, 0); // mod date
        push_u32(&mut out, crc);
        push_u32(&mut out, payload.len() as u32);
        push_u32(&mut out, entry.data.len() as u32);
        push_u16(&mut out, entry.name.len() as u16);
        push_u16(&mut out, 0); // extra length
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(payload);

        directory.push(Record {
            name: entry.name.to_string(),
            method: entry.method,
            crc,
            comp_size: payload.len() as u32,
            uncomp_size: entry.data.len() as u32,
            offset,
        });
    }

    let cd_offset = out.len() as u32;
    for record in &directory {
        push_u32(&mut out, 0x0201_4b50); // central directory signature
        push_u16(&mut out, 20); // version made by
        push_u16(&mut out, 20); // version needed
        push_u16(&mut out, 0); // flags
        push_u16(&mut out, record.method);
        push_u16(&mut out, 0); // mod time
        push_u16(&mut out, 0); // mod date
        push_u32(&mut out, record.crc);
        push_u32(&mut out, record.comp_size);
        push_u32(&mut out, record.uncomp_size);
        push_u16(&mut out, record.name.len() as u16);
        push_u16(&mut out, 0); // extra length
        push_u16(&mut out, 0); // comment length
        push_u16(&mut out, 0); // disk number start
        push_u16(&mut out, 0); // internal attributes
        push_u32(&mut out, 0); // external attributes
        push_u32(&mut out, record.offset);
        out.extend_from_slice(record.name.as_bytes());
    }
    let cd_size = out.len() as u32 - cd_offset;

    push_u32(&mut out, 0x0605_4b50); // end-of-central-directory signature
    push_u16(&mut out, 0); // disk number
    push_u16(&mut out, 0); // central directory disk
    push_u16(&mut out, directory.len() as u16);
    push_u16(&mut out, directory.len() as u16);
    push_u32(&mut out, cd_size);
    push_u32(&mut out, cd_offset);
    push_u16(&mut out, 0); // comment length

    out
}

pub fn container_xml(package_path: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
        package_path
    )
}

pub fn package_xml(items: &[(&str, &str)], spine: &[&str]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\"?>\n<package xmlns=\"http://www.idpf.org/2007/opf\" version=\"2.0\">\n  <manifest>\n",
    );
    for (id, href) in items {
        xml.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            id, href
        ));
    }
    xml.push_str("  </manifest>\n  <spine>\n");
    for idref in spine {
        xml.push_str(&format!("    <itemref idref=\"{}\"/>\n", idref));
    }
    xml.push_str("  </spine>\n</package>");
    xml
}

pub const CH1_HTML: &str = "<html><head><title>One</title></head>\
<body><p>First chapter text.</p><p>More words follow here.</p></body></html>";

pub const CH2_HTML: &str = "<html><head><title>Two</title></head>\
<body><p>Second chapter &amp; its text.</p></body></html>";

/// A small, well-formed two-chapter book mixing STORED and DEFLATE entries.
pub fn basic_epub() -> Vec<u8> {
    let container = container_xml("OEBPS/content.opf");
    let package = package_xml(
        &[("ch1", "text/ch1.xhtml"), ("ch2", "text/ch2.xhtml")],
        &["ch1", "ch2"],
    );
    build_zip(&[
        Entry::stored("mimetype", b"application/epub+zip"),
        Entry::deflated("META-INF/container.xml", container.as_bytes()),
        Entry::deflated("OEBPS/content.opf", package.as_bytes()),
        Entry::deflated("OEBPS/text/ch1.xhtml", CH1_HTML.as_bytes()),
        Entry::stored("OEBPS/text/ch2.xhtml", CH2_HTML.as_bytes()),
    ])
}

/// A book whose spine references one chapter that exists and one whose
/// archive entry is missing.
pub fn epub_with_missing_chapter_entry() -> Vec<u8> {
    let container = container_xml("content.opf");
    let package = package_xml(
        &[("ok", "ok.xhtml"), ("ghost", "ghost.xhtml")],
        &["ok", "ghost"],
    );
    build_zip(&[
        Entry::deflated("META-INF/container.xml", container.as_bytes()),
        Entry::deflated("content.opf", package.as_bytes()),
        Entry::deflated("ok.xhtml", b"<p>still here</p>"),
    ])
}
