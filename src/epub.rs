//! EPUB reading.
//!
//! An EPUB is a zip archive. `META-INF/container.xml` points at the package
//! document, whose manifest maps item ids to files and whose spine lists the
//! reading order. Every XHTML spine item becomes one numbered section.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;
use zip::ZipArchive;

use crate::clean::html_to_text;
use crate::error::{Error, Result};

const CONTAINER_PATH: &str = "META-INF/container.xml";

const DOCUMENT_MEDIA_TYPES: &[&str] = &["application/xhtml+xml", "text/html"];

struct ManifestItem {
    href: String,
    media_type: String,
}

#[derive(Default)]
struct Package {
    manifest: HashMap<String, ManifestItem>,
    spine: Vec<String>,
}

/// Read the spine documents of an EPUB as `(section_number, text)` pairs.
///
/// Sections are numbered from 1 in reading order. Spine entries that are not
/// XHTML (images, stylesheets) or that the manifest does not list are
/// skipped and do not consume a number.
///
/// # Errors
///
/// [`Error::Epub`] if the bytes are not a zip archive, the container or
/// package document is missing or malformed, or a spine document named by
/// the manifest is absent from the archive.
pub fn read_epub_sections(bytes: &[u8]) -> Result<Vec<(u32, String)>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(malformed)?;

    let container = read_entry(&mut archive, CONTAINER_PATH)?;
    let package_path = rootfile_path(&container)?;
    let package = parse_package(&read_entry(&mut archive, &package_path)?)?;
    let base = package_path.rsplit_once('/').map_or("", |(dir, _)| dir);

    let mut sections = Vec::new();
    for idref in &package.spine {
        let Some(item) = package.manifest.get(idref) else {
            debug!(idref = %idref, "spine entry not in manifest");
            continue;
        };
        if !DOCUMENT_MEDIA_TYPES.contains(&item.media_type.as_str()) {
            continue;
        }
        let xhtml = read_entry(&mut archive, &resolve_href(base, &item.href))?;
        sections.push((sections.len() as u32 + 1, html_to_text(&xhtml)));
    }

    debug!(sections = sections.len(), package = %package_path, "read epub");
    Ok(sections)
}

fn malformed(e: impl std::fmt::Display) -> Error {
    Error::Epub(e.to_string())
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| Error::Epub(format!("{name}: {e}")))?;
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| Error::Epub(format!("{name}: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value().map_err(malformed)?.into_owned()));
        }
    }
    Ok(None)
}

fn rootfile_path(container: &str) -> Result<String> {
    let mut reader = Reader::from_str(container);
    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = attribute(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Event::Eof => return Err(Error::Epub(format!("{CONTAINER_PATH} names no rootfile"))),
            _ => {}
        }
    }
}

fn parse_package(opf: &str) -> Result<Package> {
    let mut reader = Reader::from_str(opf);
    let mut package = Package::default();
    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"item" => {
                    let (Some(id), Some(href)) = (attribute(&e, b"id")?, attribute(&e, b"href")?)
                    else {
                        continue;
                    };
                    let media_type = attribute(&e, b"media-type")?.unwrap_or_default();
                    package.manifest.insert(id, ManifestItem { href, media_type });
                }
                b"itemref" => {
                    if let Some(idref) = attribute(&e, b"idref")? {
                        package.spine.push(idref);
                    }
                }
                _ => {}
            },
            Event::Eof => return Ok(package),
            _ => {}
        }
    }
}

/// Resolve a manifest href against the package document's directory.
///
/// Hrefs are percent-encoded URLs relative to the package document; archive
/// entry names are plain paths.
fn resolve_href(base: &str, href: &str) -> String {
    let without_fragment = href.split('#').next().unwrap_or(href);
    let decoded = urlencoding::decode(without_fragment)
        .map_or_else(|_| without_fragment.to_string(), Cow::into_owned);

    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const PACKAGE: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <manifest>
    <item id="ch2" href="Text/ch2.xhtml#start" media-type="application/xhtml+xml"/>
    <item id="ch1" href="Text/chapter%201.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="../Styles/book.css" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="ch1"/>
    <itemref idref="css"/>
    <itemref idref="ghost"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

    const CHAPTER_1: &str = "<html><head><style>p { margin: 0 }</style></head>\
        <body><h1>Chapter One</h1><p>The caf&eacute; opened at dawn.</p></body></html>";

    const CHAPTER_2: &str = "<html><body><h1>Chapter Two</h1>\
        <p>It closed at dusk &amp; nobody noticed.</p></body></html>";

    /// Build an EPUB archive in memory from `(entry name, contents)` pairs.
    pub(crate) fn build_epub(files: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, contents) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub(crate) fn sample_epub() -> Vec<u8> {
        build_epub(&[
            ("mimetype", "application/epub+zip"),
            (CONTAINER_PATH, CONTAINER),
            ("OEBPS/content.opf", PACKAGE),
            ("OEBPS/Text/chapter 1.xhtml", CHAPTER_1),
            ("OEBPS/Text/ch2.xhtml", CHAPTER_2),
            ("Styles/book.css", "p { margin: 0 }"),
        ])
    }

    #[test]
    fn test_sections_follow_spine_order() {
        let sections = read_epub_sections(&sample_epub()).unwrap();
        assert_eq!(
            sections,
            vec![
                (1, "Chapter One The caf\u{e9} opened at dawn.".to_string()),
                (2, "Chapter Two It closed at dusk & nobody noticed.".to_string()),
            ]
        );
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(read_epub_sections(b"PK"), Err(Error::Epub(_))));
        assert!(matches!(read_epub_sections(b""), Err(Error::Epub(_))));
    }

    #[test]
    fn test_missing_container() {
        let bytes = build_epub(&[("mimetype", "application/epub+zip")]);
        let err = read_epub_sections(&bytes).unwrap_err();
        assert!(err.to_string().contains(CONTAINER_PATH));
    }

    #[test]
    fn test_missing_spine_document() {
        let bytes = build_epub(&[
            (CONTAINER_PATH, CONTAINER),
            ("OEBPS/content.opf", PACKAGE),
            ("OEBPS/Text/ch2.xhtml", CHAPTER_2),
        ]);
        let err = read_epub_sections(&bytes).unwrap_err();
        assert!(err.to_string().contains("chapter 1.xhtml"));
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(resolve_href("OEBPS", "Text/a.xhtml"), "OEBPS/Text/a.xhtml");
        assert_eq!(resolve_href("OEBPS", "../Styles/b.css"), "Styles/b.css");
        assert_eq!(resolve_href("", "./a%20b.xhtml#p3"), "a b.xhtml");
    }
}
