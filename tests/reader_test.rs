//! Reading EPUB packages.

mod common;

use std::io::Cursor;

use common::{EpubBuilder, JPEG};
use folio::{DocumentReader, EpubReader};

fn open(book: &EpubBuilder) -> EpubReader<Cursor<Vec<u8>>> {
    EpubReader::from_reader(Cursor::new(book.build())).unwrap()
}

#[test]
fn test_metadata() {
    let reader = open(
        &EpubBuilder::new("Collected Works")
            .creator("First Author")
            .creator("Second Author")
            .metadata_xml(
                "<dc:publisher>Press</dc:publisher>\
                 <dc:date>1999</dc:date>\
                 <dc:description>About things</dc:description>",
            ),
    );

    let metadata = reader.metadata();
    assert_eq!(metadata.title, "Collected Works");
    assert_eq!(metadata.authors, vec!["First Author", "Second Author"]);
    assert_eq!(metadata.language, "en");
    assert_eq!(metadata.publisher.as_deref(), Some("Press"));
    assert_eq!(metadata.date.as_deref(), Some("1999"));
    assert_eq!(metadata.description.as_deref(), Some("About things"));
    assert!(metadata.identifier.starts_with("urn:test:"));
}

#[test]
fn test_entities_keep_surrounding_spaces() {
    let reader = open(&EpubBuilder::new("Tom & Jerry"));
    assert_eq!(reader.metadata().title, "Tom & Jerry");
}

#[test]
fn test_spine_and_manifest() {
    let mut reader = open(
        &EpubBuilder::new("Book")
            .cover("cover", "images/cover.jpg", JPEG)
            .chapter("c1", "text/one.xhtml", "<h1>One</h1>")
            .dangling_spine_ref("ghost")
            .chapter("c2", "text/two.xhtml", "<h1>Two</h1>"),
    );

    let ids: Vec<&str> = reader.sections().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
    assert_eq!(reader.sections()[0].href, "text/one.xhtml");
    assert_eq!(reader.sections()[0].path, "OEBPS/text/one.xhtml");
    assert_eq!(reader.assets().len(), 3);
    assert_eq!(reader.metadata().cover_image.as_deref(), Some("images/cover.jpg"));

    let section = reader.sections()[1].clone();
    let markup = reader.load_section(&section).unwrap();
    assert!(markup.contains("<h1>Two</h1>"));

    let cover = reader.assets()[0].clone();
    assert_eq!(reader.load_asset(&cover).unwrap(), JPEG);
}

#[test]
fn test_missing_entry_is_an_error_per_item() {
    let mut reader = open(&EpubBuilder::new("Book").missing_chapter("c1", "c1.xhtml"));
    let section = reader.sections()[0].clone();
    assert!(matches!(
        reader.load_section(&section),
        Err(folio::Error::EntryNotFound(_))
    ));
}

#[test]
fn test_not_an_epub() {
    assert!(EpubReader::from_reader(Cursor::new(b"plain text".to_vec())).is_err());
}
