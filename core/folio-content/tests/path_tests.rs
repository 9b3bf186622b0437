use folio_content::{ContentPath, PathError};
use folio_types::SectionName;

#[test]
fn parse_leaf_path() {
    let path = ContentPath::parse("contact.form.fields.firstName.label").unwrap();
    assert_eq!(path.section(), SectionName::Contact);
    assert_eq!(path.fields(), ["form", "fields", "firstName", "label"]);
    assert_eq!(path.len(), 5);
    assert_eq!(path.to_string(), "contact.form.fields.firstName.label");
}

#[test]
fn parse_section_only() {
    let path: ContentPath = "navigation".parse().unwrap();
    assert_eq!(path.section(), SectionName::Navigation);
    assert!(path.fields().is_empty());
    assert_eq!(path, ContentPath::section_root(SectionName::Navigation));
}

#[test]
fn numeric_segments_are_plain_field_names() {
    let path = ContentPath::parse("about.kpiCards.0").unwrap();
    assert_eq!(path.segments(), vec!["about", "kpiCards", "0"]);
}

#[test]
fn empty_path_is_rejected() {
    assert_eq!(ContentPath::parse(""), Err(PathError::Empty));
}

#[test]
fn empty_segments_are_rejected() {
    for bad in [".hero", "hero.", "hero..title", "."] {
        assert!(
            matches!(ContentPath::parse(bad), Err(PathError::EmptySegment(_))),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn unknown_section_is_rejected() {
    let err = ContentPath::parse("footer.text").unwrap_err();
    assert_eq!(
        err,
        PathError::UnknownSection {
            path: "footer.text".to_string(),
            section: "footer".to_string(),
        }
    );
    assert!(err.to_string().contains("footer"));
}

#[test]
fn section_names_are_case_sensitive() {
    assert!(ContentPath::parse("Hero.title").is_err());
}
