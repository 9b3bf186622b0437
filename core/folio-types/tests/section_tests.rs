use folio_types::SectionName;
use std::collections::HashSet;

#[test]
fn all_has_ten_distinct_sections() {
    let keys: HashSet<_> = SectionName::ALL.iter().map(|s| s.as_str()).collect();
    assert_eq!(keys.len(), 10);
}

#[test]
fn wire_names_are_camel_case() {
    assert_eq!(SectionName::PersonalInfo.as_str(), "personalInfo");
    assert_eq!(SectionName::SocialLinks.as_str(), "socialLinks");
    assert_eq!(SectionName::Certifications.to_string(), "certifications");
}

#[test]
fn from_str_roundtrips_every_section() {
    for section in SectionName::ALL {
        let parsed: SectionName = section.as_str().parse().unwrap();
        assert_eq!(parsed, section);
    }
}

#[test]
fn unknown_section_is_rejected() {
    assert!("footer".parse::<SectionName>().is_err());
    assert!(SectionName::from_key("Hero").is_none());
}

#[test]
fn only_links_and_navigation_are_sequences() {
    let sequences: Vec<_> = SectionName::ALL
        .into_iter()
        .filter(SectionName::is_sequence)
        .collect();
    assert_eq!(
        sequences,
        vec![SectionName::SocialLinks, SectionName::Navigation]
    );
}

#[test]
fn serde_matches_wire_name() {
    let json = serde_json::to_string(&SectionName::Experience).unwrap();
    assert_eq!(json, "\"experience\"");
    let back: SectionName = serde_json::from_str("\"personalInfo\"").unwrap();
    assert_eq!(back, SectionName::PersonalInfo);
}
