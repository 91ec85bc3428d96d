//! Tagged-string codec for test descriptors.
//!
//! The backend stores a single name field per analysis, so the structured identity of a test is
//! packed into that field as
//!
//! ```text
//! [CAT]<category>[SUB]<subCategory>[NAME]<name>[TYPE]<type>[RANGE]<normalRange>
//! ```
//!
//! with the `[TYPE]` segment omitted when the descriptor has no type. Field values are not
//! escaped, so a value containing one of the reserved tags would mis-parse; edited values are
//! checked with [`Descriptor::validate_editable`] before encoding.
//!
//! Decoding is total: missing tags produce empty fields and every segment is trimmed.

use crate::constants::{RESERVED_TAGS, TAG_CATEGORY, TAG_NAME, TAG_RANGE, TAG_SUB_CATEGORY, TAG_TYPE};
use crate::{LabError, LabResult};
use serde::{Deserialize, Serialize};

/// Structured identity of one lab test.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub category: String,
    pub sub_category: String,
    pub name: String,
    /// Optional variant such as an isotype; empty means absent.
    #[serde(rename = "type", default)]
    pub test_type: String,
    pub normal_range: String,
}

impl Descriptor {
    pub fn new(
        category: impl Into<String>,
        sub_category: impl Into<String>,
        name: impl Into<String>,
        test_type: impl Into<String>,
        normal_range: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            sub_category: sub_category.into(),
            name: name.into(),
            test_type: test_type.into(),
            normal_range: normal_range.into(),
        }
    }

    /// Parse an encoded descriptor. Never fails; see [`decode`].
    pub fn decode(raw: &str) -> Self {
        decode(raw)
    }

    /// Encode into the tagged-string form; see [`encode`].
    pub fn encode(&self) -> String {
        encode(self)
    }

    pub fn has_type(&self) -> bool {
        !self.test_type.is_empty()
    }

    /// Label used on screens and printed reports: name and type joined by `" - "`, skipping
    /// blanks.
    pub fn display_name(&self) -> String {
        [self.name.as_str(), self.test_type.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// Reject descriptors whose fields would corrupt the encoded string.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Validation`] naming the first field that contains a reserved tag.
    pub fn validate_editable(&self) -> LabResult<()> {
        let fields = [
            ("category", &self.category),
            ("subCategory", &self.sub_category),
            ("name", &self.name),
            ("type", &self.test_type),
            ("normalRange", &self.normal_range),
        ];
        for (field, value) in fields {
            if let Some(tag) = find_reserved_tag(value) {
                return Err(LabError::Validation(format!(
                    "{field} must not contain the reserved tag {tag}"
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode(self))
    }
}

/// Returns the first reserved tag contained in `value`, if any.
pub fn find_reserved_tag(value: &str) -> Option<&'static str> {
    RESERVED_TAGS.into_iter().find(|tag| value.contains(tag))
}

/// Decode a tagged descriptor string.
///
/// Each segment runs from its opening tag to the nearest following terminator tag:
/// category ends at `[SUB]`, sub-category at `[NAME]`, name at `[TYPE]` or `[RANGE]`
/// (whichever comes first), type at `[RANGE]`, and the range runs to the end of the string.
/// A segment whose opening or terminating tag is missing decodes as an empty string.
pub fn decode(raw: &str) -> Descriptor {
    Descriptor {
        category: segment(raw, TAG_CATEGORY, &[TAG_SUB_CATEGORY]),
        sub_category: segment(raw, TAG_SUB_CATEGORY, &[TAG_NAME]),
        name: segment(raw, TAG_NAME, &[TAG_TYPE, TAG_RANGE]),
        test_type: segment(raw, TAG_TYPE, &[TAG_RANGE]),
        normal_range: segment(raw, TAG_RANGE, &[]),
    }
}

/// Encode a descriptor, omitting the `[TYPE]` segment when the type is empty.
pub fn encode(d: &Descriptor) -> String {
    let mut out = String::with_capacity(
        d.category.len()
            + d.sub_category.len()
            + d.name.len()
            + d.test_type.len()
            + d.normal_range.len()
            + 32,
    );
    out.push_str(TAG_CATEGORY);
    out.push_str(&d.category);
    out.push_str(TAG_SUB_CATEGORY);
    out.push_str(&d.sub_category);
    out.push_str(TAG_NAME);
    out.push_str(&d.name);
    if d.has_type() {
        out.push_str(TAG_TYPE);
        out.push_str(&d.test_type);
    }
    out.push_str(TAG_RANGE);
    out.push_str(&d.normal_range);
    out
}

/// Text after the first `open` tag up to the nearest of `terminators`.
///
/// An empty `terminators` slice means "to the end of the string".
fn segment(raw: &str, open: &str, terminators: &[&str]) -> String {
    let Some(start) = raw.find(open).map(|i| i + open.len()) else {
        return String::new();
    };
    let rest = &raw[start..];

    if terminators.is_empty() {
        return rest.trim().to_string();
    }

    terminators
        .iter()
        .filter_map(|t| rest.find(t))
        .min()
        .map(|end| rest[..end].trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hav_igm() -> Descriptor {
        Descriptor::new("elisaTests", "viralMarkers", "HAV Ab", "HAV Ab - IgM", "Negative")
    }

    #[test]
    fn decodes_descriptor_without_type() {
        let d = decode("[CAT]elisaTests[SUB]hepatitisMarkers[NAME]HBsAg[RANGE]Negative");
        assert_eq!(
            d,
            Descriptor::new("elisaTests", "hepatitisMarkers", "HBsAg", "", "Negative")
        );
    }

    #[test]
    fn decodes_descriptor_with_type() {
        let raw = "[CAT]elisaTests[SUB]viralMarkers[NAME]HAV Ab[TYPE]HAV Ab - IgM[RANGE]Negative";
        assert_eq!(decode(raw), hav_igm());
    }

    #[test]
    fn round_trip_reproduces_input_bytes() {
        let raw = "[CAT]elisaTests[SUB]viralMarkers[NAME]HAV Ab[TYPE]HAV Ab - IgM[RANGE]Negative";
        assert_eq!(encode(&decode(raw)), raw);
        assert_eq!(decode(&encode(&hav_igm())), hav_igm());
    }

    #[test]
    fn empty_type_omits_type_segment() {
        let d = Descriptor::new("ihaTests", "parasites", "Amoeba", "", "Negative");
        let encoded = encode(&d);
        assert!(!encoded.contains(TAG_TYPE));
        assert_eq!(encoded, "[CAT]ihaTests[SUB]parasites[NAME]Amoeba[RANGE]Negative");
        assert_eq!(decode(&encoded).test_type, "");
    }

    #[test]
    fn blank_fields_encode_as_empty_segments() {
        let d = Descriptor::new("", "", "Custom", "", "");
        assert_eq!(encode(&d), "[CAT][SUB][NAME]Custom[RANGE]");
        assert_eq!(decode(&encode(&d)), d);
    }

    #[test]
    fn decode_is_total_on_untagged_input() {
        assert_eq!(decode("legacy free text"), Descriptor::default());
        assert_eq!(decode(""), Descriptor::default());
    }

    #[test]
    fn missing_name_terminator_yields_empty_name() {
        let d = decode("[CAT]a[SUB]b[NAME]orphan");
        assert_eq!(d.category, "a");
        assert_eq!(d.sub_category, "b");
        assert_eq!(d.name, "");
        assert_eq!(d.normal_range, "");
    }

    #[test]
    fn decode_trims_segments() {
        // Hand-edited records may carry stray whitespace around values.
        let d = decode("[CAT] elisaTests [SUB]viralMarkers [NAME]  HCV[RANGE] Negative ");
        assert_eq!(
            d,
            Descriptor::new("elisaTests", "viralMarkers", "HCV", "", "Negative")
        );
    }

    #[test]
    fn range_keeps_everything_after_its_tag() {
        let d = decode("[CAT]c[SUB]s[NAME]n[RANGE]Up to 1:80 [ref]");
        assert_eq!(d.normal_range, "Up to 1:80 [ref]");
    }

    #[test]
    fn display_name_joins_name_and_type() {
        assert_eq!(hav_igm().display_name(), "HAV Ab - HAV Ab - IgM");
        assert_eq!(
            Descriptor::new("c", "s", "HCV", "", "Negative").display_name(),
            "HCV"
        );
        assert_eq!(Descriptor::default().display_name(), "");
    }

    #[test]
    fn validate_editable_rejects_reserved_tags() {
        let mut d = hav_igm();
        assert!(d.validate_editable().is_ok());

        d.normal_range = "Negative[NAME]oops".into();
        let err = d.validate_editable().expect_err("reserved tag rejected");
        assert!(
            matches!(err, LabError::Validation(msg) if msg.contains("normalRange") && msg.contains("[NAME]"))
        );
    }

    #[test]
    fn serialises_type_field_as_type() {
        let json = serde_json::to_value(hav_igm()).unwrap();
        assert_eq!(json["type"], "HAV Ab - IgM");
        assert_eq!(json["subCategory"], "viralMarkers");
        assert_eq!(json["normalRange"], "Negative");
    }

    mod round_trip {
        use crate::constants::TAG_TYPE;
        use crate::descriptor::{decode, encode, Descriptor};
        use proptest::prelude::*;

        fn field() -> impl Strategy<Value = String> {
            "[A-Za-z0-9 <>:/.,()+%-]{0,24}".prop_map(|s| s.trim().to_string())
        }

        fn descriptor() -> impl Strategy<Value = Descriptor> {
            (field(), field(), field(), field(), field()).prop_map(
                |(category, sub_category, name, test_type, normal_range)| {
                    Descriptor::new(category, sub_category, name, test_type, normal_range)
                },
            )
        }

        proptest! {
            #[test]
            fn decode_inverts_encode(d in descriptor()) {
                let encoded = encode(&d);
                prop_assert_eq!(decode(&encoded), d.clone());
                prop_assert_eq!(encode(&decode(&encoded)), encoded.clone());
                prop_assert_eq!(encoded.contains(TAG_TYPE), d.has_type());
            }
        }
    }
}
