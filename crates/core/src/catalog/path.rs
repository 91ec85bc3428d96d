use super::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address of one catalog leaf.
///
/// Written as `category/subCategory/test` for simple tests and `category/subCategory/test/variant`
/// for compound nodes, where `variant` is `igm`/`igg`, a Brucella species key, or a Widal
/// `group.key` selector such as `salmonellaTyphi.aH`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TestPath {
    pub category: String,
    pub sub_category: String,
    pub test: String,
    pub variant: Option<String>,
}

impl TestPath {
    pub fn new(
        category: impl Into<String>,
        sub_category: impl Into<String>,
        test: impl Into<String>,
        variant: Option<&str>,
    ) -> Self {
        Self {
            category: category.into(),
            sub_category: sub_category.into(),
            test: test.into(),
            variant: variant.map(str::to_string),
        }
    }
}

impl FromStr for TestPath {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(CatalogError::InvalidPath(s.to_string()));
        }
        match parts.as_slice() {
            [category, sub_category, test] => {
                Ok(TestPath::new(*category, *sub_category, *test, None))
            }
            [category, sub_category, test, variant] => {
                Ok(TestPath::new(*category, *sub_category, *test, Some(*variant)))
            }
            _ => Err(CatalogError::InvalidPath(s.to_string())),
        }
    }
}

impl fmt::Display for TestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.sub_category, self.test)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{variant}")?;
        }
        Ok(())
    }
}

impl Serialize for TestPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TestPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_and_four_segment_paths() {
        let simple: TestPath = "ihaTests/parasites/amoeba".parse().unwrap();
        assert_eq!(simple.variant, None);
        assert_eq!(simple.test, "amoeba");

        let widal: TestPath = "serologyTests/routineTests/widalTest/salmonellaTyphi.aH"
            .parse()
            .unwrap();
        assert_eq!(widal.variant.as_deref(), Some("salmonellaTyphi.aH"));
        assert_eq!(
            widal.to_string(),
            "serologyTests/routineTests/widalTest/salmonellaTyphi.aH"
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        for raw in ["", "a/b", "a//c", "a/b/c/d/e", "a/b/ /d"] {
            let err = raw.parse::<TestPath>().expect_err("malformed path");
            assert!(matches!(err, CatalogError::InvalidPath(_)), "{raw}");
        }
    }

    #[test]
    fn serialises_as_string() {
        let path = TestPath::new("elisaTests", "viralMarkers", "havAb", Some("igg"));
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"elisaTests/viralMarkers/havAb/igg\"");
        assert_eq!(serde_json::from_str::<TestPath>(&json).unwrap(), path);
    }
}
