//! Patient-list search.

use crate::client::PatientRecord;

/// Patients whose unique number contains `query`, or whose name contains it ignoring case.
///
/// A blank query matches every patient. Order is preserved.
pub fn filter_patients<'a>(patients: &'a [PatientRecord], query: &str) -> Vec<&'a PatientRecord> {
    let query = query.trim();
    if query.is_empty() {
        return patients.iter().collect();
    }
    let lowered = query.to_lowercase();
    patients
        .iter()
        .filter(|p| {
            p.unique_number.to_string().contains(query) || p.name.to_lowercase().contains(&lowered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(id: i64, unique_number: i64, name: &str) -> PatientRecord {
        PatientRecord {
            id,
            unique_number,
            name: name.to_string(),
            age: 30,
            gender: "M".into(),
            created_time: None,
            pathology_analyses: Vec::new(),
        }
    }

    fn patients() -> Vec<PatientRecord> {
        vec![
            patient(1, 70012, "Nadia Fares"),
            patient(2, 81230, "Omar Haddad"),
            patient(3, 99001, "Farid Nasser"),
        ]
    }

    fn ids(found: &[&PatientRecord]) -> Vec<i64> {
        found.iter().map(|p| p.id).collect()
    }

    #[test]
    fn blank_query_keeps_everyone() {
        let all = patients();
        assert_eq!(ids(&filter_patients(&all, "")), vec![1, 2, 3]);
        assert_eq!(ids(&filter_patients(&all, "   ")), vec![1, 2, 3]);
    }

    #[test]
    fn matches_unique_number_substring() {
        let all = patients();
        assert_eq!(ids(&filter_patients(&all, "123")), vec![2]);
        assert_eq!(ids(&filter_patients(&all, "00")), vec![1, 3]);
    }

    #[test]
    fn name_match_ignores_case() {
        let all = patients();
        assert_eq!(ids(&filter_patients(&all, "fAr")), vec![1, 3]);
        assert_eq!(ids(&filter_patients(&all, "OMAR")), vec![2]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(filter_patients(&patients(), "zzz").is_empty());
    }
}
