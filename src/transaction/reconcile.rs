//! Works out which records in a feed have not been stored yet.

use std::collections::HashSet;

use crate::transaction::TransactionRecord;

/// Return the records in `records` whose ID is not in `known_ids`, in feed order.
///
/// Records without an ID are dropped since they can be neither deduplicated
/// nor stored. An ID repeated within `records` is reported each time it
/// appears; [crate::sync_records] takes care of writing it only once.
///
/// `known_ids` should be read from the store immediately before calling this
/// function.
pub fn reconcile(
    records: &[TransactionRecord],
    known_ids: &HashSet<String>,
) -> Vec<TransactionRecord> {
    records
        .iter()
        .filter(|record| {
            record
                .id
                .as_ref()
                .is_some_and(|id| !known_ids.contains(id))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::transaction::{TransactionRecord, reconcile};

    fn record(id: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            id: id.map(str::to_owned),
            ..Default::default()
        }
    }

    fn ids(records: &[TransactionRecord]) -> Vec<Option<&str>> {
        records.iter().map(|record| record.id.as_deref()).collect()
    }

    fn known(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn everything_is_new_against_an_empty_store() {
        let records = vec![record(Some("a")), record(Some("b")), record(Some("c"))];

        let new_records = reconcile(&records, &HashSet::new());

        assert_eq!(new_records, records);
    }

    #[test]
    fn known_records_are_excluded_and_order_is_kept() {
        let records = vec![
            record(Some("d")),
            record(Some("a")),
            record(Some("e")),
            record(Some("b")),
            record(Some("f")),
        ];

        let new_records = reconcile(&records, &known(&["a", "b", "z"]));

        assert_eq!(ids(&new_records), vec![Some("d"), Some("e"), Some("f")]);
    }

    #[test]
    fn nothing_is_new_when_all_ids_are_known() {
        let records = vec![record(Some("a")), record(Some("b"))];

        assert!(reconcile(&records, &known(&["a", "b"])).is_empty());
    }

    #[test]
    fn records_without_ids_are_dropped() {
        let records = vec![record(None), record(Some("a")), record(None)];

        let new_records = reconcile(&records, &HashSet::new());

        assert_eq!(ids(&new_records), vec![Some("a")]);
    }

    #[test]
    fn repeated_ids_are_reported_each_time() {
        let records = vec![record(Some("a")), record(Some("a"))];

        let new_records = reconcile(&records, &HashSet::new());

        assert_eq!(new_records.len(), 2);
    }

    #[test]
    fn output_is_a_subset_of_input_with_unknown_ids() {
        let records: Vec<TransactionRecord> = (0..20)
            .map(|i| record(Some(&i.to_string())))
            .chain([record(None)])
            .collect();
        let known_ids = known(&["0", "3", "6", "9", "12", "15", "18", "100"]);

        let new_records = reconcile(&records, &known_ids);

        for new_record in &new_records {
            assert!(records.contains(new_record));
            assert!(!known_ids.contains(new_record.id.as_ref().unwrap()));
        }
        let want: Vec<&TransactionRecord> = records
            .iter()
            .filter(|record| {
                record
                    .id
                    .as_ref()
                    .is_some_and(|id| !known_ids.contains(id))
            })
            .collect();
        assert_eq!(new_records.iter().collect::<Vec<_>>(), want);
    }

    #[test]
    fn same_inputs_give_same_output() {
        let records = vec![record(Some("a")), record(Some("b"))];
        let known_ids = known(&["b"]);

        assert_eq!(
            reconcile(&records, &known_ids),
            reconcile(&records, &known_ids)
        );
    }
}
