use serde::Serialize;

use crate::grouping::normalize::normalize_name;
use crate::grouping::processor::GroupingTable;
use crate::grouping::similarity::{are_names_similar, calculate_similarity};

/// Counters from one merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Singleton buckets folded into another bucket
    pub merged: usize,
    /// Singleton buckets left alone for lack of a similar bucket
    pub unmatched: usize,
}

/// Representative name of a bucket: common name of its first member.
fn representative(table: &GroupingTable, key: &str) -> Option<String> {
    table
        .get(key)
        .and_then(|bucket| bucket.first())
        .map(|record| normalize_name(&record.name))
}

/// Best merge target for `name` among all buckets except `own_key`.
///
/// Highest similarity wins; on a tie the bucket met first in table order
/// is kept.
fn best_match<F>(table: &GroupingTable, own_key: &str, name: &str, can_merge: &F) -> Option<(String, f64)>
where
    F: Fn(&str, &str) -> bool,
{
    let folded = name.to_lowercase();
    let mut best: Option<(String, f64)> = None;
    for key in table
        .keys()
        .filter(|key| key.as_str() != own_key && can_merge(own_key, key.as_str()))
    {
        let Some(candidate) = representative(table, key) else {
            continue;
        };
        if !are_names_similar(name, &candidate) {
            continue;
        }
        let score = calculate_similarity(&folded, &candidate.to_lowercase());
        if best.as_ref().map_or(true, |(_, best_score)| score > *best_score) {
            best = Some((key.clone(), score));
        }
    }
    best
}

/// Folds every single-member bucket into its most similar other bucket.
///
/// Singletons are visited in table order and re-checked at their turn, since
/// an earlier merge may already have grown them. A merged singleton's bucket
/// is removed without disturbing the order of the remaining keys.
pub fn merge_single_element_groups(table: &mut GroupingTable) -> MergeStats {
    merge_single_element_groups_by(table, |_, _| true)
}

/// Like [`merge_single_element_groups`], but a singleton keyed `from` may only
/// move into the bucket keyed `into` when `can_merge(from, into)` holds.
pub fn merge_single_element_groups_by<F>(table: &mut GroupingTable, can_merge: F) -> MergeStats
where
    F: Fn(&str, &str) -> bool,
{
    let singletons: Vec<String> = table
        .iter()
        .filter(|(_, bucket)| bucket.len() == 1)
        .map(|(key, _)| key.clone())
        .collect();

    let mut stats = MergeStats::default();
    for key in singletons {
        let Some(name) = table
            .get(&key)
            .filter(|bucket| bucket.len() == 1)
            .and_then(|_| representative(table, &key))
        else {
            continue;
        };

        let Some((target, score)) = best_match(table, &key, &name, &can_merge) else {
            log::debug!("No merge candidate for '{}'", key);
            stats.unmatched += 1;
            continue;
        };

        let Some(mut bucket) = table.shift_remove(&key) else {
            continue;
        };
        if let Some(record) = bucket.pop() {
            log::debug!(
                "Merging '{}' into '{}' (similarity {:.2})",
                record.name,
                target,
                score
            );
            table.entry(target).or_default().push(record);
            stats.merged += 1;
        }
    }

    if stats.merged > 0 {
        log::info!(
            "Merged {} single-address groups, {} left unmatched",
            stats.merged,
            stats.unmatched
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::processor::add_to_grouped_addresses;
    use crate::knx::model::GroupAddressRecord;

    fn table(entries: &[(&str, &[(&str, &str)])]) -> GroupingTable {
        let mut table = GroupingTable::new();
        for (key, records) in entries {
            for (name, address) in records.iter() {
                add_to_grouped_addresses(&mut table, GroupAddressRecord::new(*name, *address), key);
            }
        }
        table
    }

    fn addresses(table: &GroupingTable, key: &str) -> Vec<String> {
        table
            .get(key)
            .map(|bucket| bucket.iter().map(|r| r.address.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn singleton_moves_into_similar_bucket() {
        let mut table = table(&[
            ("Kitchen Light Status", &[("Ie Kitchen Light Status", "A")]),
            (
                "Kitchen Lite Status",
                &[("Cmd Kitchen Lite Status", "B"), ("Ie Kitchen Lite Status", "C")],
            ),
        ]);

        let stats = merge_single_element_groups(&mut table);

        assert_eq!(stats, MergeStats { merged: 1, unmatched: 0 });
        assert!(!table.contains_key("Kitchen Light Status"));
        assert_eq!(addresses(&table, "Kitchen Lite Status"), vec!["B", "C", "A"]);
    }

    #[test]
    fn dissimilar_singleton_is_kept() {
        let mut table = table(&[
            ("Kitchen Light", &[("Cmd Kitchen Light", "A"), ("Ie Kitchen Light", "B")]),
            ("Bathroom Fan", &[("Ie Bathroom Fan", "C")]),
        ]);

        let stats = merge_single_element_groups(&mut table);

        assert_eq!(stats, MergeStats { merged: 0, unmatched: 1 });
        assert_eq!(addresses(&table, "Bathroom Fan"), vec!["C"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn highest_similarity_wins() {
        let mut table = table(&[
            ("Hall Ceilng Light", &[("Hall Ceilng Light", "A"), ("Hall Ceilng Light", "B")]),
            ("Hall Ceiling Light", &[("Hall Ceiling Light", "C"), ("Hall Ceiling Light", "D")]),
            ("Hall Ceiling Lights", &[("Hall Ceiling Lights", "E")]),
        ]);

        merge_single_element_groups(&mut table);

        assert_eq!(addresses(&table, "Hall Ceiling Light"), vec!["C", "D", "E"]);
        assert_eq!(addresses(&table, "Hall Ceilng Light"), vec!["A", "B"]);
    }

    #[test]
    fn tie_goes_to_first_bucket_in_table_order() {
        let mut table = table(&[
            ("Garage Lamp X", &[("Garage Lamp X", "A"), ("Garage Lamp X", "B")]),
            ("Garage Lamp Y", &[("Garage Lamp Y", "C"), ("Garage Lamp Y", "D")]),
            ("Garage Lamp Z", &[("Garage Lamp Z", "E")]),
        ]);

        merge_single_element_groups(&mut table);

        assert_eq!(addresses(&table, "Garage Lamp X"), vec!["A", "B", "E"]);
        assert_eq!(addresses(&table, "Garage Lamp Y"), vec!["C", "D"]);
    }

    #[test]
    fn singleton_can_absorb_an_earlier_singleton() {
        let mut table = table(&[
            ("Stair Light Status", &[("Ie Stair Light Status", "A")]),
            ("Stair Lights Status", &[("Ie Stair Lights Status", "B")]),
        ]);

        let stats = merge_single_element_groups(&mut table);

        assert_eq!(stats.merged, 1);
        let keys: Vec<_> = table.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Stair Lights Status"]);
        assert_eq!(addresses(&table, "Stair Lights Status"), vec!["B", "A"]);
    }

    #[test]
    fn refused_pairs_are_not_merged() {
        let mut table = table(&[
            ("Light", &[("Cmd Light", "A"), ("Ie Light", "B")]),
            ("Light (2)", &[("Cmd Light", "C")]),
        ]);

        let stats = merge_single_element_groups_by(&mut table, |from, into| {
            !(from == "Light (2)" && into == "Light")
        });

        assert_eq!(stats, MergeStats { merged: 0, unmatched: 1 });
        assert_eq!(addresses(&table, "Light (2)"), vec!["C"]);
    }

    #[test]
    fn merging_is_deterministic() {
        let build = || {
            table(&[
                ("Office Blind", &[("Cmd Office Blind", "1"), ("Ie Office Blind", "2")]),
                ("Ofice Blind", &[("Ie Ofice Blind", "3")]),
                ("Office Blinds", &[("Cmd Office Blinds", "4")]),
                ("Porch Light", &[("Cmd Porch Light", "5")]),
            ])
        };
        let mut first = build();
        let mut second = build();
        merge_single_element_groups(&mut first);
        merge_single_element_groups(&mut second);
        let flatten = |table: &GroupingTable| {
            table
                .iter()
                .map(|(key, bucket)| (key.clone(), bucket.iter().map(|r| r.address.clone()).collect::<Vec<_>>()))
                .collect::<Vec<_>>()
        };
        assert_eq!(flatten(&first), flatten(&second));
        assert_eq!(addresses(&first, "Office Blind"), vec!["1", "2", "3", "4"]);
        assert_eq!(addresses(&first, "Porch Light"), vec!["5"]);
    }
}
