use indexmap::IndexMap;

use crate::knx::model::GroupAddressRecord;

pub use crate::grouping::normalize::normalize_name;

/// Records sharing one grouping key, in insertion order.
pub type GroupBucket = Vec<GroupAddressRecord>;

/// Grouping key to bucket. Iteration follows insertion order so every pass
/// over the table is deterministic.
pub type GroupingTable = IndexMap<String, GroupBucket>;

pub fn add_to_grouped_addresses(
    table: &mut GroupingTable,
    record: GroupAddressRecord,
    common_name: &str,
) {
    log::debug!("Grouping '{}' ({}) under '{}'", record.name, record.address, common_name);
    table.entry(common_name.to_string()).or_default().push(record);
}

/// First word of a record's common name, split on space or `_`.
pub(crate) fn leading_word(name: &str) -> String {
    normalize_name(name)
        .split(|c: char| c == ' ' || c == '_')
        .find(|word| !word.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Keeps buckets whose members agree on the leading word of their common name.
///
/// Single-member buckets always pass. A bucket with disagreeing members is
/// dropped as a whole.
pub fn filter_elements(table: GroupingTable) -> GroupingTable {
    let mut filtered = GroupingTable::with_capacity(table.len());
    for (key, bucket) in table {
        if bucket.len() < 2 {
            filtered.insert(key, bucket);
            continue;
        }
        let first = leading_word(&bucket[0].name);
        if bucket.iter().skip(1).all(|record| leading_word(&record.name) == first) {
            filtered.insert(key, bucket);
        } else {
            let names: Vec<&str> = bucket.iter().map(|record| record.name.as_str()).collect();
            log::warn!(
                "Dropping group '{}': members do not share a leading word ({})",
                key,
                names.join(", ")
            );
        }
    }
    filtered
}
