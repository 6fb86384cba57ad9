//! Group-address grouping engine.
//!
//! Records flow one way: the structure detector picks a strategy, the
//! processor buckets records by common name and filters inconsistent buckets,
//! the merger folds single-address buckets into similar ones, and the manager
//! turns the final buckets into functional models.

pub mod manager;
pub mod merger;
pub mod normalize;
pub mod processor;
pub mod similarity;
pub mod structure;

pub use manager::{extract_group_address, ImportReport, ImportSource, SourceKind};
pub use merger::{merge_single_element_groups, merge_single_element_groups_by, MergeStats};
pub use normalize::{address_role, normalize_name, AddressRole};
pub use processor::{add_to_grouped_addresses, filter_elements, GroupBucket, GroupingTable};
pub use similarity::{are_names_similar, calculate_similarity, levenshtein_distance, SIMILARITY_THRESHOLD};
pub use structure::{determine_group_address_structure, StructureDepth};
