//! Import entry point: picks the source document, detects its depth, and
//! turns its group addresses into functional models.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use roxmltree::Document;
use serde::Serialize;

use crate::functional_model::{FunctionalModel, FunctionalModelSink};
use crate::grouping::merger::merge_single_element_groups_by;
use crate::grouping::normalize::normalize_name;
use crate::grouping::processor::{add_to_grouped_addresses, filter_elements, GroupingTable};
use crate::grouping::structure::{determine_export_structure, determine_project_structure, StructureDepth};
use crate::knx::adapter::load_project_data_bytes;
use crate::knx::address::GroupAddress;
use crate::knx::model::GroupAddressRecord;
use crate::knx::namespace::NamespaceContext;
use crate::knx::parsers::device_links::extract_device_links;
use crate::knx::parsers::group_addresses::{extract_export_records, extract_project_records};
use crate::knx::xml_tags;
use crate::knx::xml_utils::strip_bom;

/// Input selected for an import
#[derive(Debug, Clone)]
pub enum ImportSource {
    /// Standalone ETS group-address export (XML text)
    GroupAddressExport(String),
    /// ETS project data file `0.xml` (XML text)
    ProjectData(String),
    /// Complete `.knxproj` archive
    ProjectArchive {
        data: Vec<u8>,
        password: Option<String>,
    },
}

impl ImportSource {
    /// Picks the variant from a file name and its contents.
    ///
    /// `.knxproj` and `.zip` files are archives; XML files are an export when
    /// their root element is `GroupAddress-Export` and project data otherwise.
    pub fn from_file(file_name: &str, data: Vec<u8>, password: Option<String>) -> Result<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".knxproj") || lower.ends_with(".zip") {
            return Ok(ImportSource::ProjectArchive { data, password });
        }
        let xml = String::from_utf8(data).with_context(|| format!("{} is not valid UTF-8", file_name))?;
        let is_export = {
            let doc = Document::parse(strip_bom(&xml)).with_context(|| format!("Failed to parse {}", file_name))?;
            doc.root_element().tag_name().name() == xml_tags::GROUP_ADDRESS_EXPORT
        };
        if is_export {
            Ok(ImportSource::GroupAddressExport(xml))
        } else {
            Ok(ImportSource::ProjectData(xml))
        }
    }
}

/// Kind of document that was processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    GroupAddressExport,
    ProjectData,
}

/// Outcome of one import pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub source: Option<SourceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub depth: Option<StructureDepth>,
    /// Group addresses read from the document
    pub records: usize,
    /// `GroupAddress` elements skipped as malformed
    pub skipped_records: usize,
    /// Groups dropped because their members disagree on the leading word
    pub dropped_groups: usize,
    /// Single-address groups folded into a similar group
    pub merged: usize,
    pub models_added: usize,
}

/// Runs a full import of `source` into `sink`.
///
/// Failures to read or parse the source are logged and yield a report with no
/// models; they never abort the caller.
pub fn extract_group_address<S>(source: &ImportSource, sink: &mut S) -> ImportReport
where
    S: FunctionalModelSink + ?Sized,
{
    let (kind, project_name, xml) = match resolve_source(source) {
        Ok(resolved) => resolved,
        Err(err) => {
            log::error!("Unable to read import source: {:#}", err);
            return ImportReport::default();
        }
    };

    let doc = match Document::parse(strip_bom(&xml)) {
        Ok(doc) => doc,
        Err(err) => {
            log::error!("Unable to parse {:?} document: {}", kind, err);
            return ImportReport {
                source: Some(kind),
                project_name,
                ..ImportReport::default()
            };
        }
    };
    let ns = NamespaceContext::resolve(&doc);

    let mut report = match kind {
        SourceKind::GroupAddressExport => process_standard_xml_file(&doc, &ns, sink),
        SourceKind::ProjectData => {
            let depth = determine_project_structure(&doc, &ns);
            process_zero_xml_file(&doc, &ns, depth, sink)
        }
    };
    report.source = Some(kind);
    report.project_name = project_name;
    log::info!(
        "Import finished: {} addresses, {} models, {} merged, {} dropped",
        report.records,
        report.models_added,
        report.merged,
        report.dropped_groups
    );
    report
}

fn resolve_source(source: &ImportSource) -> Result<(SourceKind, Option<String>, Cow<'_, str>)> {
    match source {
        ImportSource::GroupAddressExport(xml) => {
            Ok((SourceKind::GroupAddressExport, None, Cow::Borrowed(xml.as_str())))
        }
        ImportSource::ProjectData(xml) => Ok((SourceKind::ProjectData, None, Cow::Borrowed(xml.as_str()))),
        ImportSource::ProjectArchive { data, password } => {
            let docs = load_project_data_bytes(data, password.as_deref())?;
            Ok((SourceKind::ProjectData, Some(docs.project_name), Cow::Owned(docs.data_xml)))
        }
    }
}

/// Standalone export: detect depth, read records, then group them.
pub fn process_standard_xml_file<S>(doc: &Document, ns: &NamespaceContext, sink: &mut S) -> ImportReport
where
    S: FunctionalModelSink + ?Sized,
{
    let depth = determine_export_structure(doc, ns);
    let records = extract_export_records(doc, ns);
    let skipped = count_group_address_elements(doc, ns).saturating_sub(records.len());
    let mut report = new_process_standard_xml_file(records, depth, sink);
    report.skipped_records = skipped;
    report
}

/// Groups export records by common name.
///
/// Two-level installations form one table. Three-level installations form one
/// table per main group, so equal names under different main groups stay
/// apart.
pub fn new_process_standard_xml_file<S>(
    records: Vec<GroupAddressRecord>,
    depth: StructureDepth,
    sink: &mut S,
) -> ImportReport
where
    S: FunctionalModelSink + ?Sized,
{
    let mut report = ImportReport {
        depth: Some(depth),
        records: records.len(),
        ..ImportReport::default()
    };

    let partitions = match depth {
        StructureDepth::TwoLevel => vec![records],
        StructureDepth::ThreeLevel => partition_by_main_group(records),
    };
    for partition in partitions {
        let mut table = GroupingTable::new();
        for record in partition {
            let key = common_name(&record);
            add_to_grouped_addresses(&mut table, record, &key);
        }
        finish_table(table, depth, sink, &mut report, |_, _| true);
    }
    report
}

/// Project data: group by common name, split by linked devices.
///
/// Addresses with the same common name share a group only when they reach a
/// common device (or neither is linked to any). Every further group with that
/// name gets a numeric suffix.
pub fn process_zero_xml_file<S>(
    doc: &Document,
    ns: &NamespaceContext,
    depth: StructureDepth,
    sink: &mut S,
) -> ImportReport
where
    S: FunctionalModelSink + ?Sized,
{
    let records = extract_project_records(doc, ns, depth.address_style());
    let mut report = ImportReport {
        depth: Some(depth),
        records: records.len(),
        skipped_records: count_group_address_elements(doc, ns).saturating_sub(records.len()),
        ..ImportReport::default()
    };

    let mut devices_by_address: HashMap<String, BTreeSet<String>> = HashMap::new();
    for device in extract_device_links(doc, ns) {
        for id in device.group_address_ids {
            devices_by_address
                .entry(id)
                .or_default()
                .insert(device.instance_id.clone());
        }
    }

    let mut groups: Vec<LinkedGroup> = Vec::new();
    let mut groups_by_name: HashMap<String, Vec<usize>> = HashMap::new();
    for record in records {
        let name = common_name(&record);
        let devices = record
            .id
            .as_ref()
            .and_then(|id| devices_by_address.get(id))
            .cloned()
            .unwrap_or_default();
        let candidates = groups_by_name.entry(name.clone()).or_default();
        let existing = candidates
            .iter()
            .copied()
            .find(|index| links_compatible(&groups[*index].devices, &devices));
        match existing {
            Some(index) => {
                groups[index].devices.extend(devices);
                groups[index].records.push(record);
            }
            None => {
                candidates.push(groups.len());
                groups.push(LinkedGroup {
                    common_name: name,
                    devices,
                    records: vec![record],
                });
            }
        }
    }

    // Suffixed keys must not land on a name another group carries itself.
    let reserved: HashSet<String> = groups.iter().map(|group| group.common_name.clone()).collect();
    let mut links_by_key: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut table = GroupingTable::new();
    for group in groups {
        let key = if table.contains_key(&group.common_name) {
            unique_name(
                |candidate| table.contains_key(candidate) || reserved.contains(candidate),
                &group.common_name,
            )
        } else {
            group.common_name.clone()
        };
        for record in group.records {
            add_to_grouped_addresses(&mut table, record, &key);
        }
        links_by_key.insert(key, group.devices);
    }

    // A group split off by its device links stays apart through the merge.
    finish_table(table, depth, sink, &mut report, |from, into| {
        match (links_by_key.get(from), links_by_key.get(into)) {
            (Some(from), Some(into)) => links_compatible(from, into),
            _ => true,
        }
    });
    report
}

struct LinkedGroup {
    common_name: String,
    devices: BTreeSet<String>,
    records: Vec<GroupAddressRecord>,
}

/// Two device sets belong together when they share a device or are both empty.
fn links_compatible(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    if a.is_empty() && b.is_empty() {
        return true;
    }
    !a.is_disjoint(b)
}

/// Filter, merge, and hand every remaining bucket to `sink`.
fn finish_table<S, F>(
    table: GroupingTable,
    depth: StructureDepth,
    sink: &mut S,
    report: &mut ImportReport,
    can_merge: F,
) where
    S: FunctionalModelSink + ?Sized,
    F: Fn(&str, &str) -> bool,
{
    let before = table.len();
    let mut table = filter_elements(table);
    report.dropped_groups += before - table.len();
    report.merged += merge_single_element_groups_by(&mut table, can_merge).merged;

    for (key, bucket) in table {
        let name = unique_name(|candidate| sink.contains_model(candidate), &key);
        sink.add_functional_model(FunctionalModel::from_records(name, key, depth, bucket));
        report.models_added += 1;
    }
}

/// `base`, or `"base (n)"` with the smallest `n >= 2` that is still free.
fn unique_name(taken: impl Fn(&str) -> bool, base: &str) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{} ({})", base, suffix);
        if !taken(&candidate) {
            log::info!("Name '{}' already used, renamed to '{}'", base, candidate);
            return candidate;
        }
        suffix += 1;
    }
}

/// Grouping key of a record; falls back to the raw name, then the address,
/// when normalization leaves nothing.
fn common_name(record: &GroupAddressRecord) -> String {
    let name = normalize_name(&record.name);
    if !name.is_empty() {
        return name;
    }
    let raw = record.name.trim();
    if raw.is_empty() {
        record.address.clone()
    } else {
        raw.to_string()
    }
}

fn partition_by_main_group(records: Vec<GroupAddressRecord>) -> Vec<Vec<GroupAddressRecord>> {
    let mut partitions: IndexMap<String, Vec<GroupAddressRecord>> = IndexMap::new();
    for record in records {
        let key = record
            .main_group
            .clone()
            .or_else(|| GroupAddress::parse(&record.address).map(|address| address.main_group().to_string()))
            .unwrap_or_default();
        partitions.entry(key).or_default().push(record);
    }
    log::debug!("Split addresses into {} main groups", partitions.len());
    partitions.into_values().collect()
}

fn count_group_address_elements(doc: &Document, ns: &NamespaceContext) -> usize {
    ns.descendants(doc.root(), xml_tags::GROUP_ADDRESS).count()
}
