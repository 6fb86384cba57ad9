use roxmltree::Document;
use serde::{Deserialize, Serialize};

use crate::knx::address::GroupAddressStyle;
use crate::knx::model::AddressRange;
use crate::knx::namespace::NamespaceContext;
use crate::knx::parsers::ranges::extract_ranges;
use crate::knx::xml_tags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureDepth {
    TwoLevel,
    ThreeLevel,
}

impl StructureDepth {
    pub fn address_style(self) -> GroupAddressStyle {
        match self {
            StructureDepth::TwoLevel => GroupAddressStyle::TwoLevel,
            StructureDepth::ThreeLevel => GroupAddressStyle::ThreeLevel,
        }
    }
}

/// Three levels as soon as two ranges share an address, two otherwise.
///
/// Middle groups are nested inside their main group, so any intersection
/// means a second range level exists. Fewer than two ranges cannot overlap.
pub fn determine_group_address_structure(ranges: &[AddressRange]) -> StructureDepth {
    let mut sorted: Vec<&AddressRange> = ranges.iter().collect();
    sorted.sort_by_key(|range| (range.start, range.end));
    // Sorted by start, an intersection anywhere implies one between neighbours.
    let overlap = sorted.windows(2).find(|pair| pair[0].overlaps(pair[1]));
    match overlap {
        Some(pair) => {
            log::debug!(
                "Ranges {}..={} and {}..={} overlap",
                pair[0].start,
                pair[0].end,
                pair[1].start,
                pair[1].end
            );
            StructureDepth::ThreeLevel
        }
        None => StructureDepth::TwoLevel,
    }
}

/// Depth of an ETS project data file (`0.xml`).
///
/// Only ranges under `GroupAddresses` are considered.
pub fn determine_project_structure(doc: &Document, ns: &NamespaceContext) -> StructureDepth {
    let ranges: Vec<AddressRange> = ns
        .descendants(doc.root(), xml_tags::GROUP_ADDRESSES)
        .flat_map(|scope| extract_ranges(scope, ns))
        .collect();
    let depth = determine_group_address_structure(&ranges);
    log::info!("Project data: {} group ranges, {:?}", ranges.len(), depth);
    depth
}

/// Depth of a standalone group-address export.
pub fn determine_export_structure(doc: &Document, ns: &NamespaceContext) -> StructureDepth {
    let ranges = extract_ranges(doc.root(), ns);
    let depth = determine_group_address_structure(&ranges);
    log::info!("Group address export: {} group ranges, {:?}", ranges.len(), depth);
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knx::address::GroupAddress;

    fn range(start: &str, end: &str) -> AddressRange {
        let bound = |raw: &str| GroupAddress::parse(raw).map(|a| a.as_u16()).unwrap_or_default();
        AddressRange {
            name: None,
            start: bound(start),
            end: bound(end),
        }
    }

    #[test]
    fn disjoint_ranges_are_two_level() {
        let ranges = vec![range("1/1/0", "1/1/10"), range("1/2/0", "1/2/10")];
        assert_eq!(determine_group_address_structure(&ranges), StructureDepth::TwoLevel);
    }

    #[test]
    fn overlapping_ranges_are_three_level() {
        let ranges = vec![range("1/1/0", "1/1/10"), range("1/1/5", "1/1/15")];
        assert_eq!(determine_group_address_structure(&ranges), StructureDepth::ThreeLevel);
    }

    #[test]
    fn shared_boundary_counts_as_overlap() {
        let ranges = vec![range("1/1/10", "1/1/20"), range("1/1/0", "1/1/10")];
        assert_eq!(determine_group_address_structure(&ranges), StructureDepth::ThreeLevel);
    }

    #[test]
    fn overlap_is_found_regardless_of_input_order() {
        let ranges = vec![
            range("2/0/0", "2/0/255"),
            range("0/0/0", "0/7/255"),
            range("1/0/0", "1/0/255"),
            range("0/3/0", "0/3/255"),
        ];
        assert_eq!(determine_group_address_structure(&ranges), StructureDepth::ThreeLevel);
    }

    #[test]
    fn zero_or_one_range_is_two_level() {
        assert_eq!(determine_group_address_structure(&[]), StructureDepth::TwoLevel);
        let ranges = vec![range("1/1/0", "1/1/10")];
        assert_eq!(determine_group_address_structure(&ranges), StructureDepth::TwoLevel);
    }

    #[test]
    fn project_variant_reads_nested_ranges() -> anyhow::Result<()> {
        let xml = r#"
        <KNX xmlns="http://knx.org/xml/project/21">
          <Project>
            <Installations><Installation>
              <GroupAddresses><GroupRanges>
                <GroupRange Id="GR-1" Name="Lights" RangeStart="2048" RangeEnd="4095">
                  <GroupRange Id="GR-2" Name="Ground floor" RangeStart="2048" RangeEnd="2303" />
                </GroupRange>
              </GroupRanges></GroupAddresses>
            </Installation></Installations>
          </Project>
        </KNX>
        "#;
        let doc = roxmltree::Document::parse(xml)?;
        let ns = NamespaceContext::resolve(&doc);
        assert_eq!(determine_project_structure(&doc, &ns), StructureDepth::ThreeLevel);
        Ok(())
    }

    #[test]
    fn export_variant_reads_flat_ranges() -> anyhow::Result<()> {
        let xml = r#"
        <GroupAddress-Export xmlns="http://knx.org/xml/ga-export/01">
          <GroupRange Name="Lights" RangeStart="0/0" RangeEnd="0/2047">
            <GroupAddress Name="Ie Kitchen Light" Address="0/1" />
          </GroupRange>
          <GroupRange Name="Blinds" RangeStart="1/0" RangeEnd="1/2047" />
        </GroupAddress-Export>
        "#;
        let doc = roxmltree::Document::parse(xml)?;
        let ns = NamespaceContext::resolve(&doc);
        assert_eq!(determine_export_structure(&doc, &ns), StructureDepth::TwoLevel);
        Ok(())
    }
}
