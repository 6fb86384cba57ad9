use roxmltree::{Document, Node};

use crate::knx::address::{GroupAddress, GroupAddressStyle};
use crate::knx::model::GroupAddressRecord;
use crate::knx::namespace::NamespaceContext;
use crate::knx::parsers::ranges::parse_range;
use crate::knx::xml_tags;
use crate::knx::xml_utils::{attr_value, required_attribute, required_group_address, short_id};

/// Group addresses of a standalone ETS group-address export.
///
/// `Name` and `Address` are required; elements missing either are logged and
/// skipped. The address keeps the notation used by the export.
pub fn extract_export_records(doc: &Document, ns: &NamespaceContext) -> Vec<GroupAddressRecord> {
    let mut records = Vec::new();
    for group in ns.descendants(doc.root(), xml_tags::GROUP_ADDRESS) {
        let name = match required_attribute(&group, "Name") {
            Ok(value) => value,
            Err(error) => {
                log::warn!("Skipping GroupAddress without Name: {}", error);
                continue;
            }
        };
        let address = match required_group_address(&group, "Address") {
            Ok(value) => value.to_string(),
            Err(error) => {
                log::warn!("Skipping GroupAddress with unusable Address: {}", error);
                continue;
            }
        };
        let mut record = GroupAddressRecord::new(name, address);
        record.id = attr_value(&group, "Id").map(|id| short_id(&id));
        record.datapoint_type = datapoint_type(&group);
        apply_range_context(&mut record, group, ns);
        records.push(record);
    }
    log::debug!("Read {} group addresses from export", records.len());
    records
}

/// Group addresses of an ETS project data file (`0.xml`).
///
/// Project files store raw 16-bit addresses; they are rendered with `style`.
/// `Id`, `Address` and `Name` are required.
pub fn extract_project_records(
    doc: &Document,
    ns: &NamespaceContext,
    style: GroupAddressStyle,
) -> Vec<GroupAddressRecord> {
    let mut records = Vec::new();
    for group in ns.descendants(doc.root(), xml_tags::GROUP_ADDRESS) {
        let id = match required_attribute(&group, "Id") {
            Ok(value) => value,
            Err(error) => {
                log::warn!("Skipping GroupAddress without Id: {}", error);
                continue;
            }
        };
        let address = match required_group_address(&group, "Address") {
            Ok(value) => GroupAddress::with_style(value.as_u16(), style).to_string(),
            Err(error) => {
                log::warn!("Skipping GroupAddress with unusable Address: {}", error);
                continue;
            }
        };
        let name = match required_attribute(&group, "Name") {
            Ok(value) => value,
            Err(error) => {
                log::warn!("Skipping GroupAddress without Name: {}", error);
                continue;
            }
        };
        let mut record = GroupAddressRecord::new(name, address);
        record.id = Some(short_id(&id));
        record.datapoint_type = datapoint_type(&group);
        apply_range_context(&mut record, group, ns);
        records.push(record);
    }
    log::debug!("Read {} group addresses from project data", records.len());
    records
}

fn datapoint_type(node: &Node<'_, '_>) -> Option<String> {
    attr_value(node, "DatapointType").or_else(|| attr_value(node, "DPTs"))
}

fn apply_range_context(record: &mut GroupAddressRecord, group: Node<'_, '_>, ns: &NamespaceContext) {
    // Ancestors come innermost first.
    let mut ranges: Vec<_> = ns.ancestors(group, xml_tags::GROUP_RANGE).collect();
    if let Some(innermost) = ranges.first().and_then(|node| parse_range(node).ok()) {
        record.range_start = Some(innermost.start);
        record.range_end = Some(innermost.end);
    }
    ranges.reverse();
    record.main_group = ranges.first().and_then(|node| attr_value(node, "Name"));
    record.middle_group = ranges.get(1).and_then(|node| attr_value(node, "Name"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_malformed_group_addresses() -> anyhow::Result<()> {
        let xml = r#"
        <KNX>
          <GroupAddresses>
            <GroupAddress Id="GA-1" Address="1" Name="Valid" />
            <GroupAddress Id="GA-2" Address="bad" Name="Invalid" />
            <GroupAddress Id="GA-3" Address="70000" Name="TooLarge" />
            <GroupAddress Id="GA-4" Address="5" />
            <GroupAddress Address="6" Name="NoId" />
          </GroupAddresses>
        </KNX>
        "#;
        let doc = roxmltree::Document::parse(xml)?;
        let ns = NamespaceContext::resolve(&doc);
        let records = extract_project_records(&doc, &ns, GroupAddressStyle::ThreeLevel);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Valid");
        assert_eq!(records[0].address, "0/0/1");
        assert_eq!(records[0].id.as_deref(), Some("GA-1"));
        Ok(())
    }

    #[test]
    fn project_records_follow_requested_style() -> anyhow::Result<()> {
        let xml = r#"
        <KNX xmlns="http://knx.org/xml/project/21">
          <GroupAddresses>
            <GroupRanges>
              <GroupRange Id="P-1_GR-1" Name="Lighting" RangeStart="2048" RangeEnd="4095">
                <GroupAddress Id="P-1_GA-7" Address="2309" Name="Ie Kitchen Light" DatapointType="DPST-1-1" />
              </GroupRange>
            </GroupRanges>
          </GroupAddresses>
        </KNX>
        "#;
        let doc = roxmltree::Document::parse(xml)?;
        let ns = NamespaceContext::resolve(&doc);
        let records = extract_project_records(&doc, &ns, GroupAddressStyle::TwoLevel);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.address, "1/261");
        assert_eq!(record.id.as_deref(), Some("GA-7"));
        assert_eq!(record.datapoint_type.as_deref(), Some("DPST-1-1"));
        assert_eq!(record.main_group.as_deref(), Some("Lighting"));
        assert_eq!(record.middle_group, None);
        assert_eq!((record.range_start, record.range_end), (Some(2048), Some(4095)));
        Ok(())
    }

    #[test]
    fn export_records_keep_nesting_names() -> anyhow::Result<()> {
        let xml = r#"
        <GroupAddress-Export xmlns="http://knx.org/xml/ga-export/01">
          <GroupRange Name="Lighting" RangeStart="2048" RangeEnd="4095">
            <GroupRange Name="Kitchen" RangeStart="2304" RangeEnd="2559">
              <GroupAddress Name="Cmd Kitchen Light" Address="1/1/0" DPTs="DPST-1-1" />
              <GroupAddress Address="1/1/1" />
              <GroupAddress Name="Ie Kitchen Light" Address="1/1/2" />
            </GroupRange>
          </GroupRange>
        </GroupAddress-Export>
        "#;
        let doc = roxmltree::Document::parse(xml)?;
        let ns = NamespaceContext::resolve(&doc);
        let records = extract_export_records(&doc, &ns);
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Cmd Kitchen Light", "Ie Kitchen Light"]);
        assert_eq!(records[0].address, "1/1/0");
        assert_eq!(records[0].datapoint_type.as_deref(), Some("DPST-1-1"));
        assert_eq!(records[0].main_group.as_deref(), Some("Lighting"));
        assert_eq!(records[0].middle_group.as_deref(), Some("Kitchen"));
        assert_eq!(records[1].range_start, Some(2304));
        Ok(())
    }
}
