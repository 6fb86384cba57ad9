use roxmltree::Node;

use crate::knx::model::AddressRange;
use crate::knx::namespace::NamespaceContext;
use crate::knx::xml_tags;
use crate::knx::xml_utils::{attr_value, required_group_address, ParseError};

pub fn parse_range(node: &Node<'_, '_>) -> Result<AddressRange, ParseError> {
    let start = required_group_address(node, "RangeStart")?.as_u16();
    let end = required_group_address(node, "RangeEnd")?.as_u16();
    if end < start {
        return Err(ParseError::InvalidAttribute {
            element: node.tag_name().name().to_string(),
            attribute: "RangeEnd".to_string(),
            value: end.to_string(),
            expected: format!(">= RangeStart ({})", start),
            context: format!("offset {}", node.range().start),
        });
    }
    Ok(AddressRange {
        name: attr_value(node, "Name"),
        start,
        end,
    })
}

/// Every `GroupRange` below `scope`, in document order.
pub fn extract_ranges(scope: Node<'_, '_>, ns: &NamespaceContext) -> Vec<AddressRange> {
    let mut ranges = Vec::new();
    for node in ns.descendants(scope, xml_tags::GROUP_RANGE) {
        match parse_range(&node) {
            Ok(range) => ranges.push(range),
            Err(error) => log::warn!("Skipping GroupRange: {}", error),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_raw_and_formatted_bounds() -> anyhow::Result<()> {
        let xml = r#"
        <Export>
          <GroupRange Name="Raw" RangeStart="2048" RangeEnd="4095" />
          <GroupRange Name="Formatted" RangeStart="1/1/0" RangeEnd="1/1/10" />
          <GroupRange Name="Reversed" RangeStart="20" RangeEnd="10" />
          <GroupRange Name="Open" RangeStart="1" />
        </Export>
        "#;
        let doc = roxmltree::Document::parse(xml)?;
        let ns = NamespaceContext::resolve(&doc);
        let ranges = extract_ranges(doc.root(), &ns);
        assert_eq!(ranges.len(), 2);
        assert_eq!((ranges[0].start, ranges[0].end), (2048, 4095));
        assert_eq!((ranges[1].start, ranges[1].end), (2304, 2314));
        assert_eq!(ranges[1].name.as_deref(), Some("Formatted"));
        Ok(())
    }
}
