use serde::{Deserialize, Serialize};

/// Direction of a group address, taken from its name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressRole {
    /// `Ie` prefix: status / feedback sent by the device
    Status,
    /// `Cmd` prefix: command sent to the device
    Command,
    Unspecified,
}

const PREFIXES: [(&str, AddressRole); 2] = [("Ie", AddressRole::Status), ("Cmd", AddressRole::Command)];

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '_' | '-' | '.')
}

fn trim_separators(value: &str) -> &str {
    value.trim_matches(is_separator)
}

/// Splits one leading direction prefix off `name` (already trimmed).
///
/// The prefix only counts as a whole word followed by a separator and some
/// remaining text; `"Iebus"` and a bare `"Cmd"` are left alone.
fn split_prefix(name: &str) -> Option<(AddressRole, &str)> {
    let end = name.find(is_separator)?;
    let (token, rest) = name.split_at(end);
    let rest = trim_separators(rest);
    if rest.is_empty() {
        return None;
    }
    PREFIXES
        .iter()
        .find(|(prefix, _)| token.eq_ignore_ascii_case(prefix))
        .map(|(_, role)| (*role, rest))
}

/// Common name of a group address: the name without its `Ie`/`Cmd` prefix.
///
/// Edge separators are trimmed and stacked prefixes (`"Ie Cmd X"`) are all
/// removed, so the result is stable under repeated application. Separators
/// inside the name are kept: `"Cmd_Kitchen_Light"` gives `"Kitchen_Light"`.
pub fn normalize_name(name: &str) -> String {
    let mut current = trim_separators(name);
    while let Some((_, rest)) = split_prefix(current) {
        current = rest;
    }
    current.to_string()
}

/// Role implied by the first prefix of `name`.
pub fn address_role(name: &str) -> AddressRole {
    split_prefix(trim_separators(name))
        .map(|(role, _)| role)
        .unwrap_or(AddressRole::Unspecified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_prefixes() {
        assert_eq!(normalize_name("Ie Kitchen Light"), "Kitchen Light");
        assert_eq!(normalize_name("Cmd_Kitchen_Light"), "Kitchen_Light");
        assert_eq!(normalize_name("CMD - Hall Blind"), "Hall Blind");
        assert_eq!(normalize_name("ie.Garage Door"), "Garage Door");
    }

    #[test]
    fn leaves_other_names_unchanged() {
        assert_eq!(normalize_name("Kitchen Light"), "Kitchen Light");
        assert_eq!(normalize_name("Iebus Gateway"), "Iebus Gateway");
        assert_eq!(normalize_name("Command Panel"), "Command Panel");
        assert_eq!(normalize_name("Kitchen_Light_Ie"), "Kitchen_Light_Ie");
        assert_eq!(normalize_name("Cmd"), "Cmd");
    }

    #[test]
    fn never_strips_to_empty() {
        assert_eq!(normalize_name("Ie_"), "Ie");
        assert_eq!(normalize_name("Ie Cmd"), "Cmd");
        assert_eq!(normalize_name("  "), "");
    }

    #[test]
    fn is_idempotent() {
        for name in [
            "Ie Kitchen Light",
            "Cmd_Kitchen_Light",
            " Ie Cmd  Hall ",
            "Ie Cmd",
            "Ie_",
            "Kitchen Light",
            "__Cmd__Stairs__",
        ] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once, "input {:?}", name);
        }
    }

    #[test]
    fn role_follows_prefix() {
        assert_eq!(address_role("Ie Kitchen Light"), AddressRole::Status);
        assert_eq!(address_role("cmd_Kitchen_Light"), AddressRole::Command);
        assert_eq!(address_role("Kitchen Light"), AddressRole::Unspecified);
        assert_eq!(address_role("Cmd"), AddressRole::Unspecified);
    }
}
