//! Slug derivation for name-keyed records.

/// URL-safe slug: lower-cased, every space becomes `_`, anything outside
/// `[a-z0-9_-]` is dropped. Surrounding spaces are not trimmed.
///
/// ```
/// use ssot_model::slug::slugify;
///
/// assert_eq!(slugify("Default VLAN group"), "default_vlan_group");
/// assert_eq!(slugify("NYC-1 (main)"), "nyc-1_main");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            'a'..='z' | '0'..='9' | '_' | '-' => Some(c),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Corp"), "acme_corp");
        assert_eq!(slugify("VMware ESXi 8.0"), "vmware_esxi_80");
        assert_eq!(slugify("Source: ovirt"), "source_ovirt");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_keeps_surrounding_spaces_as_underscores() {
        assert_eq!(slugify(" NYC "), "_nyc_");
        assert_eq!(slugify("\tNYC\n"), "nyc");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        let inputs = [
            "Acme Corp",
            "  padded  ",
            "Mixed-CASE_name 42",
            "!!!",
            "a  b",
            "Type: proxmox",
            "tab\tand\nnewline",
        ];
        for input in inputs {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_slugify_idempotent_over_printable_ascii() {
        let all: String = (0x20u8..0x7f).map(char::from).collect();
        for window in all.as_bytes().windows(5) {
            let input = String::from_utf8_lossy(window);
            let once = slugify(&input);
            assert_eq!(slugify(&once), once);
        }
    }
}
