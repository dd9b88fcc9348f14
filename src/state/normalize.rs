use crate::ax::attribute::ProcessId;
use crate::menubar::extra_model::DiscoveredExtra;
use crate::menubar::identity::dedup_key;

/// Catalog match key: owning process plus case-folded title.
pub fn catalog_key(pid: ProcessId, title: &str) -> String {
    dedup_key(pid, title.trim())
}

/// SHA-1 over everything a rescan can change, independent of input order.
pub fn catalog_fingerprint(extras: &[DiscoveredExtra]) -> String {
    use sha1::{Digest, Sha1};

    let mut lines: Vec<String> = extras
        .iter()
        .map(|e| {
            format!(
                "{}\t{}\t{}",
                catalog_key(e.owning_process_id, &e.title),
                e.stable_identifier,
                e.can_toggle_visibility
            )
        })
        .collect();
    lines.sort();

    let mut hasher = Sha1::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extra(title: &str, togglable: bool) -> DiscoveredExtra {
        DiscoveredExtra {
            title: title.into(),
            owning_process_id: 10,
            stable_identifier: format!("AXMenuBarItem::{}", title.to_lowercase()),
            can_toggle_visibility: togglable,
        }
    }

    #[test]
    fn fingerprint_ignores_order_but_not_togglability() {
        let a = catalog_fingerprint(&[extra("Clock", true), extra("Battery", true)]);
        let b = catalog_fingerprint(&[extra("Battery", true), extra("Clock", true)]);
        let c = catalog_fingerprint(&[extra("Battery", false), extra("Clock", true)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 40);
    }
}
