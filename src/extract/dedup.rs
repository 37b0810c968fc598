use std::collections::HashMap;

use super::RasterComponent;

/// Components sharing one content hash, folded into a single group.
#[derive(Debug, Clone)]
pub struct UniqueImageGroup {
    /// First-seen component with this content hash.
    pub representative: RasterComponent,
    pub occurrence_count: usize,
    /// 0-based page indices in first-seen order. Invariant:
    /// `occurrence_count == page_indices.len()`.
    pub page_indices: Vec<u32>,
}

/// Collapse extracted components into unique-content groups.
///
/// Pure function. Output is sorted descending by `occurrence_count`; ties keep
/// first-seen order (stable sort). A logo recurs far more often than
/// incidental content images, so the likely logo surfaces first.
pub fn merge_duplicates(components: &[RasterComponent]) -> Vec<UniqueImageGroup> {
    let mut groups: Vec<UniqueImageGroup> = Vec::new();
    let mut by_hash: HashMap<&str, usize> = HashMap::new();

    for component in components {
        match by_hash.get(component.content_hash.as_str()) {
            Some(&i) => {
                groups[i].occurrence_count += 1;
                groups[i].page_indices.push(component.raster.page_index);
            }
            None => {
                by_hash.insert(component.content_hash.as_str(), groups.len());
                groups.push(UniqueImageGroup {
                    representative: component.clone(),
                    occurrence_count: 1,
                    page_indices: vec![component.raster.page_index],
                });
            }
        }
    }

    groups.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RasterRef;

    fn component(page_index: u32, bytes: &[u8]) -> RasterComponent {
        use sha2::{Digest, Sha256};
        RasterComponent {
            raster: RasterRef {
                page_index,
                name: format!("Im{page_index}"),
                object_id: None,
            },
            width: 10,
            height: 10,
            byte_size: bytes.len(),
            bytes: bytes.to_vec(),
            content_hash: hex::encode(Sha256::digest(bytes)),
            encoding: "raw".to_string(),
            bbox: None,
        }
    }

    #[test]
    fn test_occurrence_counts_sum_to_input_length() {
        let components = vec![
            component(0, b"logo"),
            component(1, b"logo"),
            component(2, b"photo"),
            component(4, b"logo"),
            component(5, b"chart"),
        ];
        let groups = merge_duplicates(&components);

        let total: usize = groups.iter().map(|g| g.occurrence_count).sum();
        assert_eq!(total, components.len());
        for group in &groups {
            assert_eq!(group.occurrence_count, group.page_indices.len());
        }
    }

    #[test]
    fn test_recurring_logo_scenario() {
        // Identical bytes on pages 1, 2, 5 plus one distinct image on page 3.
        let components = vec![
            component(1, b"logo-bytes"),
            component(2, b"logo-bytes"),
            component(3, b"distinct-bytes"),
            component(5, b"logo-bytes"),
        ];
        let groups = merge_duplicates(&components);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].occurrence_count, 3);
        assert_eq!(groups[0].page_indices, vec![1, 2, 5]);
        assert_eq!(groups[1].occurrence_count, 1);
        assert_eq!(groups[1].page_indices, vec![3]);
    }

    #[test]
    fn test_merge_is_order_insensitive_for_grouping() {
        let forward = vec![
            component(0, b"aaa"),
            component(1, b"bbb"),
            component(2, b"aaa"),
        ];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();

        let g1 = merge_duplicates(&forward);
        let g2 = merge_duplicates(&reversed);

        assert_eq!(g1.len(), 2);
        assert_eq!(g2.len(), 2);
        assert_eq!(g1[0].representative.content_hash, g2[0].representative.content_hash);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let components = vec![
            component(0, b"first"),
            component(1, b"second"),
            component(2, b"third"),
        ];
        let groups = merge_duplicates(&components);

        let hashes: Vec<&str> = groups
            .iter()
            .map(|g| g.representative.content_hash.as_str())
            .collect();
        assert_eq!(
            hashes,
            vec![
                components[0].content_hash.as_str(),
                components[1].content_hash.as_str(),
                components[2].content_hash.as_str(),
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert!(merge_duplicates(&[]).is_empty());
    }
}
