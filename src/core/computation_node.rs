// Copyright @yucwang 2026

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique default ID for a computation node, e.g. `cuboid_tally_3`.
pub fn generate_node_id(type_name: &str) -> String {
    let seq = NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}", type_name, seq)
}

pub trait ComputationNode {
    /// Return the unique identifier for this computation node.
    fn id(&self) -> &str;

    fn kind(&self) -> &'static str;

    // One-line description used in logs and the printed summary.
    fn to_string(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_node_id("disc_tally");
        let b = generate_node_id("disc_tally");
        assert_ne!(a, b);
        assert!(a.starts_with("disc_tally_"));
    }
}
