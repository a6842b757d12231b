//! Version-sequence integrity under concurrent submission.
//!
//! Concurrent `create_version` calls for the same name must serialize: the
//! resulting version sequence has no gaps and no duplicates.

use lattice_core::schema::SchemaNode;
use lattice_core::DefinitionPatch;
use lattice_registry::Registry;
use std::collections::HashSet;
use std::sync::Arc;

fn contact_patch() -> DefinitionPatch {
    DefinitionPatch::schema(
        SchemaNode::object()
            .with_property("email", SchemaNode::String)
            .with_required("email"),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_create_version_yields_gapless_sequence() {
    const WRITERS: i32 = 16;

    let registry = Arc::new(Registry::in_memory());

    let mut handles = Vec::new();
    for _ in 0..WRITERS {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            registry
                .create_version("contact", contact_patch())
                .await
                .unwrap()
                .version
        }));
    }

    let mut versions = HashSet::new();
    for handle in handles {
        assert!(versions.insert(handle.await.unwrap()), "duplicate version");
    }

    let expected: HashSet<i32> = (1..=WRITERS).collect();
    assert_eq!(versions, expected);

    let active = registry.resolve_active("contact").await.unwrap();
    assert_eq!(active.version, WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_to_different_names_do_not_interfere() {
    let registry = Arc::new(Registry::in_memory());

    let mut handles = Vec::new();
    for name in ["contact", "ticket", "invoice", "shipment"] {
        for _ in 0..4 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.create_version(name, contact_patch()).await.unwrap();
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for name in ["contact", "ticket", "invoice", "shipment"] {
        let active = registry.resolve_active(name).await.unwrap();
        assert_eq!(active.version, 4, "name {}", name);
    }
}
