use lumo_storage::{Compression, Database, Record};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    id: String,
    payload: Vec<u8>,
}

impl Record for Entry {
    fn id(&self) -> &str {
        &self.id
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn keys_and_payloads_survive_storage(
        entries in proptest::collection::btree_map("\\PC{1,30}", proptest::collection::vec(any::<u8>(), 0..512), 1..16),
        lz4 in any::<bool>(),
    ) {
        let temp = TempDir::new().unwrap();
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let compression = if lz4 { Compression::Lz4 } else { Compression::None };

        let stored: BTreeMap<String, Vec<u8>> = rt.block_on(async {
            let db = Database::builder().root(temp.path()).compression(compression).build().unwrap();
            let entries_store = db.collection::<Entry>("entries").build().unwrap();

            for (id, payload) in &entries {
                entries_store.add(&Entry { id: id.clone(), payload: payload.clone() }).await.unwrap();
            }

            let mut out = BTreeMap::new();
            for key in entries_store.get_all_keys().await.unwrap() {
                let entry = entries_store.get(&key).await.unwrap().unwrap();
                out.insert(key, entry.payload);
            }
            out
        });

        prop_assert_eq!(stored, entries);
    }
}
