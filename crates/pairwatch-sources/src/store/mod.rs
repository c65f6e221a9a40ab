pub mod firestore;
pub mod local;
pub mod memory;

pub use firestore::FirestoreStore;
pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::traits::{Document, FieldFilter};

pub(crate) fn matches_all(doc: &Document, filters: &[FieldFilter]) -> bool {
    filters.iter().all(|f| f.matches(doc))
}

pub(crate) fn merge_into(target: &mut Document, fields: Document) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}
