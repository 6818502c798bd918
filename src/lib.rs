#![allow(non_snake_case)]

// Base modules
pub mod config;
pub mod consts;
pub mod errors;
pub mod metrics;

// Page model (src/page/{mod,record,kv,container}.rs)
pub mod page;

// Versioning strategies (src/version/{mod,full,differential,incremental,sliding}.rs)
pub mod version;

// Two-tier transaction log (src/txlog/{mod,cache,codec,persistent,log}.rs)
pub mod txlog;

// Seams to the surrounding transaction infrastructure
pub mod index;
pub mod lock;
pub mod trx;

// Convenience re-exports
pub use config::StoreConfig;
pub use errors::StoreError;
pub use index::{prepare_modification, restore_page, RevisionIndex};
pub use page::{KeyValuePage, PageKind, PageReference, Record, RecordPageContainer};
pub use trx::PageReadTrx;
pub use txlog::{LogType, SynchronizedTransactionLog};
pub use version::Versioning;
