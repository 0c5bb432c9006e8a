mod serialize;
mod validate;

pub use serialize::{
    CodebaseSnapshot, ReferenceRecord, SnapshotError, UnitRecord, load_snapshot,
    load_snapshot_with_fs, save_snapshot, save_snapshot_with_fs,
};
pub use validate::{ContractError, validate_snapshot};
