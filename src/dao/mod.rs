/// Category-set assets.
pub mod clue_set;
/// Autosave format and stores.
pub mod save;
/// Storage error types shared by the stores.
pub mod storage;
