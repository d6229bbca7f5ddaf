//! Actions taken on scan results.
//!
//! - [`delete`]: remove all but the first file of each duplicate group,
//!   to the system trash or permanently

pub mod delete;

pub use delete::{
    delete_duplicates, delete_to_trash, permanent_delete, BatchDeleteResult, DeleteConfig,
    DeleteError, DeleteProgressCallback, DeleteResult, NoopDeleteCallback,
};
