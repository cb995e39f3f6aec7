//! Git-history mining using libgit2.

mod history;

pub use history::{
    CommitClass, CommitLog, CommitRecord, DeveloperProfile, FileChange, HistoryMiner,
};
