pub mod init;
pub mod plan;
pub mod reconcile;
pub mod status;
pub mod sync;
