pub mod backend;
pub mod keys;
#[cfg(test)]
pub mod memory_backend;
pub mod s3_backend;
pub mod storage_service;
