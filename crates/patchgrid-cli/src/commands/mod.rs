pub mod groups;
pub mod init;
pub mod packages;
pub mod patch;
pub mod upload;
