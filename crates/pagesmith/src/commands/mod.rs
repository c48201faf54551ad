pub mod deploy;
pub mod dev;
pub mod export;
pub mod init;
pub mod serve;
