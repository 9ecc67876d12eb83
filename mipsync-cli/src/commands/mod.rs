pub mod daemon;
pub mod init;
pub mod parse;
pub mod run;
pub mod status;
