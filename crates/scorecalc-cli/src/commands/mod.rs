pub mod compare;
pub mod eval;
pub mod init;
pub mod score;
pub mod validate;
pub mod verify;
