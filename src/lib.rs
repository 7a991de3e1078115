pub mod activity;
pub mod config;
pub mod consensus;
pub mod fault;
pub mod network;
pub mod raft;
pub mod util;
