pub mod actor;

pub use actor::ClusterActor;
