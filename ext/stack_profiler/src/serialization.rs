pub mod pprof;
pub mod profile;
pub mod serializer;
