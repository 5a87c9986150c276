pub mod relay;
pub mod stager;
